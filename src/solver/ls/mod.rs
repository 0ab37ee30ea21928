pub mod cross_exchange;
pub mod exchange;
pub mod local_search;
pub mod r#move;
pub mod or_opt;
pub mod relocate;
pub mod reverse_two_opt_star;
pub mod two_opt_star;

use crate::problem::{
    job::JobIdx,
    matrix::Cost,
    routing_problem::RoutingProblem,
    vehicle::VehicleIdx,
};

use super::{solution::route::Route, state::SolutionState};

/// Travel-cost delta of inserting `job_id` at `rank` in `route` (rank may
/// equal the route length for an append).
pub fn addition_cost(
    problem: &RoutingProblem,
    job_id: JobIdx,
    route: &Route,
    rank: usize,
) -> Cost {
    let job_location = problem.job(job_id).location_id();
    let previous = route.location_before_insertion(problem, rank);
    let next = route.location_after_insertion(problem, rank);

    problem.travel_cost_or_zero(previous, Some(job_location))
        + problem.travel_cost_or_zero(Some(job_location), next)
        - problem.travel_cost_or_zero(previous, next)
}

/// Travel-cost delta of inserting the ordered pair `(first, second)` at
/// `rank` in `route`, including the pair's internal edge.
pub(crate) fn edge_addition_cost(
    problem: &RoutingProblem,
    first: JobIdx,
    second: JobIdx,
    route: &Route,
    rank: usize,
) -> Cost {
    let first_location = problem.job(first).location_id();
    let second_location = problem.job(second).location_id();
    let previous = route.location_before_insertion(problem, rank);
    let next = route.location_after_insertion(problem, rank);

    problem.travel_cost_or_zero(previous, Some(first_location))
        + problem.travel_cost(first_location, second_location)
        + problem.travel_cost_or_zero(Some(second_location), next)
        - problem.travel_cost_or_zero(previous, next)
}

/// Cost of a hypothetical job sequence served by `vehicle_id`, with the
/// vehicle's fixed cost when the sequence is non-empty.
pub(crate) fn sequence_cost<I>(problem: &RoutingProblem, vehicle_id: VehicleIdx, jobs: I) -> Cost
where
    I: IntoIterator<Item = JobIdx>,
{
    let vehicle = problem.vehicle(vehicle_id);
    let mut iter = jobs.into_iter();

    let Some(first) = iter.next() else {
        return 0;
    };

    let mut cost = vehicle.fixed_cost();
    let mut previous = problem.job(first).location_id();

    if let Some(start) = vehicle.start_location_id() {
        cost += problem.travel_cost(start, previous);
    }

    for job_id in iter {
        let location = problem.job(job_id).location_id();
        cost += problem.travel_cost(previous, location);
        previous = location;
    }

    if let Some(end) = vehicle.end_location_id() {
        cost += problem.travel_cost(previous, end);
    }

    cost
}

/// Skill coverage of a whole moved segment. The cached per-route skill
/// union answers the common case without walking the segment; the per-job
/// scan only runs when the union is not covered.
pub(crate) fn vehicle_covers_segment<I>(
    problem: &RoutingProblem,
    state: &SolutionState,
    vehicle_id: VehicleIdx,
    segment_vehicle: VehicleIdx,
    segment: I,
) -> bool
where
    I: IntoIterator<Item = JobIdx>,
{
    if problem
        .vehicle(vehicle_id)
        .skills()
        .covers(&state.route_skills[segment_vehicle.get()])
    {
        return true;
    }

    segment
        .into_iter()
        .all(|job_id| problem.vehicle_ok_with_job(vehicle_id, job_id))
}
