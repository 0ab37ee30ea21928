use std::cmp::Reverse;

use crate::problem::{
    amount::Amount,
    job::JobIdx,
    matrix::Cost,
    routing_problem::RoutingProblem,
    vehicle::VehicleIdx,
};

use super::{ls::addition_cost, solution::route::Route};

/// Time direction of the single-route constructive heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Forward,
    Reverse,
}

/// Rebuilds a route over `jobs` by greedy cheapest feasible insertion.
///
/// Jobs are fed in time-window urgency order: ascending earliest window
/// start for the forward orientation, descending latest window end for the
/// reverse one. A job whose insertion is infeasible at every rank is left
/// out, so the result may serve a subset; callers that must not drop jobs
/// compare lengths before adopting the result.
pub fn single_route_heuristic(
    problem: &RoutingProblem,
    vehicle_id: VehicleIdx,
    jobs: &[JobIdx],
    orientation: Orientation,
) -> Route {
    let mut ordered = jobs.to_vec();
    match orientation {
        Orientation::Forward => {
            ordered.sort_by_key(|&job| (problem.job(job).time_windows()[0].start(), job));
        }
        Orientation::Reverse => {
            ordered.sort_by_key(|&job| {
                let windows = problem.job(job).time_windows();
                (Reverse(windows[windows.len() - 1].end()), job)
            });
        }
    }

    let capacity = problem.vehicle(vehicle_id).capacity();
    let mut load = Amount::zero(problem.amount_dimensions());
    let mut route = Route::empty(vehicle_id);

    for &job_id in &ordered {
        let job = problem.job(job_id);

        if !(&load + job.demand()).fits_within(capacity) {
            continue;
        }

        let mut best: Option<(Cost, usize)> = None;
        for rank in 0..=route.len() {
            if route.is_valid_addition_for_tw(problem, job_id, rank) {
                let cost = addition_cost(problem, job_id, &route, rank);
                if best.is_none_or(|(best_cost, _)| cost < best_cost) {
                    best = Some((cost, rank));
                }
            }
        }

        if let Some((_, rank)) = best {
            route.add(problem, job_id, rank);
            load += job.demand();
        }
    }

    route
}
