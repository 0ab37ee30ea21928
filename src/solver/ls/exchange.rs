use crate::{
    problem::{matrix::Gain, routing_problem::RoutingProblem, vehicle::VehicleIdx},
    solver::{solution::Solution, state::SolutionState},
};

/// **Exchange**
///
/// Swaps the job at `s_rank` of the source route with the job at `t_rank`
/// of the target route.
///
/// ```text
/// BEFORE:
///    S: ... (A) -> [s] -> (B) ...
///    T: ... (X) -> [t] -> (Y) ...
///
/// AFTER:
///    S: ... (A) -> [t] -> (B) ...
///    T: ... (X) -> [s] -> (Y) ...
/// ```
#[derive(Debug, Clone)]
pub struct Exchange {
    s_vehicle: VehicleIdx,
    s_rank: usize,
    t_vehicle: VehicleIdx,
    t_rank: usize,
    gain: Gain,
}

impl Exchange {
    pub fn new(
        problem: &RoutingProblem,
        _state: &SolutionState,
        solution: &Solution,
        s_vehicle: VehicleIdx,
        s_rank: usize,
        t_vehicle: VehicleIdx,
        t_rank: usize,
    ) -> Self {
        debug_assert!(s_vehicle != t_vehicle);

        let s_route = solution.route(s_vehicle);
        let t_route = solution.route(t_vehicle);

        let s_location = s_route.location_at(problem, s_rank);
        let t_location = t_route.location_at(problem, t_rank);

        let s_previous = s_route.previous_location(problem, s_rank);
        let s_next = s_route.next_location(problem, s_rank);
        let t_previous = t_route.previous_location(problem, t_rank);
        let t_next = t_route.next_location(problem, t_rank);

        let before = problem.travel_cost_or_zero(s_previous, Some(s_location))
            + problem.travel_cost_or_zero(Some(s_location), s_next)
            + problem.travel_cost_or_zero(t_previous, Some(t_location))
            + problem.travel_cost_or_zero(Some(t_location), t_next);

        let after = problem.travel_cost_or_zero(s_previous, Some(t_location))
            + problem.travel_cost_or_zero(Some(t_location), s_next)
            + problem.travel_cost_or_zero(t_previous, Some(s_location))
            + problem.travel_cost_or_zero(Some(s_location), t_next);

        Exchange {
            s_vehicle,
            s_rank,
            t_vehicle,
            t_rank,
            gain: before - after,
        }
    }

    pub fn gain(&self) -> Gain {
        self.gain
    }

    pub fn is_valid(
        &self,
        problem: &RoutingProblem,
        state: &SolutionState,
        solution: &Solution,
    ) -> bool {
        let s_route = solution.route(self.s_vehicle);
        let t_route = solution.route(self.t_vehicle);

        let s_job = s_route.job_at(self.s_rank);
        let t_job = t_route.job_at(self.t_rank);

        if !problem.vehicle_ok_with_job(self.s_vehicle, t_job)
            || !problem.vehicle_ok_with_job(self.t_vehicle, s_job)
        {
            return false;
        }

        let s_demand = problem.job(s_job).demand();
        let t_demand = problem.job(t_job).demand();

        let s_total = state.total_amount(problem, self.s_vehicle);
        let t_total = state.total_amount(problem, self.t_vehicle);

        (&(&s_total - s_demand) + t_demand).fits_within(s_route.vehicle(problem).capacity())
            && (&(&t_total - t_demand) + s_demand).fits_within(t_route.vehicle(problem).capacity())
            && s_route.is_valid_replacement(
                problem,
                std::iter::once(t_job),
                self.s_rank,
                self.s_rank + 1,
            )
            && t_route.is_valid_replacement(
                problem,
                std::iter::once(s_job),
                self.t_rank,
                self.t_rank + 1,
            )
    }

    pub fn apply(&self, problem: &RoutingProblem, solution: &mut Solution) {
        let s_job = solution.route(self.s_vehicle).job_at(self.s_rank);
        let t_job = solution.route(self.t_vehicle).job_at(self.t_rank);

        solution
            .route_mut(self.s_vehicle)
            .replace(problem, [t_job], self.s_rank, self.s_rank + 1);
        solution
            .route_mut(self.t_vehicle)
            .replace(problem, [s_job], self.t_rank, self.t_rank + 1);
    }

    pub fn addition_candidates(&self) -> Vec<VehicleIdx> {
        vec![self.s_vehicle, self.t_vehicle]
    }
}
