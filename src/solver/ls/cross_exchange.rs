use crate::{
    problem::{matrix::Gain, routing_problem::RoutingProblem, vehicle::VehicleIdx},
    solver::{solution::Solution, state::SolutionState},
};

/// **Cross-Exchange**
///
/// Swaps the pair of consecutive jobs at `[s_rank, s_rank + 1]` with the
/// pair at `[t_rank, t_rank + 1]`, keeping each pair's internal order.
///
/// ```text
/// BEFORE:
///    S: ... (A) -> [s1 -> s2] -> (B) ...
///    T: ... (X) -> [t1 -> t2] -> (Y) ...
///
/// AFTER:
///    S: ... (A) -> [t1 -> t2] -> (B) ...
///    T: ... (X) -> [s1 -> s2] -> (Y) ...
/// ```
///
/// Only the four boundary edges change; the internal pair edges travel
/// with their pair.
#[derive(Debug, Clone)]
pub struct CrossExchange {
    s_vehicle: VehicleIdx,
    s_rank: usize,
    t_vehicle: VehicleIdx,
    t_rank: usize,
    gain: Gain,
}

impl CrossExchange {
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

        let s_first = s_route.location_at(problem, s_rank);
        let s_second = s_route.location_at(problem, s_rank + 1);
        let t_first = t_route.location_at(problem, t_rank);
        let t_second = t_route.location_at(problem, t_rank + 1);

        let s_previous = s_route.previous_location(problem, s_rank);
        let s_next = s_route.next_location(problem, s_rank + 1);
        let t_previous = t_route.previous_location(problem, t_rank);
        let t_next = t_route.next_location(problem, t_rank + 1);

        let before = problem.travel_cost_or_zero(s_previous, Some(s_first))
            + problem.travel_cost_or_zero(Some(s_second), s_next)
            + problem.travel_cost_or_zero(t_previous, Some(t_first))
            + problem.travel_cost_or_zero(Some(t_second), t_next);

        let after = problem.travel_cost_or_zero(s_previous, Some(t_first))
            + problem.travel_cost_or_zero(Some(t_second), s_next)
            + problem.travel_cost_or_zero(t_previous, Some(s_first))
            + problem.travel_cost_or_zero(Some(s_second), t_next);

        CrossExchange {
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

        let s_pair = [s_route.job_at(self.s_rank), s_route.job_at(self.s_rank + 1)];
        let t_pair = [t_route.job_at(self.t_rank), t_route.job_at(self.t_rank + 1)];

        let skills_ok = t_pair
            .iter()
            .all(|&job| problem.vehicle_ok_with_job(self.s_vehicle, job))
            && s_pair
                .iter()
                .all(|&job| problem.vehicle_ok_with_job(self.t_vehicle, job));
        if !skills_ok {
            return false;
        }

        let s_pair_demand = problem.job(s_pair[0]).demand() + problem.job(s_pair[1]).demand();
        let t_pair_demand = problem.job(t_pair[0]).demand() + problem.job(t_pair[1]).demand();

        let s_total = state.total_amount(problem, self.s_vehicle);
        let t_total = state.total_amount(problem, self.t_vehicle);

        (&(&s_total - &s_pair_demand) + &t_pair_demand)
            .fits_within(s_route.vehicle(problem).capacity())
            && (&(&t_total - &t_pair_demand) + &s_pair_demand)
                .fits_within(t_route.vehicle(problem).capacity())
            && s_route.is_valid_replacement(
                problem,
                t_pair.iter().copied(),
                self.s_rank,
                self.s_rank + 2,
            )
            && t_route.is_valid_replacement(
                problem,
                s_pair.iter().copied(),
                self.t_rank,
                self.t_rank + 2,
            )
    }

    pub fn apply(&self, problem: &RoutingProblem, solution: &mut Solution) {
        let s_route = solution.route(self.s_vehicle);
        let t_route = solution.route(self.t_vehicle);
        let s_pair = [s_route.job_at(self.s_rank), s_route.job_at(self.s_rank + 1)];
        let t_pair = [t_route.job_at(self.t_rank), t_route.job_at(self.t_rank + 1)];

        solution
            .route_mut(self.s_vehicle)
            .replace(problem, t_pair, self.s_rank, self.s_rank + 2);
        solution
            .route_mut(self.t_vehicle)
            .replace(problem, s_pair, self.t_rank, self.t_rank + 2);
    }

    pub fn addition_candidates(&self) -> Vec<VehicleIdx> {
        vec![self.s_vehicle, self.t_vehicle]
    }
}
