use crate::{
    problem::{matrix::Gain, routing_problem::RoutingProblem, vehicle::VehicleIdx},
    solver::{ls::edge_addition_cost, solution::Solution, state::SolutionState},
};

/// **Or-Opt**
///
/// Moves the pair of consecutive jobs at `[s_rank, s_rank + 1]` of the
/// source route to rank `t_rank` of the target route, keeping their order.
///
/// ```text
/// BEFORE:
///    S: ... (A) -> [s1 -> s2] -> (B) ...
///    T: ... (X) -> (Y) ...
///
/// AFTER:
///    S: ... (A) -> (B) ...
///    T: ... (X) -> [s1 -> s2] -> (Y) ...
/// ```
#[derive(Debug, Clone)]
pub struct OrOpt {
    s_vehicle: VehicleIdx,
    s_rank: usize,
    t_vehicle: VehicleIdx,
    t_rank: usize,
    gain: Gain,
}

impl OrOpt {
    pub fn new(
        problem: &RoutingProblem,
        state: &SolutionState,
        solution: &Solution,
        s_vehicle: VehicleIdx,
        s_rank: usize,
        t_vehicle: VehicleIdx,
        t_rank: usize,
    ) -> Self {
        debug_assert!(s_vehicle != t_vehicle);

        let s_route = solution.route(s_vehicle);
        let t_route = solution.route(t_vehicle);

        let removal_gain = state.edge_gains[s_vehicle.get()][s_rank];
        let mut insertion_cost = edge_addition_cost(
            problem,
            s_route.job_at(s_rank),
            s_route.job_at(s_rank + 1),
            t_route,
            t_rank,
        );
        if t_route.is_empty() {
            insertion_cost += t_route.vehicle(problem).fixed_cost();
        }

        OrOpt {
            s_vehicle,
            s_rank,
            t_vehicle,
            t_rank,
            gain: removal_gain - insertion_cost,
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

        let pair = [s_route.job_at(self.s_rank), s_route.job_at(self.s_rank + 1)];

        let pair_demand = problem.job(pair[0]).demand() + problem.job(pair[1]).demand();

        pair.iter()
            .all(|&job| problem.vehicle_ok_with_job(self.t_vehicle, job))
            && (&state.total_amount(problem, self.t_vehicle) + &pair_demand)
                .fits_within(t_route.vehicle(problem).capacity())
            && t_route.is_valid_replacement(
                problem,
                pair.iter().copied(),
                self.t_rank,
                self.t_rank,
            )
            && s_route.is_valid_removal(problem, self.s_rank, 2)
    }

    pub fn apply(&self, problem: &RoutingProblem, solution: &mut Solution) {
        let s_route = solution.route(self.s_vehicle);
        let pair = [s_route.job_at(self.s_rank), s_route.job_at(self.s_rank + 1)];

        solution
            .route_mut(self.s_vehicle)
            .remove(problem, self.s_rank, 2);
        solution
            .route_mut(self.t_vehicle)
            .replace(problem, pair, self.t_rank, self.t_rank);
    }

    pub fn addition_candidates(&self) -> Vec<VehicleIdx> {
        vec![self.s_vehicle, self.t_vehicle]
    }
}
