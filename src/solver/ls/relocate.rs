use crate::{
    problem::{matrix::Gain, routing_problem::RoutingProblem, vehicle::VehicleIdx},
    solver::{ls::addition_cost, solution::Solution, state::SolutionState},
};

/// **Relocate**
///
/// Moves the job at `s_rank` of the source route to rank `t_rank` of the
/// target route. The workhorse for load balancing and for emptying routes.
///
/// ```text
/// BEFORE:
///    S: ... (A) -> [s] -> (B) ...
///    T: ... (X) -> (Y) ...
///
/// AFTER:
///    S: ... (A) -> (B) ...
///    T: ... (X) -> [s] -> (Y) ...
/// ```
#[derive(Debug, Clone)]
pub struct Relocate {
    s_vehicle: VehicleIdx,
    s_rank: usize,
    t_vehicle: VehicleIdx,
    t_rank: usize,
    gain: Gain,
}

impl Relocate {
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

        let removal_gain = state.node_gains[s_vehicle.get()][s_rank];
        let mut insertion_cost =
            addition_cost(problem, s_route.job_at(s_rank), t_route, t_rank);
        if t_route.is_empty() {
            insertion_cost += t_route.vehicle(problem).fixed_cost();
        }

        Relocate {
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

        let job = s_route.job_at(self.s_rank);

        problem.vehicle_ok_with_job(self.t_vehicle, job)
            && (&state.total_amount(problem, self.t_vehicle) + problem.job(job).demand())
                .fits_within(t_route.vehicle(problem).capacity())
            && t_route.is_valid_addition_for_tw(problem, job, self.t_rank)
            && s_route.is_valid_removal(problem, self.s_rank, 1)
    }

    pub fn apply(&self, problem: &RoutingProblem, solution: &mut Solution) {
        let job = solution.route(self.s_vehicle).job_at(self.s_rank);

        solution
            .route_mut(self.s_vehicle)
            .remove(problem, self.s_rank, 1);
        solution
            .route_mut(self.t_vehicle)
            .add(problem, job, self.t_rank);
    }

    pub fn addition_candidates(&self) -> Vec<VehicleIdx> {
        vec![self.s_vehicle, self.t_vehicle]
    }
}

#[cfg(test)]
mod tests {

    use crate::{
        solver::state::SolutionState,
        test_utils::{self, TestRoute},
    };

    use super::Relocate;

    fn relocate_fixture() -> (crate::problem::routing_problem::RoutingProblem, crate::solver::solution::Solution)
    {
        // Job 2 sits at the far end of the line, right next to vehicle 1's
        // other stops.
        let locations = test_utils::create_location_grid(1, 7);
        let jobs = test_utils::create_basic_jobs(vec![1, 2, 5, 6]);
        let vehicles = test_utils::create_basic_vehicles(2, 0, 10);
        let problem = test_utils::create_test_problem(locations, jobs, vehicles);

        let solution = test_utils::create_test_solution(
            &problem,
            vec![
                TestRoute {
                    vehicle_id: 0,
                    job_ids: vec![0, 1, 2],
                },
                TestRoute {
                    vehicle_id: 1,
                    job_ids: vec![3],
                },
            ],
        );

        (problem, solution)
    }

    #[test]
    fn test_relocate_moves_job() {
        let (problem, mut solution) = relocate_fixture();

        let mut state = SolutionState::new(&problem);
        state.setup(&problem, &solution);

        let before = solution.total_cost(&problem);

        let relocate = Relocate::new(&problem, &state, &solution, 0.into(), 2, 1.into(), 0);
        assert!(relocate.gain() > 0);
        assert!(relocate.is_valid(&problem, &state, &solution));

        relocate.apply(&problem, &mut solution);

        assert_eq!(solution.route(0.into()).jobs(), &[0.into(), 1.into()]);
        assert_eq!(solution.route(1.into()).jobs(), &[2.into(), 3.into()]);
        assert_eq!(solution.total_cost(&problem), before - relocate.gain());
    }

    #[test]
    fn test_relocate_round_trip_restores_state() {
        let (problem, mut solution) = relocate_fixture();

        let mut state = SolutionState::new(&problem);
        state.setup(&problem, &solution);

        let original_s = solution.route(0.into()).jobs().to_vec();
        let original_t = solution.route(1.into()).jobs().to_vec();

        let relocate = Relocate::new(&problem, &state, &solution, 0.into(), 2, 1.into(), 0);
        relocate.apply(&problem, &mut solution);
        state.update_amounts(&problem, solution.route(0.into()), 0.into());
        state.update_amounts(&problem, solution.route(1.into()), 1.into());
        state.set_node_gains(&problem, solution.route(0.into()), 0.into());
        state.set_node_gains(&problem, solution.route(1.into()), 1.into());

        // Moving the job back at its originating rank undoes the move.
        let inverse = Relocate::new(&problem, &state, &solution, 1.into(), 0, 0.into(), 2);
        assert_eq!(inverse.gain(), -relocate.gain());
        assert!(inverse.is_valid(&problem, &state, &solution));
        inverse.apply(&problem, &mut solution);

        assert_eq!(solution.route(0.into()).jobs(), original_s);
        assert_eq!(solution.route(1.into()).jobs(), original_t);

        let mut fresh = SolutionState::new(&problem);
        fresh.setup(&problem, &solution);
        state.update_amounts(&problem, solution.route(0.into()), 0.into());
        state.update_amounts(&problem, solution.route(1.into()), 1.into());
        assert_eq!(fresh.fwd_amounts, state.fwd_amounts);
        assert_eq!(fresh.bwd_amounts, state.bwd_amounts);
    }
}
