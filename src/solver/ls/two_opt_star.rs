use crate::{
    problem::{matrix::Gain, routing_problem::RoutingProblem, vehicle::VehicleIdx},
    solver::{
        ls::vehicle_covers_segment,
        solution::Solution,
        state::SolutionState,
    },
};

/// **2-Opt\***
///
/// Exchanges the tails of two routes: the source keeps its prefix up to
/// `s_rank` and appends the target's tail after `t_rank`, and vice versa.
/// Tail order is preserved. This is the classic fix for two routes that
/// cross each other.
///
/// ```text
/// BEFORE:
///    S: s0 .. s[s_rank] -> s[s_rank+1] .. s_last
///    T: t0 .. t[t_rank] -> t[t_rank+1] .. t_last
///
/// AFTER:
///    S: s0 .. s[s_rank] -> t[t_rank+1] .. t_last
///    T: t0 .. t[t_rank] -> s[s_rank+1] .. s_last
/// ```
#[derive(Debug, Clone)]
pub struct TwoOptStar {
    s_vehicle: VehicleIdx,
    s_rank: usize,
    t_vehicle: VehicleIdx,
    t_rank: usize,
    gain: Gain,
}

impl TwoOptStar {
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

        let s_end = s_route.vehicle(problem).end_location_id();
        let t_end = t_route.vehicle(problem).end_location_id();

        let s_cut = s_route.location_at(problem, s_rank);
        let t_cut = t_route.location_at(problem, t_rank);

        let s_tail_first = (s_rank + 1 < s_route.len())
            .then(|| s_route.location_at(problem, s_rank + 1));
        let t_tail_first = (t_rank + 1 < t_route.len())
            .then(|| t_route.location_at(problem, t_rank + 1));

        let s_last = s_route.location_at(problem, s_route.len() - 1);
        let t_last = t_route.location_at(problem, t_route.len() - 1);

        let mut before = 0;
        let mut after = 0;

        // Old and new connections on the source side: the cut edge plus the
        // return edge of whichever tail currently ends the route.
        match s_tail_first {
            Some(tail) => {
                before += problem.travel_cost(s_cut, tail);
                before += problem.travel_cost_or_zero(Some(s_last), s_end);
            }
            None => before += problem.travel_cost_or_zero(Some(s_cut), s_end),
        }
        match t_tail_first {
            Some(tail) => {
                before += problem.travel_cost(t_cut, tail);
                before += problem.travel_cost_or_zero(Some(t_last), t_end);
            }
            None => before += problem.travel_cost_or_zero(Some(t_cut), t_end),
        }

        match t_tail_first {
            Some(tail) => {
                after += problem.travel_cost(s_cut, tail);
                after += problem.travel_cost_or_zero(Some(t_last), s_end);
            }
            None => after += problem.travel_cost_or_zero(Some(s_cut), s_end),
        }
        match s_tail_first {
            Some(tail) => {
                after += problem.travel_cost(t_cut, tail);
                after += problem.travel_cost_or_zero(Some(s_last), t_end);
            }
            None => after += problem.travel_cost_or_zero(Some(t_cut), t_end),
        }

        TwoOptStar {
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

        let s_prefix = state.fwd_amounts[self.s_vehicle.get()][self.s_rank].clone();
        let t_prefix = state.fwd_amounts[self.t_vehicle.get()][self.t_rank].clone();
        let s_tail = state.suffix_amount(problem, self.s_vehicle, self.s_rank + 1);
        let t_tail = state.suffix_amount(problem, self.t_vehicle, self.t_rank + 1);

        (&s_prefix + &t_tail).fits_within(s_route.vehicle(problem).capacity())
            && (&t_prefix + &s_tail).fits_within(t_route.vehicle(problem).capacity())
            && vehicle_covers_segment(
                problem,
                state,
                self.s_vehicle,
                self.t_vehicle,
                t_route.jobs_iter(self.t_rank + 1, t_route.len()),
            )
            && vehicle_covers_segment(
                problem,
                state,
                self.t_vehicle,
                self.s_vehicle,
                s_route.jobs_iter(self.s_rank + 1, s_route.len()),
            )
            && s_route.is_valid_replacement(
                problem,
                t_route.jobs_iter(self.t_rank + 1, t_route.len()),
                self.s_rank + 1,
                s_route.len(),
            )
            && t_route.is_valid_replacement(
                problem,
                s_route.jobs_iter(self.s_rank + 1, s_route.len()),
                self.t_rank + 1,
                t_route.len(),
            )
    }

    pub fn apply(&self, problem: &RoutingProblem, solution: &mut Solution) {
        let s_route = solution.route(self.s_vehicle);
        let t_route = solution.route(self.t_vehicle);

        let s_tail: Vec<_> = s_route.jobs_iter(self.s_rank + 1, s_route.len()).collect();
        let t_tail: Vec<_> = t_route.jobs_iter(self.t_rank + 1, t_route.len()).collect();

        let s_route = solution.route_mut(self.s_vehicle);
        let s_len = s_route.len();
        s_route.replace(problem, t_tail, self.s_rank + 1, s_len);

        let t_route = solution.route_mut(self.t_vehicle);
        let t_len = t_route.len();
        t_route.replace(problem, s_tail, self.t_rank + 1, t_len);
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

    use super::TwoOptStar;

    #[test]
    fn test_two_opt_star_swaps_tails() {
        // Two crossing routes along two parallel lines; exchanging the
        // tails after the second stop uncrosses them.
        let locations = test_utils::create_location_grid(2, 6);
        let jobs = test_utils::create_basic_jobs(vec![1, 2, 9, 10, 7, 8, 3, 4]);
        let vehicles = test_utils::create_basic_vehicles(2, 0, 10);
        let problem = test_utils::create_test_problem(locations, jobs, vehicles);

        let mut solution = test_utils::create_test_solution(
            &problem,
            vec![
                TestRoute {
                    vehicle_id: 0,
                    job_ids: vec![0, 1, 2, 3],
                },
                TestRoute {
                    vehicle_id: 1,
                    job_ids: vec![4, 5, 6, 7],
                },
            ],
        );

        let mut state = SolutionState::new(&problem);
        state.setup(&problem, &solution);

        let before = solution.total_cost(&problem);

        let two_opt_star = TwoOptStar::new(&problem, &state, &solution, 0.into(), 1, 1.into(), 1);
        assert!(two_opt_star.gain() > 0);
        assert!(two_opt_star.is_valid(&problem, &state, &solution));

        two_opt_star.apply(&problem, &mut solution);

        assert_eq!(
            solution.route(0.into()).jobs(),
            &[0.into(), 1.into(), 6.into(), 7.into()]
        );
        assert_eq!(
            solution.route(1.into()).jobs(),
            &[4.into(), 5.into(), 2.into(), 3.into()]
        );
        assert_eq!(solution.total_cost(&problem), before - two_opt_star.gain());
    }

    #[test]
    fn test_two_opt_star_rejects_capacity_violation() {
        let locations = test_utils::create_location_grid(1, 6);
        let mut jobs = test_utils::create_basic_jobs(vec![1, 2, 3, 4]);
        jobs[0] = test_utils::job_with_demand(1, 5);
        jobs[1] = test_utils::job_with_demand(2, 5);
        let vehicles = test_utils::create_basic_vehicles(2, 0, 10);
        let problem = test_utils::create_test_problem(locations, jobs, vehicles);

        let solution = test_utils::create_test_solution(
            &problem,
            vec![
                TestRoute {
                    vehicle_id: 0,
                    job_ids: vec![0, 1],
                },
                TestRoute {
                    vehicle_id: 1,
                    job_ids: vec![2, 3],
                },
            ],
        );

        let mut state = SolutionState::new(&problem);
        state.setup(&problem, &solution);

        // The full source prefix (10 units) plus the target tail exceeds
        // the source capacity.
        let two_opt_star = TwoOptStar::new(&problem, &state, &solution, 0.into(), 1, 1.into(), 0);
        assert!(!two_opt_star.is_valid(&problem, &state, &solution));
    }
}
