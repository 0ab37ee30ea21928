use crate::{
    problem::{matrix::Gain, routing_problem::RoutingProblem, vehicle::VehicleIdx},
    solver::{
        ls::{sequence_cost, vehicle_covers_segment},
        solution::Solution,
        state::SolutionState,
    },
};

/// **Reverse 2-Opt\***
///
/// As 2-Opt\*, but the exchanged segments are reversed and come from the
/// opposite ends: the source keeps its prefix and appends the target's
/// *head* in reverse, while the target keeps its tail and is prefixed with
/// the source's tail in reverse.
///
/// ```text
/// BEFORE:
///    S: s0 .. s[s_rank] -> s[s_rank+1] .. s_last
///    T: t0 .. t[t_rank] -> t[t_rank+1] .. t_last
///
/// AFTER:
///    S: s0 .. s[s_rank] -> t[t_rank] .. t0
///    T: s_last .. s[s_rank+1] -> t[t_rank+1] .. t_last
/// ```
///
/// Unlike the other segment swaps this operator is directional: reversing
/// segments reacts to matrix asymmetry, so (S, T) and (T, S) are distinct
/// candidates.
#[derive(Debug, Clone)]
pub struct ReverseTwoOptStar {
    s_vehicle: VehicleIdx,
    s_rank: usize,
    t_vehicle: VehicleIdx,
    t_rank: usize,
    gain: Gain,
}

impl ReverseTwoOptStar {
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

        // Reversal changes every edge inside the moved segments, so the
        // gain is evaluated against the full rebuilt sequences rather than
        // a constant number of boundary edges.
        let new_s_cost = sequence_cost(
            problem,
            s_vehicle,
            s_route
                .jobs_iter(0, s_rank + 1)
                .chain(t_route.jobs_iter(0, t_rank + 1).rev()),
        );
        let new_t_cost = sequence_cost(
            problem,
            t_vehicle,
            s_route
                .jobs_iter(s_rank + 1, s_route.len())
                .rev()
                .chain(t_route.jobs_iter(t_rank + 1, t_route.len())),
        );

        let before = state.route_costs[s_vehicle.get()] + state.route_costs[t_vehicle.get()];

        ReverseTwoOptStar {
            s_vehicle,
            s_rank,
            t_vehicle,
            t_rank,
            gain: before - new_s_cost - new_t_cost,
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
        let s_tail = &state.total_amount(problem, self.s_vehicle) - &s_prefix;
        let t_tail = &state.total_amount(problem, self.t_vehicle) - &t_prefix;

        (&s_prefix + &t_prefix).fits_within(s_route.vehicle(problem).capacity())
            && (&s_tail + &t_tail).fits_within(t_route.vehicle(problem).capacity())
            && vehicle_covers_segment(
                problem,
                state,
                self.s_vehicle,
                self.t_vehicle,
                t_route.jobs_iter(0, self.t_rank + 1),
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
                t_route.jobs_iter(0, self.t_rank + 1).rev(),
                self.s_rank + 1,
                s_route.len(),
            )
            && t_route.is_valid_replacement(
                problem,
                s_route.jobs_iter(self.s_rank + 1, s_route.len()).rev(),
                0,
                self.t_rank + 1,
            )
    }

    pub fn apply(&self, problem: &RoutingProblem, solution: &mut Solution) {
        let s_route = solution.route(self.s_vehicle);
        let t_route = solution.route(self.t_vehicle);

        let reversed_s_tail: Vec<_> = s_route
            .jobs_iter(self.s_rank + 1, s_route.len())
            .rev()
            .collect();
        let reversed_t_head: Vec<_> = t_route.jobs_iter(0, self.t_rank + 1).rev().collect();

        let s_route = solution.route_mut(self.s_vehicle);
        let s_len = s_route.len();
        s_route.replace(problem, reversed_t_head, self.s_rank + 1, s_len);

        solution
            .route_mut(self.t_vehicle)
            .replace(problem, reversed_s_tail, 0, self.t_rank + 1);
    }

    pub fn addition_candidates(&self) -> Vec<VehicleIdx> {
        vec![self.s_vehicle, self.t_vehicle]
    }
}
