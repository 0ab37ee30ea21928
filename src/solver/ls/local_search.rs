use std::sync::atomic::{AtomicU32, Ordering};

use tracing::{debug, instrument, warn};

use crate::problem::{
    job::JobIdx,
    matrix::{Cost, Gain},
    routing_problem::RoutingProblem,
    vehicle::VehicleIdx,
};

use crate::solver::{
    construction::{Orientation, single_route_heuristic},
    indicators::SolutionIndicators,
    ls::{
        addition_cost, cross_exchange::CrossExchange, exchange::Exchange, or_opt::OrOpt,
        r#move::Move, relocate::Relocate, reverse_two_opt_star::ReverseTwoOptStar,
        two_opt_star::TwoOptStar,
    },
    params::LocalSearchParams,
    snapshot,
    solution::Solution,
    state::SolutionState,
};

// Process-wide engine counter, used only to disambiguate snapshot file
// names between engine instances.
static LS_RANK: AtomicU32 = AtomicU32::new(0);

/// Best-improvement local search over inter-route moves.
///
/// Each round evaluates every active (source, target) route pair under six
/// neighborhood operators, applies the single best strictly-improving move,
/// straightens the two touched routes, opportunistically reinserts
/// unassigned jobs, and invalidates exactly the cached pair evaluations the
/// move may have changed. The search runs to a fixed point: total cost is a
/// non-negative integer and every accepted move strictly decreases it.
pub struct LocalSearch<'a> {
    problem: &'a RoutingProblem,
    state: SolutionState,
    params: LocalSearchParams,
    ls_rank: u32,
    log_step: u32,
}

impl<'a> LocalSearch<'a> {
    /// Builds the solution-state cache from an initial feasible solution.
    /// An infeasible initial route is a caller bug and aborts with the
    /// vehicle's identifier.
    pub fn new(
        problem: &'a RoutingProblem,
        solution: &Solution,
        params: LocalSearchParams,
    ) -> Self {
        let mut state = SolutionState::new(problem);
        state.setup(problem, solution);

        LocalSearch {
            problem,
            state,
            params,
            ls_rank: LS_RANK.fetch_add(1, Ordering::Relaxed) + 1,
            log_step: 0,
        }
    }

    pub fn state(&self) -> &SolutionState {
        &self.state
    }

    /// Read-only snapshot of the current solution quality.
    pub fn indicators(&self, solution: &Solution) -> SolutionIndicators {
        SolutionIndicators {
            unassigned: self.state.unassigned.len(),
            cost: self.state.route_costs.iter().sum(),
            used_vehicles: solution
                .routes()
                .iter()
                .filter(|route| !route.is_empty())
                .count(),
        }
    }

    /// Runs rounds until no strictly improving move remains.
    #[instrument(skip_all, level = "debug")]
    pub fn run(&mut self, solution: &mut Solution) {
        self.log_current_solution(solution);

        let vehicle_count = self.problem.vehicles().len();

        let mut best_gains: Vec<Vec<Gain>> = vec![vec![0; vehicle_count]; vehicle_count];
        let mut best_moves: Vec<Vec<Option<Move>>> = (0..vehicle_count)
            .map(|_| (0..vehicle_count).map(|_| None).collect())
            .collect();

        // All pairs need evaluation at first.
        let mut pairs: Vec<(VehicleIdx, VehicleIdx)> =
            Vec::with_capacity(vehicle_count * vehicle_count);
        for s in 0..vehicle_count {
            for t in 0..vehicle_count {
                if s != t {
                    pairs.push((VehicleIdx::new(s), VehicleIdx::new(t)));
                }
            }
        }

        loop {
            self.evaluate_pairs(solution, &pairs, &mut best_gains, &mut best_moves);

            // Global argmax; the first maximal pair in (s, t) order wins.
            let mut best_gain: Gain = 0;
            let mut best_pair: Option<(VehicleIdx, VehicleIdx)> = None;
            for s in 0..vehicle_count {
                for t in 0..vehicle_count {
                    if s != t && best_gains[s][t] > best_gain {
                        best_gain = best_gains[s][t];
                        best_pair = Some((VehicleIdx::new(s), VehicleIdx::new(t)));
                    }
                }
            }

            let Some((best_source, best_target)) = best_pair else {
                break;
            };

            let best_move = best_moves[best_source.get()][best_target.get()]
                .take()
                .expect("a positive pair gain must come with a stored move");

            debug!(
                "applying {} on ({}, {}) with gain {}",
                best_move.operator_name(),
                best_source,
                best_target,
                best_gain
            );

            assert!(
                best_move.is_valid(self.problem, &self.state, solution),
                "stored {} move on vehicles {} and {} is no longer valid",
                best_move.operator_name(),
                self.problem.vehicle(best_source).external_id(),
                self.problem.vehicle(best_target).external_id()
            );

            best_move.apply(self.problem, solution);

            let previous_cost = self.state.route_costs[best_source.get()]
                + self.state.route_costs[best_target.get()];
            self.state
                .update_route_cost(self.problem, solution.route(best_source), best_source);
            self.state
                .update_route_cost(self.problem, solution.route(best_target), best_target);
            let new_cost = self.state.route_costs[best_source.get()]
                + self.state.route_costs[best_target.get()];

            assert_eq!(
                new_cost + best_gain,
                previous_cost,
                "gain accounting mismatch after {} on vehicles {} and {}",
                best_move.operator_name(),
                self.problem.vehicle(best_source).external_id(),
                self.problem.vehicle(best_target).external_id()
            );

            self.straighten_route(solution, best_source);
            self.straighten_route(solution, best_target);

            // Amounts must be current before reinsertion evaluates
            // capacities; additions keep them in sync afterwards.
            self.state
                .update_amounts(self.problem, solution.route(best_source), best_source);
            self.state
                .update_amounts(self.problem, solution.route(best_target), best_target);

            self.try_job_additions(solution, &best_move.addition_candidates(), 0.0);

            self.state
                .update_route_cost(self.problem, solution.route(best_source), best_source);
            self.state
                .update_route_cost(self.problem, solution.route(best_target), best_target);
            self.state
                .update_skills(self.problem, solution.route(best_source), best_source);
            self.state
                .update_skills(self.problem, solution.route(best_target), best_target);
            self.state
                .set_node_gains(self.problem, solution.route(best_source), best_source);
            self.state
                .set_node_gains(self.problem, solution.route(best_target), best_target);
            self.state
                .set_edge_gains(self.problem, solution.route(best_source), best_source);
            self.state
                .set_edge_gains(self.problem, solution.route(best_target), best_target);

            // Reset what the next round must recompute: every pair gain
            // involving a touched route, and the active pair list itself.
            for v in 0..vehicle_count {
                for touched in [best_source.get(), best_target.get()] {
                    best_gains[touched][v] = 0;
                    best_gains[v][touched] = 0;
                    best_moves[touched][v] = None;
                    best_moves[v][touched] = None;
                }
            }

            pairs.clear();
            pairs.push((best_source, best_target));
            pairs.push((best_target, best_source));
            for v in 0..vehicle_count {
                let vehicle = VehicleIdx::new(v);
                if vehicle == best_source || vehicle == best_target {
                    continue;
                }
                pairs.push((best_source, vehicle));
                pairs.push((vehicle, best_source));
                pairs.push((best_target, vehicle));
                pairs.push((vehicle, best_target));
            }

            self.log_current_solution(solution);
        }
    }

    fn evaluate_pairs(
        &self,
        solution: &Solution,
        pairs: &[(VehicleIdx, VehicleIdx)],
        best_gains: &mut [Vec<Gain>],
        best_moves: &mut [Vec<Option<Move>>],
    ) {
        // Exchange, symmetric.
        for &(s, t) in pairs {
            if t <= s || solution.route(s).is_empty() || solution.route(t).is_empty() {
                continue;
            }

            for s_rank in 0..solution.route(s).len() {
                for t_rank in 0..solution.route(t).len() {
                    let op = Exchange::new(self.problem, &self.state, solution, s, s_rank, t, t_rank);
                    if op.gain() > best_gains[s.get()][t.get()]
                        && op.is_valid(self.problem, &self.state, solution)
                    {
                        best_gains[s.get()][t.get()] = op.gain();
                        best_moves[s.get()][t.get()] = Some(Move::Exchange(op));
                    }
                }
            }
        }

        // Cross-Exchange, symmetric.
        for &(s, t) in pairs {
            if t <= s || solution.route(s).len() < 2 || solution.route(t).len() < 2 {
                continue;
            }

            for s_rank in 0..solution.route(s).len() - 1 {
                for t_rank in 0..solution.route(t).len() - 1 {
                    let op =
                        CrossExchange::new(self.problem, &self.state, solution, s, s_rank, t, t_rank);
                    if op.gain() > best_gains[s.get()][t.get()]
                        && op.is_valid(self.problem, &self.state, solution)
                    {
                        best_gains[s.get()][t.get()] = op.gain();
                        best_moves[s.get()][t.get()] = Some(Move::CrossExchange(op));
                    }
                }
            }
        }

        // 2-Opt*, symmetric. Target ranks are scanned from the rear and
        // abandoned on the first capacity overflow: bwd_amounts grow
        // monotonically towards the front.
        for &(s, t) in pairs {
            if t <= s {
                continue;
            }

            let s_capacity = self.problem.vehicle(s).capacity();
            for s_rank in 0..solution.route(s).len() {
                let s_free = s_capacity - &self.state.fwd_amounts[s.get()][s_rank];
                for t_rank in (0..solution.route(t).len()).rev() {
                    if !self.state.bwd_amounts[t.get()][t_rank].fits_within(&s_free) {
                        break;
                    }

                    let op =
                        TwoOptStar::new(self.problem, &self.state, solution, s, s_rank, t, t_rank);
                    if op.gain() > best_gains[s.get()][t.get()]
                        && op.is_valid(self.problem, &self.state, solution)
                    {
                        best_gains[s.get()][t.get()] = op.gain();
                        best_moves[s.get()][t.get()] = Some(Move::TwoOptStar(op));
                    }
                }
            }
        }

        // Reverse 2-Opt*, directional. Forward target scan with the
        // analogous fwd_amounts break.
        for &(s, t) in pairs {
            let s_capacity = self.problem.vehicle(s).capacity();
            for s_rank in 0..solution.route(s).len() {
                let s_free = s_capacity - &self.state.fwd_amounts[s.get()][s_rank];
                for t_rank in 0..solution.route(t).len() {
                    if !self.state.fwd_amounts[t.get()][t_rank].fits_within(&s_free) {
                        break;
                    }

                    let op = ReverseTwoOptStar::new(
                        self.problem,
                        &self.state,
                        solution,
                        s,
                        s_rank,
                        t,
                        t_rank,
                    );
                    if op.gain() > best_gains[s.get()][t.get()]
                        && op.is_valid(self.problem, &self.state, solution)
                    {
                        best_gains[s.get()][t.get()] = op.gain();
                        best_moves[s.get()][t.get()] = Some(Move::ReverseTwoOptStar(op));
                    }
                }
            }
        }

        // Relocate, directional.
        for &(s, t) in pairs {
            if solution.route(s).is_empty()
                || !(&self.state.total_amount(self.problem, t) + self.problem.amount_lower_bound())
                    .fits_within(self.problem.vehicle(t).capacity())
            {
                // Nothing to take from an empty route, and nothing fits
                // into a full one.
                continue;
            }

            for s_rank in 0..solution.route(s).len() {
                if self.state.node_gains[s.get()][s_rank] <= best_gains[s.get()][t.get()] {
                    // The removal saving alone caps the achievable gain,
                    // barring a negative addition cost in the target.
                    continue;
                }

                for t_rank in 0..=solution.route(t).len() {
                    let op = Relocate::new(self.problem, &self.state, solution, s, s_rank, t, t_rank);
                    if op.gain() > best_gains[s.get()][t.get()]
                        && op.is_valid(self.problem, &self.state, solution)
                    {
                        best_gains[s.get()][t.get()] = op.gain();
                        best_moves[s.get()][t.get()] = Some(Move::Relocate(op));
                    }
                }
            }
        }

        // Or-Opt, directional.
        for &(s, t) in pairs {
            if solution.route(s).len() < 2
                || !(&self.state.total_amount(self.problem, t)
                    + self.problem.double_amount_lower_bound())
                .fits_within(self.problem.vehicle(t).capacity())
            {
                continue;
            }

            for s_rank in 0..solution.route(s).len() - 1 {
                if self.state.edge_gains[s.get()][s_rank] <= best_gains[s.get()][t.get()] {
                    continue;
                }

                for t_rank in 0..=solution.route(t).len() {
                    let op = OrOpt::new(self.problem, &self.state, solution, s, s_rank, t, t_rank);
                    if op.gain() > best_gains[s.get()][t.get()]
                        && op.is_valid(self.problem, &self.state, solution)
                    {
                        best_gains[s.get()][t.get()] = op.gain();
                        best_moves[s.get()][t.get()] = Some(Move::OrOpt(op));
                    }
                }
            }
        }
    }

    /// Rebuilds a touched route with the constructive heuristic in both
    /// orientations and keeps the best full-coverage result. Jobs are never
    /// dropped: a rebuild that loses coverage is discarded.
    fn straighten_route(&mut self, solution: &mut Solution, vehicle_id: VehicleIdx) {
        if solution.route(vehicle_id).is_empty() {
            return;
        }

        let before_cost = self.state.route_costs[vehicle_id.get()];
        let jobs = solution.route(vehicle_id).jobs().to_vec();

        let forward = single_route_heuristic(self.problem, vehicle_id, &jobs, Orientation::Forward);
        let reverse = single_route_heuristic(self.problem, vehicle_id, &jobs, Orientation::Reverse);

        let mut candidate = forward;
        if reverse.len() > candidate.len()
            || (reverse.len() == candidate.len()
                && reverse.cost(self.problem) < candidate.cost(self.problem))
        {
            candidate = reverse;
        }

        if candidate.len() == jobs.len() {
            let after_cost = candidate.cost(self.problem);
            if after_cost < before_cost {
                debug!(
                    "straightened route of vehicle {} from {} to {}",
                    self.problem.vehicle(vehicle_id).external_id(),
                    before_cost,
                    after_cost
                );
                self.log_current_solution(solution);
                solution.replace_route(vehicle_id, candidate);
                self.state.route_costs[vehicle_id.get()] = after_cost;
            }
        }
    }

    /// Regret-based reinsertion of unassigned jobs over candidate routes.
    ///
    /// With coefficient 0 this is pure cheapest insertion. Per pass, every
    /// unassigned job gets its cheapest compatible rank per route; the job
    /// minimizing `cost - regret_coeff * regret` is inserted, where the
    /// regret is the best cost among the other routes. Passes repeat until
    /// no finite insertion exists.
    #[instrument(skip_all, level = "debug")]
    pub fn try_job_additions(
        &mut self,
        solution: &mut Solution,
        routes: &[VehicleIdx],
        regret_coeff: f64,
    ) {
        loop {
            let mut best_score = f64::INFINITY;
            let mut best_addition: Option<(JobIdx, VehicleIdx, usize)> = None;

            for &job_id in &self.state.unassigned {
                let demand = self.problem.job(job_id).demand();

                let mut best_costs = vec![Cost::MAX; routes.len()];
                let mut best_ranks = vec![0usize; routes.len()];

                for (i, &vehicle_id) in routes.iter().enumerate() {
                    let route = solution.route(vehicle_id);
                    let vehicle = self.problem.vehicle(vehicle_id);

                    if self.problem.vehicle_ok_with_job(vehicle_id, job_id)
                        && (&self.state.total_amount(self.problem, vehicle_id) + demand)
                            .fits_within(vehicle.capacity())
                    {
                        for rank in 0..=route.len() {
                            if route.is_valid_addition_for_tw(self.problem, job_id, rank) {
                                let mut cost = addition_cost(self.problem, job_id, route, rank);
                                if route.is_empty() {
                                    cost += vehicle.fixed_cost();
                                }

                                if cost < best_costs[i] {
                                    best_costs[i] = cost;
                                    best_ranks[i] = rank;
                                }
                            }
                        }
                    }
                }

                let mut smallest = Cost::MAX;
                let mut second_smallest = Cost::MAX;
                let mut smallest_idx = usize::MAX;
                for (i, &cost) in best_costs.iter().enumerate() {
                    if cost < smallest {
                        smallest_idx = i;
                        second_smallest = smallest;
                        smallest = cost;
                    } else if cost < second_smallest {
                        second_smallest = cost;
                    }
                }

                for (i, &cost) in best_costs.iter().enumerate() {
                    if cost == Cost::MAX {
                        continue;
                    }

                    let regret = if i == smallest_idx {
                        second_smallest
                    } else {
                        smallest
                    };

                    let score = cost as f64 - regret_coeff * regret as f64;
                    if score < best_score {
                        best_score = score;
                        best_addition = Some((job_id, routes[i], best_ranks[i]));
                    }
                }
            }

            // No finite insertion anywhere ends the pass.
            let Some((job_id, vehicle_id, rank)) = best_addition else {
                break;
            };

            debug!(
                "adding job {} to vehicle {} at rank {}",
                self.problem.job(job_id).external_id(),
                self.problem.vehicle(vehicle_id).external_id(),
                rank
            );

            solution.route_mut(vehicle_id).add(self.problem, job_id, rank);
            self.state
                .update_amounts(self.problem, solution.route(vehicle_id), vehicle_id);
            self.state
                .update_route_cost(self.problem, solution.route(vehicle_id), vehicle_id);
            self.state.unassigned.remove(&job_id);
        }
    }

    fn log_current_solution(&mut self, solution: &Solution) {
        if !self.params.log_solutions {
            return;
        }

        self.log_step += 1;
        let path = format!(
            "{}{}_{}_sol.json",
            self.params.log_prefix, self.ls_rank, self.log_step
        );

        if let Err(error) = snapshot::write_snapshot(&path, self.problem, solution, &self.state) {
            warn!("failed to write solution snapshot {}: {}", path, error);
        }
    }
}
