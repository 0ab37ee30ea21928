use std::collections::BTreeSet;

use crate::problem::{
    amount::Amount,
    job::JobIdx,
    matrix::{Cost, Gain},
    routing_problem::RoutingProblem,
    skill::SkillSet,
    vehicle::VehicleIdx,
};

use super::solution::{Solution, route::Route};

/// Derived per-route data the engine keeps in sync with the solution:
/// costs, cumulative amounts, removal gains, skill unions and the set of
/// unassigned jobs.
///
/// Built once at engine start; after that, only the fields of routes
/// touched by an accepted move (or by job reinsertion) are refreshed. The
/// cache stores scalars and vectors keyed by (vehicle, rank) and never owns
/// jobs or vehicles.
pub struct SolutionState {
    /// Total routing cost per route.
    pub route_costs: Vec<Cost>,

    /// `fwd_amounts[v][r]`: summed demand of ranks `0..=r`.
    pub fwd_amounts: Vec<Vec<Amount>>,

    /// `bwd_amounts[v][r]`: summed demand of ranks `r..len`.
    pub bwd_amounts: Vec<Vec<Amount>>,

    /// Cost saved by removing the single job at a rank. Can be negative.
    pub node_gains: Vec<Vec<Gain>>,

    /// Cost saved by removing the pair of jobs at ranks `r`, `r + 1`.
    pub edge_gains: Vec<Vec<Gain>>,

    /// Union of the skills required by each route's jobs.
    pub route_skills: Vec<SkillSet>,

    /// Jobs currently assigned to no route. Ordered so reinsertion scans
    /// jobs deterministically.
    pub unassigned: BTreeSet<JobIdx>,
}

impl SolutionState {
    pub fn new(problem: &RoutingProblem) -> Self {
        let vehicles = problem.vehicles().len();

        SolutionState {
            route_costs: vec![0; vehicles],
            fwd_amounts: vec![Vec::new(); vehicles],
            bwd_amounts: vec![Vec::new(); vehicles],
            node_gains: vec![Vec::new(); vehicles],
            edge_gains: vec![Vec::new(); vehicles],
            route_skills: vec![SkillSet::empty(0); vehicles],
            unassigned: BTreeSet::new(),
        }
    }

    /// Computes every cache field from the initial solution and derives the
    /// unassigned set. Initial routes must respect vehicle capacity; a
    /// violation is a caller bug and aborts with the vehicle's identifier.
    pub fn setup(&mut self, problem: &RoutingProblem, solution: &Solution) {
        for route in solution.routes() {
            let vehicle_id = route.vehicle_id();
            self.update_route_cost(problem, route, vehicle_id);
            self.update_amounts(problem, route, vehicle_id);
            self.set_node_gains(problem, route, vehicle_id);
            self.set_edge_gains(problem, route, vehicle_id);
            self.update_skills(problem, route, vehicle_id);

            assert!(
                self.total_amount(problem, vehicle_id)
                    .fits_within(problem.vehicle(vehicle_id).capacity()),
                "initial route for vehicle {} exceeds its capacity",
                problem.vehicle(vehicle_id).external_id()
            );
        }

        let assigned = solution.assigned_jobs();
        self.unassigned = (0..problem.jobs().len())
            .map(JobIdx::new)
            .filter(|job| !assigned.contains(job))
            .collect();
    }

    pub fn update_route_cost(
        &mut self,
        problem: &RoutingProblem,
        route: &Route,
        vehicle_id: VehicleIdx,
    ) {
        self.route_costs[vehicle_id.get()] = route.cost(problem);
    }

    pub fn update_amounts(
        &mut self,
        problem: &RoutingProblem,
        route: &Route,
        vehicle_id: VehicleIdx,
    ) {
        let dimensions = problem.amount_dimensions();

        let fwd = &mut self.fwd_amounts[vehicle_id.get()];
        fwd.clear();
        let mut cumulated = Amount::zero(dimensions);
        for &job_id in route.jobs() {
            cumulated += problem.job(job_id).demand();
            fwd.push(cumulated.clone());
        }

        // bwd_amounts[r] is derived as total - fwd_amounts[r - 1].
        let total = fwd
            .last()
            .cloned()
            .unwrap_or_else(|| Amount::zero(dimensions));
        let bwd = &mut self.bwd_amounts[vehicle_id.get()];
        bwd.clear();
        for rank in 0..route.len() {
            if rank == 0 {
                bwd.push(total.clone());
            } else {
                bwd.push(&total - &fwd[rank - 1]);
            }
        }
    }

    pub fn set_node_gains(
        &mut self,
        problem: &RoutingProblem,
        route: &Route,
        vehicle_id: VehicleIdx,
    ) {
        let gains = &mut self.node_gains[vehicle_id.get()];
        gains.clear();

        for rank in 0..route.len() {
            let previous = route.previous_location(problem, rank);
            let current = route.location_at(problem, rank);
            let next = route.next_location(problem, rank);

            let before = problem.travel_cost_or_zero(previous, Some(current))
                + problem.travel_cost_or_zero(Some(current), next);
            let after = problem.travel_cost_or_zero(previous, next);

            let mut gain = before - after;
            if route.len() == 1 {
                gain += route.vehicle(problem).fixed_cost();
            }

            gains.push(gain);
        }
    }

    pub fn set_edge_gains(
        &mut self,
        problem: &RoutingProblem,
        route: &Route,
        vehicle_id: VehicleIdx,
    ) {
        let gains = &mut self.edge_gains[vehicle_id.get()];
        gains.clear();

        if route.len() < 2 {
            return;
        }

        for rank in 0..route.len() - 1 {
            let previous = route.previous_location(problem, rank);
            let first = route.location_at(problem, rank);
            let second = route.location_at(problem, rank + 1);
            let next = route.next_location(problem, rank + 1);

            let before = problem.travel_cost_or_zero(previous, Some(first))
                + problem.travel_cost(first, second)
                + problem.travel_cost_or_zero(Some(second), next);
            let after = problem.travel_cost_or_zero(previous, next);

            let mut gain = before - after;
            if route.len() == 2 {
                gain += route.vehicle(problem).fixed_cost();
            }

            gains.push(gain);
        }
    }

    pub fn update_skills(
        &mut self,
        problem: &RoutingProblem,
        route: &Route,
        vehicle_id: VehicleIdx,
    ) {
        let skills = &mut self.route_skills[vehicle_id.get()];
        skills.clear();
        for &job_id in route.jobs() {
            skills.union_with(problem.job(job_id).skills());
        }
    }

    /// Summed demand of a whole route.
    pub fn total_amount(&self, problem: &RoutingProblem, vehicle_id: VehicleIdx) -> Amount {
        self.fwd_amounts[vehicle_id.get()]
            .last()
            .cloned()
            .unwrap_or_else(|| Amount::zero(problem.amount_dimensions()))
    }

    /// Summed demand of ranks `rank..len`, zero past the end.
    pub fn suffix_amount(
        &self,
        problem: &RoutingProblem,
        vehicle_id: VehicleIdx,
        rank: usize,
    ) -> Amount {
        self.bwd_amounts[vehicle_id.get()]
            .get(rank)
            .cloned()
            .unwrap_or_else(|| Amount::zero(problem.amount_dimensions()))
    }
}
