pub mod route;

use fxhash::FxHashSet;

use crate::problem::{
    job::JobIdx,
    matrix::Cost,
    routing_problem::RoutingProblem,
    vehicle::VehicleIdx,
};

use self::route::Route;

/// One route per vehicle, indexed by vehicle. Which jobs are unassigned is
/// tracked by the engine's solution state, not here.
pub struct Solution {
    routes: Vec<Route>,
}

impl Solution {
    /// All routes empty.
    pub fn new(problem: &RoutingProblem) -> Self {
        Solution {
            routes: (0..problem.vehicles().len())
                .map(|vehicle| Route::empty(VehicleIdx::new(vehicle)))
                .collect(),
        }
    }

    /// Takes ownership of prebuilt routes; there must be exactly one per
    /// vehicle, in vehicle order.
    pub fn from_routes(problem: &RoutingProblem, routes: Vec<Route>) -> Self {
        assert_eq!(routes.len(), problem.vehicles().len());
        assert!(
            routes
                .iter()
                .enumerate()
                .all(|(index, route)| route.vehicle_id().get() == index)
        );

        Solution { routes }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn route(&self, vehicle_id: VehicleIdx) -> &Route {
        &self.routes[vehicle_id.get()]
    }

    pub fn route_mut(&mut self, vehicle_id: VehicleIdx) -> &mut Route {
        &mut self.routes[vehicle_id.get()]
    }

    pub fn replace_route(&mut self, vehicle_id: VehicleIdx, route: Route) {
        assert_eq!(route.vehicle_id(), vehicle_id);
        self.routes[vehicle_id.get()] = route;
    }

    pub fn assigned_jobs(&self) -> FxHashSet<JobIdx> {
        self.routes
            .iter()
            .flat_map(|route| route.jobs().iter().copied())
            .collect()
    }

    /// Recomputes the total cost from scratch; the engine keeps a cached
    /// per-route version in its solution state.
    pub fn total_cost(&self, problem: &RoutingProblem) -> Cost {
        self.routes.iter().map(|route| route.cost(problem)).sum()
    }
}
