use crate::{
    problem::{
        amount::Amount,
        job::{Job, JobBuilder},
        location::Location,
        routing_problem::{RoutingProblem, RoutingProblemBuilder},
        vehicle::{Vehicle, VehicleBuilder, VehicleIdx},
    },
    solver::solution::{Solution, route::Route},
};

pub fn create_location_grid(rows: usize, cols: usize) -> Vec<Location> {
    let mut locations = Vec::new();

    for y in 0..rows {
        for x in 0..cols {
            locations.push(Location::from_cartesian(x as f64, y as f64));
        }
    }

    locations
}

/// Unit-demand jobs with wide time windows, one per location id.
pub fn create_basic_jobs(location_ids: Vec<usize>) -> Vec<Job> {
    location_ids
        .iter()
        .enumerate()
        .map(|(index, &location_id)| {
            let mut builder = JobBuilder::default();
            builder.set_external_id(index.to_string());
            builder.set_location_id(location_id);
            builder.set_delivery(Amount::from_vec(vec![1]));
            builder.build()
        })
        .collect()
}

pub fn job_with_demand(location_id: usize, demand: i64) -> Job {
    let mut builder = JobBuilder::default();
    builder.set_external_id(format!("demand_{demand}_at_{location_id}"));
    builder.set_location_id(location_id);
    builder.set_delivery(Amount::from_vec(vec![demand]));
    builder.build()
}

/// Identical round-trip vehicles sharing one depot.
pub fn create_basic_vehicles(count: usize, depot_location_id: usize, capacity: i64) -> Vec<Vehicle> {
    (0..count)
        .map(|index| {
            let mut builder = VehicleBuilder::default();
            builder.set_vehicle_id(index.to_string());
            builder.set_depot_location_id(depot_location_id);
            builder.set_capacity(Amount::from_vec(vec![capacity]));
            builder.build()
        })
        .collect()
}

pub fn create_test_problem(
    locations: Vec<Location>,
    jobs: Vec<Job>,
    vehicles: Vec<Vehicle>,
) -> RoutingProblem {
    let mut builder = RoutingProblemBuilder::default();
    builder.set_locations(locations);
    builder.set_jobs(jobs);
    builder.set_vehicles(vehicles);
    builder.build()
}

pub struct TestRoute {
    pub vehicle_id: usize,
    pub job_ids: Vec<usize>,
}

/// Builds a solution with the given routes; vehicles without an entry get
/// an empty route. Panics if a route is infeasible, which is a test bug.
pub fn create_test_solution(problem: &RoutingProblem, routes: Vec<TestRoute>) -> Solution {
    let mut built: Vec<Route> = (0..problem.vehicles().len())
        .map(|vehicle| Route::empty(VehicleIdx::new(vehicle)))
        .collect();

    for route in routes {
        let jobs = route.job_ids.iter().map(|&job| job.into()).collect();
        built[route.vehicle_id] = Route::new(problem, route.vehicle_id.into(), jobs)
            .expect("test route must be time-window feasible");
    }

    Solution::from_routes(problem, built)
}
