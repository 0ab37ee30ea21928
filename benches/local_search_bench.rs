use criterion::{Criterion, criterion_group, criterion_main};

use drover::problem::{
    amount::Amount,
    job::JobBuilder,
    location::Location,
    routing_problem::{RoutingProblem, RoutingProblemBuilder},
    vehicle::{VehicleBuilder, VehicleIdx},
};
use drover::solver::{
    ls::local_search::LocalSearch,
    params::LocalSearchParams,
    solution::{Solution, route::Route},
};

fn grid_problem(rows: usize, cols: usize, vehicles: usize) -> RoutingProblem {
    let mut locations = vec![Location::from_cartesian(0.0, 0.0)];
    for y in 0..rows {
        for x in 0..cols {
            locations.push(Location::from_cartesian(x as f64 + 1.0, y as f64));
        }
    }

    let jobs = (0..rows * cols)
        .map(|index| {
            let mut builder = JobBuilder::default();
            builder.set_external_id(index.to_string());
            builder.set_location_id(index + 1);
            builder.set_delivery(Amount::from_vec(vec![1]));
            builder.build()
        })
        .collect();

    let vehicles = (0..vehicles)
        .map(|index| {
            let mut builder = VehicleBuilder::default();
            builder.set_vehicle_id(index.to_string());
            builder.set_depot_location_id(0);
            builder.set_capacity(Amount::from_vec(vec![(rows * cols) as i64]));
            builder.build()
        })
        .collect();

    let mut builder = RoutingProblemBuilder::default();
    builder.set_locations(locations);
    builder.set_jobs(jobs);
    builder.set_vehicles(vehicles);
    builder.build()
}

fn round_robin_solution(problem: &RoutingProblem) -> Solution {
    let vehicle_count = problem.vehicles().len();
    let mut assignments: Vec<Vec<_>> = vec![Vec::new(); vehicle_count];
    for job in 0..problem.jobs().len() {
        assignments[job % vehicle_count].push(job.into());
    }

    let routes = assignments
        .into_iter()
        .enumerate()
        .map(|(vehicle, jobs)| {
            Route::new(problem, VehicleIdx::new(vehicle), jobs).expect("feasible")
        })
        .collect();

    Solution::from_routes(problem, routes)
}

fn bench_local_search(c: &mut Criterion) {
    let problem = grid_problem(5, 8, 4);

    c.bench_function("local_search_grid_40_jobs", |b| {
        b.iter(|| {
            let mut solution = round_robin_solution(&problem);
            let mut local_search =
                LocalSearch::new(&problem, &solution, LocalSearchParams::default());
            local_search.run(&mut solution);
            local_search.indicators(&solution)
        })
    });
}

criterion_group!(benches, bench_local_search);
criterion_main!(benches);
