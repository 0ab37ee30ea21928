use drover::problem::{
    amount::Amount,
    job::{Job, JobBuilder, JobIdx},
    location::Location,
    routing_problem::{RoutingProblem, RoutingProblemBuilder},
    skill::SkillSet,
    time_window::TimeWindow,
    vehicle::{Vehicle, VehicleBuilder, VehicleIdx},
};
use drover::solver::{
    ls::{local_search::LocalSearch, two_opt_star::TwoOptStar},
    params::LocalSearchParams,
    solution::{Solution, route::Route},
    state::SolutionState,
};
use jiff::SignedDuration;

fn locations(points: &[(f64, f64)]) -> Vec<Location> {
    points
        .iter()
        .map(|&(x, y)| Location::from_cartesian(x, y))
        .collect()
}

fn job(id: &str, location_id: usize, demand: i64) -> Job {
    let mut builder = JobBuilder::default();
    builder.set_external_id(String::from(id));
    builder.set_location_id(location_id);
    builder.set_delivery(Amount::from_vec(vec![demand]));
    builder.build()
}

fn vehicle(id: &str, depot_location_id: usize, capacity: i64) -> Vehicle {
    let mut builder = VehicleBuilder::default();
    builder.set_vehicle_id(String::from(id));
    builder.set_depot_location_id(depot_location_id);
    builder.set_capacity(Amount::from_vec(vec![capacity]));
    builder.build()
}

fn problem(locations: Vec<Location>, jobs: Vec<Job>, vehicles: Vec<Vehicle>) -> RoutingProblem {
    let mut builder = RoutingProblemBuilder::default();
    builder.set_locations(locations);
    builder.set_jobs(jobs);
    builder.set_vehicles(vehicles);
    builder.build()
}

fn solution_with(problem: &RoutingProblem, routes: &[(usize, &[usize])]) -> Solution {
    let mut built: Vec<Route> = (0..problem.vehicles().len())
        .map(|v| Route::empty(VehicleIdx::new(v)))
        .collect();

    for &(vehicle_id, jobs) in routes {
        let jobs = jobs.iter().map(|&j| j.into()).collect();
        built[vehicle_id] =
            Route::new(problem, vehicle_id.into(), jobs).expect("initial route must be feasible");
    }

    Solution::from_routes(problem, built)
}

fn sorted_jobs(solution: &Solution, vehicle_id: usize) -> Vec<usize> {
    let mut jobs: Vec<usize> = solution
        .route(vehicle_id.into())
        .jobs()
        .iter()
        .map(|job| job.get())
        .collect();
    jobs.sort_unstable();
    jobs
}

// Two vehicles on a line, each holding one job from the other's cluster.
// The engine must settle on the clustered assignment.
#[test]
fn test_swaps_misassigned_clusters() {
    let problem = problem(
        locations(&[
            (0.0, 0.0),  // depot A
            (10.0, 0.0), // depot B
            (1.0, 0.0),
            (2.0, 0.0),
            (8.0, 0.0),
            (9.0, 0.0),
        ]),
        vec![
            job("near_a_1", 2, 1),
            job("near_a_2", 3, 1),
            job("near_b_1", 4, 1),
            job("near_b_2", 5, 1),
        ],
        vec![vehicle("a", 0, 10), vehicle("b", 1, 10)],
    );

    let mut solution = solution_with(&problem, &[(0, &[0, 2]), (1, &[1, 3])]);
    let initial_cost = solution.total_cost(&problem);
    assert_eq!(initial_cost, 3200);

    let mut local_search = LocalSearch::new(&problem, &solution, LocalSearchParams::default());
    local_search.run(&mut solution);

    assert_eq!(sorted_jobs(&solution, 0), vec![0, 1]);
    assert_eq!(sorted_jobs(&solution, 1), vec![2, 3]);

    let indicators = local_search.indicators(&solution);
    assert_eq!(indicators.unassigned, 0);
    assert_eq!(indicators.cost, 800);
    assert_eq!(indicators.used_vehicles, 2);
    assert!(indicators.cost < initial_cost);
    assert_eq!(indicators.cost, solution.total_cost(&problem));
}

// A job whose time window is unreachable stays unassigned and the engine
// terminates without touching the cost.
#[test]
fn test_unreachable_job_stays_unassigned() {
    let unreachable = {
        let mut builder = JobBuilder::default();
        builder.set_external_id(String::from("unreachable"));
        builder.set_location_id(1);
        builder.set_delivery(Amount::from_vec(vec![1]));
        builder.add_time_window(TimeWindow::from_iso(
            "2025-06-01T06:00:00Z",
            "2025-06-01T06:30:00Z",
        ));
        builder.build()
    };

    let vehicle = {
        let mut builder = VehicleBuilder::default();
        builder.set_vehicle_id(String::from("only"));
        builder.set_depot_location_id(0);
        builder.set_capacity(Amount::from_vec(vec![10]));
        builder.set_availability(TimeWindow::from_iso(
            "2025-06-01T08:00:00Z",
            "2025-06-01T18:00:00Z",
        ));
        builder.build()
    };

    let problem = problem(
        locations(&[(0.0, 0.0), (10.0, 0.0)]),
        vec![unreachable],
        vec![vehicle],
    );

    let mut solution = Solution::new(&problem);
    let mut local_search = LocalSearch::new(&problem, &solution, LocalSearchParams::default());
    local_search.run(&mut solution);

    let indicators = local_search.indicators(&solution);
    assert_eq!(indicators.unassigned, 1);
    assert_eq!(indicators.cost, 0);
    assert_eq!(indicators.used_vehicles, 0);
    assert!(local_search.state().unassigned.contains(&JobIdx::new(0)));
}

// Two crossing routes where the uncrossing tail swap saves cost but breaks
// capacity on the source side. Nothing may be applied.
#[test]
fn test_tail_swap_blocked_by_capacity() {
    let problem = problem(
        locations(&[
            (0.0, 0.0),
            (1.0, 0.0), // j0, demand 4
            (1.0, 5.0), // j1, demand 3
            (2.0, 5.0), // j2, demand 3
            (2.0, 0.0), // j3, demand 4
        ]),
        vec![
            job("j0", 1, 4),
            job("j1", 2, 3),
            job("j2", 3, 3),
            job("j3", 4, 4),
        ],
        vec![vehicle("a", 0, 7), vehicle("b", 0, 7)],
    );

    let mut solution = solution_with(&problem, &[(0, &[0, 1]), (1, &[2, 3])]);
    let initial_cost = solution.total_cost(&problem);
    assert_eq!(initial_cost, 2349);

    let mut state = SolutionState::new(&problem);
    state.setup(&problem, &solution);

    // The uncrossing swap would save 800 but puts 8 units on a 7-unit
    // vehicle.
    let blocked = TwoOptStar::new(&problem, &state, &solution, 0.into(), 0, 1.into(), 0);
    assert_eq!(blocked.gain(), 800);
    assert!(!blocked.is_valid(&problem, &state, &solution));

    let mut local_search = LocalSearch::new(&problem, &solution, LocalSearchParams::default());
    local_search.run(&mut solution);

    assert_eq!(solution.route(0.into()).jobs(), &[0.into(), 1.into()]);
    assert_eq!(solution.route(1.into()).jobs(), &[2.into(), 3.into()]);
    assert_eq!(local_search.indicators(&solution).cost, initial_cost);
}

// Relocate strictly beats every other move, including the tail swap that
// can only append at the end of the target route.
#[test]
fn test_prefers_relocate_over_exchange() {
    let problem = problem(
        locations(&[
            (0.0, 0.0),  // depot A
            (12.0, 0.0), // depot B
            (1.0, 0.0),  // j0
            (6.0, 0.0),  // j1, misplaced on A
            (5.0, 0.0),  // j2
            (7.0, 0.0),  // j3
        ]),
        vec![job("j0", 2, 1), job("j1", 3, 1), job("j2", 4, 1), job("j3", 5, 1)],
        vec![vehicle("a", 0, 2), vehicle("b", 1, 3)],
    );

    let mut solution = solution_with(&problem, &[(0, &[0, 1]), (1, &[2, 3])]);
    let initial_cost = solution.total_cost(&problem);
    assert_eq!(initial_cost, 2600);

    let mut local_search = LocalSearch::new(&problem, &solution, LocalSearchParams::default());
    local_search.run(&mut solution);

    // j1 was relocated into B's route; an exchange would have left four
    // stops split two and two.
    assert_eq!(sorted_jobs(&solution, 0), vec![0]);
    assert_eq!(sorted_jobs(&solution, 1), vec![1, 2, 3]);

    let indicators = local_search.indicators(&solution);
    assert_eq!(indicators.cost, 1600);
    assert_eq!(indicators.unassigned, 0);
}

// An unassigned job that only fits the skill-equipped vehicle gets picked
// up by reinsertion as soon as a move touches that vehicle's route.
#[test]
fn test_reinserts_skill_restricted_job() {
    let restricted = {
        let mut builder = JobBuilder::default();
        builder.set_external_id(String::from("restricted"));
        builder.set_location_id(4);
        builder.set_delivery(Amount::from_vec(vec![1]));
        builder.set_skills(SkillSet::from_indices(1, &[0]));
        builder.build()
    };

    let equipped = {
        let mut builder = VehicleBuilder::default();
        builder.set_vehicle_id(String::from("equipped"));
        builder.set_depot_location_id(1);
        builder.set_capacity(Amount::from_vec(vec![10]));
        builder.set_skills(SkillSet::from_indices(1, &[0]));
        builder.build()
    };

    let problem = problem(
        locations(&[
            (0.0, 0.0),  // depot of the plain vehicles
            (10.0, 0.0), // depot of the equipped vehicle
            (1.0, 0.0),  // j0
            (9.0, 0.0),  // j1, near the equipped depot
            (10.0, 1.0), // restricted job
        ]),
        vec![job("j0", 2, 1), job("j1", 3, 1), restricted],
        vec![vehicle("a", 0, 10), vehicle("b", 0, 10), equipped],
    );

    let mut solution = solution_with(&problem, &[(0, &[0, 1])]);

    let mut local_search = LocalSearch::new(&problem, &solution, LocalSearchParams::default());
    assert!(local_search.state().unassigned.contains(&JobIdx::new(2)));

    local_search.run(&mut solution);

    // Relocating j1 onto the equipped vehicle makes that route an addition
    // candidate, and the restricted job rides along.
    let indicators = local_search.indicators(&solution);
    assert_eq!(indicators.unassigned, 0);
    assert_eq!(indicators.used_vehicles, 2);
    assert_eq!(solution.route(2.into()).jobs(), &[2.into(), 1.into()]);
    assert_eq!(indicators.cost, 541);
}

// After the accepted move, the reverse-orientation rebuild of the touched
// route is cheaper than both the move result and the forward rebuild.
#[test]
fn test_straightener_improves_touched_route() {
    let make_job = |id: &str, location: usize, start: &str, end: &str, service_mins: i64| {
        let mut builder = JobBuilder::default();
        builder.set_external_id(String::from(id));
        builder.set_location_id(location);
        builder.set_delivery(Amount::from_vec(vec![1]));
        builder.set_service_duration(SignedDuration::from_mins(service_mins));
        builder.add_time_window(TimeWindow::from_iso(start, end));
        builder.build()
    };

    let make_vehicle = |id: &str, capacity: i64| {
        let mut builder = VehicleBuilder::default();
        builder.set_vehicle_id(String::from(id));
        builder.set_depot_location_id(0);
        builder.set_capacity(Amount::from_vec(vec![capacity]));
        builder.set_availability(TimeWindow::from_iso(
            "2025-06-01T08:00:00Z",
            "2025-06-01T18:00:00Z",
        ));
        builder.build()
    };

    let problem = problem(
        locations(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (2.0, 0.0)]),
        vec![
            make_job("o1", 1, "2025-06-01T08:00:00Z", "2025-06-01T08:20:00Z", 5),
            make_job("o2", 2, "2025-06-01T08:05:00Z", "2025-06-01T09:00:00Z", 5),
            make_job("o3", 3, "2025-06-01T08:20:30Z", "2025-06-01T08:21:00Z", 0),
        ],
        vec![make_vehicle("v", 3), make_vehicle("w", 2)],
    );

    let mut solution = solution_with(&problem, &[(0, &[1, 2]), (1, &[0])]);
    assert_eq!(solution.total_cost(&problem), 682);

    let mut local_search = LocalSearch::new(&problem, &solution, LocalSearchParams::default());
    local_search.run(&mut solution);

    // The relocate alone would leave [o1, o2, o3] at cost 541; the
    // straightener's reverse rebuild reorders it to [o1, o3, o2].
    assert_eq!(
        solution.route(0.into()).jobs(),
        &[0.into(), 2.into(), 1.into()]
    );
    assert!(solution.route(1.into()).is_empty());

    let indicators = local_search.indicators(&solution);
    assert_eq!(indicators.cost, 482);
    assert_eq!(indicators.used_vehicles, 1);
    assert!(indicators.cost < 541);
}

// Invariants over a larger run: job conservation, capacity prefixes,
// time-window feasibility, cost monotonicity and cache coherence.
#[test]
fn test_run_preserves_invariants() {
    let problem = problem(
        locations(&[
            (0.0, 0.0),
            (1.0, 0.0),
            (2.0, 0.0),
            (3.0, 0.0),
            (1.0, 1.0),
            (2.0, 1.0),
            (3.0, 1.0),
            (1.0, 2.0),
            (2.0, 2.0),
            (3.0, 2.0),
            (0.0, 3.0),
        ]),
        (1..=10).map(|i| job(&format!("job_{i}"), i, 1)).collect(),
        vec![
            vehicle("v0", 0, 5),
            vehicle("v1", 0, 5),
            vehicle("v2", 0, 5),
        ],
    );

    let mut solution = solution_with(
        &problem,
        &[(0, &[0, 4, 8]), (1, &[1, 5, 9]), (2, &[2, 3, 6, 7])],
    );
    let initial_cost = solution.total_cost(&problem);

    let mut local_search = LocalSearch::new(&problem, &solution, LocalSearchParams::default());
    local_search.run(&mut solution);

    // Conservation: every job exactly once across routes and unassigned.
    let mut seen: Vec<usize> = solution
        .routes()
        .iter()
        .flat_map(|route| route.jobs().iter().map(|job| job.get()))
        .chain(local_search.state().unassigned.iter().map(|job| job.get()))
        .collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..10).collect::<Vec<_>>());

    for route in solution.routes() {
        // Capacity holds at every prefix.
        let capacity = route.vehicle(&problem).capacity();
        let mut prefix = Amount::zero(problem.amount_dimensions());
        for &job_id in route.jobs() {
            prefix += problem.job(job_id).demand();
            assert!(prefix.fits_within(capacity));
        }

        // Every final sequence still admits a feasible schedule.
        assert!(
            Route::new(&problem, route.vehicle_id(), route.jobs().to_vec()).is_some(),
            "route of vehicle {} lost feasibility",
            route.vehicle_id()
        );
    }

    // Cost never increased, and the cached total matches a recomputation.
    let indicators = local_search.indicators(&solution);
    assert!(indicators.cost <= initial_cost);
    assert_eq!(indicators.cost, solution.total_cost(&problem));

    // Cache coherence: a from-scratch state equals the maintained one.
    let mut fresh = SolutionState::new(&problem);
    fresh.setup(&problem, &solution);
    assert_eq!(fresh.route_costs, local_search.state().route_costs);
    assert_eq!(fresh.fwd_amounts, local_search.state().fwd_amounts);
    assert_eq!(fresh.bwd_amounts, local_search.state().bwd_amounts);
    assert_eq!(fresh.node_gains, local_search.state().node_gains);
    assert_eq!(fresh.edge_gains, local_search.state().edge_gains);
    assert_eq!(fresh.route_skills, local_search.state().route_skills);
    assert_eq!(fresh.unassigned, local_search.state().unassigned);
}
