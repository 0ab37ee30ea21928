use std::{fs::File, io::BufWriter};

use serde::Serialize;
use thiserror::Error;

use crate::problem::{matrix::Cost, routing_problem::RoutingProblem};

use super::{solution::Solution, state::SolutionState};

/// A snapshot write never aborts the search; the engine reports failures
/// and keeps going.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to serialize solution: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write solution file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Serialize)]
struct RouteSnapshot<'a> {
    vehicle: &'a str,
    jobs: Vec<&'a str>,
    cost: Cost,
}

#[derive(Serialize)]
struct SolutionSnapshot<'a> {
    routes: Vec<RouteSnapshot<'a>>,
    unassigned: Vec<&'a str>,
    total_cost: Cost,
}

pub fn write_snapshot(
    path: &str,
    problem: &RoutingProblem,
    solution: &Solution,
    state: &SolutionState,
) -> Result<(), SnapshotError> {
    let routes = solution
        .routes()
        .iter()
        .map(|route| RouteSnapshot {
            vehicle: problem.vehicle(route.vehicle_id()).external_id(),
            jobs: route
                .jobs()
                .iter()
                .map(|&job| problem.job(job).external_id())
                .collect(),
            cost: state.route_costs[route.vehicle_id().get()],
        })
        .collect();

    let snapshot = SolutionSnapshot {
        routes,
        unassigned: state
            .unassigned
            .iter()
            .map(|&job| problem.job(job).external_id())
            .collect(),
        total_cost: state.route_costs.iter().sum(),
    };

    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), &snapshot)?;

    Ok(())
}
