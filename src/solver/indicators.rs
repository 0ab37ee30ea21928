use serde::Serialize;

use crate::problem::matrix::Cost;

/// Read-only quality snapshot of a solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SolutionIndicators {
    pub unassigned: usize,
    pub cost: Cost,
    pub used_vehicles: usize,
}
