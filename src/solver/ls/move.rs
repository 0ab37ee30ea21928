use crate::{
    problem::{matrix::Gain, routing_problem::RoutingProblem, vehicle::VehicleIdx},
    solver::{solution::Solution, state::SolutionState},
};

use super::{
    cross_exchange::CrossExchange, exchange::Exchange, or_opt::OrOpt, relocate::Relocate,
    reverse_two_opt_star::ReverseTwoOptStar, two_opt_star::TwoOptStar,
};

/// Closed set of neighborhood moves. The engine keeps the best move per
/// (source, target) route pair as one of these; dispatch is an explicit
/// `match` rather than a trait object so promoted moves stay plain values
/// holding ranks and a gain.
///
/// Every variant honors the same contract: `gain` is precomputed at
/// construction, `is_valid` checks capacity, time-window and skill
/// invariants on both touched routes, `apply` assumes the move was valid
/// and the routes unchanged since construction, and `addition_candidates`
/// names the routes worth trying for job reinsertion afterwards.
#[derive(Debug, Clone)]
pub enum Move {
    /// Swap two single jobs between routes.
    Exchange(Exchange),

    /// Swap two consecutive pairs between routes.
    CrossExchange(CrossExchange),

    /// Exchange route tails.
    TwoOptStar(TwoOptStar),

    /// Exchange reversed segments from opposite route ends.
    ReverseTwoOptStar(ReverseTwoOptStar),

    /// Move a single job to another route.
    Relocate(Relocate),

    /// Move a consecutive pair to another route.
    OrOpt(OrOpt),
}

impl Move {
    pub fn operator_name(&self) -> &'static str {
        match self {
            Move::Exchange(_) => "Exchange",
            Move::CrossExchange(_) => "Cross-Exchange",
            Move::TwoOptStar(_) => "2-Opt*",
            Move::ReverseTwoOptStar(_) => "Reverse 2-Opt*",
            Move::Relocate(_) => "Relocate",
            Move::OrOpt(_) => "Or-Opt",
        }
    }

    pub fn gain(&self) -> Gain {
        match self {
            Move::Exchange(op) => op.gain(),
            Move::CrossExchange(op) => op.gain(),
            Move::TwoOptStar(op) => op.gain(),
            Move::ReverseTwoOptStar(op) => op.gain(),
            Move::Relocate(op) => op.gain(),
            Move::OrOpt(op) => op.gain(),
        }
    }

    pub fn is_valid(
        &self,
        problem: &RoutingProblem,
        state: &SolutionState,
        solution: &Solution,
    ) -> bool {
        match self {
            Move::Exchange(op) => op.is_valid(problem, state, solution),
            Move::CrossExchange(op) => op.is_valid(problem, state, solution),
            Move::TwoOptStar(op) => op.is_valid(problem, state, solution),
            Move::ReverseTwoOptStar(op) => op.is_valid(problem, state, solution),
            Move::Relocate(op) => op.is_valid(problem, state, solution),
            Move::OrOpt(op) => op.is_valid(problem, state, solution),
        }
    }

    pub fn apply(&self, problem: &RoutingProblem, solution: &mut Solution) {
        match self {
            Move::Exchange(op) => op.apply(problem, solution),
            Move::CrossExchange(op) => op.apply(problem, solution),
            Move::TwoOptStar(op) => op.apply(problem, solution),
            Move::ReverseTwoOptStar(op) => op.apply(problem, solution),
            Move::Relocate(op) => op.apply(problem, solution),
            Move::OrOpt(op) => op.apply(problem, solution),
        }
    }

    pub fn addition_candidates(&self) -> Vec<VehicleIdx> {
        match self {
            Move::Exchange(op) => op.addition_candidates(),
            Move::CrossExchange(op) => op.addition_candidates(),
            Move::TwoOptStar(op) => op.addition_candidates(),
            Move::ReverseTwoOptStar(op) => op.addition_candidates(),
            Move::Relocate(op) => op.addition_candidates(),
            Move::OrOpt(op) => op.addition_candidates(),
        }
    }
}
