use std::sync::Arc;

use jiff::SignedDuration;

use super::location::{Location, LocationIdx};

pub type Cost = i64;
pub type Gain = i64;

/// Cost multiplier applied when deriving a matrix from planar coordinates,
/// so that short hops stay distinguishable after rounding to integer travel
/// units.
pub const COST_SCALE: f64 = 100.0;

/// Flat row-major travel matrix. The index for a pair of locations is
/// `from * num_locations + to`. Costs are integer travel units; durations
/// are seconds.
pub struct Matrix {
    costs: Arc<Vec<Cost>>,
    durations: Arc<Vec<i64>>,
    num_locations: usize,
}

impl Matrix {
    pub fn new(costs: Vec<Vec<Cost>>) -> Self {
        let num_locations = costs.len();
        assert!(
            costs.iter().all(|row| row.len() == num_locations),
            "travel matrix must be square"
        );

        let costs = Arc::new(costs.into_iter().flatten().collect::<Vec<_>>());
        let durations = Arc::clone(&costs);

        Matrix {
            costs,
            durations,
            num_locations,
        }
    }

    pub fn with_durations(costs: Vec<Vec<Cost>>, durations: Vec<Vec<i64>>) -> Self {
        let num_locations = costs.len();
        assert_eq!(durations.len(), num_locations);
        assert!(
            costs.iter().all(|row| row.len() == num_locations)
                && durations.iter().all(|row| row.len() == num_locations),
            "travel matrix must be square"
        );

        Matrix {
            costs: Arc::new(costs.into_iter().flatten().collect()),
            durations: Arc::new(durations.into_iter().flatten().collect()),
            num_locations,
        }
    }

    pub fn from_euclidean(locations: &[Location]) -> Self {
        let num_locations = locations.len();
        let mut costs: Vec<Cost> = vec![0; num_locations * num_locations];

        for (i, from) in locations.iter().enumerate() {
            for (j, to) in locations.iter().enumerate() {
                costs[i * num_locations + j] =
                    (from.euclidean_distance(to) * COST_SCALE).round() as Cost;
            }
        }

        let costs = Arc::new(costs);
        let durations = Arc::clone(&costs);

        Matrix {
            costs,
            durations,
            num_locations,
        }
    }

    pub fn from_constant(num_locations: usize, cost: Cost) -> Self {
        let costs = Arc::new(vec![cost; num_locations * num_locations]);
        let durations = Arc::clone(&costs);
        Matrix {
            costs,
            durations,
            num_locations,
        }
    }

    #[inline(always)]
    fn get_index(&self, from: LocationIdx, to: LocationIdx) -> usize {
        from.get() * self.num_locations + to.get()
    }

    #[inline(always)]
    pub fn cost(&self, from: LocationIdx, to: LocationIdx) -> Cost {
        if from == to {
            return 0;
        }

        self.costs[self.get_index(from, to)]
    }

    #[inline(always)]
    pub fn duration(&self, from: LocationIdx, to: LocationIdx) -> SignedDuration {
        if from == to {
            return SignedDuration::ZERO;
        }

        SignedDuration::from_secs(self.durations[self.get_index(from, to)])
    }

    pub fn num_locations(&self) -> usize {
        self.num_locations
    }
}
