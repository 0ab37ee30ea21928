use geo::{Distance, Euclidean};

use crate::define_index_newtype;

define_index_newtype!(LocationIdx, Location);

/// Planar point backing matrix construction in tests and builders. The
/// engine itself only ever sees matrix indices.
pub struct Location {
    point: geo::Point,
}

impl Location {
    pub fn from_cartesian(x: f64, y: f64) -> Self {
        Self {
            point: geo::Point::new(x, y),
        }
    }

    pub fn x(&self) -> f64 {
        self.point.x()
    }

    pub fn y(&self) -> f64 {
        self.point.y()
    }

    pub fn euclidean_distance(&self, to: &Location) -> f64 {
        Euclidean.distance(self.point, to.point)
    }
}
