use jiff::SignedDuration;

use super::{
    amount::Amount,
    job::{Job, JobIdx},
    location::{Location, LocationIdx},
    matrix::{Cost, Matrix},
    vehicle::{Vehicle, VehicleIdx},
};

/// Immutable problem definition handed to the engine: jobs, vehicles and
/// the travel matrix, plus the per-job demand lower bounds the driver uses
/// to skip vehicles that are already full.
pub struct RoutingProblem {
    jobs: Vec<Job>,
    vehicles: Vec<Vehicle>,
    matrix: Matrix,
    amount_dimensions: usize,
    // Componentwise minimum of job demands, and its doubling, used as
    // insertion lower bounds by the Relocate / Or-Opt candidate filters.
    amount_lower_bound: Amount,
    double_amount_lower_bound: Amount,
}

impl RoutingProblem {
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn job(&self, job_id: JobIdx) -> &Job {
        &self.jobs[job_id]
    }

    pub fn vehicle(&self, vehicle_id: VehicleIdx) -> &Vehicle {
        &self.vehicles[vehicle_id]
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    pub fn amount_dimensions(&self) -> usize {
        self.amount_dimensions
    }

    pub fn amount_lower_bound(&self) -> &Amount {
        &self.amount_lower_bound
    }

    pub fn double_amount_lower_bound(&self) -> &Amount {
        &self.double_amount_lower_bound
    }

    /// Skill compatibility between a vehicle and a job.
    pub fn vehicle_ok_with_job(&self, vehicle_id: VehicleIdx, job_id: JobIdx) -> bool {
        self.vehicle(vehicle_id)
            .skills()
            .covers(self.job(job_id).skills())
    }

    #[inline]
    pub fn travel_cost(&self, from: LocationIdx, to: LocationIdx) -> Cost {
        self.matrix.cost(from, to)
    }

    /// Travel cost where either endpoint may be absent (open route ends).
    #[inline]
    pub fn travel_cost_or_zero(&self, from: Option<LocationIdx>, to: Option<LocationIdx>) -> Cost {
        match (from, to) {
            (Some(from), Some(to)) => self.matrix.cost(from, to),
            _ => 0,
        }
    }

    #[inline]
    pub fn travel_duration(&self, from: LocationIdx, to: LocationIdx) -> SignedDuration {
        self.matrix.duration(from, to)
    }

    #[inline]
    pub fn travel_duration_or_zero(
        &self,
        from: Option<LocationIdx>,
        to: Option<LocationIdx>,
    ) -> SignedDuration {
        match (from, to) {
            (Some(from), Some(to)) => self.matrix.duration(from, to),
            _ => SignedDuration::ZERO,
        }
    }
}

#[derive(Default)]
pub struct RoutingProblemBuilder {
    jobs: Vec<Job>,
    vehicles: Vec<Vehicle>,
    locations: Vec<Location>,
    matrix: Option<Matrix>,
}

impl RoutingProblemBuilder {
    pub fn set_jobs(&mut self, jobs: Vec<Job>) -> &mut RoutingProblemBuilder {
        self.jobs = jobs;
        self
    }

    pub fn set_vehicles(&mut self, vehicles: Vec<Vehicle>) -> &mut RoutingProblemBuilder {
        self.vehicles = vehicles;
        self
    }

    /// When no explicit matrix is set, a Euclidean matrix is derived from
    /// these locations.
    pub fn set_locations(&mut self, locations: Vec<Location>) -> &mut RoutingProblemBuilder {
        self.locations = locations;
        self
    }

    pub fn set_matrix(&mut self, matrix: Matrix) -> &mut RoutingProblemBuilder {
        self.matrix = Some(matrix);
        self
    }

    pub fn build(self) -> RoutingProblem {
        let matrix = self
            .matrix
            .unwrap_or_else(|| Matrix::from_euclidean(&self.locations));

        let referenced = self
            .jobs
            .iter()
            .map(|job| job.location_id())
            .chain(self.vehicles.iter().flat_map(|vehicle| {
                vehicle
                    .start_location_id()
                    .into_iter()
                    .chain(vehicle.end_location_id())
            }))
            .max()
            .map(|location| location.get() + 1)
            .unwrap_or(0);
        assert!(
            referenced <= matrix.num_locations(),
            "location index out of matrix bounds"
        );

        let amount_dimensions = self
            .vehicles
            .iter()
            .map(|vehicle| vehicle.capacity().len())
            .chain(self.jobs.iter().map(|job| job.demand().len()))
            .max()
            .unwrap_or(0);

        let amount_lower_bound = self
            .jobs
            .iter()
            .map(|job| job.demand())
            .fold(None::<Amount>, |lower_bound, demand| match lower_bound {
                None => Some(demand.clone()),
                Some(current) => Some(Amount::from_vec(
                    (0..amount_dimensions)
                        .map(|i| current.get(i).min(demand.get(i)))
                        .collect(),
                )),
            })
            .unwrap_or_else(|| Amount::zero(amount_dimensions));

        let double_amount_lower_bound = &amount_lower_bound + &amount_lower_bound;

        RoutingProblem {
            jobs: self.jobs,
            vehicles: self.vehicles,
            matrix,
            amount_dimensions,
            amount_lower_bound,
            double_amount_lower_bound,
        }
    }
}
