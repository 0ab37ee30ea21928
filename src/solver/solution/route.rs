use jiff::{SignedDuration, Timestamp};

use crate::problem::{
    job::JobIdx,
    location::LocationIdx,
    matrix::Cost,
    routing_problem::RoutingProblem,
    vehicle::{Vehicle, VehicleIdx},
};

/// Job sequence served by one vehicle, together with the cached
/// earliest/latest service-start arrays that make time-window feasibility
/// queries O(1 + edit size).
///
/// `earliest[r]` is the earliest in-window service start reachable at rank
/// `r` when every predecessor also starts as early as possible; `latest[r]`
/// is the latest in-window start that keeps every successor (and the return
/// to the vehicle's end location) feasible. A sequence is feasible iff
/// `earliest[r] <= latest[r]` at every rank, which both passes verify while
/// rebuilding.
#[derive(Clone)]
pub struct Route {
    vehicle_id: VehicleIdx,
    jobs: Vec<JobIdx>,
    earliest: Vec<Timestamp>,
    latest: Vec<Timestamp>,
}

impl Route {
    pub fn empty(vehicle_id: VehicleIdx) -> Self {
        Route {
            vehicle_id,
            jobs: Vec::new(),
            earliest: Vec::new(),
            latest: Vec::new(),
        }
    }

    /// Builds a route over `jobs`, or `None` when the sequence admits no
    /// feasible schedule.
    pub fn new(problem: &RoutingProblem, vehicle_id: VehicleIdx, jobs: Vec<JobIdx>) -> Option<Self> {
        let mut route = Route {
            vehicle_id,
            jobs,
            earliest: Vec::new(),
            latest: Vec::new(),
        };

        if route.update_schedule(problem) {
            Some(route)
        } else {
            None
        }
    }

    pub fn vehicle_id(&self) -> VehicleIdx {
        self.vehicle_id
    }

    pub fn vehicle<'a>(&self, problem: &'a RoutingProblem) -> &'a Vehicle {
        problem.vehicle(self.vehicle_id)
    }

    pub fn jobs(&self) -> &[JobIdx] {
        &self.jobs
    }

    pub fn job_at(&self, rank: usize) -> JobIdx {
        self.jobs[rank]
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn earliest(&self, rank: usize) -> Timestamp {
        self.earliest[rank]
    }

    pub fn latest(&self, rank: usize) -> Timestamp {
        self.latest[rank]
    }

    /// Jobs in `[start, end)`, cloneable so operators can hand the same
    /// segment to several feasibility checks.
    pub fn jobs_iter(
        &self,
        start: usize,
        end: usize,
    ) -> impl DoubleEndedIterator<Item = JobIdx> + Clone + '_ {
        self.jobs[start..end].iter().copied()
    }

    pub fn location_at(&self, problem: &RoutingProblem, rank: usize) -> LocationIdx {
        problem.job(self.jobs[rank]).location_id()
    }

    /// Location visited before the job at `rank` (the vehicle start for
    /// rank 0, `None` for an open start).
    pub fn previous_location(&self, problem: &RoutingProblem, rank: usize) -> Option<LocationIdx> {
        if rank == 0 {
            self.vehicle(problem).start_location_id()
        } else {
            Some(self.location_at(problem, rank - 1))
        }
    }

    /// Location visited after the job at `rank` (the vehicle end for the
    /// last rank, `None` for an open end).
    pub fn next_location(&self, problem: &RoutingProblem, rank: usize) -> Option<LocationIdx> {
        if rank + 1 < self.jobs.len() {
            Some(self.location_at(problem, rank + 1))
        } else {
            self.vehicle(problem).end_location_id()
        }
    }

    /// Location preceding an insertion at `rank` (rank may equal `len`).
    pub fn location_before_insertion(
        &self,
        problem: &RoutingProblem,
        rank: usize,
    ) -> Option<LocationIdx> {
        if rank == 0 {
            self.vehicle(problem).start_location_id()
        } else {
            Some(self.location_at(problem, rank - 1))
        }
    }

    /// Location following an insertion at `rank`.
    pub fn location_after_insertion(
        &self,
        problem: &RoutingProblem,
        rank: usize,
    ) -> Option<LocationIdx> {
        if rank < self.jobs.len() {
            Some(self.location_at(problem, rank))
        } else {
            self.vehicle(problem).end_location_id()
        }
    }

    /// True iff inserting `job` at `rank` leaves a feasible schedule.
    pub fn is_valid_addition_for_tw(
        &self,
        problem: &RoutingProblem,
        job: JobIdx,
        rank: usize,
    ) -> bool {
        self.is_valid_replacement(problem, std::iter::once(job), rank, rank)
    }

    /// True iff removing `count` jobs starting at `rank` leaves a feasible
    /// schedule. Removals only move arrivals earlier, but the check stays
    /// generic so callers need not reason about that.
    pub fn is_valid_removal(&self, problem: &RoutingProblem, rank: usize, count: usize) -> bool {
        self.is_valid_replacement(problem, std::iter::empty(), rank, rank + count)
    }

    /// True iff replacing ranks `[start, end)` with `jobs` leaves a
    /// feasible schedule. Runs in O(|jobs| + 1): the replaced span is
    /// simulated forward from the frozen prefix, then the first surviving
    /// successor is checked against its cached latest start.
    pub fn is_valid_replacement<I>(
        &self,
        problem: &RoutingProblem,
        jobs: I,
        start: usize,
        end: usize,
    ) -> bool
    where
        I: Iterator<Item = JobIdx>,
    {
        debug_assert!(start <= end && end <= self.jobs.len());

        let vehicle = self.vehicle(problem);
        let (mut prev_location, mut departure) = self.departure_before(problem, start);

        for job_id in jobs {
            let job = problem.job(job_id);
            let arrival = match prev_location {
                Some(previous) => {
                    departure + problem.travel_duration(previous, job.location_id())
                }
                None => departure,
            };

            let Some(service_start) = job.earliest_start_after(arrival) else {
                return false;
            };

            departure = service_start + job.service_duration();
            prev_location = Some(job.location_id());
        }

        if end < self.jobs.len() {
            let next = problem.job(self.jobs[end]);
            let arrival = match prev_location {
                Some(previous) => departure + problem.travel_duration(previous, next.location_id()),
                None => departure,
            };

            match next.earliest_start_after(arrival) {
                Some(service_start) => service_start <= self.latest[end],
                None => false,
            }
        } else {
            let arrival = match (prev_location, vehicle.end_location_id()) {
                (Some(previous), Some(end_location)) => {
                    departure + problem.travel_duration(previous, end_location)
                }
                _ => departure,
            };

            arrival <= vehicle.latest_arrival()
        }
    }

    /// Precondition: the matching validity predicate returned true and the
    /// route has not been edited since.
    pub fn add(&mut self, problem: &RoutingProblem, job: JobIdx, rank: usize) {
        self.jobs.insert(rank, job);
        self.rebuild(problem);
    }

    pub fn remove(&mut self, problem: &RoutingProblem, rank: usize, count: usize) {
        self.jobs.drain(rank..rank + count);
        self.rebuild(problem);
    }

    pub fn replace<I>(&mut self, problem: &RoutingProblem, jobs: I, start: usize, end: usize)
    where
        I: IntoIterator<Item = JobIdx>,
    {
        self.jobs.splice(start..end, jobs);
        self.rebuild(problem);
    }

    /// Travel cost of the route in matrix units, plus the vehicle's fixed
    /// cost when the route is non-empty.
    pub fn cost(&self, problem: &RoutingProblem) -> Cost {
        if self.jobs.is_empty() {
            return 0;
        }

        let vehicle = self.vehicle(problem);
        let mut cost = vehicle.fixed_cost();

        if let Some(start) = vehicle.start_location_id() {
            cost += problem.travel_cost(start, self.location_at(problem, 0));
        }

        for pair in self.jobs.windows(2) {
            cost += problem.travel_cost(
                problem.job(pair[0]).location_id(),
                problem.job(pair[1]).location_id(),
            );
        }

        if let Some(end) = vehicle.end_location_id() {
            cost += problem.travel_cost(self.location_at(problem, self.jobs.len() - 1), end);
        }

        cost
    }

    fn departure_before(
        &self,
        problem: &RoutingProblem,
        rank: usize,
    ) -> (Option<LocationIdx>, Timestamp) {
        let vehicle = self.vehicle(problem);

        if rank == 0 {
            (vehicle.start_location_id(), vehicle.earliest_departure())
        } else {
            let prev_job = problem.job(self.jobs[rank - 1]);
            (
                Some(prev_job.location_id()),
                self.earliest[rank - 1] + prev_job.service_duration(),
            )
        }
    }

    fn rebuild(&mut self, problem: &RoutingProblem) {
        let feasible = self.update_schedule(problem);
        assert!(
            feasible,
            "route for vehicle {} lost time-window feasibility after an edit",
            self.vehicle(problem).external_id()
        );
    }

    /// Full O(L) rebuild of the earliest/latest arrays. Returns false when
    /// the current sequence admits no feasible schedule.
    fn update_schedule(&mut self, problem: &RoutingProblem) -> bool {
        let n = self.jobs.len();
        let vehicle = problem.vehicle(self.vehicle_id);

        self.earliest.clear();
        self.latest.clear();
        self.latest.resize(n, Timestamp::MAX);

        let mut prev_location = vehicle.start_location_id();
        let mut departure = vehicle.earliest_departure();

        for i in 0..n {
            let job = problem.job(self.jobs[i]);
            let arrival = match prev_location {
                Some(previous) => departure + problem.travel_duration(previous, job.location_id()),
                None => departure,
            };

            let Some(service_start) = job.earliest_start_after(arrival) else {
                return false;
            };

            self.earliest.push(service_start);
            departure = service_start + job.service_duration();
            prev_location = Some(job.location_id());
        }

        if n > 0 {
            let last = problem.job(self.jobs[n - 1]);
            let arrival_back = match vehicle.end_location_id() {
                Some(end) => departure + problem.travel_duration(last.location_id(), end),
                None => departure,
            };

            if arrival_back > vehicle.latest_arrival() {
                return false;
            }
        }

        for i in (0..n).rev() {
            let job = problem.job(self.jobs[i]);

            let limit = if i == n - 1 {
                let back = match vehicle.end_location_id() {
                    Some(end) => problem.travel_duration(job.location_id(), end),
                    None => SignedDuration::ZERO,
                };
                vehicle.latest_arrival() - back - job.service_duration()
            } else {
                let next = problem.job(self.jobs[i + 1]);
                self.latest[i + 1]
                    - problem.travel_duration(job.location_id(), next.location_id())
                    - job.service_duration()
            };

            let Some(latest_start) = job.latest_start_before(limit) else {
                return false;
            };

            if latest_start < self.earliest[i] {
                return false;
            }

            self.latest[i] = latest_start;
        }

        true
    }
}
