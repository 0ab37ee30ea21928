use jiff::{SignedDuration, Timestamp};

use crate::define_index_newtype;

use super::{amount::Amount, location::LocationIdx, skill::SkillSet, time_window::TimeWindow};

define_index_newtype!(JobIdx, Job);

/// Single service task: one location, one service duration, pickup and
/// delivery amounts, and at least one service time window.
pub struct Job {
    external_id: String,
    location_id: LocationIdx,
    service_duration: SignedDuration,
    delivery: Amount,
    pickup: Amount,
    // Componentwise max of delivery and pickup, precomputed at build time.
    demand: Amount,
    time_windows: Vec<TimeWindow>,
    skills: SkillSet,
}

impl Job {
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn location_id(&self) -> LocationIdx {
        self.location_id
    }

    pub fn service_duration(&self) -> SignedDuration {
        self.service_duration
    }

    pub fn delivery(&self) -> &Amount {
        &self.delivery
    }

    pub fn pickup(&self) -> &Amount {
        &self.pickup
    }

    /// Capacity demand used throughout the engine.
    pub fn demand(&self) -> &Amount {
        &self.demand
    }

    pub fn time_windows(&self) -> &[TimeWindow] {
        &self.time_windows
    }

    pub fn skills(&self) -> &SkillSet {
        &self.skills
    }

    /// Earliest service start at or after `arrival` inside one of the
    /// job's time windows, or `None` when the arrival misses every window.
    pub fn earliest_start_after(&self, arrival: Timestamp) -> Option<Timestamp> {
        self.time_windows
            .iter()
            .find(|window| arrival <= window.end())
            .map(|window| arrival.max(window.start()))
    }

    /// Latest in-window service start not exceeding `bound`, or `None`
    /// when every window opens after `bound`.
    pub fn latest_start_before(&self, bound: Timestamp) -> Option<Timestamp> {
        self.time_windows
            .iter()
            .rev()
            .find(|window| window.start() <= bound)
            .map(|window| bound.min(window.end()))
    }
}

#[derive(Default)]
pub struct JobBuilder {
    external_id: Option<String>,
    location_id: Option<usize>,
    service_duration: Option<SignedDuration>,
    delivery: Option<Amount>,
    pickup: Option<Amount>,
    time_windows: Vec<TimeWindow>,
    skills: Option<SkillSet>,
}

impl JobBuilder {
    pub fn set_external_id(&mut self, external_id: String) -> &mut JobBuilder {
        self.external_id = Some(external_id);
        self
    }

    pub fn set_location_id(&mut self, location_id: usize) -> &mut JobBuilder {
        self.location_id = Some(location_id);
        self
    }

    pub fn set_service_duration(&mut self, service_duration: SignedDuration) -> &mut JobBuilder {
        self.service_duration = Some(service_duration);
        self
    }

    pub fn set_delivery(&mut self, delivery: Amount) -> &mut JobBuilder {
        self.delivery = Some(delivery);
        self
    }

    pub fn set_pickup(&mut self, pickup: Amount) -> &mut JobBuilder {
        self.pickup = Some(pickup);
        self
    }

    pub fn add_time_window(&mut self, time_window: TimeWindow) -> &mut JobBuilder {
        self.time_windows.push(time_window);
        self
    }

    pub fn set_skills(&mut self, skills: SkillSet) -> &mut JobBuilder {
        self.skills = Some(skills);
        self
    }

    pub fn build(self) -> Job {
        let delivery = self.delivery.unwrap_or_else(|| Amount::zero(0));
        let pickup = self.pickup.unwrap_or_else(|| Amount::zero(0));
        let demand = delivery.component_max(&pickup);

        let mut time_windows = self.time_windows;
        if time_windows.is_empty() {
            time_windows.push(TimeWindow::new(Timestamp::MIN, Timestamp::MAX));
        }
        assert!(
            time_windows
                .windows(2)
                .all(|pair| pair[0].end() < pair[1].start()),
            "job time windows must be sorted and disjoint"
        );

        Job {
            external_id: self.external_id.expect("External ID is required"),
            location_id: self.location_id.expect("Location ID is required").into(),
            service_duration: self.service_duration.unwrap_or(SignedDuration::ZERO),
            delivery,
            pickup,
            demand,
            time_windows,
            skills: self.skills.unwrap_or_else(|| SkillSet::empty(0)),
        }
    }
}
