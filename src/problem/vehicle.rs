use jiff::Timestamp;

use crate::define_index_newtype;

use super::{
    amount::Amount, location::LocationIdx, matrix::Cost, skill::SkillSet, time_window::TimeWindow,
};

define_index_newtype!(VehicleIdx, Vehicle);

/// A vehicle and its shift. Start and end locations are both optional:
/// open-ended routes simply begin at the first job or end at the last one.
pub struct Vehicle {
    external_id: String,
    start_location_id: Option<LocationIdx>,
    end_location_id: Option<LocationIdx>,
    capacity: Amount,
    availability: Option<TimeWindow>,
    skills: SkillSet,
    fixed_cost: Cost,
}

impl Vehicle {
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn start_location_id(&self) -> Option<LocationIdx> {
        self.start_location_id
    }

    pub fn end_location_id(&self) -> Option<LocationIdx> {
        self.end_location_id
    }

    pub fn capacity(&self) -> &Amount {
        &self.capacity
    }

    pub fn availability(&self) -> Option<&TimeWindow> {
        self.availability.as_ref()
    }

    pub fn skills(&self) -> &SkillSet {
        &self.skills
    }

    /// Contributes to the route cost exactly when the route is non-empty.
    pub fn fixed_cost(&self) -> Cost {
        self.fixed_cost
    }

    /// Earliest time the vehicle may leave its start location.
    pub fn earliest_departure(&self) -> Timestamp {
        self.availability
            .as_ref()
            .map(|window| window.start())
            .unwrap_or(Timestamp::MIN)
    }

    /// Latest time the vehicle may finish its shift.
    pub fn latest_arrival(&self) -> Timestamp {
        self.availability
            .as_ref()
            .map(|window| window.end())
            .unwrap_or(Timestamp::MAX)
    }
}

#[derive(Default)]
pub struct VehicleBuilder {
    external_id: Option<String>,
    start_location_id: Option<usize>,
    end_location_id: Option<usize>,
    capacity: Option<Amount>,
    availability: Option<TimeWindow>,
    skills: Option<SkillSet>,
    fixed_cost: Option<Cost>,
}

impl VehicleBuilder {
    pub fn set_vehicle_id(&mut self, external_id: String) -> &mut VehicleBuilder {
        self.external_id = Some(external_id);
        self
    }

    pub fn set_start_location_id(&mut self, start_location_id: usize) -> &mut VehicleBuilder {
        self.start_location_id = Some(start_location_id);
        self
    }

    pub fn set_end_location_id(&mut self, end_location_id: usize) -> &mut VehicleBuilder {
        self.end_location_id = Some(end_location_id);
        self
    }

    /// Round trip from and back to a single depot.
    pub fn set_depot_location_id(&mut self, depot_location_id: usize) -> &mut VehicleBuilder {
        self.start_location_id = Some(depot_location_id);
        self.end_location_id = Some(depot_location_id);
        self
    }

    pub fn set_capacity(&mut self, capacity: Amount) -> &mut VehicleBuilder {
        self.capacity = Some(capacity);
        self
    }

    pub fn set_availability(&mut self, availability: TimeWindow) -> &mut VehicleBuilder {
        self.availability = Some(availability);
        self
    }

    pub fn set_skills(&mut self, skills: SkillSet) -> &mut VehicleBuilder {
        self.skills = Some(skills);
        self
    }

    pub fn set_fixed_cost(&mut self, fixed_cost: Cost) -> &mut VehicleBuilder {
        self.fixed_cost = Some(fixed_cost);
        self
    }

    pub fn build(self) -> Vehicle {
        Vehicle {
            external_id: self.external_id.expect("External ID is required"),
            start_location_id: self.start_location_id.map(|id| id.into()),
            end_location_id: self.end_location_id.map(|id| id.into()),
            capacity: self.capacity.unwrap_or_else(|| Amount::zero(0)),
            availability: self.availability,
            skills: self.skills.unwrap_or_else(|| SkillSet::empty(0)),
            fixed_cost: self.fixed_cost.unwrap_or(0),
        }
    }
}
