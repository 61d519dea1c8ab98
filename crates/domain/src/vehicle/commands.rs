//! Vehicle commands.

use catalog::ServiceId;
use common::{AggregateId, Money};

use crate::command::Command;

use super::Vehicle;

/// Check a vehicle in to the workshop. Fields are raw form input.
#[derive(Debug, Clone)]
pub struct RegisterVehicle {
    pub vehicle_id: AggregateId,
    pub vin: String,
    pub model: String,
    pub year: String,
}

impl RegisterVehicle {
    /// Creates the command with a freshly generated vehicle id.
    pub fn new(vin: impl Into<String>, model: impl Into<String>, year: impl Into<String>) -> Self {
        Self {
            vehicle_id: AggregateId::new(),
            vin: vin.into(),
            model: model.into(),
            year: year.into(),
        }
    }
}

impl Command for RegisterVehicle {
    type Aggregate = Vehicle;

    fn aggregate_id(&self) -> AggregateId {
        self.vehicle_id
    }
}

/// Report a problem with a vehicle.
#[derive(Debug, Clone)]
pub struct ReportIssue {
    pub vehicle_id: AggregateId,
    pub description: String,
    /// `"repair"` or `"new"`.
    pub component_choice: String,
    pub component: Option<String>,
}

impl ReportIssue {
    pub fn new(
        vehicle_id: AggregateId,
        description: impl Into<String>,
        component_choice: impl Into<String>,
        component: Option<String>,
    ) -> Self {
        Self {
            vehicle_id,
            description: description.into(),
            component_choice: component_choice.into(),
            component,
        }
    }
}

impl Command for ReportIssue {
    type Aggregate = Vehicle;

    fn aggregate_id(&self) -> AggregateId {
        self.vehicle_id
    }
}

/// Persist a payment the pricing side has already checked.
#[derive(Debug, Clone)]
pub struct RecordPayment {
    pub vehicle_id: AggregateId,
    pub amount: Money,
    pub service_ids: Vec<ServiceId>,
}

impl RecordPayment {
    pub fn new(vehicle_id: AggregateId, amount: Money, service_ids: Vec<ServiceId>) -> Self {
        Self {
            vehicle_id,
            amount,
            service_ids,
        }
    }
}

impl Command for RecordPayment {
    type Aggregate = Vehicle;

    fn aggregate_id(&self) -> AggregateId {
        self.vehicle_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_generates_distinct_ids() {
        let a = RegisterVehicle::new("A", "Sedan", "2020");
        let b = RegisterVehicle::new("A", "Sedan", "2020");
        assert_ne!(a.aggregate_id(), b.aggregate_id());
    }

    #[test]
    fn commands_target_their_vehicle() {
        let id = AggregateId::new();
        assert_eq!(ReportIssue::new(id, "noise", "repair", None).aggregate_id(), id);
        assert_eq!(
            RecordPayment::new(id, Money::from_units(1), vec![]).aggregate_id(),
            id
        );
    }
}
