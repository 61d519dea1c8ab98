//! Services chosen for a vehicle while the customer decides.

use catalog::ServiceId;
use common::AggregateId;
use serde::{Deserialize, Serialize};

/// An ordered set of chosen services for one vehicle.
///
/// Owned by the caller for the length of one interaction; nothing here is
/// shared or persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSelection {
    vehicle_id: AggregateId,
    services: Vec<ServiceId>,
}

impl ServiceSelection {
    pub fn new(vehicle_id: AggregateId) -> Self {
        Self {
            vehicle_id,
            services: Vec::new(),
        }
    }

    pub fn vehicle_id(&self) -> AggregateId {
        self.vehicle_id
    }

    /// Chosen services in the order they were picked.
    pub fn services(&self) -> &[ServiceId] {
        &self.services
    }

    pub fn is_selected(&self, id: &ServiceId) -> bool {
        self.services.contains(id)
    }

    /// Adds `id` unless it is already chosen.
    pub fn select(&mut self, id: ServiceId) {
        if !self.is_selected(&id) {
            self.services.push(id);
        }
    }

    pub fn deselect(&mut self, id: &ServiceId) {
        self.services.retain(|s| s != id);
    }

    /// Flips `id` in or out, like a checkbox. Returns whether it is now selected.
    pub fn toggle(&mut self, id: ServiceId) -> bool {
        if self.is_selected(&id) {
            self.deselect(&id);
            false
        } else {
            self.services.push(id);
            true
        }
    }

    pub fn clear(&mut self) {
        self.services.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }
}
