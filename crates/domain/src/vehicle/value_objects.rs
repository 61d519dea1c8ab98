//! Value objects for vehicles, issues and payments.

use std::str::FromStr;

use catalog::{ComponentId, ServiceId};
use chrono::{DateTime, Utc};
use common::{AggregateId, Money};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::VehicleError;

/// First year a motor car was sold.
pub const EARLIEST_MODEL_YEAR: u16 = 1886;
pub const LATEST_MODEL_YEAR: u16 = 9999;

/// Vehicle identification number as entered, trimmed.
///
/// Two VINs are the same vehicle when their [`claim_key`](Vin::claim_key)s match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vin(String);

impl Vin {
    pub fn parse(raw: &str) -> Result<Self, VehicleError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(VehicleError::EmptyVin);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive uniqueness key.
    pub fn claim_key(&self) -> String {
        self.0.to_uppercase()
    }
}

impl std::fmt::Display for Vin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parses a model year such as `"2020"`.
pub fn parse_model_year(raw: &str) -> Result<u16, VehicleError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(VehicleError::EmptyYear);
    }
    trimmed
        .parse::<u16>()
        .ok()
        .filter(|y| (EARLIEST_MODEL_YEAR..=LATEST_MODEL_YEAR).contains(y))
        .ok_or_else(|| VehicleError::InvalidYear(trimmed.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(Uuid);

impl IssueId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for IssueId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for IssueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(Uuid);

impl PaymentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PaymentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PaymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether the reported component is to be repaired or replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentChoice {
    Repair,
    New,
}

impl ComponentChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentChoice::Repair => "repair",
            ComponentChoice::New => "new",
        }
    }

    /// A replacement cannot be ordered without naming the part.
    pub fn requires_component(&self) -> bool {
        matches!(self, ComponentChoice::New)
    }
}

impl FromStr for ComponentChoice {
    type Err = VehicleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "repair" => Ok(ComponentChoice::Repair),
            "new" => Ok(ComponentChoice::New),
            other => Err(VehicleError::InvalidComponentChoice(other.to_string())),
        }
    }
}

impl std::fmt::Display for ComponentChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A validated issue report that has not been recorded yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueDraft {
    pub description: String,
    pub component_choice: ComponentChoice,
    pub component: Option<ComponentId>,
}

impl IssueDraft {
    /// Validates raw form input. A blank component counts as none.
    pub fn parse(
        description: &str,
        component_choice: &str,
        component: Option<&str>,
    ) -> Result<Self, VehicleError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(VehicleError::EmptyDescription);
        }

        let component_choice: ComponentChoice = component_choice.parse()?;

        let component = component
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(ComponentId::from);

        if component_choice.requires_component() && component.is_none() {
            return Err(VehicleError::ComponentRequired);
        }

        Ok(Self {
            description: description.to_string(),
            component_choice,
            component,
        })
    }
}

/// A recorded issue. Immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: IssueId,
    pub vehicle_id: AggregateId,
    pub description: String,
    pub component_choice: ComponentChoice,
    pub component: Option<ComponentId>,
    pub reported_at: DateTime<Utc>,
}

/// A confirmed payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: PaymentId,
    pub vehicle_id: AggregateId,
    pub amount: Money,
    pub service_ids: Vec<ServiceId>,
    pub paid_at: DateTime<Utc>,
}
