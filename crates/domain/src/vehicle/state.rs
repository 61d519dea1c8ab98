//! Repair lifecycle of a vehicle.

use serde::{Deserialize, Serialize};

use super::VehicleError;

/// Where a vehicle stands in its repair order.
///
/// ```text
/// NoIssues ──issue──► IssuesOpen ──payment──► Paid
///                      ▲      │
///                      └issue─┘
/// ```
///
/// `Paid` is terminal: no issue can be added and no second payment recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepairStatus {
    #[default]
    NoIssues,
    IssuesOpen,
    Paid,
}

/// Something that moves a vehicle through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairTransition {
    IssueReported,
    PaymentConfirmed,
}

/// What the workshop may do next with a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableActions {
    pub report_issue: bool,
    pub pay: bool,
}

impl RepairStatus {
    /// The only place lifecycle moves are decided.
    pub fn transition(self, transition: RepairTransition) -> Result<RepairStatus, VehicleError> {
        use RepairStatus::*;
        use RepairTransition::*;

        match (self, transition) {
            (NoIssues | IssuesOpen, IssueReported) => Ok(IssuesOpen),
            (Paid, IssueReported) => Err(VehicleError::IssuesLocked),
            (IssuesOpen, PaymentConfirmed) => Ok(Paid),
            (NoIssues, PaymentConfirmed) => Err(VehicleError::NoIssuesReported),
            (Paid, PaymentConfirmed) => Err(VehicleError::AlreadyPaid),
        }
    }

    pub fn can_report_issue(&self) -> bool {
        self.transition(RepairTransition::IssueReported).is_ok()
    }

    pub fn can_pay(&self) -> bool {
        self.transition(RepairTransition::PaymentConfirmed).is_ok()
    }

    /// Payment status as shown to the workshop; derived, never stored.
    pub fn is_paid(&self) -> bool {
        matches!(self, RepairStatus::Paid)
    }

    pub fn available_actions(&self) -> AvailableActions {
        AvailableActions {
            report_issue: self.can_report_issue(),
            pay: self.can_pay(),
        }
    }

    /// Label of the primary action offered for this state.
    pub fn prompt(&self) -> &'static str {
        match self {
            RepairStatus::NoIssues => "Report Issue",
            RepairStatus::IssuesOpen => "Report Another Issue",
            RepairStatus::Paid => "Payment Completed",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RepairStatus::NoIssues => "NO_ISSUES",
            RepairStatus::IssuesOpen => "ISSUES_OPEN",
            RepairStatus::Paid => "PAID",
        }
    }
}

impl std::fmt::Display for RepairStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
