//! Repair-order workflow: quoting, payment and the controller the
//! presentation layer talks to.
//!
//! A request flows through the [`WorkflowController`], which checks
//! preconditions against the repair order store, asks the
//! [`PricingEngine`] for a [`Quote`] and, once the customer accepts it, hands
//! the quote to the [`PaymentProcessor`].

pub mod controller;
pub mod error;
pub mod payment;
pub mod pricing;
pub mod selection;

pub use controller::{VehicleOverview, WorkflowController};
pub use error::{Result, WorkflowError};
pub use payment::PaymentProcessor;
pub use pricing::{PricedServices, PricingEngine, Quote, QuoteLine};
pub use selection::ServiceSelection;
