//! Shared types for the workshop repair-order system.

mod error_kind;
mod id;
mod money;

pub use error_kind::ErrorKind;
pub use id::AggregateId;
pub use money::{Money, ParseMoneyError};
