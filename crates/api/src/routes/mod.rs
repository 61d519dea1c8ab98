//! HTTP handlers grouped by resource.

pub mod catalog;
pub mod health;
pub mod metrics;
pub mod vehicles;
