//! Catalog collaborator: components that can be repaired or replaced and the
//! services a workshop charges for.
//!
//! The core only reads from the catalog. [`CatalogClient`] is the seam;
//! [`InMemoryCatalog`] and [`HttpCatalogClient`] implement it and
//! [`TimeoutCatalog`] bounds every call.

pub mod client;
pub mod error;
pub mod http;
pub mod memory;
pub mod timeout;
pub mod types;

pub use client::CatalogClient;
pub use error::{CatalogError, Result};
pub use http::HttpCatalogClient;
pub use memory::{CatalogSeed, InMemoryCatalog};
pub use timeout::{DEFAULT_CATALOG_TIMEOUT, TimeoutCatalog};
pub use types::{Component, ComponentId, Service, ServiceId};
