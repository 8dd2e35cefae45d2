//! Domain-level building blocks for the package tracker: entities and their
//! HTTP views, the storage contract, the listing service, token issuance and
//! configuration shared by the API binary.

pub mod config;
pub mod model;
pub mod services;
pub mod storage;

pub use storage::*;
