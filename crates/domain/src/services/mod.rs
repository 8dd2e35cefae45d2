//! Listing, token issuance and telemetry wiring shared by the binaries.

pub mod auth;
pub mod listing;
pub mod telemetry;

pub use auth::*;
pub use listing::*;
pub use telemetry::*;
