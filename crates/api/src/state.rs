use std::sync::Arc;

use package_tracker_domain::services::{PackageListing, TelemetryGuard, TokenIssuer};
use package_tracker_storage::SeaOrmStorage;

#[derive(Clone)]
pub struct AppState {
    listing: PackageListing<SeaOrmStorage>,
    issuer: Arc<TokenIssuer>,
    telemetry: TelemetryGuard,
}

impl AppState {
    pub fn new(storage: SeaOrmStorage, issuer: TokenIssuer, telemetry: TelemetryGuard) -> Self {
        Self {
            listing: PackageListing::new(storage),
            issuer: Arc::new(issuer),
            telemetry,
        }
    }

    pub fn listing(&self) -> &PackageListing<SeaOrmStorage> {
        &self.listing
    }

    pub fn issuer(&self) -> &TokenIssuer {
        self.issuer.as_ref()
    }

    pub fn telemetry(&self) -> &TelemetryGuard {
        &self.telemetry
    }
}
