//! Package entities as persisted by the storage layer and the views handed
//! out over HTTP.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Surrogate key generated by the store.
pub type RecordId = i32;

#[derive(Debug, Clone, PartialEq)]
pub struct GeoLocation {
    pub id: RecordId,
    pub latitude: f64,
    pub longitude: f64,
}

/// A persisted package. `delivery_address` is nullable in the schema, so a
/// row without one is representable even though it cannot be listed.
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub id: RecordId,
    pub consignment_number: String,
    pub consignee_name: String,
    pub delivery_address: Option<GeoLocation>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewGeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPackage {
    pub consignment_number: String,
    pub consignee_name: String,
    pub delivery_address: Option<NewGeoLocation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocationView {
    pub latitude: f64,
    pub longitude: f64,
}

/// API-facing representation of a package. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageView {
    pub consignment_number: String,
    pub consignee_name: String,
    pub delivery_address: GeoLocationView,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("package `{consignment_number}` has no delivery address")]
    MissingDeliveryAddress { consignment_number: String },
}

impl From<&GeoLocation> for GeoLocationView {
    fn from(location: &GeoLocation) -> Self {
        Self {
            latitude: location.latitude,
            longitude: location.longitude,
        }
    }
}

impl TryFrom<Package> for PackageView {
    type Error = TransformError;

    fn try_from(package: Package) -> Result<Self, Self::Error> {
        let Some(address) = package.delivery_address.as_ref() else {
            return Err(TransformError::MissingDeliveryAddress {
                consignment_number: package.consignment_number,
            });
        };
        let delivery_address = GeoLocationView::from(address);

        Ok(Self {
            consignment_number: package.consignment_number,
            consignee_name: package.consignee_name,
            delivery_address,
        })
    }
}

/// Converts a persisted package into its transfer view.
pub fn to_view(package: Package) -> Result<PackageView, TransformError> {
    PackageView::try_from(package)
}
