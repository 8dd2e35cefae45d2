use thiserror::Error;
use tracing::{debug, error};

use crate::model::{to_view, PackageView, TransformError};
use crate::storage::{PackageStore, StorageError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ListingError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error("package `{0}` not found")]
    NotFound(String),
}

/// Fetches packages from the store and maps each one to its view.
#[derive(Debug, Clone)]
pub struct PackageListing<S> {
    store: S,
}

impl<S: PackageStore> PackageListing<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// All-or-nothing: the first package that cannot be transformed fails the
    /// whole listing. Store order is preserved.
    pub async fn list_all(&self) -> Result<Vec<PackageView>, ListingError> {
        let packages = self.store.find_all().await?;
        debug!(count = packages.len(), "transforming packages");

        packages
            .into_iter()
            .map(|package| {
                to_view(package).map_err(|err| {
                    error!(error = %err, "package failed integrity check");
                    ListingError::from(err)
                })
            })
            .collect()
    }

    pub async fn find_by_consignment_number(
        &self,
        consignment_number: &str,
    ) -> Result<PackageView, ListingError> {
        let package = self
            .store
            .find_by_consignment_number(consignment_number)
            .await?
            .ok_or_else(|| ListingError::NotFound(consignment_number.to_string()))?;
        Ok(to_view(package)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::model::{GeoLocation, NewPackage, Package, RecordId};
    use crate::storage::StorageResult;

    #[derive(Default)]
    struct VecStore {
        packages: Mutex<Vec<Package>>,
        fail: bool,
    }

    impl VecStore {
        fn with(packages: Vec<Package>) -> Self {
            Self {
                packages: Mutex::new(packages),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl PackageStore for VecStore {
        async fn find_all(&self) -> StorageResult<Vec<Package>> {
            if self.fail {
                return Err(StorageError::Database("connection reset".into()));
            }
            Ok(self.packages.lock().unwrap().clone())
        }

        async fn find_by_consignment_number(
            &self,
            consignment_number: &str,
        ) -> StorageResult<Option<Package>> {
            Ok(self
                .packages
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.consignment_number == consignment_number)
                .cloned())
        }

        async fn find_by_consignee_name(
            &self,
            consignee_name: &str,
        ) -> StorageResult<Option<Package>> {
            Ok(self
                .packages
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.consignee_name == consignee_name)
                .cloned())
        }

        async fn insert_package(&self, _package: NewPackage) -> StorageResult<Package> {
            unimplemented!("listing never writes")
        }

        async fn delete_package(&self, _id: RecordId) -> StorageResult<bool> {
            unimplemented!("listing never writes")
        }
    }

    fn package(id: RecordId, number: &str, located: bool) -> Package {
        Package {
            id,
            consignment_number: number.into(),
            consignee_name: format!("consignee-{id}"),
            delivery_address: located.then(|| GeoLocation {
                id,
                latitude: id as f64 * 1.5,
                longitude: id as f64 * -0.5,
            }),
        }
    }

    #[tokio::test]
    async fn lists_in_store_order() {
        let listing = PackageListing::new(VecStore::with(vec![
            package(2, "CN-2", true),
            package(1, "CN-1", true),
        ]));

        let views = listing.list_all().await.unwrap();
        let numbers: Vec<_> = views.iter().map(|v| v.consignment_number.as_str()).collect();
        assert_eq!(numbers, ["CN-2", "CN-1"]);
        assert_eq!(views[0].delivery_address.latitude, 3.0);
        assert_eq!(views[0].delivery_address.longitude, -1.0);
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let listing = PackageListing::new(VecStore::default());
        assert!(listing.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn one_unlocated_package_fails_the_listing() {
        let listing = PackageListing::new(VecStore::with(vec![
            package(1, "CN-1", true),
            package(2, "CN-2", false),
        ]));

        let err = listing.list_all().await.unwrap_err();
        assert!(matches!(err, ListingError::Transform(_)));
        assert!(err.to_string().contains("CN-2"));
    }

    #[tokio::test]
    async fn storage_failures_propagate() {
        let listing = PackageListing::new(VecStore {
            fail: true,
            ..VecStore::default()
        });

        let err = listing.list_all().await.unwrap_err();
        assert_eq!(
            err,
            ListingError::Storage(StorageError::Database("connection reset".into()))
        );
    }

    #[tokio::test]
    async fn lookup_miss_is_not_found() {
        let listing = PackageListing::new(VecStore::with(vec![package(1, "CN-1", true)]));

        let found = listing.find_by_consignment_number("CN-1").await.unwrap();
        assert_eq!(found.consignee_name, "consignee-1");

        let err = listing.find_by_consignment_number("CN-9").await.unwrap_err();
        assert_eq!(err, ListingError::NotFound("CN-9".into()));
    }
}
