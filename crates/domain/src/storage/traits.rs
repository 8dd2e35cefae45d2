use async_trait::async_trait;
use thiserror::Error;

use crate::model::{NewPackage, Package, RecordId};

/// Common result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(String),
}

impl StorageError {
    pub fn from_source(err: impl std::fmt::Display) -> Self {
        Self::Database(err.to_string())
    }
}

/// Read and administration queries over the `packages`/`geo_locations` pair.
#[async_trait]
pub trait PackageStore: Send + Sync {
    /// Every package with its delivery address joined in.
    async fn find_all(&self) -> StorageResult<Vec<Package>>;
    async fn find_by_consignment_number(
        &self,
        consignment_number: &str,
    ) -> StorageResult<Option<Package>>;
    async fn find_by_consignee_name(&self, consignee_name: &str)
        -> StorageResult<Option<Package>>;
    /// Inserts the package and its delivery address atomically.
    async fn insert_package(&self, package: NewPackage) -> StorageResult<Package>;
    /// Deletes the package together with the location it owns.
    async fn delete_package(&self, id: RecordId) -> StorageResult<bool>;
}
