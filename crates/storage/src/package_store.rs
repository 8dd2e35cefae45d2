use package_tracker_domain::model::{GeoLocation, NewPackage, Package, RecordId};
use package_tracker_domain::storage::{PackageStore, StorageError, StorageResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Select, SelectTwo, Set,
    TransactionTrait,
};
use tracing::debug;

use crate::entity::{geo_locations, packages};
use crate::SeaOrmStorage;

#[async_trait::async_trait]
impl PackageStore for SeaOrmStorage {
    async fn find_all(&self) -> StorageResult<Vec<Package>> {
        let rows = with_address(packages::Entity::find())
            .all(self.connection())
            .await
            .map_err(StorageError::from_source)?;
        Ok(rows
            .into_iter()
            .map(|(package, address)| package_to_domain(package, address))
            .collect())
    }

    async fn find_by_consignment_number(
        &self,
        consignment_number: &str,
    ) -> StorageResult<Option<Package>> {
        let maybe = with_address(
            packages::Entity::find()
                .filter(packages::Column::ConsignmentNumber.eq(consignment_number)),
        )
        .one(self.connection())
        .await
        .map_err(StorageError::from_source)?;
        Ok(maybe.map(|(package, address)| package_to_domain(package, address)))
    }

    async fn find_by_consignee_name(
        &self,
        consignee_name: &str,
    ) -> StorageResult<Option<Package>> {
        let maybe = with_address(
            packages::Entity::find().filter(packages::Column::ConsigneeName.eq(consignee_name)),
        )
        .one(self.connection())
        .await
        .map_err(StorageError::from_source)?;
        Ok(maybe.map(|(package, address)| package_to_domain(package, address)))
    }

    async fn insert_package(&self, package: NewPackage) -> StorageResult<Package> {
        let txn = self
            .connection()
            .begin()
            .await
            .map_err(StorageError::from_source)?;

        let address = match package.delivery_address {
            Some(location) => {
                let model = geo_locations::ActiveModel {
                    latitude: Set(location.latitude),
                    longitude: Set(location.longitude),
                    ..Default::default()
                };
                Some(
                    model
                        .insert(&txn)
                        .await
                        .map_err(StorageError::from_source)?,
                )
            }
            None => None,
        };

        let model = packages::ActiveModel {
            consignment_number: Set(package.consignment_number),
            consignee_name: Set(package.consignee_name),
            delivery_address_id: Set(address.as_ref().map(|location| location.id)),
            ..Default::default()
        };
        let created = model
            .insert(&txn)
            .await
            .map_err(StorageError::from_source)?;

        txn.commit().await.map_err(StorageError::from_source)?;
        debug!(id = created.id, "inserted package");
        Ok(package_to_domain(created, address))
    }

    async fn delete_package(&self, id: RecordId) -> StorageResult<bool> {
        let txn = self
            .connection()
            .begin()
            .await
            .map_err(StorageError::from_source)?;

        let Some(existing) = packages::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(StorageError::from_source)?
        else {
            return Ok(false);
        };

        packages::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(StorageError::from_source)?;
        if let Some(address_id) = existing.delivery_address_id {
            geo_locations::Entity::delete_by_id(address_id)
                .exec(&txn)
                .await
                .map_err(StorageError::from_source)?;
        }

        txn.commit().await.map_err(StorageError::from_source)?;
        debug!(id, "deleted package and its delivery address");
        Ok(true)
    }
}

/// Joins the delivery address and pins ordering to ascending id, so duplicate
/// consignment numbers or names resolve to the oldest row.
fn with_address(
    select: Select<packages::Entity>,
) -> SelectTwo<packages::Entity, geo_locations::Entity> {
    select
        .find_also_related(geo_locations::Entity)
        .order_by_asc(packages::Column::Id)
}

fn package_to_domain(model: packages::Model, address: Option<geo_locations::Model>) -> Package {
    Package {
        id: model.id,
        consignment_number: model.consignment_number,
        consignee_name: model.consignee_name,
        delivery_address: address.map(|location| GeoLocation {
            id: location.id,
            latitude: location.latitude,
            longitude: location.longitude,
        }),
    }
}

#[cfg(test)]
mod tests {
    use package_tracker_domain::model::NewGeoLocation;
    use sea_orm::PaginatorTrait;

    use super::*;

    async fn storage() -> SeaOrmStorage {
        SeaOrmStorage::connect("sqlite::memory:")
            .await
            .expect("storage inits")
    }

    fn new_package(number: &str, name: &str, located: bool) -> NewPackage {
        NewPackage {
            consignment_number: number.into(),
            consignee_name: name.into(),
            delivery_address: located.then_some(NewGeoLocation {
                latitude: 59.913_868,
                longitude: 10.752_245,
            }),
        }
    }

    #[tokio::test]
    async fn empty_store_returns_nothing() {
        let storage = storage().await;
        assert!(storage.find_all().await.unwrap().is_empty());
        assert!(storage
            .find_by_consignment_number("CN-1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn inserted_packages_round_trip_with_address() {
        let storage = storage().await;
        let created = storage
            .insert_package(new_package("CN-1", "Ada", true))
            .await
            .unwrap();

        let all = storage.find_all().await.unwrap();
        assert_eq!(all, vec![created.clone()]);

        let address = created.delivery_address.expect("address stored");
        assert_eq!(address.latitude, 59.913_868);
        assert_eq!(address.longitude, 10.752_245);
    }

    #[tokio::test]
    async fn packages_without_address_are_returned_unjoined() {
        let storage = storage().await;
        storage
            .insert_package(new_package("CN-2", "Grace", false))
            .await
            .unwrap();

        let all = storage.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].delivery_address.is_none());
    }

    #[tokio::test]
    async fn lookups_match_exactly_and_prefer_oldest_row() {
        let storage = storage().await;
        let first = storage
            .insert_package(new_package("CN-3", "Linus", true))
            .await
            .unwrap();
        storage
            .insert_package(new_package("CN-3", "Ken", true))
            .await
            .unwrap();

        let by_number = storage
            .find_by_consignment_number("CN-3")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_number.id, first.id);

        let by_name = storage.find_by_consignee_name("Ken").await.unwrap().unwrap();
        assert_eq!(by_name.consignee_name, "Ken");
        assert!(storage.find_by_consignee_name("ken").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_cascades_to_delivery_address() {
        let storage = storage().await;
        let created = storage
            .insert_package(new_package("CN-4", "Barbara", true))
            .await
            .unwrap();
        let kept = storage
            .insert_package(new_package("CN-5", "Margaret", true))
            .await
            .unwrap();

        assert!(storage.delete_package(created.id).await.unwrap());
        assert!(!storage.delete_package(created.id).await.unwrap());

        let locations = geo_locations::Entity::find()
            .count(storage.connection())
            .await
            .unwrap();
        assert_eq!(locations, 1);
        assert_eq!(storage.find_all().await.unwrap(), vec![kept]);
    }

    #[tokio::test]
    async fn builder_requires_url() {
        let err = SeaOrmStorage::builder().build().await.err().unwrap();
        assert_eq!(err, StorageError::Database("missing database url".into()));
    }

    #[tokio::test]
    async fn builder_connects_and_migrates() {
        let storage = SeaOrmStorage::builder()
            .database_url("sqlite::memory:")
            .max_connections(1)
            .build()
            .await
            .unwrap();
        assert!(storage.find_all().await.unwrap().is_empty());
    }
}
