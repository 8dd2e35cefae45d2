use sea_orm::sea_query::{ColumnDef, ForeignKey, ForeignKeyAction, Table, TableCreateStatement};
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection};

use crate::entity::{geo_locations, packages};
use package_tracker_domain::storage::{StorageError, StorageResult};

pub async fn run_migrations(db: &DatabaseConnection) -> StorageResult<()> {
    let backend = db.get_database_backend();

    let geo_locations_table = Table::create()
        .table(geo_locations::Entity)
        .col(
            ColumnDef::new(geo_locations::Column::Id)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(
            ColumnDef::new(geo_locations::Column::Latitude)
                .double()
                .not_null(),
        )
        .col(
            ColumnDef::new(geo_locations::Column::Longitude)
                .double()
                .not_null(),
        )
        .to_owned();
    create_table(db, backend, geo_locations_table).await?;

    // Consignment numbers are not unique at the schema level.
    let packages_table = Table::create()
        .table(packages::Entity)
        .col(
            ColumnDef::new(packages::Column::Id)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(
            ColumnDef::new(packages::Column::ConsignmentNumber)
                .string()
                .not_null(),
        )
        .col(
            ColumnDef::new(packages::Column::ConsigneeName)
                .string()
                .not_null(),
        )
        .col(
            ColumnDef::new(packages::Column::DeliveryAddressId)
                .integer()
                .null()
                .unique_key(),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_packages_delivery_address")
                .from(packages::Entity, packages::Column::DeliveryAddressId)
                .to(geo_locations::Entity, geo_locations::Column::Id)
                .on_delete(ForeignKeyAction::Restrict),
        )
        .to_owned();
    create_table(db, backend, packages_table).await?;

    Ok(())
}

async fn create_table(
    db: &DatabaseConnection,
    backend: DatabaseBackend,
    mut statement: TableCreateStatement,
) -> StorageResult<()> {
    statement.if_not_exists();
    db.execute(backend.build(&statement))
        .await
        .map_err(StorageError::from_source)?;
    Ok(())
}
