pub mod packages {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "packages")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub consignment_number: String,
        pub consignee_name: String,
        pub delivery_address_id: Option<i32>,
    }

    #[derive(Debug, Clone, Copy, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::geo_locations::Entity",
            from = "Column::DeliveryAddressId",
            to = "super::geo_locations::Column::Id"
        )]
        DeliveryAddress,
    }

    impl Related<super::geo_locations::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::DeliveryAddress.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod geo_locations {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "geo_locations")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub latitude: f64,
        pub longitude: f64,
    }

    #[derive(Debug, Clone, Copy, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}
