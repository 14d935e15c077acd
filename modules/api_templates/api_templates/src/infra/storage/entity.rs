//! SeaORM entities for api_templates.

pub use configuration::Entity as ConfigurationEntity;
pub use template::Entity as TemplateEntity;
pub use tenant::Entity as TenantEntity;

/// Tenant entity for the `api_tenant` table.
pub mod tenant {
    use chrono::{DateTime, Utc};
    use sea_orm::entity::prelude::*;
    use uuid::Uuid;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "api_tenant")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub name: String,
        pub description: Option<String>,
        pub credential_digest: String,
        pub active: bool,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::configuration::Entity")]
        Configurations,
    }

    impl Related<super::configuration::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Configurations.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// API configuration entity for the `api_configuration` table.
///
/// `token` is stored as-is; it is needed to dispatch calls.
pub mod configuration {
    use chrono::{DateTime, Utc};
    use sea_orm::entity::prelude::*;
    use uuid::Uuid;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "api_configuration")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub tenant_id: Uuid,
        pub api_name: String,
        pub base_url: String,
        pub token: String,
        pub version: String,
        pub timeout_seconds: i64,
        pub max_retries: i64,
        pub description: Option<String>,
        pub active: bool,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::tenant::Entity",
            from = "Column::TenantId",
            to = "super::tenant::Column::Id",
            on_delete = "Cascade"
        )]
        Tenant,
        #[sea_orm(has_many = "super::template::Entity")]
        Templates,
    }

    impl Related<super::tenant::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Tenant.def()
        }
    }

    impl Related<super::template::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Templates.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Parameter template entity for the `api_parameter_template` table.
pub mod template {
    use chrono::{DateTime, Utc};
    use sea_orm::entity::prelude::*;
    use uuid::Uuid;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "api_parameter_template")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub config_id: Uuid,
        pub template_name: String,
        pub description: Option<String>,
        pub http_method: String,
        pub endpoint_path: String,
        #[sea_orm(column_type = "Json")]
        pub parameter_spec: Json,
        #[sea_orm(column_type = "Json")]
        pub response_mapping: Json,
        pub active: bool,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::configuration::Entity",
            from = "Column::ConfigId",
            to = "super::configuration::Column::Id",
            on_delete = "Cascade"
        )]
        Configuration,
    }

    impl Related<super::configuration::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Configuration.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}
