//! `SeaORM` repository implementation for the catalog.
//!
//! Active-name uniqueness is checked before each write and backed by partial
//! unique indexes; a unique violation from the database maps to `Conflict`.

use anyhow::Context;
use api_templates_sdk::{
    ApiConfiguration, ConfigurationId, CredentialDigest, ParameterTemplate, TemplateId, Tenant,
    TenantId,
};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectOptions, Database, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, SqlErr, TransactionTrait,
};
use sea_orm_migration::MigratorTrait;
use tracing::{info, warn};
use uuid::Uuid;

use super::entity::{configuration, template, tenant};
use super::mapper::{configuration_to_active_model, template_to_active_model, tenant_to_active_model};
use super::migrations::Migrator;
use crate::config::StorageConfig;
use crate::domain::error::DomainError;
use crate::domain::repo::{ConfigurationRepository, TemplateRepository, TenantRepository};

/// Translate a database error, keeping unique violations distinguishable.
fn db_err(err: DbErr, conflict: impl FnOnce() -> String) -> DomainError {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        let message = conflict();
        warn!(%message, "unique index rejected write");
        return DomainError::conflict(message);
    }
    DomainError::Database(anyhow::Error::new(err))
}

fn read_err(err: DbErr) -> DomainError {
    DomainError::Database(anyhow::Error::new(err))
}

/// Repository over a SeaORM connection implementing all three catalog traits.
#[derive(Clone)]
pub struct SeaOrmCatalog {
    conn: DatabaseConnection,
}

impl SeaOrmCatalog {
    #[must_use]
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Connect to `storage.dsn` and apply pending migrations.
    ///
    /// In-memory SQLite is pinned to one long-lived pooled connection so
    /// every query sees the same database.
    ///
    /// # Errors
    /// Connection or migration failures.
    pub async fn connect(storage: &StorageConfig) -> anyhow::Result<Self> {
        let mut options = ConnectOptions::new(storage.dsn.clone());
        let in_memory = storage.dsn.contains(":memory:");
        let max_connections = if in_memory {
            1
        } else {
            storage.max_connections.max(1)
        };
        options.max_connections(max_connections).sqlx_logging(false);
        if in_memory {
            // The database lives only as long as its connection.
            options.min_connections(1);
        }

        let conn = Database::connect(options)
            .await
            .context("failed to connect to catalog database")?;
        Migrator::up(&conn, None)
            .await
            .context("failed to run api_templates migrations")?;
        info!(max_connections, "catalog database ready");

        Ok(Self::new(conn))
    }

    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    async fn ensure_unique_tenant(&self, t: &Tenant) -> Result<(), DomainError> {
        let clash = tenant::Entity::find()
            .filter(
                Condition::any()
                    .add(tenant::Column::Name.eq(t.name.as_str()))
                    .add(tenant::Column::CredentialDigest.eq(t.credential_digest.as_str())),
            )
            .filter(tenant::Column::Id.ne(t.id))
            .one(&self.conn)
            .await
            .map_err(read_err)?;
        match clash {
            Some(_) => Err(DomainError::conflict(tenant_conflict())),
            None => Ok(()),
        }
    }

    async fn ensure_unique_configuration(&self, config: &ApiConfiguration) -> Result<(), DomainError> {
        if !config.active {
            return Ok(());
        }
        let clash = configuration::Entity::find()
            .filter(configuration::Column::TenantId.eq(config.tenant_id))
            .filter(configuration::Column::ApiName.eq(config.api_name.as_str()))
            .filter(configuration::Column::Active.eq(true))
            .filter(configuration::Column::Id.ne(config.id))
            .one(&self.conn)
            .await
            .map_err(read_err)?;
        match clash {
            Some(_) => Err(DomainError::conflict(configuration_conflict(config))),
            None => Ok(()),
        }
    }

    async fn ensure_unique_template(&self, t: &ParameterTemplate) -> Result<(), DomainError> {
        if !t.active {
            return Ok(());
        }
        let clash = template::Entity::find()
            .filter(template::Column::ConfigId.eq(t.config_id))
            .filter(template::Column::TemplateName.eq(t.template_name.as_str()))
            .filter(template::Column::Active.eq(true))
            .filter(template::Column::Id.ne(t.id))
            .one(&self.conn)
            .await
            .map_err(read_err)?;
        match clash {
            Some(_) => Err(DomainError::conflict(template_conflict(t))),
            None => Ok(()),
        }
    }
}

fn configuration_conflict(config: &ApiConfiguration) -> String {
    format!(
        "active API configuration '{}' already exists for tenant {}",
        config.api_name, config.tenant_id
    )
}

fn template_conflict(t: &ParameterTemplate) -> String {
    format!(
        "active template '{}' already exists for configuration {}",
        t.template_name, t.config_id
    )
}

fn tenant_conflict() -> String {
    "tenant name or credential is already registered".to_owned()
}

#[async_trait]
impl TenantRepository for SeaOrmCatalog {
    async fn find_active_by_credential(
        &self,
        digest: &CredentialDigest,
    ) -> Result<Vec<Tenant>, DomainError> {
        let rows = tenant::Entity::find()
            .filter(tenant::Column::CredentialDigest.eq(digest.as_str()))
            .filter(tenant::Column::Active.eq(true))
            .all(&self.conn)
            .await
            .map_err(read_err)?;
        Ok(rows.into_iter().map(Tenant::from).collect())
    }

    async fn find_by_id(&self, id: TenantId) -> Result<Option<Tenant>, DomainError> {
        let row = tenant::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .map_err(read_err)?;
        Ok(row.map(Tenant::from))
    }

    async fn list(&self) -> Result<Vec<Tenant>, DomainError> {
        let rows = tenant::Entity::find()
            .order_by_asc(tenant::Column::Name)
            .all(&self.conn)
            .await
            .map_err(read_err)?;
        Ok(rows.into_iter().map(Tenant::from).collect())
    }

    async fn insert(&self, t: Tenant) -> Result<Tenant, DomainError> {
        self.ensure_unique_tenant(&t).await?;
        let model = tenant_to_active_model(&t)
            .insert(&self.conn)
            .await
            .map_err(|e| db_err(e, tenant_conflict))?;
        Ok(Tenant::from(model))
    }

    async fn update(&self, t: Tenant) -> Result<Tenant, DomainError> {
        self.ensure_unique_tenant(&t).await?;
        let model = tenant_to_active_model(&t)
            .update(&self.conn)
            .await
            .map_err(|e| db_err(e, tenant_conflict))?;
        Ok(Tenant::from(model))
    }

    async fn delete(&self, id: TenantId) -> Result<bool, DomainError> {
        let txn = self.conn.begin().await.map_err(read_err)?;

        let config_ids: Vec<Uuid> = configuration::Entity::find()
            .filter(configuration::Column::TenantId.eq(id))
            .all(&txn)
            .await
            .map_err(read_err)?
            .into_iter()
            .map(|c| c.id)
            .collect();
        template::Entity::delete_many()
            .filter(template::Column::ConfigId.is_in(config_ids))
            .exec(&txn)
            .await
            .map_err(read_err)?;
        configuration::Entity::delete_many()
            .filter(configuration::Column::TenantId.eq(id))
            .exec(&txn)
            .await
            .map_err(read_err)?;
        let res = tenant::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(read_err)?;

        txn.commit().await.map_err(read_err)?;
        Ok(res.rows_affected > 0)
    }
}

#[async_trait]
impl ConfigurationRepository for SeaOrmCatalog {
    async fn find_active(
        &self,
        tenant_id: TenantId,
        api_name: &str,
    ) -> Result<Vec<ApiConfiguration>, DomainError> {
        let rows = configuration::Entity::find()
            .filter(configuration::Column::TenantId.eq(tenant_id))
            .filter(configuration::Column::ApiName.eq(api_name))
            .filter(configuration::Column::Active.eq(true))
            .all(&self.conn)
            .await
            .map_err(read_err)?;
        rows.into_iter()
            .map(|m| ApiConfiguration::try_from(m).map_err(DomainError::Database))
            .collect()
    }

    async fn find_by_id(
        &self,
        id: ConfigurationId,
    ) -> Result<Option<ApiConfiguration>, DomainError> {
        configuration::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .map_err(read_err)?
            .map(ApiConfiguration::try_from)
            .transpose()
            .map_err(DomainError::Database)
    }

    async fn list_by_tenant(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<ApiConfiguration>, DomainError> {
        let rows = configuration::Entity::find()
            .filter(configuration::Column::TenantId.eq(tenant_id))
            .order_by_asc(configuration::Column::ApiName)
            .all(&self.conn)
            .await
            .map_err(read_err)?;
        rows.into_iter()
            .map(|m| ApiConfiguration::try_from(m).map_err(DomainError::Database))
            .collect()
    }

    async fn insert(&self, config: ApiConfiguration) -> Result<ApiConfiguration, DomainError> {
        self.ensure_unique_configuration(&config).await?;
        let model = configuration_to_active_model(&config)
            .insert(&self.conn)
            .await
            .map_err(|e| db_err(e, || configuration_conflict(&config)))?;
        ApiConfiguration::try_from(model).map_err(DomainError::Database)
    }

    async fn update(&self, config: ApiConfiguration) -> Result<ApiConfiguration, DomainError> {
        self.ensure_unique_configuration(&config).await?;
        let model = configuration_to_active_model(&config)
            .update(&self.conn)
            .await
            .map_err(|e| db_err(e, || configuration_conflict(&config)))?;
        ApiConfiguration::try_from(model).map_err(DomainError::Database)
    }

    async fn delete(&self, id: ConfigurationId) -> Result<bool, DomainError> {
        let txn = self.conn.begin().await.map_err(read_err)?;
        template::Entity::delete_many()
            .filter(template::Column::ConfigId.eq(id))
            .exec(&txn)
            .await
            .map_err(read_err)?;
        let res = configuration::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(read_err)?;
        txn.commit().await.map_err(read_err)?;
        Ok(res.rows_affected > 0)
    }
}

#[async_trait]
impl TemplateRepository for SeaOrmCatalog {
    async fn find_active(
        &self,
        config_id: ConfigurationId,
        template_name: &str,
    ) -> Result<Vec<ParameterTemplate>, DomainError> {
        let rows = template::Entity::find()
            .filter(template::Column::ConfigId.eq(config_id))
            .filter(template::Column::TemplateName.eq(template_name))
            .filter(template::Column::Active.eq(true))
            .all(&self.conn)
            .await
            .map_err(read_err)?;
        rows.into_iter()
            .map(|m| ParameterTemplate::try_from(m).map_err(DomainError::Database))
            .collect()
    }

    async fn find_by_id(&self, id: TemplateId) -> Result<Option<ParameterTemplate>, DomainError> {
        template::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .map_err(read_err)?
            .map(ParameterTemplate::try_from)
            .transpose()
            .map_err(DomainError::Database)
    }

    async fn list_by_configuration(
        &self,
        config_id: ConfigurationId,
    ) -> Result<Vec<ParameterTemplate>, DomainError> {
        let rows = template::Entity::find()
            .filter(template::Column::ConfigId.eq(config_id))
            .order_by_asc(template::Column::TemplateName)
            .all(&self.conn)
            .await
            .map_err(read_err)?;
        rows.into_iter()
            .map(|m| ParameterTemplate::try_from(m).map_err(DomainError::Database))
            .collect()
    }

    async fn insert(&self, t: ParameterTemplate) -> Result<ParameterTemplate, DomainError> {
        self.ensure_unique_template(&t).await?;
        let model = template_to_active_model(&t)?
            .insert(&self.conn)
            .await
            .map_err(|e| db_err(e, || template_conflict(&t)))?;
        ParameterTemplate::try_from(model).map_err(DomainError::Database)
    }

    async fn update(&self, t: ParameterTemplate) -> Result<ParameterTemplate, DomainError> {
        self.ensure_unique_template(&t).await?;
        let model = template_to_active_model(&t)?
            .update(&self.conn)
            .await
            .map_err(|e| db_err(e, || template_conflict(&t)))?;
        ParameterTemplate::try_from(model).map_err(DomainError::Database)
    }

    async fn delete(&self, id: TemplateId) -> Result<bool, DomainError> {
        let res = template::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .map_err(read_err)?;
        Ok(res.rows_affected > 0)
    }
}
