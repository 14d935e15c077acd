//! Repository traits for the api_templates domain.
//!
//! Services build complete records (ids, timestamps, defaults) and hand them
//! to the repository, which persists them and enforces the active-name
//! uniqueness rules, reporting a duplicate as `DomainError::Conflict`.

use api_templates_sdk::{
    ApiConfiguration, ConfigurationId, CredentialDigest, ParameterTemplate, TemplateId, Tenant,
    TenantId,
};
use async_trait::async_trait;

use super::error::DomainError;

#[async_trait]
pub trait TenantRepository: Send + Sync {
    /// Active tenants registered under this credential digest.
    async fn find_active_by_credential(
        &self,
        digest: &CredentialDigest,
    ) -> Result<Vec<Tenant>, DomainError>;

    async fn find_by_id(&self, id: TenantId) -> Result<Option<Tenant>, DomainError>;

    async fn list(&self) -> Result<Vec<Tenant>, DomainError>;

    async fn insert(&self, tenant: Tenant) -> Result<Tenant, DomainError>;

    /// Replace the stored record with the same id.
    async fn update(&self, tenant: Tenant) -> Result<Tenant, DomainError>;

    /// Delete a tenant together with its configurations and their templates.
    async fn delete(&self, id: TenantId) -> Result<bool, DomainError>;
}

#[async_trait]
pub trait ConfigurationRepository: Send + Sync {
    /// Active configurations of a tenant with this API name.
    async fn find_active(
        &self,
        tenant_id: TenantId,
        api_name: &str,
    ) -> Result<Vec<ApiConfiguration>, DomainError>;

    async fn find_by_id(&self, id: ConfigurationId)
    -> Result<Option<ApiConfiguration>, DomainError>;

    /// Every configuration of a tenant, inactive ones included.
    async fn list_by_tenant(&self, tenant_id: TenantId)
    -> Result<Vec<ApiConfiguration>, DomainError>;

    async fn insert(&self, config: ApiConfiguration) -> Result<ApiConfiguration, DomainError>;

    async fn update(&self, config: ApiConfiguration) -> Result<ApiConfiguration, DomainError>;

    /// Delete a configuration together with its templates.
    async fn delete(&self, id: ConfigurationId) -> Result<bool, DomainError>;
}

#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Active templates of a configuration with this name.
    async fn find_active(
        &self,
        config_id: ConfigurationId,
        template_name: &str,
    ) -> Result<Vec<ParameterTemplate>, DomainError>;

    async fn find_by_id(&self, id: TemplateId) -> Result<Option<ParameterTemplate>, DomainError>;

    /// Every template of a configuration, inactive ones included.
    async fn list_by_configuration(
        &self,
        config_id: ConfigurationId,
    ) -> Result<Vec<ParameterTemplate>, DomainError>;

    async fn insert(&self, template: ParameterTemplate) -> Result<ParameterTemplate, DomainError>;

    async fn update(&self, template: ParameterTemplate) -> Result<ParameterTemplate, DomainError>;

    async fn delete(&self, id: TemplateId) -> Result<bool, DomainError>;
}
