//! Public API traits for the api_templates module.
//!
//! `ApiTemplatesClient` is the read path used by a gateway to turn a tenant
//! credential and an intent-level request into a dispatch-ready descriptor.
//! `ApiTemplatesAdminClient` covers the administrative writes.

use async_trait::async_trait;

use crate::error::ApiTemplatesError;
use crate::models::{
    ApiConfiguration, ApiConfigurationPatch, ConfigurationId, IssuedTenant, NewApiConfiguration,
    NewParameterTemplate, NewTenant, ParameterTemplate, ParameterTemplatePatch, PreparedRequest,
    RequestDescriptor, RequestInput, TemplateId, Tenant, TenantId, TenantPatch,
};
use crate::secret::SecretString;

/// Read-side API: resolution, template lookup and compilation.
///
/// ```ignore
/// let prepared = client
///     .prepare_request(&credential, "employee", "salary_lookup", &input)
///     .await?;
/// println!("{} {}", prepared.request.method, prepared.request.url);
/// ```
#[async_trait]
pub trait ApiTemplatesClient: Send + Sync {
    /// Resolve the active configuration named `api_name` for the tenant
    /// holding `credential`.
    ///
    /// # Errors
    ///
    /// - `TenantNotFound` if no active tenant holds the credential
    /// - `ConfigurationNotFound` if the tenant has no active configuration with that name
    async fn resolve_configuration(
        &self,
        credential: &SecretString,
        api_name: &str,
    ) -> Result<ApiConfiguration, ApiTemplatesError>;

    /// Look up an active template of a configuration by name.
    ///
    /// # Errors
    ///
    /// - `TemplateNotFound` if no active template matches
    async fn get_template(
        &self,
        config_id: ConfigurationId,
        template_name: &str,
    ) -> Result<ParameterTemplate, ApiTemplatesError>;

    /// List the active templates of a configuration.
    async fn list_templates(
        &self,
        config_id: ConfigurationId,
    ) -> Result<Vec<ParameterTemplate>, ApiTemplatesError>;

    /// Compile a template against runtime input. Pure; no store access.
    ///
    /// # Errors
    ///
    /// - `MissingRequiredParameter`, `MissingPathParameter`, `InvalidPathParameter`
    ///   for caller input errors
    /// - `InvalidTemplateSpecification` if the stored specification is malformed
    async fn compile_request(
        &self,
        template: &ParameterTemplate,
        input: &RequestInput,
        base_url: &str,
    ) -> Result<RequestDescriptor, ApiTemplatesError>;

    /// Resolve, look up and compile in one call.
    ///
    /// # Errors
    ///
    /// Any error of the three steps above.
    async fn prepare_request(
        &self,
        credential: &SecretString,
        api_name: &str,
        template_name: &str,
        input: &RequestInput,
    ) -> Result<PreparedRequest, ApiTemplatesError>;
}

/// Administrative API over tenants, configurations and templates.
///
/// Writes that would produce a second active configuration with the same
/// `(tenant, api_name)` or a second active template with the same
/// `(configuration, template_name)` fail with `Conflict`.
#[async_trait]
pub trait ApiTemplatesAdminClient: Send + Sync {
    // === Tenants ===

    /// Create a tenant and return it with its plaintext credential.
    async fn create_tenant(&self, new_tenant: NewTenant)
    -> Result<IssuedTenant, ApiTemplatesError>;

    async fn get_tenant(&self, id: TenantId) -> Result<Tenant, ApiTemplatesError>;

    async fn list_tenants(&self) -> Result<Vec<Tenant>, ApiTemplatesError>;

    async fn update_tenant(
        &self,
        id: TenantId,
        patch: TenantPatch,
    ) -> Result<Tenant, ApiTemplatesError>;

    /// Issue a fresh random credential; the previous one stops resolving.
    async fn rotate_tenant_credential(
        &self,
        id: TenantId,
    ) -> Result<IssuedTenant, ApiTemplatesError>;

    async fn deactivate_tenant(&self, id: TenantId) -> Result<Tenant, ApiTemplatesError>;

    /// Delete a tenant with all of its configurations and templates.
    async fn delete_tenant(&self, id: TenantId) -> Result<(), ApiTemplatesError>;

    // === Configurations ===

    async fn create_configuration(
        &self,
        new_config: NewApiConfiguration,
    ) -> Result<ApiConfiguration, ApiTemplatesError>;

    async fn get_configuration(
        &self,
        id: ConfigurationId,
    ) -> Result<ApiConfiguration, ApiTemplatesError>;

    /// All configurations of a tenant, inactive ones included.
    async fn list_configurations(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<ApiConfiguration>, ApiTemplatesError>;

    async fn update_configuration(
        &self,
        id: ConfigurationId,
        patch: ApiConfigurationPatch,
    ) -> Result<ApiConfiguration, ApiTemplatesError>;

    async fn deactivate_configuration(
        &self,
        id: ConfigurationId,
    ) -> Result<ApiConfiguration, ApiTemplatesError>;

    /// Delete a configuration with all of its templates.
    async fn delete_configuration(&self, id: ConfigurationId) -> Result<(), ApiTemplatesError>;

    // === Templates ===

    /// Create a template. The parameter specification is validated first.
    async fn create_template(
        &self,
        new_template: NewParameterTemplate,
    ) -> Result<ParameterTemplate, ApiTemplatesError>;

    async fn get_template_by_id(
        &self,
        id: TemplateId,
    ) -> Result<ParameterTemplate, ApiTemplatesError>;

    /// All templates of a configuration, inactive ones included.
    async fn list_all_templates(
        &self,
        config_id: ConfigurationId,
    ) -> Result<Vec<ParameterTemplate>, ApiTemplatesError>;

    async fn update_template(
        &self,
        id: TemplateId,
        patch: ParameterTemplatePatch,
    ) -> Result<ParameterTemplate, ApiTemplatesError>;

    async fn deactivate_template(
        &self,
        id: TemplateId,
    ) -> Result<ParameterTemplate, ApiTemplatesError>;

    async fn delete_template(&self, id: TemplateId) -> Result<(), ApiTemplatesError>;
}
