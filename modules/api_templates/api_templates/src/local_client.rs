//! Local client adapter implementing the SDK API traits.
//!
//! Bridges the domain services to `ApiTemplatesClient` and
//! `ApiTemplatesAdminClient`, converting domain errors at the boundary.

use std::sync::Arc;

use api_templates_sdk::{
    ApiConfiguration, ApiConfigurationPatch, ApiTemplatesAdminClient, ApiTemplatesClient,
    ApiTemplatesError, ConfigurationId, IssuedTenant, NewApiConfiguration, NewParameterTemplate,
    NewTenant, ParameterTemplate, ParameterTemplatePatch, PreparedRequest, RequestDescriptor,
    RequestInput, SecretString, TemplateId, Tenant, TenantId, TenantPatch,
};
use async_trait::async_trait;

use crate::domain::admin::AdminService;
use crate::domain::service::Service;

pub struct ApiTemplatesLocalClient {
    service: Arc<Service>,
    admin: Arc<AdminService>,
}

impl ApiTemplatesLocalClient {
    #[must_use]
    pub fn new(service: Arc<Service>, admin: Arc<AdminService>) -> Self {
        Self { service, admin }
    }
}

#[async_trait]
impl ApiTemplatesClient for ApiTemplatesLocalClient {
    async fn resolve_configuration(
        &self,
        credential: &SecretString,
        api_name: &str,
    ) -> Result<ApiConfiguration, ApiTemplatesError> {
        self.service
            .resolve(credential, api_name)
            .await
            .map_err(Into::into)
    }

    async fn get_template(
        &self,
        config_id: ConfigurationId,
        template_name: &str,
    ) -> Result<ParameterTemplate, ApiTemplatesError> {
        self.service
            .get_template(config_id, template_name)
            .await
            .map_err(Into::into)
    }

    async fn list_templates(
        &self,
        config_id: ConfigurationId,
    ) -> Result<Vec<ParameterTemplate>, ApiTemplatesError> {
        self.service
            .list_templates(config_id)
            .await
            .map_err(Into::into)
    }

    async fn compile_request(
        &self,
        template: &ParameterTemplate,
        input: &RequestInput,
        base_url: &str,
    ) -> Result<RequestDescriptor, ApiTemplatesError> {
        self.service
            .compile(template, input, base_url)
            .map_err(Into::into)
    }

    async fn prepare_request(
        &self,
        credential: &SecretString,
        api_name: &str,
        template_name: &str,
        input: &RequestInput,
    ) -> Result<PreparedRequest, ApiTemplatesError> {
        self.service
            .prepare_request(credential, api_name, template_name, input)
            .await
            .map_err(Into::into)
    }
}

#[async_trait]
impl ApiTemplatesAdminClient for ApiTemplatesLocalClient {
    // === Tenants ===

    async fn create_tenant(
        &self,
        new_tenant: NewTenant,
    ) -> Result<IssuedTenant, ApiTemplatesError> {
        self.admin.create_tenant(new_tenant).await.map_err(Into::into)
    }

    async fn get_tenant(&self, id: TenantId) -> Result<Tenant, ApiTemplatesError> {
        self.admin.get_tenant(id).await.map_err(Into::into)
    }

    async fn list_tenants(&self) -> Result<Vec<Tenant>, ApiTemplatesError> {
        self.admin.list_tenants().await.map_err(Into::into)
    }

    async fn update_tenant(
        &self,
        id: TenantId,
        patch: TenantPatch,
    ) -> Result<Tenant, ApiTemplatesError> {
        self.admin.update_tenant(id, patch).await.map_err(Into::into)
    }

    async fn rotate_tenant_credential(
        &self,
        id: TenantId,
    ) -> Result<IssuedTenant, ApiTemplatesError> {
        self.admin
            .rotate_tenant_credential(id)
            .await
            .map_err(Into::into)
    }

    async fn deactivate_tenant(&self, id: TenantId) -> Result<Tenant, ApiTemplatesError> {
        self.admin.deactivate_tenant(id).await.map_err(Into::into)
    }

    async fn delete_tenant(&self, id: TenantId) -> Result<(), ApiTemplatesError> {
        self.admin.delete_tenant(id).await.map_err(Into::into)
    }

    // === Configurations ===

    async fn create_configuration(
        &self,
        new_config: NewApiConfiguration,
    ) -> Result<ApiConfiguration, ApiTemplatesError> {
        self.admin
            .create_configuration(new_config)
            .await
            .map_err(Into::into)
    }

    async fn get_configuration(
        &self,
        id: ConfigurationId,
    ) -> Result<ApiConfiguration, ApiTemplatesError> {
        self.admin.get_configuration(id).await.map_err(Into::into)
    }

    async fn list_configurations(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<ApiConfiguration>, ApiTemplatesError> {
        self.admin
            .list_configurations(tenant_id)
            .await
            .map_err(Into::into)
    }

    async fn update_configuration(
        &self,
        id: ConfigurationId,
        patch: ApiConfigurationPatch,
    ) -> Result<ApiConfiguration, ApiTemplatesError> {
        self.admin
            .update_configuration(id, patch)
            .await
            .map_err(Into::into)
    }

    async fn deactivate_configuration(
        &self,
        id: ConfigurationId,
    ) -> Result<ApiConfiguration, ApiTemplatesError> {
        self.admin
            .deactivate_configuration(id)
            .await
            .map_err(Into::into)
    }

    async fn delete_configuration(&self, id: ConfigurationId) -> Result<(), ApiTemplatesError> {
        self.admin.delete_configuration(id).await.map_err(Into::into)
    }

    // === Templates ===

    async fn create_template(
        &self,
        new_template: NewParameterTemplate,
    ) -> Result<ParameterTemplate, ApiTemplatesError> {
        self.admin
            .create_template(new_template)
            .await
            .map_err(Into::into)
    }

    async fn get_template_by_id(
        &self,
        id: TemplateId,
    ) -> Result<ParameterTemplate, ApiTemplatesError> {
        self.admin.get_template(id).await.map_err(Into::into)
    }

    async fn list_all_templates(
        &self,
        config_id: ConfigurationId,
    ) -> Result<Vec<ParameterTemplate>, ApiTemplatesError> {
        self.admin.list_templates(config_id).await.map_err(Into::into)
    }

    async fn update_template(
        &self,
        id: TemplateId,
        patch: ParameterTemplatePatch,
    ) -> Result<ParameterTemplate, ApiTemplatesError> {
        self.admin
            .update_template(id, patch)
            .await
            .map_err(Into::into)
    }

    async fn deactivate_template(
        &self,
        id: TemplateId,
    ) -> Result<ParameterTemplate, ApiTemplatesError> {
        self.admin.deactivate_template(id).await.map_err(Into::into)
    }

    async fn delete_template(&self, id: TemplateId) -> Result<(), ApiTemplatesError> {
        self.admin.delete_template(id).await.map_err(Into::into)
    }
}
