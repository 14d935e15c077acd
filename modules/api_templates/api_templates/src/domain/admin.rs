//! Administrative writes over tenants, configurations and templates.
//!
//! Duplicate policy is reject: a second active configuration with the same
//! `(tenant, api_name)` or a second active template with the same
//! `(configuration, template_name)` fails with `Conflict`. Repositories
//! enforce it; this layer validates input and fills defaults.

use std::sync::Arc;

use api_templates_sdk::{
    ApiConfiguration, ApiConfigurationPatch, ConfigurationId, CredentialDigest,
    DEFAULT_API_VERSION, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECONDS, IssuedTenant,
    NewApiConfiguration, NewParameterTemplate, NewTenant, ParameterTemplate,
    ParameterTemplatePatch, SecretString, TemplateId, Tenant, TenantId, TenantPatch,
};
use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::error::{DomainError, RecordKind};
use super::parameter_spec::ParameterSpec;
use super::repo::{ConfigurationRepository, TemplateRepository, TenantRepository};

/// Random credential handed to a tenant created without one.
fn generate_credential() -> SecretString {
    SecretString::new(Uuid::new_v4().to_string())
}

fn require_non_empty(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(field, "must not be empty"));
    }
    Ok(())
}

fn validate_base_url(base_url: &str) -> Result<(), DomainError> {
    if base_url.starts_with("http://") || base_url.starts_with("https://") {
        Ok(())
    } else {
        Err(DomainError::validation(
            "base_url",
            "must start with http:// or https://",
        ))
    }
}

fn validate_endpoint_path(endpoint_path: &str) -> Result<(), DomainError> {
    if endpoint_path.is_empty() || endpoint_path.starts_with('/') {
        Ok(())
    } else {
        Err(DomainError::validation(
            "endpoint_path",
            "must be empty or start with '/'",
        ))
    }
}

fn validate_credential(credential: &SecretString) -> Result<(), DomainError> {
    if credential.expose().trim().is_empty() {
        return Err(DomainError::validation("credential", "must not be empty"));
    }
    Ok(())
}

pub struct AdminService {
    tenants: Arc<dyn TenantRepository>,
    configurations: Arc<dyn ConfigurationRepository>,
    templates: Arc<dyn TemplateRepository>,
}

impl AdminService {
    #[must_use]
    pub fn new(
        tenants: Arc<dyn TenantRepository>,
        configurations: Arc<dyn ConfigurationRepository>,
        templates: Arc<dyn TemplateRepository>,
    ) -> Self {
        Self {
            tenants,
            configurations,
            templates,
        }
    }

    // === Tenants ===

    /// # Errors
    /// `Validation` for empty name or credential, `Conflict` for a reused
    /// credential or name, storage errors.
    #[instrument(skip_all, fields(tenant.name = %new_tenant.name))]
    pub async fn create_tenant(&self, new_tenant: NewTenant) -> Result<IssuedTenant, DomainError> {
        require_non_empty("name", &new_tenant.name)?;
        let credential = new_tenant.credential.unwrap_or_else(generate_credential);
        validate_credential(&credential)?;

        let tenant = Tenant {
            id: new_tenant.id.unwrap_or_else(Uuid::new_v4),
            name: new_tenant.name,
            description: new_tenant.description,
            credential_digest: CredentialDigest::of(&credential),
            active: new_tenant.active.unwrap_or(true),
            created_at: Utc::now(),
        };
        let tenant = self.tenants.insert(tenant).await?;

        info!(tenant.id = %tenant.id, "tenant created");
        Ok(IssuedTenant { tenant, credential })
    }

    /// # Errors
    /// `RecordNotFound` or storage errors.
    pub async fn get_tenant(&self, id: TenantId) -> Result<Tenant, DomainError> {
        self.tenants
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(RecordKind::Tenant, id))
    }

    /// All tenants, ordered by name.
    ///
    /// # Errors
    /// Storage errors only.
    pub async fn list_tenants(&self) -> Result<Vec<Tenant>, DomainError> {
        let mut tenants = self.tenants.list().await?;
        tenants.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(tenants)
    }

    /// # Errors
    /// `RecordNotFound`, `Validation`, `Conflict` or storage errors.
    #[instrument(skip_all, fields(tenant.id = %id))]
    pub async fn update_tenant(&self, id: TenantId, patch: TenantPatch) -> Result<Tenant, DomainError> {
        let mut tenant = self.get_tenant(id).await?;

        if let Some(name) = patch.name {
            require_non_empty("name", &name)?;
            tenant.name = name;
        }
        if let Some(description) = patch.description {
            tenant.description = description;
        }
        if let Some(active) = patch.active {
            tenant.active = active;
        }

        let tenant = self.tenants.update(tenant).await?;
        info!("tenant updated");
        Ok(tenant)
    }

    /// Issue a fresh credential; the old one stops resolving immediately.
    ///
    /// # Errors
    /// `RecordNotFound` or storage errors.
    #[instrument(skip_all, fields(tenant.id = %id))]
    pub async fn rotate_tenant_credential(&self, id: TenantId) -> Result<IssuedTenant, DomainError> {
        let mut tenant = self.get_tenant(id).await?;
        let credential = generate_credential();
        tenant.credential_digest = CredentialDigest::of(&credential);

        let tenant = self.tenants.update(tenant).await?;
        info!("tenant credential rotated");
        Ok(IssuedTenant { tenant, credential })
    }

    /// # Errors
    /// `RecordNotFound` or storage errors.
    pub async fn deactivate_tenant(&self, id: TenantId) -> Result<Tenant, DomainError> {
        self.update_tenant(
            id,
            TenantPatch {
                active: Some(false),
                ..TenantPatch::default()
            },
        )
        .await
    }

    /// Delete a tenant and everything it owns.
    ///
    /// # Errors
    /// `RecordNotFound` or storage errors.
    #[instrument(skip_all, fields(tenant.id = %id))]
    pub async fn delete_tenant(&self, id: TenantId) -> Result<(), DomainError> {
        if !self.tenants.delete(id).await? {
            return Err(DomainError::not_found(RecordKind::Tenant, id));
        }
        info!("tenant deleted");
        Ok(())
    }

    // === Configurations ===

    /// # Errors
    /// `RecordNotFound` for an unknown tenant, `Validation`, `Conflict`, storage errors.
    #[instrument(skip_all, fields(tenant.id = %new_config.tenant_id, api_name = %new_config.api_name))]
    pub async fn create_configuration(
        &self,
        new_config: NewApiConfiguration,
    ) -> Result<ApiConfiguration, DomainError> {
        self.get_tenant(new_config.tenant_id).await?;

        require_non_empty("api_name", &new_config.api_name)?;
        validate_base_url(&new_config.base_url)?;
        let version = new_config
            .version
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_owned());
        require_non_empty("version", &version)?;

        let now = Utc::now();
        let config = ApiConfiguration {
            id: new_config.id.unwrap_or_else(Uuid::new_v4),
            tenant_id: new_config.tenant_id,
            api_name: new_config.api_name,
            base_url: new_config.base_url,
            token: new_config.token,
            version,
            timeout_seconds: new_config.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS),
            max_retries: new_config.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            description: new_config.description,
            active: new_config.active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        let config = self.configurations.insert(config).await?;

        info!(config.id = %config.id, "configuration created");
        Ok(config)
    }

    /// # Errors
    /// `RecordNotFound` or storage errors.
    pub async fn get_configuration(
        &self,
        id: ConfigurationId,
    ) -> Result<ApiConfiguration, DomainError> {
        self.configurations
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(RecordKind::Configuration, id))
    }

    /// All configurations of a tenant, ordered by API name.
    ///
    /// # Errors
    /// `RecordNotFound` for an unknown tenant, storage errors.
    pub async fn list_configurations(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<ApiConfiguration>, DomainError> {
        self.get_tenant(tenant_id).await?;
        let mut configs = self.configurations.list_by_tenant(tenant_id).await?;
        configs.sort_by(|a, b| a.api_name.cmp(&b.api_name).then(a.id.cmp(&b.id)));
        Ok(configs)
    }

    /// # Errors
    /// `RecordNotFound`, `Validation`, `Conflict` or storage errors.
    #[instrument(skip_all, fields(config.id = %id))]
    pub async fn update_configuration(
        &self,
        id: ConfigurationId,
        patch: ApiConfigurationPatch,
    ) -> Result<ApiConfiguration, DomainError> {
        let mut config = self.get_configuration(id).await?;

        if let Some(api_name) = patch.api_name {
            require_non_empty("api_name", &api_name)?;
            config.api_name = api_name;
        }
        if let Some(base_url) = patch.base_url {
            validate_base_url(&base_url)?;
            config.base_url = base_url;
        }
        if let Some(token) = patch.token {
            config.token = token;
        }
        if let Some(version) = patch.version {
            require_non_empty("version", &version)?;
            config.version = version;
        }
        if let Some(timeout_seconds) = patch.timeout_seconds {
            config.timeout_seconds = timeout_seconds;
        }
        if let Some(max_retries) = patch.max_retries {
            config.max_retries = max_retries;
        }
        if let Some(description) = patch.description {
            config.description = description;
        }
        if let Some(active) = patch.active {
            config.active = active;
        }
        config.updated_at = Utc::now();

        let config = self.configurations.update(config).await?;
        info!("configuration updated");
        Ok(config)
    }

    /// # Errors
    /// `RecordNotFound` or storage errors.
    pub async fn deactivate_configuration(
        &self,
        id: ConfigurationId,
    ) -> Result<ApiConfiguration, DomainError> {
        self.update_configuration(
            id,
            ApiConfigurationPatch {
                active: Some(false),
                ..ApiConfigurationPatch::default()
            },
        )
        .await
    }

    /// Delete a configuration and its templates.
    ///
    /// # Errors
    /// `RecordNotFound` or storage errors.
    #[instrument(skip_all, fields(config.id = %id))]
    pub async fn delete_configuration(&self, id: ConfigurationId) -> Result<(), DomainError> {
        if !self.configurations.delete(id).await? {
            return Err(DomainError::not_found(RecordKind::Configuration, id));
        }
        info!("configuration deleted");
        Ok(())
    }

    // === Templates ===

    /// # Errors
    /// `RecordNotFound` for an unknown configuration, `Validation`,
    /// `InvalidTemplateSpecification`, `Conflict`, storage errors.
    #[instrument(skip_all, fields(config.id = %new_template.config_id, template_name = %new_template.template_name))]
    pub async fn create_template(
        &self,
        new_template: NewParameterTemplate,
    ) -> Result<ParameterTemplate, DomainError> {
        self.get_configuration(new_template.config_id).await?;

        require_non_empty("template_name", &new_template.template_name)?;
        validate_endpoint_path(&new_template.endpoint_path)?;
        ParameterSpec::parse(&new_template.parameter_spec)?;

        let now = Utc::now();
        let template = ParameterTemplate {
            id: new_template.id.unwrap_or_else(Uuid::new_v4),
            config_id: new_template.config_id,
            template_name: new_template.template_name,
            description: new_template.description,
            http_method: new_template.http_method.unwrap_or_default(),
            endpoint_path: new_template.endpoint_path,
            parameter_spec: new_template.parameter_spec,
            response_mapping: new_template.response_mapping,
            active: new_template.active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        let template = self.templates.insert(template).await?;

        info!(template.id = %template.id, "template created");
        Ok(template)
    }

    /// # Errors
    /// `RecordNotFound` or storage errors.
    pub async fn get_template(&self, id: TemplateId) -> Result<ParameterTemplate, DomainError> {
        self.templates
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(RecordKind::Template, id))
    }

    /// All templates of a configuration, ordered by name.
    ///
    /// # Errors
    /// `RecordNotFound` for an unknown configuration, storage errors.
    pub async fn list_templates(
        &self,
        config_id: ConfigurationId,
    ) -> Result<Vec<ParameterTemplate>, DomainError> {
        self.get_configuration(config_id).await?;
        let mut templates = self.templates.list_by_configuration(config_id).await?;
        templates.sort_by(|a, b| a.template_name.cmp(&b.template_name).then(a.id.cmp(&b.id)));
        Ok(templates)
    }

    /// # Errors
    /// `RecordNotFound`, `Validation`, `InvalidTemplateSpecification`,
    /// `Conflict` or storage errors.
    #[instrument(skip_all, fields(template.id = %id))]
    pub async fn update_template(
        &self,
        id: TemplateId,
        patch: ParameterTemplatePatch,
    ) -> Result<ParameterTemplate, DomainError> {
        let mut template = self.get_template(id).await?;

        if let Some(template_name) = patch.template_name {
            require_non_empty("template_name", &template_name)?;
            template.template_name = template_name;
        }
        if let Some(description) = patch.description {
            template.description = description;
        }
        if let Some(http_method) = patch.http_method {
            template.http_method = http_method;
        }
        if let Some(endpoint_path) = patch.endpoint_path {
            validate_endpoint_path(&endpoint_path)?;
            template.endpoint_path = endpoint_path;
        }
        if let Some(parameter_spec) = patch.parameter_spec {
            ParameterSpec::parse(&parameter_spec)?;
            template.parameter_spec = parameter_spec;
        }
        if let Some(response_mapping) = patch.response_mapping {
            template.response_mapping = response_mapping;
        }
        if let Some(active) = patch.active {
            template.active = active;
        }
        template.updated_at = Utc::now();

        let template = self.templates.update(template).await?;
        info!("template updated");
        Ok(template)
    }

    /// # Errors
    /// `RecordNotFound` or storage errors.
    pub async fn deactivate_template(
        &self,
        id: TemplateId,
    ) -> Result<ParameterTemplate, DomainError> {
        self.update_template(
            id,
            ParameterTemplatePatch {
                active: Some(false),
                ..ParameterTemplatePatch::default()
            },
        )
        .await
    }

    /// # Errors
    /// `RecordNotFound` or storage errors.
    #[instrument(skip_all, fields(template.id = %id))]
    pub async fn delete_template(&self, id: TemplateId) -> Result<(), DomainError> {
        if !self.templates.delete(id).await? {
            return Err(DomainError::not_found(RecordKind::Template, id));
        }
        info!("template deleted");
        Ok(())
    }
}
