//! Domain service for api_templates.
//!
//! Orchestrates the read path: resolve the configuration for a tenant
//! credential, look up the template, compile the caller's input.

use std::sync::Arc;

use api_templates_sdk::{
    ApiConfiguration, ConfigurationId, ParameterTemplate, PreparedRequest, RequestDescriptor,
    RequestInput, SecretString,
};
use tracing::{debug, instrument};

use super::compiler::{self, CompileOptions};
use super::error::DomainError;
use super::repo::{ConfigurationRepository, TemplateRepository, TenantRepository};
use super::resolver::Resolver;
use super::template_store::TemplateStore;
use crate::config::ApiTemplatesConfig;

/// Service configuration extracted from module config.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceConfig {
    pub compile: CompileOptions,
}

impl From<&ApiTemplatesConfig> for ServiceConfig {
    fn from(cfg: &ApiTemplatesConfig) -> Self {
        Self {
            compile: CompileOptions {
                path_parameters: cfg.compiler.path_parameters,
            },
        }
    }
}

pub struct Service {
    resolver: Resolver,
    templates: TemplateStore,
    config: ServiceConfig,
}

impl Service {
    #[must_use]
    pub fn new(
        tenants: Arc<dyn TenantRepository>,
        configurations: Arc<dyn ConfigurationRepository>,
        templates: Arc<dyn TemplateRepository>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            resolver: Resolver::new(tenants, configurations),
            templates: TemplateStore::new(templates),
            config,
        }
    }

    /// # Errors
    /// `TenantNotFound`, `ConfigurationNotFound` or storage errors.
    pub async fn resolve(
        &self,
        credential: &SecretString,
        api_name: &str,
    ) -> Result<ApiConfiguration, DomainError> {
        self.resolver.resolve(credential, api_name).await
    }

    /// # Errors
    /// `TemplateNotFound` or storage errors.
    pub async fn get_template(
        &self,
        config_id: ConfigurationId,
        template_name: &str,
    ) -> Result<ParameterTemplate, DomainError> {
        self.templates.lookup(config_id, template_name).await
    }

    /// # Errors
    /// Storage errors only.
    pub async fn list_templates(
        &self,
        config_id: ConfigurationId,
    ) -> Result<Vec<ParameterTemplate>, DomainError> {
        self.templates.list_active(config_id).await
    }

    /// Compile with the configured path-parameter policy.
    ///
    /// # Errors
    /// Compiler errors wrapped in `DomainError::Compile`.
    pub fn compile(
        &self,
        template: &ParameterTemplate,
        input: &RequestInput,
        base_url: &str,
    ) -> Result<RequestDescriptor, DomainError> {
        Ok(compiler::compile_with(
            template,
            input,
            base_url,
            self.config.compile,
        )?)
    }

    /// Resolve, look up and compile in one call.
    ///
    /// # Errors
    /// Any error of the three steps.
    #[instrument(skip_all, fields(api_name = %api_name, template_name = %template_name))]
    pub async fn prepare_request(
        &self,
        credential: &SecretString,
        api_name: &str,
        template_name: &str,
        input: &RequestInput,
    ) -> Result<PreparedRequest, DomainError> {
        let config = self.resolver.resolve(credential, api_name).await?;
        let template = self.templates.lookup(config.id, template_name).await?;
        let request = self.compile(&template, input, &config.base_url)?;

        debug!(
            config.id = %config.id,
            method = %request.method,
            query_parameters = request.query_parameters.len(),
            "request prepared"
        );

        Ok(PreparedRequest {
            request,
            configuration_id: config.id,
            api_name: config.api_name,
            template_name: template.template_name,
            version: config.version,
            timeout_seconds: config.timeout_seconds,
            max_retries: config.max_retries,
        })
    }
}
