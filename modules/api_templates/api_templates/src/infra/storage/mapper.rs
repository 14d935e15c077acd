//! Entity to domain model mappers.

use anyhow::Context;
use api_templates_sdk::{
    ApiConfiguration, CredentialDigest, HttpMethod, ParameterTemplate, ResponseMapping,
    SecretString, Tenant,
};
use sea_orm::ActiveValue::Set;

use super::entity::{configuration, template, tenant};

impl From<tenant::Model> for Tenant {
    fn from(model: tenant::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            credential_digest: CredentialDigest::from_hex(model.credential_digest),
            active: model.active,
            created_at: model.created_at,
        }
    }
}

impl TryFrom<configuration::Model> for ApiConfiguration {
    type Error = anyhow::Error;

    fn try_from(model: configuration::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            tenant_id: model.tenant_id,
            api_name: model.api_name,
            base_url: model.base_url,
            token: SecretString::new(model.token),
            version: model.version,
            timeout_seconds: u32::try_from(model.timeout_seconds)
                .with_context(|| format!("timeout_seconds out of range for {}", model.id))?,
            max_retries: u32::try_from(model.max_retries)
                .with_context(|| format!("max_retries out of range for {}", model.id))?,
            description: model.description,
            active: model.active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

impl TryFrom<template::Model> for ParameterTemplate {
    type Error = anyhow::Error;

    fn try_from(model: template::Model) -> Result<Self, Self::Error> {
        let http_method: HttpMethod = model
            .http_method
            .parse()
            .with_context(|| format!("invalid http_method stored for template {}", model.id))?;
        let response_mapping: ResponseMapping = serde_json::from_value(model.response_mapping)
            .with_context(|| format!("invalid response_mapping stored for template {}", model.id))?;

        Ok(Self {
            id: model.id,
            config_id: model.config_id,
            template_name: model.template_name,
            description: model.description,
            http_method,
            endpoint_path: model.endpoint_path,
            parameter_spec: model.parameter_spec,
            response_mapping,
            active: model.active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[must_use]
pub fn tenant_to_active_model(tenant: &Tenant) -> tenant::ActiveModel {
    tenant::ActiveModel {
        id: Set(tenant.id),
        name: Set(tenant.name.clone()),
        description: Set(tenant.description.clone()),
        credential_digest: Set(tenant.credential_digest.as_str().to_owned()),
        active: Set(tenant.active),
        created_at: Set(tenant.created_at),
    }
}

#[must_use]
pub fn configuration_to_active_model(config: &ApiConfiguration) -> configuration::ActiveModel {
    configuration::ActiveModel {
        id: Set(config.id),
        tenant_id: Set(config.tenant_id),
        api_name: Set(config.api_name.clone()),
        base_url: Set(config.base_url.clone()),
        token: Set(config.token.expose().to_owned()),
        version: Set(config.version.clone()),
        timeout_seconds: Set(i64::from(config.timeout_seconds)),
        max_retries: Set(i64::from(config.max_retries)),
        description: Set(config.description.clone()),
        active: Set(config.active),
        created_at: Set(config.created_at),
        updated_at: Set(config.updated_at),
    }
}

/// # Errors
/// Fails only if the response mapping cannot be rendered as JSON.
pub fn template_to_active_model(
    template: &ParameterTemplate,
) -> anyhow::Result<template::ActiveModel> {
    Ok(template::ActiveModel {
        id: Set(template.id),
        config_id: Set(template.config_id),
        template_name: Set(template.template_name.clone()),
        description: Set(template.description.clone()),
        http_method: Set(template.http_method.as_str().to_owned()),
        endpoint_path: Set(template.endpoint_path.clone()),
        parameter_spec: Set(template.parameter_spec.clone()),
        response_mapping: Set(serde_json::to_value(&template.response_mapping)?),
        active: Set(template.active),
        created_at: Set(template.created_at),
        updated_at: Set(template.updated_at),
    })
}
