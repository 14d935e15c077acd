//! Configuration resolver: credential + API name -> active configuration.

use std::sync::Arc;

use api_templates_sdk::{ApiConfiguration, CredentialDigest, SecretString, Tenant};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::error::DomainError;
use super::repo::{ConfigurationRepository, TenantRepository};

/// Pick the candidate with the lowest id.
///
/// Several active matches mean the uniqueness rule was broken by authoring;
/// resolution stays deterministic and the ids are logged.
pub fn pick_lowest<T>(candidates: Vec<T>, id_of: impl Fn(&T) -> Uuid, what: &str) -> Option<T> {
    if candidates.len() > 1 {
        let ids: Vec<String> = candidates.iter().map(|c| id_of(c).to_string()).collect();
        warn!(
            record = what,
            candidates = %ids.join(","),
            "multiple active matches, lowest id wins"
        );
    }
    candidates.into_iter().min_by_key(&id_of)
}

pub struct Resolver {
    tenants: Arc<dyn TenantRepository>,
    configurations: Arc<dyn ConfigurationRepository>,
}

impl Resolver {
    #[must_use]
    pub fn new(
        tenants: Arc<dyn TenantRepository>,
        configurations: Arc<dyn ConfigurationRepository>,
    ) -> Self {
        Self {
            tenants,
            configurations,
        }
    }

    /// Find the active tenant holding `credential`.
    ///
    /// # Errors
    /// `TenantNotFound` or a storage error.
    pub async fn tenant_for(&self, credential: &SecretString) -> Result<Tenant, DomainError> {
        let digest = CredentialDigest::of(credential);
        let candidates: Vec<Tenant> = self
            .tenants
            .find_active_by_credential(&digest)
            .await?
            .into_iter()
            .filter(|t| t.active)
            .collect();

        pick_lowest(candidates, |t| t.id, "tenant").ok_or(DomainError::TenantNotFound)
    }

    /// Resolve the active configuration `api_name` of the tenant holding `credential`.
    ///
    /// # Errors
    /// `TenantNotFound`, `ConfigurationNotFound` or a storage error.
    #[instrument(skip_all, fields(api_name = %api_name))]
    pub async fn resolve(
        &self,
        credential: &SecretString,
        api_name: &str,
    ) -> Result<ApiConfiguration, DomainError> {
        let tenant = self.tenant_for(credential).await?;

        let candidates: Vec<ApiConfiguration> = self
            .configurations
            .find_active(tenant.id, api_name)
            .await?
            .into_iter()
            .filter(|c| c.active)
            .collect();

        let config = pick_lowest(candidates, |c| c.id, "api_configuration")
            .ok_or_else(|| DomainError::configuration_not_found(api_name))?;

        debug!(tenant.id = %tenant.id, config.id = %config.id, "configuration resolved");
        Ok(config)
    }
}
