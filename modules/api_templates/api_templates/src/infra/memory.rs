//! In-memory catalog served from immutable snapshots.
//!
//! Readers load the current `Arc<CatalogSnapshot>` without locking. Writers
//! and `reload` serialise on a mutex, build the next snapshot from a copy,
//! validate it and publish it in one atomic swap. A failed write leaves the
//! published snapshot untouched.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use api_templates_sdk::{
    ApiConfiguration, ConfigurationId, CredentialDigest, DEFAULT_API_VERSION,
    DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECONDS, ParameterTemplate, TemplateId, Tenant, TenantId,
};
use arc_swap::ArcSwap;
use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::CatalogConfig;
use crate::domain::error::{DomainError, RecordKind};
use crate::domain::parameter_spec::ParameterSpec;
use crate::domain::repo::{ConfigurationRepository, TemplateRepository, TenantRepository};

/// Immutable view of tenants, configurations and templates.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    tenants: IndexMap<TenantId, Tenant>,
    configurations: IndexMap<ConfigurationId, ApiConfiguration>,
    templates: IndexMap<TemplateId, ParameterTemplate>,
    by_credential: HashMap<CredentialDigest, TenantId>,
}

impl CatalogSnapshot {
    /// Build a validated snapshot from loose records.
    ///
    /// # Errors
    /// `Conflict` for duplicate ids, credentials, tenant names or active
    /// names; `Validation` for dangling parents; `InvalidTemplateSpecification`
    /// for malformed parameter specifications.
    pub fn build(
        tenants: Vec<Tenant>,
        configurations: Vec<ApiConfiguration>,
        templates: Vec<ParameterTemplate>,
    ) -> Result<Self, DomainError> {
        let mut snapshot = Self::default();
        for tenant in tenants {
            if snapshot.tenants.insert(tenant.id, tenant).is_some() {
                return Err(DomainError::conflict("duplicate tenant id"));
            }
        }
        for config in configurations {
            if snapshot.configurations.insert(config.id, config).is_some() {
                return Err(DomainError::conflict("duplicate API configuration id"));
            }
        }
        for template in templates {
            if snapshot.templates.insert(template.id, template).is_some() {
                return Err(DomainError::conflict("duplicate parameter template id"));
            }
        }
        snapshot.validate()?;
        for template in snapshot.templates.values() {
            ParameterSpec::parse(&template.parameter_spec)?;
        }
        Ok(snapshot)
    }

    /// Build a snapshot from the `catalog` config section.
    ///
    /// Credentials are digested here; the plaintext is not retained.
    ///
    /// # Errors
    /// Same as [`build`](Self::build).
    pub fn from_config(catalog: &CatalogConfig) -> Result<Self, DomainError> {
        let now = Utc::now();
        let mut tenants = Vec::new();
        let mut configurations = Vec::new();
        let mut templates = Vec::new();

        for tc in &catalog.tenants {
            let tenant_id = tc.id.unwrap_or_else(Uuid::new_v4);
            tenants.push(Tenant {
                id: tenant_id,
                name: tc.name.clone(),
                description: tc.description.clone(),
                credential_digest: CredentialDigest::of(&tc.credential),
                active: tc.active,
                created_at: now,
            });

            for cc in &tc.configurations {
                let config_id = cc.id.unwrap_or_else(Uuid::new_v4);
                configurations.push(ApiConfiguration {
                    id: config_id,
                    tenant_id,
                    api_name: cc.api_name.clone(),
                    base_url: cc.base_url.clone(),
                    token: cc.token.clone(),
                    version: cc
                        .version
                        .clone()
                        .unwrap_or_else(|| DEFAULT_API_VERSION.to_owned()),
                    timeout_seconds: cc.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS),
                    max_retries: cc.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
                    description: cc.description.clone(),
                    active: cc.active,
                    created_at: now,
                    updated_at: now,
                });

                for t in &cc.templates {
                    templates.push(ParameterTemplate {
                        id: t.id.unwrap_or_else(Uuid::new_v4),
                        config_id,
                        template_name: t.template_name.clone(),
                        description: t.description.clone(),
                        http_method: t.http_method.unwrap_or_default(),
                        endpoint_path: t.endpoint_path.clone(),
                        parameter_spec: t.parameter_spec.clone(),
                        response_mapping: t.response_mapping.clone(),
                        active: t.active,
                        created_at: now,
                        updated_at: now,
                    });
                }
            }
        }

        Self::build(tenants, configurations, templates)
    }

    /// Check referential integrity and the uniqueness rules, and rebuild the
    /// credential index.
    fn validate(&mut self) -> Result<(), DomainError> {
        let mut by_credential = HashMap::with_capacity(self.tenants.len());
        let mut names = HashSet::with_capacity(self.tenants.len());
        for tenant in self.tenants.values() {
            if by_credential
                .insert(tenant.credential_digest.clone(), tenant.id)
                .is_some()
            {
                return Err(DomainError::conflict(
                    "credential is already registered to another tenant",
                ));
            }
            if !names.insert(tenant.name.as_str()) {
                return Err(DomainError::conflict(format!(
                    "tenant name '{}' already exists",
                    tenant.name
                )));
            }
        }

        let mut active_configs = HashSet::new();
        for config in self.configurations.values() {
            if !self.tenants.contains_key(&config.tenant_id) {
                return Err(DomainError::validation(
                    "tenant_id",
                    format!("unknown tenant {}", config.tenant_id),
                ));
            }
            if config.active && !active_configs.insert((config.tenant_id, config.api_name.as_str()))
            {
                return Err(DomainError::conflict(format!(
                    "active API configuration '{}' already exists for tenant {}",
                    config.api_name, config.tenant_id
                )));
            }
        }

        let mut active_templates = HashSet::new();
        for template in self.templates.values() {
            if !self.configurations.contains_key(&template.config_id) {
                return Err(DomainError::validation(
                    "config_id",
                    format!("unknown API configuration {}", template.config_id),
                ));
            }
            if template.active
                && !active_templates.insert((template.config_id, template.template_name.as_str()))
            {
                return Err(DomainError::conflict(format!(
                    "active template '{}' already exists for configuration {}",
                    template.template_name, template.config_id
                )));
            }
        }

        self.by_credential = by_credential;
        Ok(())
    }

    pub fn tenants(&self) -> impl Iterator<Item = &Tenant> {
        self.tenants.values()
    }

    pub fn configurations(&self) -> impl Iterator<Item = &ApiConfiguration> {
        self.configurations.values()
    }

    pub fn templates(&self) -> impl Iterator<Item = &ParameterTemplate> {
        self.templates.values()
    }

    #[must_use]
    pub fn tenant_count(&self) -> usize {
        self.tenants.len()
    }

    #[must_use]
    pub fn configuration_count(&self) -> usize {
        self.configurations.len()
    }

    #[must_use]
    pub fn template_count(&self) -> usize {
        self.templates.len()
    }
}

/// Catalog publishing [`CatalogSnapshot`]s through `ArcSwap`.
pub struct InMemoryCatalog {
    current: ArcSwap<CatalogSnapshot>,
    write_lock: Mutex<()>,
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new(CatalogSnapshot::default())
    }
}

impl InMemoryCatalog {
    #[must_use]
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            current: ArcSwap::from_pointee(snapshot),
            write_lock: Mutex::new(()),
        }
    }

    /// The currently published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.current.load_full()
    }

    /// Replace the whole catalog. In-flight readers keep the snapshot they loaded.
    pub fn reload(&self, snapshot: CatalogSnapshot) {
        let _guard = self.write_lock.lock();
        info!(
            tenants = snapshot.tenant_count(),
            configurations = snapshot.configuration_count(),
            templates = snapshot.template_count(),
            "catalog reloaded"
        );
        self.current.store(Arc::new(snapshot));
    }

    fn mutate<R>(
        &self,
        change: impl FnOnce(&mut CatalogSnapshot) -> Result<R, DomainError>,
    ) -> Result<R, DomainError> {
        let _guard = self.write_lock.lock();
        let mut next = CatalogSnapshot::clone(&self.current.load());
        let out = change(&mut next)?;
        if let Err(err) = next.validate() {
            if matches!(err, DomainError::Conflict { .. }) {
                warn!(error = %err, "catalog write rejected");
            }
            return Err(err);
        }
        self.current.store(Arc::new(next));
        Ok(out)
    }
}

fn ensure_absent<T>(map: &IndexMap<Uuid, T>, id: Uuid, kind: RecordKind) -> Result<(), DomainError> {
    if map.contains_key(&id) {
        return Err(DomainError::conflict(format!("{kind} {id} already exists")));
    }
    Ok(())
}

fn replace<T: Clone>(
    map: &mut IndexMap<Uuid, T>,
    id: Uuid,
    record: T,
    kind: RecordKind,
) -> Result<T, DomainError> {
    let slot = map
        .get_mut(&id)
        .ok_or_else(|| DomainError::not_found(kind, id))?;
    *slot = record.clone();
    Ok(record)
}

#[async_trait]
impl TenantRepository for InMemoryCatalog {
    async fn find_active_by_credential(
        &self,
        digest: &CredentialDigest,
    ) -> Result<Vec<Tenant>, DomainError> {
        let snapshot = self.current.load();
        Ok(snapshot
            .by_credential
            .get(digest)
            .and_then(|id| snapshot.tenants.get(id))
            .filter(|t| t.active)
            .cloned()
            .into_iter()
            .collect())
    }

    async fn find_by_id(&self, id: TenantId) -> Result<Option<Tenant>, DomainError> {
        Ok(self.current.load().tenants.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Tenant>, DomainError> {
        Ok(self.current.load().tenants.values().cloned().collect())
    }

    async fn insert(&self, tenant: Tenant) -> Result<Tenant, DomainError> {
        self.mutate(|next| {
            ensure_absent(&next.tenants, tenant.id, RecordKind::Tenant)?;
            next.tenants.insert(tenant.id, tenant.clone());
            Ok(tenant)
        })
    }

    async fn update(&self, tenant: Tenant) -> Result<Tenant, DomainError> {
        self.mutate(|next| replace(&mut next.tenants, tenant.id, tenant, RecordKind::Tenant))
    }

    async fn delete(&self, id: TenantId) -> Result<bool, DomainError> {
        self.mutate(|next| {
            if next.tenants.shift_remove(&id).is_none() {
                return Ok(false);
            }
            next.configurations.retain(|_, c| c.tenant_id != id);
            let live: HashSet<ConfigurationId> = next.configurations.keys().copied().collect();
            next.templates.retain(|_, t| live.contains(&t.config_id));
            Ok(true)
        })
    }
}

#[async_trait]
impl ConfigurationRepository for InMemoryCatalog {
    async fn find_active(
        &self,
        tenant_id: TenantId,
        api_name: &str,
    ) -> Result<Vec<ApiConfiguration>, DomainError> {
        Ok(self
            .current
            .load()
            .configurations
            .values()
            .filter(|c| c.active && c.tenant_id == tenant_id && c.api_name == api_name)
            .cloned()
            .collect())
    }

    async fn find_by_id(
        &self,
        id: ConfigurationId,
    ) -> Result<Option<ApiConfiguration>, DomainError> {
        Ok(self.current.load().configurations.get(&id).cloned())
    }

    async fn list_by_tenant(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<ApiConfiguration>, DomainError> {
        Ok(self
            .current
            .load()
            .configurations
            .values()
            .filter(|c| c.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn insert(&self, config: ApiConfiguration) -> Result<ApiConfiguration, DomainError> {
        self.mutate(|next| {
            ensure_absent(&next.configurations, config.id, RecordKind::Configuration)?;
            next.configurations.insert(config.id, config.clone());
            Ok(config)
        })
    }

    async fn update(&self, config: ApiConfiguration) -> Result<ApiConfiguration, DomainError> {
        self.mutate(|next| {
            replace(
                &mut next.configurations,
                config.id,
                config,
                RecordKind::Configuration,
            )
        })
    }

    async fn delete(&self, id: ConfigurationId) -> Result<bool, DomainError> {
        self.mutate(|next| {
            if next.configurations.shift_remove(&id).is_none() {
                return Ok(false);
            }
            next.templates.retain(|_, t| t.config_id != id);
            Ok(true)
        })
    }
}

#[async_trait]
impl TemplateRepository for InMemoryCatalog {
    async fn find_active(
        &self,
        config_id: ConfigurationId,
        template_name: &str,
    ) -> Result<Vec<ParameterTemplate>, DomainError> {
        Ok(self
            .current
            .load()
            .templates
            .values()
            .filter(|t| t.active && t.config_id == config_id && t.template_name == template_name)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: TemplateId) -> Result<Option<ParameterTemplate>, DomainError> {
        Ok(self.current.load().templates.get(&id).cloned())
    }

    async fn list_by_configuration(
        &self,
        config_id: ConfigurationId,
    ) -> Result<Vec<ParameterTemplate>, DomainError> {
        Ok(self
            .current
            .load()
            .templates
            .values()
            .filter(|t| t.config_id == config_id)
            .cloned()
            .collect())
    }

    async fn insert(&self, template: ParameterTemplate) -> Result<ParameterTemplate, DomainError> {
        self.mutate(|next| {
            ensure_absent(&next.templates, template.id, RecordKind::Template)?;
            next.templates.insert(template.id, template.clone());
            Ok(template)
        })
    }

    async fn update(&self, template: ParameterTemplate) -> Result<ParameterTemplate, DomainError> {
        self.mutate(|next| {
            replace(&mut next.templates, template.id, template, RecordKind::Template)
        })
    }

    async fn delete(&self, id: TemplateId) -> Result<bool, DomainError> {
        self.mutate(|next| Ok(next.templates.shift_remove(&id).is_some()))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::config::{ApiConfigurationConfig, TemplateConfig, TenantConfig};
    use api_templates_sdk::{ResponseMapping, SecretString};
    use serde_json::json;

    fn tenant_config(name: &str, credential: &str) -> TenantConfig {
        TenantConfig {
            id: None,
            name: name.to_owned(),
            description: None,
            credential: SecretString::new(credential),
            active: true,
            configurations: Vec::new(),
        }
    }

    fn configuration_config(api_name: &str) -> ApiConfigurationConfig {
        ApiConfigurationConfig {
            id: None,
            api_name: api_name.to_owned(),
            base_url: "https://api.test".to_owned(),
            token: SecretString::new("tok"),
            version: None,
            timeout_seconds: None,
            max_retries: None,
            description: None,
            active: true,
            templates: Vec::new(),
        }
    }

    fn template_config(name: &str) -> TemplateConfig {
        TemplateConfig {
            id: None,
            template_name: name.to_owned(),
            description: None,
            http_method: None,
            endpoint_path: "/x".to_owned(),
            parameter_spec: json!({}),
            response_mapping: ResponseMapping::new(),
            active: true,
        }
    }

    #[test]
    fn from_config_fills_defaults() {
        let mut tenant = tenant_config("IndiaNIC", "k1");
        let mut config = configuration_config("employee");
        config.templates.push(template_config("salary_lookup"));
        tenant.configurations.push(config);

        let snapshot = CatalogSnapshot::from_config(&CatalogConfig {
            path: None,
            tenants: vec![tenant],
        })
        .unwrap();

        let config = snapshot.configurations().next().unwrap();
        assert_eq!(config.version, "v1");
        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(config.max_retries, 3);
        assert_eq!(snapshot.template_count(), 1);
    }

    #[test]
    fn duplicate_active_configuration_is_rejected() {
        let mut tenant = tenant_config("IndiaNIC", "k1");
        tenant.configurations.push(configuration_config("employee"));
        tenant.configurations.push(configuration_config("employee"));

        let err = CatalogSnapshot::from_config(&CatalogConfig {
            path: None,
            tenants: vec![tenant],
        })
        .unwrap_err();
        assert!(matches!(err, DomainError::Conflict { .. }));
    }

    #[test]
    fn inactive_duplicate_is_allowed() {
        let mut tenant = tenant_config("IndiaNIC", "k1");
        tenant.configurations.push(configuration_config("employee"));
        let mut retired = configuration_config("employee");
        retired.active = false;
        tenant.configurations.push(retired);

        let snapshot = CatalogSnapshot::from_config(&CatalogConfig {
            path: None,
            tenants: vec![tenant],
        })
        .unwrap();
        assert_eq!(snapshot.configuration_count(), 2);
    }

    #[test]
    fn shared_credential_is_rejected_without_echoing_it() {
        let err = CatalogSnapshot::from_config(&CatalogConfig {
            path: None,
            tenants: vec![tenant_config("A", "same-key"), tenant_config("B", "same-key")],
        })
        .unwrap_err();
        assert!(matches!(err, DomainError::Conflict { .. }));
        assert!(!err.to_string().contains("same-key"));
    }

    #[test]
    fn malformed_template_spec_is_rejected() {
        let mut tenant = tenant_config("IndiaNIC", "k1");
        let mut config = configuration_config("employee");
        let mut template = template_config("broken");
        template.parameter_spec = json!({ "headers": { "X-N": 1 } });
        config.templates.push(template);
        tenant.configurations.push(config);

        let err = CatalogSnapshot::from_config(&CatalogConfig {
            path: None,
            tenants: vec![tenant],
        })
        .unwrap_err();
        assert!(matches!(err, DomainError::Compile(_)));
    }

    #[tokio::test]
    async fn failed_write_keeps_published_snapshot() {
        let mut tenant = tenant_config("IndiaNIC", "k1");
        tenant.configurations.push(configuration_config("employee"));
        let catalog = InMemoryCatalog::new(
            CatalogSnapshot::from_config(&CatalogConfig {
                path: None,
                tenants: vec![tenant],
            })
            .unwrap(),
        );
        let before = catalog.snapshot();
        let mut duplicate = before.configurations().next().unwrap().clone();
        duplicate.id = Uuid::new_v4();

        let err = ConfigurationRepository::insert(&catalog, duplicate)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Conflict { .. }));
        assert!(Arc::ptr_eq(&before, &catalog.snapshot()));
    }

    #[tokio::test]
    async fn deleting_a_tenant_cascades() {
        let mut tenant = tenant_config("IndiaNIC", "k1");
        let mut config = configuration_config("employee");
        config.templates.push(template_config("salary_lookup"));
        tenant.configurations.push(config);
        let catalog = InMemoryCatalog::new(
            CatalogSnapshot::from_config(&CatalogConfig {
                path: None,
                tenants: vec![tenant],
            })
            .unwrap(),
        );
        let tenant_id = catalog.snapshot().tenants().next().unwrap().id;

        assert!(TenantRepository::delete(&catalog, tenant_id).await.unwrap());

        let snapshot = catalog.snapshot();
        assert_eq!(snapshot.tenant_count(), 0);
        assert_eq!(snapshot.configuration_count(), 0);
        assert_eq!(snapshot.template_count(), 0);
    }
}
