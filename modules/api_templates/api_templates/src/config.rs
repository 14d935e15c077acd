//! Configuration for the api_templates module.
//!
//! Layered with figment: defaults -> optional YAML file -> environment
//! (`API_TEMPLATES__*`, nested keys split on `__`) -> caller overrides.
//!
//! Figment dictionaries do not keep key order. After extraction the YAML file
//! is read again with `serde_saphyr` and each template's `parameter_spec` and
//! `response_mapping` is taken from that pass when its content is unchanged,
//! so query parameters keep their declared order. Values overridden from the
//! environment keep figment's sorted order. `catalog.path` JSON files are
//! parsed with insertion order intact.

use std::path::{Path, PathBuf};

use anyhow::Context;
use api_templates_sdk::{HttpMethod, ResponseMapping, SecretString};
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::domain::compiler::PathParameterPolicy;

pub const ENV_PREFIX: &str = "API_TEMPLATES__";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiTemplatesConfig {
    pub logging: LoggingConfig,
    pub compiler: CompilerConfig,
    pub storage: StorageConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    pub path_parameters: PathParameterPolicy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Serve the configured catalog from memory.
    #[default]
    Static,
    /// Serve from a SeaORM database (migrations run on start).
    Database,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub kind: StorageKind,
    pub dsn: String,
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::Static,
            dsn: "sqlite::memory:".to_owned(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// JSON file with a `{"tenants": [...]}` document, appended to `tenants`.
    pub path: Option<PathBuf>,
    pub tenants: Vec<TenantConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TenantConfig {
    /// Generated when absent.
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Plaintext in config; only its digest is kept after loading.
    pub credential: SecretString,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub configurations: Vec<ApiConfigurationConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfigurationConfig {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub api_name: String,
    pub base_url: String,
    pub token: SecretString,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub timeout_seconds: Option<u32>,
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub templates: Vec<TemplateConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateConfig {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub template_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub http_method: Option<HttpMethod>,
    pub endpoint_path: String,
    #[serde(default = "empty_object")]
    pub parameter_spec: serde_json::Value,
    #[serde(default)]
    pub response_mapping: ResponseMapping,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default)]
    tenants: Vec<TenantConfig>,
}

/// Second pass over the YAML file, keeping only order-sensitive values.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OrderedDocument {
    catalog: OrderedCatalog,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OrderedCatalog {
    tenants: Vec<OrderedTenant>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OrderedTenant {
    configurations: Vec<OrderedConfiguration>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OrderedConfiguration {
    templates: Vec<OrderedTemplate>,
}

#[derive(Debug, Deserialize)]
struct OrderedTemplate {
    #[serde(default = "empty_object")]
    parameter_spec: serde_json::Value,
    #[serde(default)]
    response_mapping: ResponseMapping,
}

const fn default_true() -> bool {
    true
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl ApiTemplatesConfig {
    /// Figment with the file and environment layers; callers may merge
    /// further overrides before [`from_figment`](Self::from_figment).
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load from an optional YAML file plus the environment.
    ///
    /// # Errors
    /// Malformed YAML, unknown keys, or an unreadable `catalog.path`.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        Self::from_sources(&Self::figment(path), path)
    }

    /// [`from_figment`](Self::from_figment), then restore declaration order
    /// from `yaml`, the file the figment's YAML layer was built from.
    ///
    /// # Errors
    /// Same as [`from_figment`](Self::from_figment).
    pub fn from_sources(figment: &Figment, yaml: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = Self::from_figment(figment)?;
        if let Some(path) = yaml {
            config.catalog.restore_yaml_order(path);
        }
        Ok(config)
    }

    /// Extract the typed config and append tenants from `catalog.path`.
    ///
    /// # Errors
    /// Extraction errors or an unreadable `catalog.path`.
    pub fn from_figment(figment: &Figment) -> anyhow::Result<Self> {
        let mut config: Self = figment
            .extract()
            .context("failed to extract api_templates configuration")?;

        if let Some(path) = config.catalog.path.clone() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read catalog file {}", path.display()))?;
            let file: CatalogFile = serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse catalog file {}", path.display()))?;
            config.catalog.tenants.extend(file.tenants);
        }

        Ok(config)
    }
}

impl CatalogConfig {
    fn restore_yaml_order(&mut self, path: &Path) {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "catalog order not restored");
                return;
            }
        };
        let document: OrderedDocument = match serde_saphyr::from_str(&raw) {
            Ok(document) => document,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "catalog order not restored");
                return;
            }
        };

        // YAML tenants come first; tenants appended from `catalog.path` are past the zip.
        for (tenant, ordered) in self.tenants.iter_mut().zip(document.catalog.tenants) {
            for (config, ordered) in tenant.configurations.iter_mut().zip(ordered.configurations) {
                for (template, ordered) in config.templates.iter_mut().zip(ordered.templates) {
                    // Map equality ignores order.
                    if template.parameter_spec == ordered.parameter_spec {
                        template.parameter_spec = ordered.parameter_spec;
                    }
                    if template.response_mapping == ordered.response_mapping {
                        template.response_mapping = ordered.response_mapping;
                    }
                }
            }
        }
    }
}
