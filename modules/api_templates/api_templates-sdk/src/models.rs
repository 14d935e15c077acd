//! api_templates domain models.
//!
//! Tenants and configurations carry secrets and therefore do not derive
//! `Serialize`. Templates and compiled requests are plain data.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::ApiTemplatesError;
use crate::secret::SecretString;

pub type TenantId = Uuid;
pub type ConfigurationId = Uuid;
pub type TemplateId = Uuid;

/// Runtime input handed to the compiler: named values in caller order.
pub type RequestInput = serde_json::Map<String, serde_json::Value>;

pub const DEFAULT_API_VERSION: &str = "v1";
pub const DEFAULT_TIMEOUT_SECONDS: u32 = 30;
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// SHA-256 digest of a tenant credential, lowercase hex.
///
/// Tenants are looked up by digest so the plaintext credential is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CredentialDigest(String);

impl CredentialDigest {
    /// Digest a plaintext credential.
    #[must_use]
    pub fn of(credential: &SecretString) -> Self {
        Self(hex::encode(Sha256::digest(credential.expose().as_bytes())))
    }

    /// Wrap a digest read back from storage.
    #[must_use]
    pub fn from_hex(hex_digest: impl Into<String>) -> Self {
        Self(hex_digest.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A tenant ("client") owning API configurations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub description: Option<String>,
    pub credential_digest: CredentialDigest,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Data for creating a tenant.
#[derive(Debug, Clone, Default)]
pub struct NewTenant {
    /// Optional ID (generated if not provided).
    pub id: Option<TenantId>,
    pub name: String,
    pub description: Option<String>,
    /// Credential to register. A random one is issued when absent.
    pub credential: Option<SecretString>,
    /// Defaults to `true`.
    pub active: Option<bool>,
}

/// Partial update for a tenant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantPatch {
    pub name: Option<String>,
    /// Use `Some(None)` to clear.
    #[allow(clippy::option_option)]
    pub description: Option<Option<String>>,
    pub active: Option<bool>,
}

/// A tenant together with its plaintext credential.
///
/// Returned only by credential-issuing writes; this is the one place the
/// plaintext leaves the store.
#[derive(Debug, Clone)]
pub struct IssuedTenant {
    pub tenant: Tenant,
    pub credential: SecretString,
}

/// Per-tenant connection profile for one logical API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfiguration {
    pub id: ConfigurationId,
    pub tenant_id: TenantId,
    pub api_name: String,
    pub base_url: String,
    pub token: SecretString,
    pub version: String,
    pub timeout_seconds: u32,
    pub max_retries: u32,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for creating an API configuration.
#[derive(Debug, Clone)]
pub struct NewApiConfiguration {
    /// Optional ID (generated if not provided).
    pub id: Option<ConfigurationId>,
    pub tenant_id: TenantId,
    pub api_name: String,
    pub base_url: String,
    pub token: SecretString,
    /// Defaults to [`DEFAULT_API_VERSION`].
    pub version: Option<String>,
    /// Defaults to [`DEFAULT_TIMEOUT_SECONDS`].
    pub timeout_seconds: Option<u32>,
    /// Defaults to [`DEFAULT_MAX_RETRIES`].
    pub max_retries: Option<u32>,
    pub description: Option<String>,
    /// Defaults to `true`.
    pub active: Option<bool>,
}

impl NewApiConfiguration {
    #[must_use]
    pub fn new(
        tenant_id: TenantId,
        api_name: impl Into<String>,
        base_url: impl Into<String>,
        token: SecretString,
    ) -> Self {
        Self {
            id: None,
            tenant_id,
            api_name: api_name.into(),
            base_url: base_url.into(),
            token,
            version: None,
            timeout_seconds: None,
            max_retries: None,
            description: None,
            active: None,
        }
    }
}

/// Partial update for an API configuration.
#[derive(Debug, Clone, Default)]
pub struct ApiConfigurationPatch {
    pub api_name: Option<String>,
    pub base_url: Option<String>,
    pub token: Option<SecretString>,
    pub version: Option<String>,
    pub timeout_seconds: Option<u32>,
    pub max_retries: Option<u32>,
    /// Use `Some(None)` to clear.
    #[allow(clippy::option_option)]
    pub description: Option<Option<String>>,
    pub active: Option<bool>,
}

/// HTTP method of a compiled request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ApiTemplatesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            other => Err(ApiTemplatesError::validation(format!(
                "unsupported HTTP method: {other}"
            ))),
        }
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = ApiTemplatesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Opaque extraction expression, e.g. `$.data.base_salary`. Never evaluated here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractionPath(String);

impl ExtractionPath {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ExtractionPath {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for ExtractionPath {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Output key -> extraction expression, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseMapping(IndexMap<String, ExtractionPath>);

impl ResponseMapping {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, path: impl Into<ExtractionPath>) {
        self.0.insert(key.into(), path.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ExtractionPath> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ExtractionPath)> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for ResponseMapping
where
    K: Into<String>,
    V: Into<ExtractionPath>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Reusable definition of one kind of outbound request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterTemplate {
    pub id: TemplateId,
    pub config_id: ConfigurationId,
    pub template_name: String,
    pub description: Option<String>,
    pub http_method: HttpMethod,
    /// Path pattern, may contain `{name}` placeholders.
    pub endpoint_path: String,
    /// Raw `{path_params, query_params, headers}` object. Validated on write
    /// and again on every compile.
    pub parameter_spec: serde_json::Value,
    pub response_mapping: ResponseMapping,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for creating a parameter template.
#[derive(Debug, Clone, PartialEq)]
pub struct NewParameterTemplate {
    /// Optional ID (generated if not provided).
    pub id: Option<TemplateId>,
    pub config_id: ConfigurationId,
    pub template_name: String,
    pub description: Option<String>,
    /// Defaults to `GET`.
    pub http_method: Option<HttpMethod>,
    pub endpoint_path: String,
    pub parameter_spec: serde_json::Value,
    pub response_mapping: ResponseMapping,
    /// Defaults to `true`.
    pub active: Option<bool>,
}

impl NewParameterTemplate {
    #[must_use]
    pub fn new(
        config_id: ConfigurationId,
        template_name: impl Into<String>,
        endpoint_path: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            config_id,
            template_name: template_name.into(),
            description: None,
            http_method: None,
            endpoint_path: endpoint_path.into(),
            parameter_spec: serde_json::Value::Object(serde_json::Map::new()),
            response_mapping: ResponseMapping::new(),
            active: None,
        }
    }
}

/// Partial update for a parameter template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterTemplatePatch {
    pub template_name: Option<String>,
    /// Use `Some(None)` to clear.
    #[allow(clippy::option_option)]
    pub description: Option<Option<String>>,
    pub http_method: Option<HttpMethod>,
    pub endpoint_path: Option<String>,
    pub parameter_spec: Option<serde_json::Value>,
    pub response_mapping: Option<ResponseMapping>,
    pub active: Option<bool>,
}

/// Fully compiled, dispatch-ready outbound call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub url: String,
    pub method: HttpMethod,
    pub query_parameters: IndexMap<String, String>,
    pub headers: IndexMap<String, String>,
    pub response_mapping: ResponseMapping,
}

/// A compiled request plus the dispatch settings of its configuration.
///
/// The configuration token is intentionally not part of this value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedRequest {
    pub request: RequestDescriptor,
    pub configuration_id: ConfigurationId,
    pub api_name: String,
    pub template_name: String,
    pub version: String,
    pub timeout_seconds: u32,
    pub max_retries: u32,
}
