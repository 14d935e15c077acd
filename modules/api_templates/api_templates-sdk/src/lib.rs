//! API Templates SDK
//!
//! This crate provides the public API for the `api_templates` module:
//!
//! - [`ApiTemplatesClient`] - read path: resolve, look up, compile
//! - [`ApiTemplatesAdminClient`] - administrative writes
//! - [`Tenant`], [`ApiConfiguration`], [`ParameterTemplate`], [`RequestDescriptor`] - models
//! - [`ApiTemplatesError`] - error taxonomy
//! - [`SecretString`] - redacting wrapper for credentials and tokens
//!
//! ## Usage
//!
//! ```ignore
//! use api_templates_sdk::{ApiTemplatesClient, SecretString};
//!
//! let credential = SecretString::new(header_value);
//! let input = serde_json::json!({ "employee_id": "234" });
//! let prepared = client
//!     .prepare_request(&credential, "employee", "salary_lookup", input.as_object().unwrap())
//!     .await?;
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod api;
pub mod error;
pub mod models;
pub mod secret;

pub use api::{ApiTemplatesAdminClient, ApiTemplatesClient};
pub use error::ApiTemplatesError;
pub use models::{
    ApiConfiguration, ApiConfigurationPatch, ConfigurationId, CredentialDigest,
    DEFAULT_API_VERSION, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECONDS, ExtractionPath, HttpMethod,
    IssuedTenant, NewApiConfiguration, NewParameterTemplate, NewTenant, ParameterTemplate,
    ParameterTemplatePatch, PreparedRequest, RequestDescriptor, RequestInput, ResponseMapping,
    TemplateId, Tenant, TenantId, TenantPatch,
};
pub use secret::SecretString;
