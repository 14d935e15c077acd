//! api_templates module implementation
//!
//! Resolves a tenant credential plus an API name to the tenant's
//! configuration for that API, and compiles stored request templates
//! against runtime input into dispatch-ready request descriptors.
//!
//! ```text
//!        credential, api_name, template_name, input
//!                         │
//!                         ▼
//! ┌────────────────────────────────────────────┐
//! │  Service                                   │
//! │   Resolver ──► TemplateStore ──► compile   │
//! └────────────────────────────────────────────┘
//!                         │ repo traits
//!            ┌────────────┴────────────┐
//!            ▼                         ▼
//!     InMemoryCatalog            SeaOrmCatalog
//!    (config snapshot)        (sqlite / migrations)
//! ```
//!
//! The public API is defined in `api_templates-sdk` and re-exported here.

// === PUBLIC API (from SDK) ===
pub use api_templates_sdk::{
    ApiConfiguration, ApiConfigurationPatch, ApiTemplatesAdminClient, ApiTemplatesClient,
    ApiTemplatesError, HttpMethod, IssuedTenant, NewApiConfiguration, NewParameterTemplate,
    NewTenant, ParameterTemplate, ParameterTemplatePatch, PreparedRequest, RequestDescriptor,
    RequestInput, ResponseMapping, SecretString, Tenant, TenantPatch,
};

// === MODULE DEFINITION ===
pub mod module;
pub use module::{ApiTemplatesModule, CatalogBackend, ImportReport};

// === LOCAL CLIENT ===
pub mod local_client;

pub mod config;
pub use config::ApiTemplatesConfig;

// === INTERNAL MODULES ===
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;

pub use domain::compiler::{CompileError, CompileOptions, PathParameterPolicy, compile, compile_with};
