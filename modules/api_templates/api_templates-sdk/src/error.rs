//! Error types for the api_templates module.
//!
//! Transport-agnostic. Messages never carry tenant credentials or tokens.

use thiserror::Error;
use uuid::Uuid;

/// Errors returned by the api_templates client traits.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiTemplatesError {
    /// No active tenant holds the supplied credential.
    #[error("tenant not found")]
    TenantNotFound,

    /// The tenant has no active configuration with this API name.
    #[error("API configuration not found: {api_name}")]
    ConfigurationNotFound { api_name: String },

    /// The configuration has no active template with this name.
    #[error("parameter template not found: {template_name}")]
    TemplateNotFound { template_name: String },

    /// Administrative lookup by id found nothing.
    #[error("{kind} not found: {id}")]
    RecordNotFound { kind: String, id: Uuid },

    /// A required query parameter was absent from input and had no default.
    #[error("missing required parameter: {name}")]
    MissingRequiredParameter { name: String },

    /// A declared path parameter was absent from input.
    #[error("missing path parameter: {name}")]
    MissingPathParameter { name: String },

    /// A path parameter value would span more than one path segment.
    #[error("invalid path parameter: {name}")]
    InvalidPathParameter { name: String },

    /// The stored parameter specification is structurally malformed.
    #[error("invalid template specification: {reason}")]
    InvalidTemplateSpecification { reason: String },

    /// An administrative write would duplicate an active record.
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// Malformed administrative input.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Storage or backend failure. Details are logged, not returned.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl ApiTemplatesError {
    #[must_use]
    pub fn configuration_not_found(api_name: impl Into<String>) -> Self {
        Self::ConfigurationNotFound {
            api_name: api_name.into(),
        }
    }

    #[must_use]
    pub fn template_not_found(template_name: impl Into<String>) -> Self {
        Self::TemplateNotFound {
            template_name: template_name.into(),
        }
    }

    #[must_use]
    pub fn record_not_found(kind: impl Into<String>, id: Uuid) -> Self {
        Self::RecordNotFound {
            kind: kind.into(),
            id,
        }
    }

    #[must_use]
    pub fn missing_required_parameter(name: impl Into<String>) -> Self {
        Self::MissingRequiredParameter { name: name.into() }
    }

    #[must_use]
    pub fn missing_path_parameter(name: impl Into<String>) -> Self {
        Self::MissingPathParameter { name: name.into() }
    }

    #[must_use]
    pub fn invalid_path_parameter(name: impl Into<String>) -> Self {
        Self::InvalidPathParameter { name: name.into() }
    }

    #[must_use]
    pub fn invalid_template_specification(reason: impl Into<String>) -> Self {
        Self::InvalidTemplateSpecification {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for every lookup failure.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TenantNotFound
                | Self::ConfigurationNotFound { .. }
                | Self::TemplateNotFound { .. }
                | Self::RecordNotFound { .. }
        )
    }

    /// HTTP status an eventual front door should answer with.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::TenantNotFound
            | Self::ConfigurationNotFound { .. }
            | Self::TemplateNotFound { .. }
            | Self::RecordNotFound { .. } => 404,
            Self::MissingRequiredParameter { .. }
            | Self::MissingPathParameter { .. }
            | Self::InvalidPathParameter { .. }
            | Self::Validation { .. } => 400,
            Self::InvalidTemplateSpecification { .. } => 422,
            Self::Conflict { .. } => 409,
            Self::Internal { .. } => 500,
        }
    }
}
