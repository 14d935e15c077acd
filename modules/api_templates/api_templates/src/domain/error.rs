//! Domain errors for api_templates.

use std::fmt;

use api_templates_sdk::ApiTemplatesError;
use thiserror::Error;
use uuid::Uuid;

use super::compiler::CompileError;

/// Record families managed by the administrative layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Tenant,
    Configuration,
    Template,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tenant => "tenant",
            Self::Configuration => "API configuration",
            Self::Template => "parameter template",
        })
    }
}

/// Domain-level errors for api_templates operations.
#[derive(Error, Debug)]
pub enum DomainError {
    /// No active tenant for the credential. The credential is never echoed.
    #[error("tenant not found")]
    TenantNotFound,

    #[error("API configuration not found: {api_name}")]
    ConfigurationNotFound { api_name: String },

    #[error("parameter template not found: {template_name}")]
    TemplateNotFound { template_name: String },

    #[error("{kind} not found: {id}")]
    RecordNotFound { kind: RecordKind, id: Uuid },

    #[error(transparent)]
    Compile(#[from] CompileError),

    /// A write would produce a second active record with the same name.
    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("validation error: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl DomainError {
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
    pub fn not_found(kind: RecordKind, id: Uuid) -> Self {
        Self::RecordNotFound { kind, id }
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Convert DomainError to SDK ApiTemplatesError.
impl From<DomainError> for ApiTemplatesError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::TenantNotFound => Self::TenantNotFound,
            DomainError::ConfigurationNotFound { api_name } => {
                Self::configuration_not_found(api_name)
            }
            DomainError::TemplateNotFound { template_name } => {
                Self::template_not_found(template_name)
            }
            DomainError::RecordNotFound { kind, id } => Self::record_not_found(kind.to_string(), id),
            DomainError::Compile(CompileError::MissingRequiredParameter { name }) => {
                Self::missing_required_parameter(name)
            }
            DomainError::Compile(CompileError::MissingPathParameter { name }) => {
                Self::missing_path_parameter(name)
            }
            DomainError::Compile(CompileError::InvalidPathParameter { name }) => {
                Self::invalid_path_parameter(name)
            }
            DomainError::Compile(CompileError::InvalidTemplateSpecification { reason }) => {
                Self::invalid_template_specification(reason)
            }
            DomainError::Conflict { message } => Self::conflict(message),
            DomainError::Validation { field, message } => {
                Self::validation(format!("{field}: {message}"))
            }
            DomainError::Database(err) => {
                tracing::error!(error = %format!("{err:#}"), "storage failure");
                Self::internal("storage failure")
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn database_details_are_not_returned() {
        let err: ApiTemplatesError =
            DomainError::Database(anyhow::anyhow!("connection refused at 10.0.0.5")).into();
        assert_eq!(err, ApiTemplatesError::internal("storage failure"));
    }

    #[test]
    fn compile_errors_keep_their_kind() {
        let err: ApiTemplatesError = DomainError::from(CompileError::MissingRequiredParameter {
            name: "empid".to_owned(),
        })
        .into();
        assert_eq!(err, ApiTemplatesError::missing_required_parameter("empid"));

        let err: ApiTemplatesError = DomainError::from(CompileError::InvalidPathParameter {
            name: "id".to_owned(),
        })
        .into();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "invalid path parameter: id");
    }

    #[test]
    fn record_not_found_names_the_kind() {
        let id = Uuid::nil();
        let err: ApiTemplatesError = DomainError::not_found(RecordKind::Template, id).into();
        assert_eq!(
            err.to_string(),
            format!("parameter template not found: {id}")
        );
    }
}
