//! Request-template compiler.
//!
//! Pure transformation from `(template, input, base_url)` to a
//! [`RequestDescriptor`]. No I/O, no shared state, arguments are never mutated.
//!
//! Steps, in order:
//! 1. substitute declared path parameters into `endpoint_path` in one pass;
//!    inserted values are never scanned for further placeholders
//! 2. resolve query parameters: input value, else default, else
//!    `MissingRequiredParameter` when required, else omitted
//! 3. coerce resolved values by declared type
//! 4. copy static headers
//! 5. join `base_url` (one trailing slash trimmed) with the path
//! 6. copy the response mapping unevaluated

use std::collections::HashMap;

use api_templates_sdk::{ParameterTemplate, RequestDescriptor, RequestInput};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::parameter_spec::{ParamType, ParameterEntry, ParameterSpec};

/// How declared path parameters are checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathParameterPolicy {
    /// Fail with `MissingPathParameter` when a value is absent and with
    /// `InvalidPathParameter` when a value is not a single path segment.
    #[default]
    Strict,
    /// Leave absent placeholders in the path and insert values verbatim.
    Lenient,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub path_parameters: PathParameterPolicy,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("missing required parameter: {name}")]
    MissingRequiredParameter { name: String },

    #[error("missing path parameter: {name}")]
    MissingPathParameter { name: String },

    #[error("invalid path parameter: {name}")]
    InvalidPathParameter { name: String },

    #[error("invalid template specification: {reason}")]
    InvalidTemplateSpecification { reason: String },
}

/// Compile with default options (strict path parameters).
///
/// # Errors
/// See [`compile_with`].
pub fn compile(
    template: &ParameterTemplate,
    input: &RequestInput,
    base_url: &str,
) -> Result<RequestDescriptor, CompileError> {
    compile_with(template, input, base_url, CompileOptions::default())
}

/// Compile a template against runtime input.
///
/// # Errors
/// - `InvalidTemplateSpecification` if `parameter_spec` is malformed
/// - `MissingPathParameter` or `InvalidPathParameter` under the strict policy
/// - `MissingRequiredParameter` for the first required query parameter
///   (in declaration order) with neither input nor default
pub fn compile_with(
    template: &ParameterTemplate,
    input: &RequestInput,
    base_url: &str,
    options: CompileOptions,
) -> Result<RequestDescriptor, CompileError> {
    let spec = ParameterSpec::parse(&template.parameter_spec)?;

    let path = substitute_path(
        &template.endpoint_path,
        &spec.path_params,
        input,
        options.path_parameters,
    )?;
    let query_parameters = resolve_query(&spec.query_params, input)?;

    Ok(RequestDescriptor {
        url: join_url(base_url, &path),
        method: template.http_method,
        query_parameters,
        headers: spec.headers,
        response_mapping: template.response_mapping.clone(),
    })
}

fn substitute_path(
    endpoint_path: &str,
    params: &[ParameterEntry],
    input: &RequestInput,
    policy: PathParameterPolicy,
) -> Result<String, CompileError> {
    let mut values: HashMap<&str, String> = HashMap::with_capacity(params.len());
    for param in params {
        match input.get(&param.source) {
            Some(value) => {
                let value = string_form(value);
                if policy == PathParameterPolicy::Strict && !is_single_segment(&value) {
                    return Err(CompileError::InvalidPathParameter {
                        name: param.name.clone(),
                    });
                }
                values.insert(param.name.as_str(), value);
            }
            None if policy == PathParameterPolicy::Strict => {
                return Err(CompileError::MissingPathParameter {
                    name: param.name.clone(),
                });
            }
            None => {}
        }
    }

    let mut path = String::with_capacity(endpoint_path.len());
    let mut rest = endpoint_path;
    while let Some(open) = rest.find('{') {
        let (head, tail) = rest.split_at(open);
        path.push_str(head);
        let Some(close) = tail.find('}') else {
            rest = tail;
            break;
        };
        let (placeholder, after) = tail.split_at(close + 1);
        let name = &placeholder[1..close];
        match values.get(name) {
            Some(value) => path.push_str(value),
            None => path.push_str(placeholder),
        }
        rest = after;
    }
    path.push_str(rest);
    Ok(path)
}

/// No separators, no query or fragment markers, no dot segments.
fn is_single_segment(value: &str) -> bool {
    !value.contains(['/', '?', '#']) && value != "." && value != ".."
}

fn resolve_query(
    params: &[ParameterEntry],
    input: &RequestInput,
) -> Result<IndexMap<String, String>, CompileError> {
    let mut resolved = IndexMap::with_capacity(params.len());
    for param in params {
        let value = match (input.get(&param.source), &param.default) {
            (Some(value), _) | (None, Some(value)) => value,
            (None, None) if param.required => {
                return Err(CompileError::MissingRequiredParameter {
                    name: param.name.clone(),
                });
            }
            (None, None) => continue,
        };
        resolved.insert(param.name.clone(), coerce(value, param.param_type));
    }
    Ok(resolved)
}

/// Render a resolved value according to its declared type.
#[must_use]
pub fn coerce(value: &Value, param_type: ParamType) -> String {
    match (param_type, value) {
        (ParamType::Boolean, Value::Bool(b)) => b.to_string(),
        (ParamType::Boolean, other) => string_form(other).to_lowercase(),
        (ParamType::Array, Value::Array(items)) => items
            .iter()
            .map(string_form)
            .collect::<Vec<_>>()
            .join(","),
        (ParamType::Array | ParamType::String, other) => string_form(other),
    }
}

/// Strings verbatim; every other value as compact JSON.
#[must_use]
pub fn string_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `base_url` with at most one trailing slash removed, followed by `path`.
#[must_use]
pub fn join_url(base_url: &str, path: &str) -> String {
    let base = base_url.strip_suffix('/').unwrap_or(base_url);
    format!("{base}{path}")
}
