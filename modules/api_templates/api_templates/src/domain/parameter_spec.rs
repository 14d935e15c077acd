//! Typed view over a template's raw `parameter_spec` object.
//!
//! ```json
//! {
//!   "path_params":  { "id":    { "source": "employee_id" } },
//!   "query_params": { "empid": { "type": "string", "required": true, "source": "employee_id" } },
//!   "headers":      { "Content-Type": "application/json" }
//! }
//! ```
//!
//! Entries keep the order they were declared in.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::compiler::CompileError;

/// Declared type of a parameter, drives coercion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParamType {
    #[default]
    String,
    Boolean,
    Array,
}

impl ParamType {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "boolean" => Some(Self::Boolean),
            "array" => Some(Self::Array),
            _ => None,
        }
    }
}

/// One declared path or query parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterEntry {
    pub name: String,
    /// Input key the value is read from; the parameter's own name by default.
    pub source: String,
    pub param_type: ParamType,
    pub required: bool,
    /// `None` when absent or explicitly `null`.
    pub default: Option<Value>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSpec {
    pub path_params: Vec<ParameterEntry>,
    pub query_params: Vec<ParameterEntry>,
    pub headers: IndexMap<String, String>,
}

impl ParameterSpec {
    /// Parse and structurally validate a raw specification.
    ///
    /// # Errors
    /// `CompileError::InvalidTemplateSpecification` naming the offending part.
    pub fn parse(raw: &Value) -> Result<Self, CompileError> {
        let Value::Object(root) = raw else {
            return Err(invalid("parameter specification must be an object"));
        };

        Ok(Self {
            path_params: parse_entries(root, "path_params")?,
            query_params: parse_entries(root, "query_params")?,
            headers: parse_headers(root)?,
        })
    }
}

fn invalid(reason: impl Into<String>) -> CompileError {
    CompileError::InvalidTemplateSpecification {
        reason: reason.into(),
    }
}

fn section<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, CompileError> {
    match root.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(invalid(format!("`{key}` must be an object"))),
    }
}

fn parse_entries(
    root: &Map<String, Value>,
    key: &str,
) -> Result<Vec<ParameterEntry>, CompileError> {
    let Some(entries) = section(root, key)? else {
        return Ok(Vec::new());
    };

    entries
        .iter()
        .map(|(name, raw)| parse_entry(key, name, raw))
        .collect()
}

fn parse_entry(section: &str, name: &str, raw: &Value) -> Result<ParameterEntry, CompileError> {
    let Value::Object(entry) = raw else {
        return Err(invalid(format!("{section}.{name} must be an object")));
    };

    let param_type = match entry.get("type") {
        None | Some(Value::Null) => ParamType::default(),
        Some(Value::String(t)) => ParamType::parse(t).ok_or_else(|| {
            invalid(format!(
                "{section}.{name}.type must be one of string, boolean, array (got `{t}`)"
            ))
        })?,
        Some(_) => return Err(invalid(format!("{section}.{name}.type must be a string"))),
    };

    let required = match entry.get("required") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => return Err(invalid(format!("{section}.{name}.required must be a boolean"))),
    };

    let source = match entry.get("source") {
        None | Some(Value::Null) => name.to_owned(),
        Some(Value::String(s)) => s.clone(),
        Some(_) => return Err(invalid(format!("{section}.{name}.source must be a string"))),
    };

    let default = match entry.get("default") {
        None | Some(Value::Null) => None,
        Some(v) => Some(v.clone()),
    };

    let description = entry
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_owned);

    Ok(ParameterEntry {
        name: name.to_owned(),
        source,
        param_type,
        required,
        default,
        description,
    })
}

fn parse_headers(root: &Map<String, Value>) -> Result<IndexMap<String, String>, CompileError> {
    let Some(headers) = section(root, "headers")? else {
        return Ok(IndexMap::new());
    };

    headers
        .iter()
        .map(|(name, value)| match value {
            Value::String(v) => Ok((name.clone(), v.clone())),
            _ => Err(invalid(format!("headers.{name} must be a string"))),
        })
        .collect()
}
