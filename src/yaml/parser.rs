//! YAML parsing into typed values and raw documents

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::yaml::diagnostics::{YamlError, YamlSyntaxError};

/// Parse YAML content into a typed value with nice error messages
pub fn parse_yaml<T: DeserializeOwned>(content: &str, filename: &str) -> Result<T, YamlError> {
    serde_yml::from_str(content).map_err(|e| {
        YamlError::Syntax(YamlSyntaxError::from_serde_error(&e, content, filename))
    })
}

/// Parse a stored record; the top level must be a mapping
pub fn parse_document(content: &str, filename: &str) -> Result<Value, YamlError> {
    match parse_yaml::<Value>(content, filename)? {
        value @ Value::Object(_) => Ok(value),
        _ => Err(YamlError::NotAMapping(filename.to_string())),
    }
}
