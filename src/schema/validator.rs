//! Document validation against the embedded schemas

use miette::Diagnostic;
use std::collections::HashMap;
use thiserror::Error;

use crate::core::EntityPrefix;
use crate::schema::registry::SchemaRegistry;

#[derive(Debug, Error, Diagnostic)]
pub enum SchemaError {
    #[error("no schema registered for {0}")]
    #[diagnostic(code(sawtrack::schema::missing))]
    Missing(EntityPrefix),

    #[error("invalid embedded schema for {prefix}: {message}")]
    #[diagnostic(code(sawtrack::schema::invalid))]
    InvalidSchema { prefix: EntityPrefix, message: String },
}

/// Compiled validators, one per collection
pub struct Validator {
    compiled: HashMap<EntityPrefix, jsonschema::Validator>,
}

impl Validator {
    /// Compile every schema in the registry
    pub fn new(registry: &SchemaRegistry) -> Result<Self, SchemaError> {
        let mut compiled = HashMap::new();
        for prefix in EntityPrefix::all() {
            let schema = registry.schema(*prefix).ok_or(SchemaError::Missing(*prefix))?;
            let validator =
                jsonschema::validator_for(schema).map_err(|e| SchemaError::InvalidSchema {
                    prefix: *prefix,
                    message: e.to_string(),
                })?;
            compiled.insert(*prefix, validator);
        }
        Ok(Self { compiled })
    }

    /// Validate a document; returns one message per violation
    pub fn validate(&self, prefix: EntityPrefix, document: &serde_json::Value) -> Vec<String> {
        match self.compiled.get(&prefix) {
            Some(validator) => validator
                .iter_errors(document)
                .map(|e| {
                    let path = e.instance_path.to_string();
                    if path.is_empty() {
                        e.to_string()
                    } else {
                        format!("{}: {}", path, e)
                    }
                })
                .collect(),
            None => vec![format!("no schema registered for {}", prefix)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validator() -> Validator {
        Validator::new(&SchemaRegistry::new()).unwrap()
    }

    #[test]
    fn test_valid_branch_passes() {
        let doc = json!({
            "id": "BRN-01JB7Q2M3C4D5E6F7G8H9J0K1M",
            "name": "Norte",
            "address": "Av. Siempre Viva 742",
            "phone": "555-0101",
            "created": "2026-01-05T09:00:00Z"
        });
        assert!(validator().validate(EntityPrefix::Brn, &doc).is_empty());
    }

    #[test]
    fn test_unknown_kind_is_reported() {
        let doc = json!({
            "id": "SHP-01JB7Q2M3C4D5E6F7G8H9J0K1M",
            "blade": "BLD-01JB7Q2M3C4D5E6F7G8H9J0K1M",
            "timestamp": "2026-01-05T09:00:00Z",
            "kind": "SIDE",
            "branch": "BRN-01JB7Q2M3C4D5E6F7G8H9J0K1M"
        });
        let errors = validator().validate(EntityPrefix::Shp, &doc);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("/kind"));
    }

    #[test]
    fn test_missing_required_field_is_reported() {
        let doc = json!({ "id": "BTY-01JB7Q2M3C4D5E6F7G8H9J0K1M", "name": "Band" });
        let errors = validator().validate(EntityPrefix::Bty, &doc);
        assert!(!errors.is_empty());
    }
}
