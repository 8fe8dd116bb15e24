//! Embedded JSON schemas, one per collection

use std::collections::HashMap;

use rust_embed::Embed;
use serde_json::Value;
use tracing::warn;

use crate::core::EntityPrefix;

#[derive(Embed)]
#[folder = "schemas/"]
struct EmbeddedSchemas;

/// Parsed schemas keyed by entity prefix
pub struct SchemaRegistry {
    schemas: HashMap<EntityPrefix, Value>,
}

impl SchemaRegistry {
    /// Load and parse the embedded schema of every collection.
    ///
    /// Files that are missing or not JSON are left out; `Validator::new`
    /// reports the gap.
    pub fn new() -> Self {
        let schemas = EntityPrefix::all()
            .iter()
            .filter_map(|prefix| {
                let file = EmbeddedSchemas::get(&schema_file(*prefix))?;
                match serde_json::from_slice::<Value>(&file.data) {
                    Ok(schema) => Some((*prefix, schema)),
                    Err(e) => {
                        warn!(collection = prefix.collection(), error = %e, "unreadable schema");
                        None
                    }
                }
            })
            .collect();
        Self { schemas }
    }

    pub fn schema(&self, prefix: EntityPrefix) -> Option<&Value> {
        self.schemas.get(&prefix)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn schema_file(prefix: EntityPrefix) -> String {
    format!("{}.schema.json", prefix.schema_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_collection_has_a_schema() {
        let registry = SchemaRegistry::new();
        for prefix in EntityPrefix::all() {
            let schema = registry.schema(*prefix);
            assert!(schema.is_some(), "missing schema for {}", prefix);
            assert_eq!(schema.and_then(|s| s.get("type")), Some(&Value::from("object")));
        }
    }
}
