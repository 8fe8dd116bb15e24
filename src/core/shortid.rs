//! Short ID aliases for easier record selection
//!
//! Listing a collection assigns each record a persistent alias such as
//! `BRN@1` or `USR@3`. Aliases are stored in `.sawtrack/shortids.json` and
//! accepted anywhere a record ID is expected.

use std::collections::{BTreeMap, HashMap};
use std::fs;

use serde::{Deserialize, Serialize};

use crate::core::identity::EntityId;
use crate::core::project::Project;

const INDEX_FILE: &str = "shortids.json";

/// Persistent mapping of `PREFIX@N` aliases to record IDs
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ShortIdIndex {
    /// "BRN@1" -> "BRN-01ABC..."
    entries: BTreeMap<String, String>,
    /// Next alias number per prefix
    next_ids: BTreeMap<String, u32>,
    #[serde(skip)]
    reverse: HashMap<String, String>,
}

impl ShortIdIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the project's index; a missing or unreadable file gives an empty one
    pub fn load(project: &Project) -> Self {
        let path = project.sawtrack_dir().join(INDEX_FILE);
        let Some(mut index) = fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str::<ShortIdIndex>(&content).ok())
        else {
            return Self::new();
        };
        index.reverse = index
            .entries
            .iter()
            .map(|(k, v)| (v.clone(), k.clone()))
            .collect();
        index
    }

    pub fn save(&self, project: &Project) -> std::io::Result<()> {
        let path = project.sawtrack_dir().join(INDEX_FILE);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
    }

    /// Assign an alias if the ID has none yet, returning the alias
    pub fn add(&mut self, id: &EntityId) -> String {
        let full = id.to_string();
        if let Some(existing) = self.reverse.get(&full) {
            return existing.clone();
        }
        let prefix = id.prefix().as_str().to_string();
        let next = self.next_ids.entry(prefix.clone()).or_insert(1);
        let alias = format!("{}@{}", prefix, next);
        *next += 1;
        self.entries.insert(alias.clone(), full.clone());
        self.reverse.insert(full, alias.clone());
        alias
    }

    /// Resolve `PREFIX@N` (case-insensitive) or a full ID
    pub fn resolve(&self, reference: &str) -> Option<EntityId> {
        let reference = reference.trim();
        if reference.contains('@') {
            return self
                .entries
                .get(&reference.to_ascii_uppercase())
                .and_then(|full| full.parse().ok());
        }
        reference.parse().ok()
    }

    /// Alias of a full ID, if one was assigned
    pub fn alias(&self, id: &EntityId) -> Option<&str> {
        self.reverse.get(&id.to_string()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::EntityPrefix;
    use tempfile::tempdir;

    #[test]
    fn test_aliases_are_per_prefix() {
        let mut index = ShortIdIndex::new();
        let b1 = EntityId::new(EntityPrefix::Brn);
        let b2 = EntityId::new(EntityPrefix::Brn);
        let u1 = EntityId::new(EntityPrefix::Usr);

        assert_eq!(index.add(&b1), "BRN@1");
        assert_eq!(index.add(&b2), "BRN@2");
        assert_eq!(index.add(&u1), "USR@1");
        assert_eq!(index.add(&b1), "BRN@1");
        assert_eq!(index.len(), 3);

        assert_eq!(index.resolve("BRN@2"), Some(b2));
        assert_eq!(index.resolve("usr@1"), Some(u1));
        assert_eq!(index.resolve("BRN@9"), None);
        assert_eq!(index.alias(&b1), Some("BRN@1"));
    }

    #[test]
    fn test_full_id_passes_through() {
        let index = ShortIdIndex::new();
        let id = EntityId::new(EntityPrefix::Bty);
        assert_eq!(index.resolve(&id.to_string()), Some(id));
        assert_eq!(index.resolve("Norte"), None);
    }

    #[test]
    fn test_index_persists() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        let id = EntityId::new(EntityPrefix::Brn);

        let mut index = ShortIdIndex::load(&project);
        index.add(&id);
        index.save(&project).unwrap();

        let reloaded = ShortIdIndex::load(&project);
        assert_eq!(reloaded.resolve("BRN@1"), Some(id));
        assert_eq!(reloaded.alias(&id), Some("BRN@1"));
    }
}
