//! Document store - the collections every component reads and writes
//!
//! The store is schemaless at the storage layer (documents are plain YAML
//! or JSON values) and typed at the boundary: every read goes through the
//! entity's serde model, and [`FileStore`] additionally checks each document
//! against its embedded JSON schema before handing it out.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::project::Project;
use crate::schema::{SchemaError, SchemaRegistry, Validator};
use crate::yaml::{parse_document, YamlError};

/// File extension of stored documents
pub const DOCUMENT_EXT: &str = "yaml";

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("I/O error at {path}: {source}")]
    #[diagnostic(code(sawtrack::store::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Yaml(#[from] YamlError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Schema(#[from] SchemaError),

    #[error("document {path} does not match the {collection} schema: {}", .errors.join("; "))]
    #[diagnostic(
        code(sawtrack::store::invalid_document),
        help("Fix the document by hand or run 'sawtrack validate' for a full report")
    )]
    InvalidDocument {
        path: String,
        collection: &'static str,
        errors: Vec<String>,
    },

    #[error("failed to encode or decode a {collection} document: {message}")]
    #[diagnostic(code(sawtrack::store::serde))]
    Serde {
        collection: &'static str,
        message: String,
    },

    #[error("{id} already exists in {collection}")]
    #[diagnostic(code(sawtrack::store::exists))]
    AlreadyExists {
        collection: &'static str,
        id: EntityId,
    },

    #[error("{id} not found in {collection}")]
    #[diagnostic(code(sawtrack::store::not_found))]
    NotFound {
        collection: &'static str,
        id: EntityId,
    },

    #[error("document store unavailable: {0}")]
    #[diagnostic(code(sawtrack::store::unavailable))]
    Unavailable(String),
}

/// Read/write access to the five collections.
///
/// Reads take `&self`; every read is a fresh point-in-time fetch.
pub trait DocumentStore {
    /// Fetch every document of a collection, in storage order
    fn fetch_all<T: Entity>(&self) -> Result<Vec<T>, StoreError>;

    /// Create a new document; fails if the ID is taken
    fn create<T: Entity>(&mut self, doc: &T) -> Result<(), StoreError>;

    /// Overwrite an existing document; fails if it does not exist
    fn update<T: Entity>(&mut self, doc: &T) -> Result<(), StoreError>;

    /// Remove a document; fails if it does not exist
    fn delete<T: Entity>(&mut self, id: &EntityId) -> Result<(), StoreError>;

    /// Fetch documents whose top-level `field` equals `value`
    fn fetch_where<T: Entity>(&self, field: &str, value: &Value) -> Result<Vec<T>, StoreError> {
        let mut matches = Vec::new();
        for doc in self.fetch_all::<T>()? {
            let encoded = encode(&doc)?;
            if encoded.get(field) == Some(value) {
                matches.push(doc);
            }
        }
        Ok(matches)
    }

    /// Fetch a single document by ID
    fn fetch<T: Entity>(&self, id: &EntityId) -> Result<Option<T>, StoreError> {
        Ok(self.fetch_all::<T>()?.into_iter().find(|d| d.id() == id))
    }
}

fn encode<T: Entity>(doc: &T) -> Result<Value, StoreError> {
    serde_json::to_value(doc).map_err(|e| StoreError::Serde {
        collection: T::collection(),
        message: e.to_string(),
    })
}

fn decode<T: Entity>(value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|e| StoreError::Serde {
        collection: T::collection(),
        message: e.to_string(),
    })
}

// =========================================================================
// FileStore
// =========================================================================

/// YAML files under a project root: `<collection>/<ID>.yaml`
pub struct FileStore {
    root: PathBuf,
    validator: Validator,
}

impl FileStore {
    /// Open the store for a project
    pub fn open(project: &Project) -> Result<Self, StoreError> {
        Self::at(project.root())
    }

    /// Open a store rooted at an arbitrary directory
    pub fn at(root: &Path) -> Result<Self, StoreError> {
        let validator = Validator::new(&SchemaRegistry::default())?;
        Ok(Self {
            root: root.to_path_buf(),
            validator,
        })
    }

    fn collection_dir(&self, prefix: EntityPrefix) -> PathBuf {
        self.root.join(prefix.collection())
    }

    fn document_path(&self, id: &EntityId) -> PathBuf {
        self.collection_dir(id.prefix())
            .join(format!("{}.{}", id, DOCUMENT_EXT))
    }

    /// Document files of a collection, sorted by file name
    pub fn document_paths(&self, prefix: EntityPrefix) -> Vec<PathBuf> {
        let dir = self.collection_dir(prefix);
        WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| p.extension().is_some_and(|ext| ext == DOCUMENT_EXT))
            .collect()
    }

    /// Read one document as a raw value and check it against its schema
    pub fn read_value(&self, prefix: EntityPrefix, path: &Path) -> Result<Value, StoreError> {
        let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let filename = path.display().to_string();
        let value = parse_document(&content, &filename)?;

        let errors = self.validator.validate(prefix, &value);
        if !errors.is_empty() {
            return Err(StoreError::InvalidDocument {
                path: filename,
                collection: prefix.collection(),
                errors,
            });
        }
        Ok(value)
    }

    fn write<T: Entity>(&self, doc: &T) -> Result<(), StoreError> {
        let path = self.document_path(doc.id());
        let yaml = serde_yml::to_string(doc).map_err(|e| StoreError::Serde {
            collection: T::collection(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, yaml).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        trace!(path = %path.display(), "wrote document");
        Ok(())
    }
}

impl DocumentStore for FileStore {
    fn fetch_all<T: Entity>(&self) -> Result<Vec<T>, StoreError> {
        let paths = self.document_paths(T::PREFIX);
        debug!(collection = T::collection(), count = paths.len(), "fetching collection");
        paths
            .iter()
            .map(|path| self.read_value(T::PREFIX, path).and_then(decode::<T>))
            .collect()
    }

    fn fetch<T: Entity>(&self, id: &EntityId) -> Result<Option<T>, StoreError> {
        if id.prefix() != T::PREFIX {
            return Ok(None);
        }
        let path = self.document_path(id);
        if !path.exists() {
            return Ok(None);
        }
        self.read_value(T::PREFIX, &path).and_then(decode).map(Some)
    }

    fn create<T: Entity>(&mut self, doc: &T) -> Result<(), StoreError> {
        if self.document_path(doc.id()).exists() {
            return Err(StoreError::AlreadyExists {
                collection: T::collection(),
                id: *doc.id(),
            });
        }
        self.write(doc)
    }

    fn update<T: Entity>(&mut self, doc: &T) -> Result<(), StoreError> {
        if !self.document_path(doc.id()).exists() {
            return Err(StoreError::NotFound {
                collection: T::collection(),
                id: *doc.id(),
            });
        }
        self.write(doc)
    }

    fn delete<T: Entity>(&mut self, id: &EntityId) -> Result<(), StoreError> {
        let path = self.document_path(id);
        if id.prefix() != T::PREFIX || !path.exists() {
            return Err(StoreError::NotFound {
                collection: T::collection(),
                id: *id,
            });
        }
        fs::remove_file(&path).map_err(|source| StoreError::Io { path, source })
    }
}

// =========================================================================
// MemoryStore
// =========================================================================

/// Write operations that can be made to fail in a [`MemoryStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteOp {
    Create,
    Update,
    Delete,
}

/// In-process store keeping documents as JSON values in insertion order
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: HashMap<EntityPrefix, Vec<Value>>,
    failing: HashSet<(WriteOp, EntityPrefix)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `op` on the collection of `prefix` fail with `Unavailable`
    pub fn inject_failure(&mut self, op: WriteOp, prefix: EntityPrefix) {
        self.failing.insert((op, prefix));
    }

    /// Number of documents stored in a collection
    pub fn len(&self, prefix: EntityPrefix) -> usize {
        self.collections.get(&prefix).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, prefix: EntityPrefix) -> bool {
        self.len(prefix) == 0
    }

    fn check(&self, op: WriteOp, prefix: EntityPrefix) -> Result<(), StoreError> {
        if self.failing.contains(&(op, prefix)) {
            return Err(StoreError::Unavailable(format!(
                "{:?} on {} rejected",
                op,
                prefix.collection()
            )));
        }
        Ok(())
    }

    fn position(&self, id: &EntityId) -> Option<usize> {
        let wanted = Value::String(id.to_string());
        self.collections
            .get(&id.prefix())?
            .iter()
            .position(|doc| doc.get("id") == Some(&wanted))
    }
}

impl DocumentStore for MemoryStore {
    fn fetch_all<T: Entity>(&self) -> Result<Vec<T>, StoreError> {
        self.collections
            .get(&T::PREFIX)
            .map(|docs| docs.iter().cloned().map(decode::<T>).collect())
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn create<T: Entity>(&mut self, doc: &T) -> Result<(), StoreError> {
        self.check(WriteOp::Create, T::PREFIX)?;
        if self.position(doc.id()).is_some() {
            return Err(StoreError::AlreadyExists {
                collection: T::collection(),
                id: *doc.id(),
            });
        }
        let value = encode(doc)?;
        self.collections.entry(T::PREFIX).or_default().push(value);
        Ok(())
    }

    fn update<T: Entity>(&mut self, doc: &T) -> Result<(), StoreError> {
        self.check(WriteOp::Update, T::PREFIX)?;
        let pos = self.position(doc.id()).ok_or(StoreError::NotFound {
            collection: T::collection(),
            id: *doc.id(),
        })?;
        let value = encode(doc)?;
        if let Some(docs) = self.collections.get_mut(&T::PREFIX) {
            docs[pos] = value;
        }
        Ok(())
    }

    fn delete<T: Entity>(&mut self, id: &EntityId) -> Result<(), StoreError> {
        self.check(WriteOp::Delete, T::PREFIX)?;
        let pos = self
            .position(id)
            .filter(|_| id.prefix() == T::PREFIX)
            .ok_or(StoreError::NotFound {
                collection: T::collection(),
                id: *id,
            })?;
        if let Some(docs) = self.collections.get_mut(&T::PREFIX) {
            docs.remove(pos);
        }
        Ok(())
    }
}
