//! Entity trait - common interface for all stored record types

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::core::identity::{EntityId, EntityPrefix};

/// Common trait for all sawtrack records
pub trait Entity: Serialize + DeserializeOwned + Clone {
    /// The entity type prefix; also selects the collection
    const PREFIX: EntityPrefix;

    /// Get the entity's unique ID
    fn id(&self) -> &EntityId;

    /// Human-readable label (name, code, email...)
    fn title(&self) -> &str;

    /// Get the creation timestamp
    fn created(&self) -> DateTime<Utc>;

    /// Name of the collection this entity is stored in
    fn collection() -> &'static str {
        Self::PREFIX.collection()
    }
}
