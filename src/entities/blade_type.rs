//! Blade type entity - a category for blades

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};

/// A BladeType entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BladeType {
    /// Unique identifier
    pub id: EntityId,

    /// Short catalog code
    pub code: String,

    /// Display name
    pub name: String,

    /// Inactive types cannot be assigned to new blades
    #[serde(default = "default_active")]
    pub active: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Creation timestamp
    pub created: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl Entity for BladeType {
    const PREFIX: EntityPrefix = EntityPrefix::Bty;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }
}
