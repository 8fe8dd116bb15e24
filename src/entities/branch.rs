//! Branch entity type - a physical service location

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};

/// A Branch entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    /// Unique identifier
    pub id: EntityId,

    /// Branch name
    pub name: String,

    /// Street address
    pub address: String,

    /// Contact phone
    pub phone: String,

    /// Person in charge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<String>,

    /// Creation timestamp
    pub created: DateTime<Utc>,
}

impl Entity for Branch {
    const PREFIX: EntityPrefix = EntityPrefix::Brn;

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
