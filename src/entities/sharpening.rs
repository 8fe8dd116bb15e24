//! Sharpening event - one append-only record of a blade being sharpened

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::entities::blade::Blade;

/// Which part of the blade was sharpened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SharpeningKind {
    Edge,
    Face,
}

impl std::fmt::Display for SharpeningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SharpeningKind::Edge => write!(f, "EDGE"),
            SharpeningKind::Face => write!(f, "FACE"),
        }
    }
}

impl std::str::FromStr for SharpeningKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "EDGE" => Ok(SharpeningKind::Edge),
            "FACE" => Ok(SharpeningKind::Face),
            other => Err(format!("unknown sharpening kind '{}'", other)),
        }
    }
}

/// A SharpeningEvent entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharpeningEvent {
    /// Unique identifier
    pub id: EntityId,

    /// Blade that was sharpened
    pub blade: EntityId,

    /// When the sharpening happened
    pub timestamp: DateTime<Utc>,

    /// Sharpening kind
    pub kind: SharpeningKind,

    /// Free-form observations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Branch of the blade when the event was recorded (not re-synced)
    pub branch: EntityId,

    /// User who recorded the event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_by: Option<EntityId>,
}

impl Entity for SharpeningEvent {
    const PREFIX: EntityPrefix = EntityPrefix::Shp;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        match self.kind {
            SharpeningKind::Edge => "EDGE",
            SharpeningKind::Face => "FACE",
        }
    }

    fn created(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl SharpeningEvent {
    /// Create an event for a blade, copying the blade's current branch
    pub fn for_blade(blade: &Blade, kind: SharpeningKind, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Shp),
            blade: blade.id,
            timestamp,
            kind,
            notes: None,
            branch: blade.branch,
            recorded_by: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_copies_blade_branch() {
        let blade = Blade::new(
            "SN-1",
            EntityId::new(EntityPrefix::Brn),
            EntityId::new(EntityPrefix::Bty),
        );
        let event = SharpeningEvent::for_blade(&blade, SharpeningKind::Edge, Utc::now());
        assert_eq!(event.blade, blade.id);
        assert_eq!(event.branch, blade.branch);
        assert!(event.id.to_string().starts_with("SHP-"));
    }

    #[test]
    fn test_kind_serializes_uppercase() {
        let yaml = serde_yml::to_string(&SharpeningKind::Face).unwrap();
        assert_eq!(yaml.trim(), "FACE");
        assert_eq!("edge".parse::<SharpeningKind>(), Ok(SharpeningKind::Edge));
        assert!("side".parse::<SharpeningKind>().is_err());
    }
}
