//! Blade entity type - a saw blade tracked through its sharpening lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};

/// Lifecycle state derived from the terminal flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BladeStatus {
    /// Blade can still receive sharpenings
    Available,
    /// Blade received its terminal sharpening
    Terminal,
}

impl std::fmt::Display for BladeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BladeStatus::Available => write!(f, "available for sharpening"),
            BladeStatus::Terminal => write!(f, "terminal sharpening done"),
        }
    }
}

/// A Blade entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blade {
    /// Unique identifier
    pub id: EntityId,

    /// Scanned or typed code, unique among blades
    pub code: String,

    /// Owning branch
    pub branch: EntityId,

    /// Blade category
    pub blade_type: EntityId,

    /// Set once the final sharpening was recorded; never cleared
    #[serde(default)]
    pub terminal_sharpening_done: bool,

    /// Timestamp of the final sharpening
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_sharpening_date: Option<DateTime<Utc>>,

    /// When the blade was registered
    pub registration_date: DateTime<Utc>,

    /// User who registered the blade
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered_by: Option<EntityId>,
}

impl Entity for Blade {
    const PREFIX: EntityPrefix = EntityPrefix::Bld;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.code
    }

    fn created(&self) -> DateTime<Utc> {
        self.registration_date
    }
}

impl Blade {
    /// Create a new, not yet sharpened blade
    pub fn new(code: impl Into<String>, branch: EntityId, blade_type: EntityId) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Bld),
            code: code.into(),
            branch,
            blade_type,
            terminal_sharpening_done: false,
            terminal_sharpening_date: None,
            registration_date: Utc::now(),
            registered_by: None,
        }
    }

    pub fn status(&self) -> BladeStatus {
        if self.terminal_sharpening_done {
            BladeStatus::Terminal
        } else {
            BladeStatus::Available
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal_sharpening_done
    }

    /// Mark the blade as having received its final sharpening.
    ///
    /// Returns `false` without touching the blade if it was already terminal.
    pub fn mark_terminal(&mut self, at: DateTime<Utc>) -> bool {
        if self.terminal_sharpening_done {
            return false;
        }
        self.terminal_sharpening_done = true;
        self.terminal_sharpening_date = Some(at);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn blade() -> Blade {
        Blade::new(
            "SN-1001",
            EntityId::new(EntityPrefix::Brn),
            EntityId::new(EntityPrefix::Bty),
        )
    }

    #[test]
    fn test_new_blade_is_available() {
        let b = blade();
        assert!(b.id.to_string().starts_with("BLD-"));
        assert_eq!(b.status(), BladeStatus::Available);
        assert!(b.terminal_sharpening_date.is_none());
    }

    #[test]
    fn test_mark_terminal_is_monotonic() {
        let mut b = blade();
        let first = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2026, 4, 1, 10, 0, 0).unwrap();

        assert!(b.mark_terminal(first));
        assert!(!b.mark_terminal(second));
        assert_eq!(b.status(), BladeStatus::Terminal);
        assert_eq!(b.terminal_sharpening_date, Some(first));
    }

    #[test]
    fn test_blade_yaml_omits_empty_terminal_date() {
        let b = blade();
        let yaml = serde_yml::to_string(&b).unwrap();
        assert!(yaml.contains("code: SN-1001"));
        assert!(!yaml.contains("terminal_sharpening_date"));

        let parsed: Blade = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(parsed, b);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(BladeStatus::Available.to_string(), "available for sharpening");
        assert_eq!(BladeStatus::Terminal.to_string(), "terminal sharpening done");
    }
}
