//! User entity type - staff accounts bound to a branch and a role

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};

/// Staff role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Operator,
    Administrator,
}

impl Role {
    /// The other role; used by role toggling
    pub fn toggled(self) -> Role {
        match self {
            Role::Operator => Role::Administrator,
            Role::Administrator => Role::Operator,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Operator => write!(f, "operator"),
            Role::Administrator => write!(f, "administrator"),
        }
    }
}

/// A User profile. The ID is the identity provider's uid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Identity uid
    pub id: EntityId,

    /// Sign-in email
    pub email: String,

    /// Full name
    pub name: String,

    #[serde(default)]
    pub role: Role,

    /// Home branch
    pub branch: EntityId,

    #[serde(default = "default_active")]
    pub active: bool,

    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl Entity for User {
    const PREFIX: EntityPrefix = EntityPrefix::Usr;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn created(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Administrator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_toggle() {
        assert_eq!(Role::Operator.toggled(), Role::Administrator);
        assert_eq!(Role::Administrator.toggled(), Role::Operator);
    }

    #[test]
    fn test_user_defaults_when_fields_missing() {
        let yaml = format!(
            "id: {}\nemail: ana@example.com\nname: Ana\nbranch: {}\ncreated_at: 2026-01-05T09:00:00Z\n",
            EntityId::new(EntityPrefix::Usr),
            EntityId::new(EntityPrefix::Brn)
        );
        let user: User = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(user.role, Role::Operator);
        assert!(user.active);
        assert!(!user.is_admin());
    }
}
