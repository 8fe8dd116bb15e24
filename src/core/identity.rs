//! Entity identifiers - `PREFIX-ULID` strings
//!
//! Every stored record carries an ID made of a collection prefix and a ULID,
//! e.g. `BLD-01JB7Q2M3C4D5E6F7G8H9J0K1M`. ULIDs sort by creation time, so a
//! directory listing of a collection is also its creation order.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ulid::Ulid;

/// Collection prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityPrefix {
    /// Saw blade
    Bld,
    /// Sharpening event
    Shp,
    /// Branch location
    Brn,
    /// Blade type
    Bty,
    /// Staff user
    Usr,
}

impl EntityPrefix {
    /// All known prefixes
    pub fn all() -> &'static [EntityPrefix] {
        &[
            EntityPrefix::Bld,
            EntityPrefix::Shp,
            EntityPrefix::Brn,
            EntityPrefix::Bty,
            EntityPrefix::Usr,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::Bld => "BLD",
            EntityPrefix::Shp => "SHP",
            EntityPrefix::Brn => "BRN",
            EntityPrefix::Bty => "BTY",
            EntityPrefix::Usr => "USR",
        }
    }

    /// Name of the collection (and directory) holding this entity type
    pub fn collection(&self) -> &'static str {
        match self {
            EntityPrefix::Bld => "blades",
            EntityPrefix::Shp => "sharpening-history",
            EntityPrefix::Brn => "branches",
            EntityPrefix::Bty => "blade-types",
            EntityPrefix::Usr => "users",
        }
    }

    /// Base name of the embedded JSON schema for this entity type
    pub fn schema_name(&self) -> &'static str {
        match self {
            EntityPrefix::Bld => "blade",
            EntityPrefix::Shp => "sharpening",
            EntityPrefix::Brn => "branch",
            EntityPrefix::Bty => "blade_type",
            EntityPrefix::Usr => "user",
        }
    }
}

impl fmt::Display for EntityPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityPrefix {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BLD" => Ok(EntityPrefix::Bld),
            "SHP" => Ok(EntityPrefix::Shp),
            "BRN" => Ok(EntityPrefix::Brn),
            "BTY" => Ok(EntityPrefix::Bty),
            "USR" => Ok(EntityPrefix::Usr),
            _ => Err(IdParseError::UnknownPrefix(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdParseError {
    #[error("missing '-' separator in entity ID '{0}'")]
    MissingSeparator(String),

    #[error("unknown entity prefix '{0}'")]
    UnknownPrefix(String),

    #[error("invalid ULID in entity ID '{0}'")]
    InvalidUlid(String),
}

/// A typed entity ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    prefix: EntityPrefix,
    ulid: Ulid,
}

impl EntityId {
    /// Generate a fresh ID for the given prefix
    pub fn new(prefix: EntityPrefix) -> Self {
        Self {
            prefix,
            ulid: Ulid::new(),
        }
    }

    pub fn prefix(&self) -> EntityPrefix {
        self.prefix
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.ulid)
    }
}

impl FromStr for EntityId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, ulid) = s
            .split_once('-')
            .ok_or_else(|| IdParseError::MissingSeparator(s.to_string()))?;
        let prefix: EntityPrefix = prefix.parse()?;
        let ulid = Ulid::from_string(ulid).map_err(|_| IdParseError::InvalidUlid(s.to_string()))?;
        Ok(Self { prefix, ulid })
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
