//! Session context and the identity gate
//!
//! A [`Session`] is created by signing in and is passed explicitly to every
//! operation that needs to know who is acting. The [`IdentityGate`] persists
//! the signed-in identity between CLI invocations and turns it back into a
//! `Session`, re-reading the user's profile so role and active flag are
//! always current.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::auth::{collaborator, normalize_email, AuthError, IdentityProvider};
use crate::core::identity::EntityId;
use crate::core::project::Project;
use crate::core::store::DocumentStore;
use crate::entities::User;
use crate::yaml::parse_yaml;

/// The acting user for the duration of a command
#[derive(Debug, Clone)]
pub struct Session {
    user: User,
    signed_in_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user: User, signed_in_at: DateTime<Utc>) -> Self {
        Self { user, signed_in_at }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn user_id(&self) -> EntityId {
        self.user.id
    }

    pub fn email(&self) -> &str {
        &self.user.email
    }

    pub fn signed_in_at(&self) -> DateTime<Utc> {
        self.signed_in_at
    }

    pub fn is_admin(&self) -> bool {
        self.user.is_admin()
    }

    /// Fail unless the acting user is an administrator
    pub fn require_admin(&self, action: &'static str) -> Result<(), AuthError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AuthError::Forbidden(action))
        }
    }
}

/// Verify credentials and build a session from the user's profile
pub fn sign_in<I: IdentityProvider, S: DocumentStore>(
    identity: &I,
    store: &S,
    email: &str,
    password: &str,
) -> Result<Session, AuthError> {
    let uid = identity.verify(email, password)?;
    let session = session_for(store, uid, &normalize_email(email), Utc::now())?;
    info!(user = %session.user_id(), "signed in");
    Ok(session)
}

fn session_for<S: DocumentStore>(
    store: &S,
    uid: EntityId,
    email: &str,
    signed_in_at: DateTime<Utc>,
) -> Result<Session, AuthError> {
    let user: User = store
        .fetch(&uid)
        .map_err(collaborator)?
        .ok_or_else(|| AuthError::ProfileMissing(email.to_string()))?;
    if !user.active {
        return Err(AuthError::Inactive(user.email));
    }
    Ok(Session::new(user, signed_in_at))
}

/// What is persisted between invocations
#[derive(Debug, Serialize, Deserialize)]
struct SessionRecord {
    user: EntityId,
    email: String,
    signed_in_at: DateTime<Utc>,
}

/// Gate in front of every command that needs a signed-in user
pub struct IdentityGate {
    path: PathBuf,
}

impl IdentityGate {
    pub fn new(project: &Project) -> Self {
        Self {
            path: project.session_path(),
        }
    }

    /// Restore the current session, or fail with `NotSignedIn`
    pub fn open<S: DocumentStore>(&self, store: &S) -> Result<Session, AuthError> {
        if !self.path.exists() {
            return Err(AuthError::NotSignedIn);
        }
        let content = fs::read_to_string(&self.path).map_err(|source| AuthError::Io {
            path: self.path.clone(),
            source,
        })?;
        let record: SessionRecord = parse_yaml(&content, &self.path.display().to_string())?;
        debug!(user = %record.user, "restoring session");
        session_for(store, record.user, &record.email, record.signed_in_at)
    }

    /// Persist a freshly signed-in session
    pub fn persist(&self, session: &Session) -> Result<(), AuthError> {
        let record = SessionRecord {
            user: session.user_id(),
            email: session.email().to_string(),
            signed_in_at: session.signed_in_at(),
        };
        let yaml = serde_yml::to_string(&record).map_err(|e| AuthError::Encode {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        fs::write(&self.path, yaml).map_err(|source| AuthError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Tear the session down; returns whether one existed
    pub fn clear(&self) -> Result<bool, AuthError> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path).map_err(|source| AuthError::Io {
            path: self.path.clone(),
            source,
        })?;
        info!("signed out");
        Ok(true)
    }
}
