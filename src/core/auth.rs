//! Identity collaborator - account provisioning and credential checks
//!
//! [`LocalIdentity`] keeps accounts in `.sawtrack/credentials.yaml`, one entry
//! per email holding an Argon2id PHC string. The uid it hands out is the ID of
//! the user's profile document.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::project::Project;
use crate::core::store::StoreError;
use crate::yaml::{parse_yaml, YamlError};

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Error, Diagnostic)]
pub enum AuthError {
    #[error("invalid credentials, please try again")]
    #[diagnostic(code(sawtrack::auth::invalid_credentials))]
    InvalidCredentials,

    #[error("an account already exists for {0}")]
    #[diagnostic(code(sawtrack::auth::email_in_use))]
    EmailInUse(String),

    #[error("password must be at least 6 characters")]
    #[diagnostic(code(sawtrack::auth::weak_password))]
    WeakPassword,

    #[error("passwords do not match")]
    #[diagnostic(code(sawtrack::auth::password_mismatch))]
    PasswordMismatch,

    #[error("email is required")]
    #[diagnostic(code(sawtrack::auth::missing_email))]
    MissingEmail,

    #[error("not signed in")]
    #[diagnostic(
        code(sawtrack::auth::not_signed_in),
        help("Sign in with 'sawtrack login --email <EMAIL>'")
    )]
    NotSignedIn,

    #[error("account {0} is inactive")]
    #[diagnostic(code(sawtrack::auth::inactive), help("Ask an administrator to reactivate it"))]
    Inactive(String),

    #[error("no user profile found for {0}")]
    #[diagnostic(code(sawtrack::auth::profile_missing))]
    ProfileMissing(String),

    #[error("the administrator role is required to {0}")]
    #[diagnostic(code(sawtrack::auth::forbidden))]
    Forbidden(&'static str),

    #[error("credential store error at {path}: {source}")]
    #[diagnostic(code(sawtrack::auth::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {message}")]
    #[diagnostic(code(sawtrack::auth::encode))]
    Encode { path: PathBuf, message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Yaml(#[from] YamlError),

    #[error("failed to hash password: {0}")]
    #[diagnostic(code(sawtrack::auth::hash))]
    Hash(String),

    #[error("Operation failed, please try again")]
    #[diagnostic(code(sawtrack::auth::collaborator))]
    Collaborator { cause: StoreError },
}

/// Log a failed store call and hide it behind the generic retry message
pub(crate) fn collaborator(cause: StoreError) -> AuthError {
    error!(error = %cause, "document store call failed");
    AuthError::Collaborator { cause }
}

/// Account provisioning and sign-in checks
pub trait IdentityProvider {
    /// Create an account and return its uid
    fn create_account(&mut self, email: &str, password: &str) -> Result<EntityId, AuthError>;

    /// Check credentials and return the account's uid
    fn verify(&self, email: &str, password: &str) -> Result<EntityId, AuthError>;
}

/// Normalize an email for lookups
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Check a new password against the policy and its confirmation
pub fn check_new_password(password: &str, confirmation: Option<&str>) -> Result<(), AuthError> {
    if let Some(confirmation) = confirmation {
        if confirmation != password {
            return Err(AuthError::PasswordMismatch);
        }
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Account {
    uid: EntityId,
    /// Argon2id PHC string, salt and parameters included
    hash: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialFile {
    #[serde(default)]
    accounts: BTreeMap<String, Account>,
}

/// File-backed identity provider
#[derive(Debug, Default)]
pub struct LocalIdentity {
    path: Option<PathBuf>,
    accounts: BTreeMap<String, Account>,
}

impl LocalIdentity {
    /// Open the project's credential file (missing file means no accounts)
    pub fn open(project: &Project) -> Result<Self, AuthError> {
        Self::at(&project.credentials_path())
    }

    pub fn at(path: &Path) -> Result<Self, AuthError> {
        let accounts = if path.exists() {
            let content = fs::read_to_string(path).map_err(|source| AuthError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            parse_yaml::<Option<CredentialFile>>(&content, &path.display().to_string())?
                .unwrap_or_default()
                .accounts
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path: Some(path.to_path_buf()),
            accounts,
        })
    }

    /// Identity provider that never touches the disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn has_account(&self, email: &str) -> bool {
        self.accounts.contains_key(&normalize_email(email))
    }

    fn persist(&self) -> Result<(), AuthError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let file = CredentialFile {
            accounts: self.accounts.clone(),
        };
        let yaml = serde_yml::to_string(&file).map_err(|e| AuthError::Encode {
            path: path.clone(),
            message: e.to_string(),
        })?;
        fs::write(path, yaml).map_err(|source| AuthError::Io {
            path: path.clone(),
            source,
        })
    }
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt_bytes: [u8; 16] = rand::random();
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| AuthError::Hash(e.to_string()))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

fn password_matches(stored: &str, password: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!(error = %e, "unreadable password hash in credential file");
            false
        }
    }
}

impl IdentityProvider for LocalIdentity {
    fn create_account(&mut self, email: &str, password: &str) -> Result<EntityId, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AuthError::MissingEmail);
        }
        if self.accounts.contains_key(&email) {
            return Err(AuthError::EmailInUse(email));
        }
        check_new_password(password, None)?;

        let account = Account {
            uid: EntityId::new(EntityPrefix::Usr),
            hash: hash_password(password)?,
        };
        let uid = account.uid;
        self.accounts.insert(email, account);
        self.persist()?;
        Ok(uid)
    }

    fn verify(&self, email: &str, password: &str) -> Result<EntityId, AuthError> {
        let account = self
            .accounts
            .get(&normalize_email(email))
            .ok_or(AuthError::InvalidCredentials)?;
        if password_matches(&account.hash, password) {
            Ok(account.uid)
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}
