//! Core module - fundamental types and services

pub mod auth;
pub mod config;
pub mod dashboard;
pub mod directory;
pub mod entity;
pub mod export;
pub mod identity;
pub mod lifecycle;
pub mod project;
pub mod session;
pub mod shortid;
pub mod store;
pub mod validation;

pub use auth::{AuthError, IdentityProvider, LocalIdentity};
pub use config::Config;
pub use dashboard::{Dashboard, ReportError};
pub use directory::{
    BladeTypeForm, BranchForm, Directory, DirectoryEditor, DirectoryError, UserForm,
};
pub use entity::Entity;
pub use identity::{EntityId, EntityPrefix, IdParseError};
pub use lifecycle::{
    BladeLifecycle, BladeSnapshot, LifecycleError, LookupOutcome, NewBlade, SharpeningForm,
};
pub use project::{Project, ProjectError};
pub use session::{sign_in, IdentityGate, Session};
pub use shortid::ShortIdIndex;
pub use store::{DocumentStore, FileStore, MemoryStore, StoreError};
pub use validation::ValidationError;
