//! CLI command implementations

pub mod auth;
pub mod blade;
pub mod blade_type;
pub mod branch;
pub mod completions;
pub mod init;
pub mod report;
pub mod user;
pub mod validate;
