//! sawtrack: saw-blade sharpening tracker
//!
//! Tracks blades through their sharpening lifecycle across branch locations,
//! keeping every record as a plain-text YAML file inside a project directory.

pub mod cli;
pub mod core;
pub mod entities;
pub mod schema;
pub mod yaml;
