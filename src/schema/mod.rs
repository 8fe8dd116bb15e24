//! Embedded JSON schemas, templates and document validation

pub mod registry;
pub mod template;
pub mod validator;

pub use registry::SchemaRegistry;
pub use template::{TemplateError, TemplateRenderer};
pub use validator::{SchemaError, Validator};
