//! Rich diagnostics for YAML syntax errors

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// A YAML syntax error pointing into the offending file
#[derive(Debug, Error, Diagnostic)]
#[error("YAML syntax error: {message}")]
#[diagnostic(
    code(sawtrack::yaml::syntax),
    help("Check indentation and quoting near the highlighted location")
)]
pub struct YamlSyntaxError {
    #[source_code]
    pub src: NamedSource<String>,

    #[label("here")]
    pub span: Option<SourceSpan>,

    pub message: String,
}

impl YamlSyntaxError {
    /// Build a diagnostic from a serde_yml error and the content that produced it
    pub fn from_serde_error(err: &serde_yml::Error, content: &str, filename: &str) -> Self {
        let span = err.location().map(|loc| {
            let offset = loc.index().min(content.len());
            let len = if offset < content.len() { 1 } else { 0 };
            SourceSpan::from((offset, len))
        });

        Self {
            src: NamedSource::new(filename, content.to_string()),
            span,
            message: err.to_string(),
        }
    }
}

/// Errors raised while reading YAML documents
#[derive(Debug, Error, Diagnostic)]
pub enum YamlError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),

    #[error("{0} is not a YAML mapping")]
    #[diagnostic(
        code(sawtrack::yaml::not_a_mapping),
        help("Each record file holds one mapping of field names to values")
    )]
    NotAMapping(String),
}
