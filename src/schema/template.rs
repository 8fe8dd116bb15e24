//! Embedded tera templates

use std::collections::HashMap;

use rust_embed::Embed;
use tera::{Tera, Value};
use thiserror::Error;

#[derive(Embed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Template rendering error: {0}")]
    RenderError(String),
}

/// Renders the templates embedded at build time
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    pub fn new() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();

        for file in EmbeddedTemplates::iter() {
            let filename = file.as_ref();
            if let Some(content) = EmbeddedTemplates::get(filename) {
                if let Ok(template_str) = std::str::from_utf8(&content.data) {
                    tera.add_raw_template(filename, template_str)
                        .map_err(|e| TemplateError::RenderError(e.to_string()))?;
                }
            }
        }

        tera.register_filter("md_cell", md_cell);

        Ok(Self { tera })
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    pub fn render(&self, name: &str, context: &tera::Context) -> Result<String, TemplateError> {
        if !self.has_template(name) {
            return Err(TemplateError::NotFound(name.to_string()));
        }
        self.tera
            .render(name, context)
            .map_err(|e| TemplateError::RenderError(e.to_string()))
    }
}

/// Make a value safe inside a Markdown table cell
fn md_cell(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let escaped = text
        .replace('\\', "\\\\")
        .replace('|', "\\|")
        .replace(['\r', '\n'], " ");
    Ok(Value::String(escaped))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_template_is_embedded() {
        let renderer = TemplateRenderer::new().unwrap();
        assert!(renderer.has_template("report.md.tera"));
        assert!(matches!(
            renderer.render("missing.tera", &tera::Context::new()),
            Err(TemplateError::NotFound(_))
        ));
    }

    #[test]
    fn test_md_cell_escapes_pipes_and_newlines() {
        let out = md_cell(&Value::from("A|B\nC"), &HashMap::new()).unwrap();
        assert_eq!(out, Value::from("A\\|B C"));
        assert_eq!(md_cell(&Value::from(4), &HashMap::new()).unwrap(), Value::from("4"));
    }
}
