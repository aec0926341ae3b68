//! Prompt templates: an immutable instruction string with named placeholders
//! and one pure rendering function.
//!
//! Templates use the `{{field}}` syntax the original prompts were written in,
//! including the media-tagged form `{{media url=field}}` which substitutes a
//! reference to binary image content (a data URI) instead of inline prose.
//! The rendering engine is created fresh on every call, so a template carries
//! no hidden state and identical inputs always render identically.

use handlebars::{
    Context, Handlebars, Helper, HelperResult, Output, RenderContext, RenderError,
    RenderErrorReason, no_escape,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    /// A placeholder named a field the payload does not carry. This is a
    /// programming defect in the flow definition, not a caller fault.
    #[error("template placeholder has no matching field: {0}")]
    MissingField(String),
    #[error("template failed to render: {0}")]
    Render(String),
}

/// An immutable string-with-placeholders. Construction never fails; errors
/// surface at render time where the payload is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    source: String,
}

impl PromptTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Substitute every placeholder with the matching payload field.
    /// Deterministic: same template and payload give the same string.
    pub fn render(&self, payload: &Value) -> Result<String, TemplateError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(no_escape);
        registry.register_helper("media", Box::new(media_helper));

        registry
            .render_template(&self.source, payload)
            .map_err(into_template_error)
    }
}

/// `{{media url=field}}` emits the field's data URI so the model client can
/// recognize it as an attached image rather than prompt text.
fn media_helper(
    h: &Helper<'_>,
    _: &Handlebars<'_>,
    _: &Context,
    _: &mut RenderContext<'_, '_>,
    out: &mut dyn Output,
) -> HelperResult {
    let url = h
        .hash_get("url")
        .and_then(|v| v.value().as_str())
        .ok_or(RenderErrorReason::ParamNotFoundForName(
            "media",
            "url".to_string(),
        ))?;
    out.write(url)?;
    Ok(())
}

fn into_template_error(e: RenderError) -> TemplateError {
    match e.reason() {
        RenderErrorReason::MissingVariable(path) => TemplateError::MissingField(
            path.clone().unwrap_or_else(|| "<unknown>".to_string()),
        ),
        _ => TemplateError::Render(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn substitutes_named_placeholders() {
        let template = PromptTemplate::new("Identify the symbol named {{name}}.");
        let rendered = template.render(&json!({"name": "Ouroboros"})).unwrap();
        assert_eq!(rendered, "Identify the symbol named Ouroboros.");
    }

    #[test]
    fn media_placeholder_emits_the_data_uri() {
        let template = PromptTemplate::new("Image: {{media url=imageDataUri}}\n\nRespond.");
        let rendered = template
            .render(&json!({"imageDataUri": "data:image/png;base64,AAAA"}))
            .unwrap();
        assert_eq!(rendered, "Image: data:image/png;base64,AAAA\n\nRespond.");
    }

    #[test]
    fn rendering_is_deterministic() {
        let template = PromptTemplate::new("Image: {{media url=imageDataUri}} for {{task}}");
        let payload = json!({"imageDataUri": "data:image/png;base64,AAAA", "task": "analysis"});
        let first = template.render(&payload).unwrap();
        let second = template.render(&payload).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_field_is_a_template_error() {
        let template = PromptTemplate::new("Hello {{missing}}");
        let err = template.render(&json!({"other": 1})).unwrap_err();
        assert!(matches!(err, TemplateError::MissingField(_)));
    }

    #[test]
    fn data_uri_payload_is_not_escaped() {
        let template = PromptTemplate::new("{{uri}}");
        let rendered = template
            .render(&json!({"uri": "data:image/png;base64,AA+/AA=="}))
            .unwrap();
        assert_eq!(rendered, "data:image/png;base64,AA+/AA==");
    }

    #[test]
    fn template_without_placeholders_renders_verbatim() {
        let template = PromptTemplate::new("Generate an abstract optical illusion.");
        let rendered = template.render(&json!({})).unwrap();
        assert_eq!(rendered, "Generate an abstract optical illusion.");
    }
}
