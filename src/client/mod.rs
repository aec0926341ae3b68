//! Model client backends and the call/response contract flows depend on.
//!
//! A flow never talks to a vendor SDK directly: it hands a rendered prompt
//! and a [`ResponseFormat`] to a [`ModelClient`] and gets back either a
//! structured payload or a media handle. The client is constructed once at
//! startup and passed explicitly into each invocation.

pub mod gemini;
pub mod ollama;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::util::parse_data_uri;

/// How the model is asked to shape its reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseFormat {
    /// Respond with JSON matching the given schema.
    Json(Value),
    /// Respond with both a text and an image part.
    TextAndImage,
}

impl ResponseFormat {
    pub fn kind(&self) -> &'static str {
        match self {
            ResponseFormat::Json(_) => "structured JSON",
            ResponseFormat::TextAndImage => "text and image",
        }
    }
}

/// What a model call produced, before any output validation.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResult {
    /// A structured JSON payload.
    Structured(Value),
    /// A handle to generated media content, as a data URI.
    Media { uri: String },
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Request(String),
    #[error("model API returned an error: {0}")]
    Api(String),
    #[error("model response could not be parsed: {0}")]
    Parse(String),
    #[error("the {provider} provider does not support {format} responses")]
    UnsupportedFormat {
        provider: &'static str,
        format: &'static str,
    },
}

/// The external model collaborator. One rendered prompt in, one raw result
/// out; `Ok(None)` means the model returned nothing usable. A call is a
/// single attempt: no retry, no backoff, no timeout beyond the transport's.
#[async_trait]
pub trait ModelClient: Send + Sync {
    fn provider(&self) -> &'static str;

    async fn call(
        &self,
        prompt: &str,
        format: &ResponseFormat,
    ) -> Result<Option<RawResult>, ModelError>;
}

/// A rendered prompt split into text runs and embedded media references.
/// Backends turn media segments into whatever attachment form their API
/// expects instead of sending megabytes of base64 as prose.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptSegment {
    Text(String),
    Media { mime: String, base64: String },
}

/// Split a rendered prompt on embedded `data:` URIs. A URI counts as media
/// when it parses as a base64 data URI; anything else stays prompt text.
pub fn split_prompt(prompt: &str) -> Vec<PromptSegment> {
    let mut segments = Vec::new();
    let mut rest = prompt;

    while let Some(start) = rest.find("data:") {
        let candidate = &rest[start..];
        let end = candidate
            .find(char::is_whitespace)
            .unwrap_or(candidate.len());
        match parse_data_uri(&candidate[..end]) {
            Some(uri) => {
                if start > 0 {
                    segments.push(PromptSegment::Text(rest[..start].to_string()));
                }
                segments.push(PromptSegment::Media {
                    mime: uri.mime.to_string(),
                    base64: uri.base64.to_string(),
                });
                rest = &candidate[end..];
            }
            None => {
                // "data:" appeared in prose; keep scanning past it.
                let consumed = start + "data:".len();
                segments.push(PromptSegment::Text(rest[..consumed].to_string()));
                rest = &rest[consumed..];
            }
        }
    }

    if !rest.is_empty() {
        segments.push(PromptSegment::Text(rest.to_string()));
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_without_media_is_one_text_segment() {
        let segments = split_prompt("Generate an abstract optical illusion.");
        assert_eq!(
            segments,
            vec![PromptSegment::Text(
                "Generate an abstract optical illusion.".to_string()
            )]
        );
    }

    #[test]
    fn embedded_data_uri_becomes_a_media_segment() {
        let segments = split_prompt("Image: data:image/png;base64,AAAA\n\nRespond with JSON.");
        assert_eq!(
            segments,
            vec![
                PromptSegment::Text("Image: ".to_string()),
                PromptSegment::Media {
                    mime: "image/png".to_string(),
                    base64: "AAAA".to_string(),
                },
                PromptSegment::Text("\n\nRespond with JSON.".to_string()),
            ]
        );
    }

    #[test]
    fn prose_mention_of_data_is_not_media() {
        let segments = split_prompt("The data: field holds the reading.");
        let text: String = segments
            .iter()
            .map(|s| match s {
                PromptSegment::Text(t) => t.as_str(),
                PromptSegment::Media { .. } => panic!("no media expected"),
            })
            .collect();
        assert_eq!(text, "The data: field holds the reading.");
    }

    #[test]
    fn trailing_media_uri_is_captured() {
        let segments = split_prompt("Artwork: data:image/jpeg;base64,QUJD");
        assert_eq!(
            segments.last(),
            Some(&PromptSegment::Media {
                mime: "image/jpeg".to_string(),
                base64: "QUJD".to_string(),
            })
        );
    }
}
