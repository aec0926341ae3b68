//! Ollama backend for running the analysis flows against a local multimodal
//! model. Structured replies use the chat endpoint's structured-JSON format;
//! image generation is not something Ollama offers, so media flows are
//! rejected up front.

use async_trait::async_trait;
use ollama_rs::Ollama;
use ollama_rs::generation::chat::{ChatMessage, request::ChatMessageRequest};
use ollama_rs::generation::images::Image;
use ollama_rs::generation::parameters::{FormatType, JsonStructure};
use serde_json::Value;
use tracing::{debug, error};

use crate::client::{ModelClient, ModelError, PromptSegment, RawResult, ResponseFormat, split_prompt};
use crate::config::OllamaConfig;

pub struct OllamaClient {
    client: Ollama,
    model: String,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Self {
        let client = match config.url {
            Some(url) => {
                let port = url.port().unwrap_or(11434);
                Ollama::new(url, port)
            }
            None => Ollama::default(),
        };
        Self {
            client,
            model: config.model,
        }
    }
}

/// Rebuild the prompt as plain text plus detached images. Ollama takes
/// images as bare base64 alongside the message, never inline.
fn text_and_images(prompt: &str) -> (String, Vec<Image>) {
    let mut text = String::new();
    let mut images = Vec::new();
    for segment in split_prompt(prompt) {
        match segment {
            PromptSegment::Text(t) => text.push_str(&t),
            PromptSegment::Media { base64, .. } => {
                text.push_str("(attached image)");
                images.push(Image::from_base64(&base64));
            }
        }
    }
    (text, images)
}

#[async_trait]
impl ModelClient for OllamaClient {
    fn provider(&self) -> &'static str {
        "ollama"
    }

    #[tracing::instrument(name = "ollama_call", skip(self, prompt, format))]
    async fn call(
        &self,
        prompt: &str,
        format: &ResponseFormat,
    ) -> Result<Option<RawResult>, ModelError> {
        let ResponseFormat::Json(schema) = format else {
            return Err(ModelError::UnsupportedFormat {
                provider: self.provider(),
                format: format.kind(),
            });
        };

        let structure = schemars::Schema::try_from(schema.clone())
            .map_err(|e| ModelError::Parse(format!("response schema is not a schema: {e}")))?;
        let format = FormatType::StructuredJson(Box::new(JsonStructure::new_for_schema(structure)));

        let (text, images) = text_and_images(prompt);
        debug!(model = %self.model, images = images.len(), "sending chat request");

        let mut message = ChatMessage::user(text);
        if !images.is_empty() {
            message = message.with_images(images);
        }
        let req = ChatMessageRequest::new(self.model.clone(), vec![message]).format(format);

        let resp = self.client.send_chat_messages(req).await.map_err(|e| {
            error!("Ollama error: {e}");
            ModelError::Request(format!("Ollama request failed: {e}"))
        })?;

        let content = resp.message.content;
        if content.trim().is_empty() {
            return Ok(None);
        }

        let value: Value = serde_json::from_str(&content)
            .map_err(|e| ModelError::Parse(format!("model reply is not JSON: {e}")))?;
        Ok(Some(RawResult::Structured(value)))
    }
}
