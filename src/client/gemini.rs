//! Gemini backend, the hosted model family the flows were designed against.
//!
//! JSON flows use `responseMimeType`/`responseSchema` so the API itself is
//! told what shape to produce; media flows ask for both TEXT and IMAGE
//! modalities, which the image-generation models require.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, error};
use url::Url;

use crate::client::{ModelClient, ModelError, PromptSegment, RawResult, ResponseFormat, split_prompt};
use crate::config::GeminiConfig;

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    base_url: Url,
    api_key: String,
    model: String,
    image_model: String,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.base_url,
            api_key: config.api_key,
            model: config.model,
            image_model: config.image_model,
        }
    }

    fn endpoint(&self, format: &ResponseFormat) -> String {
        let model = match format {
            ResponseFormat::Json(_) => &self.model,
            ResponseFormat::TextAndImage => &self.image_model,
        };
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.as_str().trim_end_matches('/'),
            model
        )
    }
}

/// Build the `generateContent` request. Embedded data URIs in the prompt are
/// carried as `inlineData` parts, not prompt text.
fn request_body(prompt: &str, format: &ResponseFormat) -> Value {
    let parts: Vec<Value> = split_prompt(prompt)
        .into_iter()
        .map(|segment| match segment {
            PromptSegment::Text(text) => json!({"text": text}),
            PromptSegment::Media { mime, base64 } => {
                json!({"inlineData": {"mimeType": mime, "data": base64}})
            }
        })
        .collect();

    let generation_config = match format {
        ResponseFormat::Json(schema) => json!({
            "responseMimeType": "application/json",
            "responseSchema": schema,
        }),
        ResponseFormat::TextAndImage => json!({
            "responseModalities": ["TEXT", "IMAGE"],
        }),
    };

    json!({
        "contents": [{"role": "user", "parts": parts}],
        "generationConfig": generation_config,
    })
}

/// Pull the usable payload out of a `generateContent` response. `Ok(None)`
/// when the model produced no candidate or no part of the requested kind.
fn parse_response(body: &Value, format: &ResponseFormat) -> Result<Option<RawResult>, ModelError> {
    let Some(parts) = body
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
    else {
        return Ok(None);
    };

    match format {
        ResponseFormat::TextAndImage => {
            for part in parts {
                let mime = part.pointer("/inlineData/mimeType").and_then(Value::as_str);
                let data = part.pointer("/inlineData/data").and_then(Value::as_str);
                if let (Some(mime), Some(data)) = (mime, data) {
                    return Ok(Some(RawResult::Media {
                        uri: format!("data:{mime};base64,{data}"),
                    }));
                }
            }
            Ok(None)
        }
        ResponseFormat::Json(_) => {
            let Some(text) = parts
                .iter()
                .find_map(|part| part.get("text").and_then(Value::as_str))
                .filter(|text| !text.trim().is_empty())
            else {
                return Ok(None);
            };
            let value: Value = serde_json::from_str(text)
                .map_err(|e| ModelError::Parse(format!("candidate text is not JSON: {e}")))?;
            Ok(Some(RawResult::Structured(value)))
        }
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    fn provider(&self) -> &'static str {
        "gemini"
    }

    #[tracing::instrument(name = "gemini_call", skip(self, prompt, format))]
    async fn call(
        &self,
        prompt: &str,
        format: &ResponseFormat,
    ) -> Result<Option<RawResult>, ModelError> {
        let url = self.endpoint(format);
        debug!(%url, "sending generateContent request");

        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(prompt, format))
            .send()
            .await
            .map_err(|e| ModelError::Request(format!("Gemini request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_else(|_| "<no body>".into());
            error!(%status, "Gemini error: {}", text);
            return Err(ModelError::Api(format!("{status}: {text}")));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| ModelError::Parse(format!("invalid Gemini response body: {e}")))?;

        parse_response(&body, format)
    }
}
