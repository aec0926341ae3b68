//! Provider configuration, read once from the environment at startup.
//!
//! A missing credential is a startup error here, never a per-call surprise
//! inside a flow. `.env` loading is the binary's job; this module only reads
//! what is already in the process environment.

use anyhow::{Context, Result, bail};
use std::env;
use url::Url;

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
// Only this preview model family can generate images.
const DEFAULT_GEMINI_IMAGE_MODEL: &str = "gemini-2.0-flash-preview-image-generation";
const DEFAULT_OLLAMA_MODEL: &str = "llava:latest";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: Url,
    pub model: String,
    pub image_model: String,
}

impl GeminiConfig {
    pub fn from_env() -> Result<Self> {
        let Ok(api_key) = env::var("GEMINI_API_KEY") else {
            bail!("GEMINI_API_KEY is not set");
        };
        if api_key.trim().is_empty() {
            bail!("GEMINI_API_KEY is empty");
        }

        let base_url = env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string());
        let base_url = Url::parse(&base_url)
            .with_context(|| format!("GEMINI_BASE_URL is not a valid URL: {base_url}"))?;

        Ok(Self {
            api_key,
            base_url,
            model: env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
            image_model: env::var("GEMINI_IMAGE_MODEL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_IMAGE_MODEL.to_string()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Override for a non-local server. `None` uses the client default.
    pub url: Option<Url>,
    pub model: String,
}

impl OllamaConfig {
    pub fn from_env() -> Result<Self> {
        let url = match env::var("OLLAMA_URL") {
            Ok(raw) => Some(
                Url::parse(&raw).with_context(|| format!("OLLAMA_URL is not a valid URL: {raw}"))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            url,
            model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| DEFAULT_OLLAMA_MODEL.to_string()),
        })
    }
}
