use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::language_utils;
use crate::providers::{RetryPolicy, endpoint_url, send_with_retry};
use crate::translation::TranslationEngine;

/// Default Ollama endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default system prompt; `{source_language}` and `{target_language}` are replaced by language names
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a professional subtitle translator. Translate the user's text from {source_language} to {target_language}. Keep line breaks. Reply with the translation only, without notes or quotes.";

// Languages listed by `supported_languages`; pair support accepts any known ISO code
const ADVERTISED_LANGUAGES: &[&str] = &[
    "ar", "cs", "da", "de", "el", "en", "es", "fa", "fi", "fr", "he", "hi", "hu", "id", "it", "ja",
    "ko", "ms", "nl", "no", "pl", "pt", "ro", "ru", "sv", "th", "tl", "tr", "uk", "vi", "zh",
];

/// Generate request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

/// Generation options for the Ollama API
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for generation (default: 0.8)
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Generation response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Model name
    pub model: String,
    /// Generated text
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
}

/// Installed model, as listed by `/api/tags`
#[derive(Debug, Clone, Deserialize)]
pub struct ModelTag {
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

impl GenerationRequest {
    /// Create a new non-streaming generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            options: None,
            stream: Some(false),
        }
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).temperature = Some(temperature);
        self
    }
}

/// Ollama translation engine
#[derive(Debug)]
pub struct OllamaEngine {
    /// Base URL of the Ollama API
    base_url: String,
    /// Model used for translation
    model: String,
    /// System prompt template
    system_prompt: String,
    temperature: f32,
    client: Client,
    retry: RetryPolicy,
}

impl OllamaEngine {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
        retry: RetryPolicy,
    ) -> Self {
        let base_url = base_url.into();
        let base_url = if base_url.trim().is_empty() { DEFAULT_ENDPOINT.to_string() } else { base_url };

        Self {
            base_url,
            model: model.into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: 0.3,
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                // Ollama uses HTTP/1.1
                .http1_only()
                .pool_idle_timeout(Duration::from_secs(90))
                .build()
                .unwrap_or_default(),
            retry,
        }
    }

    /// Replace the system prompt template
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        if !prompt.trim().is_empty() {
            self.system_prompt = prompt;
        }
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// System prompt for a language pair
    pub fn render_system_prompt(&self, source_language: &str, target_language: &str) -> String {
        let name = |code: &str| language_utils::get_language_name(code).unwrap_or_else(|| code.to_string());
        self.system_prompt
            .replace("{source_language}", &name(source_language))
            .replace("{target_language}", &name(target_language))
    }

    /// Models installed on the server
    pub async fn list_models(&self) -> Result<Vec<ModelTag>, ProviderError> {
        let url = endpoint_url(&self.base_url, "api/tags");
        let response = send_with_retry("Ollama", self.retry, || self.client.get(&url)).await?;
        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Ollama /api/tags: {}", e)))?;
        Ok(tags.models)
    }

    /// Generate text from the Ollama API with retry logic
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let url = endpoint_url(&self.base_url, "api/generate");
        let response = send_with_retry("Ollama", self.retry, || self.client.post(&url).json(&request)).await?;
        response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Ollama /api/generate: {}", e)))
    }
}

/// Whether `model` is among the installed `models`; a missing tag means `latest`
pub fn model_installed(models: &[ModelTag], model: &str) -> bool {
    let wanted = if model.contains(':') { model.to_string() } else { format!("{}:latest", model) };
    models.iter().any(|tag| tag.name == model || tag.name == wanted)
}

#[async_trait]
impl TranslationEngine for OllamaEngine {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn supported_languages(&self) -> Result<BTreeSet<String>, ProviderError> {
        Ok(ADVERTISED_LANGUAGES.iter().map(|code| code.to_string()).collect())
    }

    async fn is_pair_supported(&self, source_language: &str, target_language: &str) -> Result<bool, ProviderError> {
        Ok(language_utils::is_known_language(source_language)
            && language_utils::is_known_language(target_language)
            && !language_utils::language_codes_match(source_language, target_language))
    }

    async fn prepare(&self, _source_language: &str, _target_language: &str) -> Result<(), ProviderError> {
        let models = self.list_models().await?;
        if !model_installed(&models, &self.model) {
            return Err(ProviderError::ModelUnavailable(format!(
                "{} is not installed on {} (run `ollama pull {}`)",
                self.model, self.base_url, self.model
            )));
        }
        info!("Using Ollama model {}", self.model);
        Ok(())
    }

    async fn translate_text(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let request = GenerationRequest::new(&self.model, text)
            .system(self.render_system_prompt(source_language, target_language))
            .temperature(self.temperature);

        let response = self.generate(request).await?;
        debug!("Ollama {} produced {} chars", response.model, response.response.len());
        Ok(response.response.trim().to_string())
    }
}
