/*!
 * LibreTranslate engine.
 *
 * Talks to a LibreTranslate server (`/languages`, `/translate`). The server
 * runs the Argos Translate models locally, so supported pairs depend on the
 * language packages installed on it; they are queried once per engine and
 * cached.
 */

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use parking_lot::RwLock;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::providers::{RetryPolicy, endpoint_url, send_with_retry};
use crate::translation::TranslationEngine;

/// Default LibreTranslate endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000";

/// Language entry of `GET /languages`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LanguageInfo {
    pub code: String,
    pub name: String,
    /// Codes this language can be translated into
    #[serde(default)]
    pub targets: Vec<String>,
}

/// Body of `POST /translate`
#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
    error: Option<String>,
}

/// LibreTranslate client
#[derive(Debug)]
pub struct LibreTranslateEngine {
    endpoint: String,
    api_key: Option<String>,
    client: Client,
    retry: RetryPolicy,
    languages: RwLock<Option<Arc<Vec<LanguageInfo>>>>,
}

impl LibreTranslateEngine {
    /// Create a client for the server at `endpoint`
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout_secs: u64, retry: RetryPolicy) -> Self {
        let endpoint = endpoint.into();
        let endpoint = if endpoint.trim().is_empty() { DEFAULT_ENDPOINT.to_string() } else { endpoint };

        Self {
            endpoint,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            retry,
            languages: RwLock::new(None),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Installed languages, fetched on first use
    pub async fn languages(&self) -> Result<Arc<Vec<LanguageInfo>>, ProviderError> {
        if let Some(languages) = self.languages.read().as_ref() {
            return Ok(languages.clone());
        }

        let url = endpoint_url(&self.endpoint, "languages");
        let response = send_with_retry("LibreTranslate", self.retry, || self.client.get(&url)).await?;
        let languages: Vec<LanguageInfo> = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("LibreTranslate /languages: {}", e)))?;

        info!("LibreTranslate at {} offers {} languages", self.endpoint, languages.len());
        let languages = Arc::new(languages);
        *self.languages.write() = Some(languages.clone());
        Ok(languages)
    }
}

/// Whether `languages` allow translating `source` into `target`
pub fn pair_supported(languages: &[LanguageInfo], source: &str, target: &str) -> bool {
    if source == target {
        return false;
    }
    languages
        .iter()
        .find(|lang| lang.code == source)
        .map(|lang| lang.targets.iter().any(|t| t == target))
        .unwrap_or(false)
}

#[async_trait]
impl TranslationEngine for LibreTranslateEngine {
    fn name(&self) -> &str {
        "libretranslate"
    }

    async fn supported_languages(&self) -> Result<BTreeSet<String>, ProviderError> {
        Ok(self.languages().await?.iter().map(|lang| lang.code.clone()).collect())
    }

    async fn is_pair_supported(&self, source_language: &str, target_language: &str) -> Result<bool, ProviderError> {
        let languages = self.languages().await?;
        Ok(pair_supported(&languages, source_language, target_language))
    }

    async fn prepare(&self, _source_language: &str, _target_language: &str) -> Result<(), ProviderError> {
        // Models are loaded server side; reaching /languages is the readiness check
        self.languages().await.map(|_| ())
    }

    async fn translate_text(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let url = endpoint_url(&self.endpoint, "translate");
        let request = TranslateRequest {
            q: text,
            source: source_language,
            target: target_language,
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let response = send_with_retry("LibreTranslate", self.retry, || self.client.post(&url).json(&request)).await?;
        let body: TranslateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("LibreTranslate /translate: {}", e)))?;

        if let Some(error) = body.error {
            return Err(ProviderError::Engine(error));
        }

        let translated = body
            .translated_text
            .ok_or_else(|| ProviderError::EmptyResponse("LibreTranslate response has no translatedText".to_string()))?;
        debug!("LibreTranslate {} -> {}: {} chars", source_language, target_language, translated.len());
        Ok(translated)
    }
}
