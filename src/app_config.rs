use anyhow::{Context, Result, anyhow};
use log::{LevelFilter, warn};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::language_utils;
use crate::ports::EmbedMode;
use crate::providers::RetryPolicy;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Language of the original subtitles (ISO), or "auto" to let Whisper detect it
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Root of the pipeline workspace
    #[serde(default = "default_workspace_dir")]
    pub workspace_dir: PathBuf,

    /// How translated subtitles are put into the video
    #[serde(default)]
    pub embed_mode: EmbedMode,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Download stage
    #[serde(default)]
    pub download: DownloadConfig,

    /// Extraction stage
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Embedding stage
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: LibreTranslate server
    #[default]
    LibreTranslate,
    // @provider: Ollama
    Ollama,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::LibreTranslate => "LibreTranslate",
            Self::Ollama => "Ollama",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::LibreTranslate => "libretranslate".to_string(),
            Self::Ollama => "ollama".to_string(),
        }
    }
}

impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "libretranslate" => Ok(Self::LibreTranslate),
            "ollama" => Ok(Self::Ollama),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name (Ollama only)
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key (LibreTranslate instances that require one)
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: TranslationProvider) -> Self {
        match provider_type {
            TranslationProvider::LibreTranslate => Self {
                provider_type: "libretranslate".to_string(),
                model: String::new(),
                api_key: String::new(),
                endpoint: default_libretranslate_endpoint(),
                timeout_secs: default_timeout_secs(),
            },
            TranslationProvider::Ollama => Self {
                provider_type: "ollama".to_string(),
                model: default_ollama_model(),
                api_key: String::new(),
                endpoint: default_ollama_endpoint(),
                timeout_secs: default_ollama_timeout_secs(),
            },
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Available translation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// System prompt template for LLM providers
    /// Placeholders: {source_language}, {target_language}
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Reuse translations of repeated cue texts
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff multiplier for retries (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    /// Lower values make output more deterministic, higher values more creative
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            cache_enabled: true,
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: default_temperature(),
        }
    }
}

/// yt-dlp download settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DownloadConfig {
    /// yt-dlp executable
    #[serde(default = "default_yt_dlp_path")]
    pub yt_dlp_path: String,

    /// yt-dlp format selector
    #[serde(default = "default_download_format")]
    pub format: String,

    /// Container of the merged download
    #[serde(default = "default_merge_output_format")]
    pub merge_output_format: String,

    /// Also fetch caption tracks next to the video
    #[serde(default = "default_true")]
    pub download_subtitles: bool,

    /// Caption languages to fetch
    #[serde(default = "default_subtitle_languages")]
    pub subtitle_languages: Vec<String>,

    /// Retries for the download and each fragment
    #[serde(default = "default_download_retries")]
    pub retries: u32,

    /// Timeout of one yt-dlp run in seconds
    #[serde(default = "default_download_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: default_yt_dlp_path(),
            format: default_download_format(),
            merge_output_format: default_merge_output_format(),
            download_subtitles: true,
            subtitle_languages: default_subtitle_languages(),
            retries: default_download_retries(),
            timeout_secs: default_download_timeout_secs(),
        }
    }
}

/// Subtitle extraction settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExtractionConfig {
    /// Whisper CLI executable
    #[serde(default = "default_whisper_path")]
    pub whisper_path: String,

    /// ffmpeg executable, used to convert vtt captions
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// Whisper model name
    #[serde(default = "default_whisper_model")]
    pub model: String,

    /// Caption languages to prefer after the requested one
    #[serde(default = "default_language_priority")]
    pub language_priority: Vec<String>,

    /// Timeout of one Whisper or ffmpeg run in seconds
    #[serde(default = "default_long_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            whisper_path: default_whisper_path(),
            ffmpeg_path: default_ffmpeg_path(),
            model: default_whisper_model(),
            language_priority: default_language_priority(),
            timeout_secs: default_long_timeout_secs(),
        }
    }
}

/// Subtitle embedding settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EmbeddingConfig {
    /// ffmpeg executable
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// ffprobe executable, used for progress
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,

    /// Timeout of one ffmpeg run in seconds
    #[serde(default = "default_long_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            timeout_secs: default_long_timeout_secs(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

/// Source language value that lets Whisper detect the language
pub const AUTO_SOURCE_LANGUAGE: &str = "auto";

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_language() -> String {
    "ko".to_string()
}

fn default_workspace_dir() -> PathBuf {
    PathBuf::from("workspace")
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_ollama_timeout_secs() -> u64 {
    120
}

fn default_long_timeout_secs() -> u64 {
    3600
}

fn default_download_timeout_secs() -> u64 {
    1800
}

fn default_retry_count() -> u32 {
    3 // Default to 3 retries
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_temperature() -> f32 {
    0.3
}

fn default_true() -> bool {
    true
}

fn default_libretranslate_endpoint() -> String {
    crate::providers::libretranslate::DEFAULT_ENDPOINT.to_string()
}

fn default_ollama_endpoint() -> String {
    crate::providers::ollama::DEFAULT_ENDPOINT.to_string()
}

fn default_ollama_model() -> String {
    "llama3".to_string()
}

fn default_system_prompt() -> String {
    crate::providers::ollama::DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_yt_dlp_path() -> String {
    "yt-dlp".to_string()
}

fn default_download_format() -> String {
    "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best".to_string()
}

fn default_merge_output_format() -> String {
    "mp4".to_string()
}

fn default_subtitle_languages() -> Vec<String> {
    vec!["en".to_string(), "ko".to_string()]
}

fn default_download_retries() -> u32 {
    10
}

fn default_whisper_path() -> String {
    "whisper".to_string()
}

fn default_whisper_model() -> String {
    "base".to_string()
}

fn default_language_priority() -> Vec<String> {
    vec!["ko".to_string(), "en".to_string()]
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

impl Config {
    /// Load the configuration at `path`, writing a default one if the file does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path).context(format!("Failed to open config file: {:?}", path))?;
            let reader = BufReader::new(file);
            let config: Config =
                serde_json::from_reader(reader).context(format!("Failed to parse config file: {:?}", path))?;
            return Ok(config);
        }

        warn!("Config file not found at {:?}, creating default config.", path);
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).context(format!("Failed to create config directory: {:?}", parent))?;
        }
        std::fs::write(path, config_json).context(format!("Failed to write config file: {:?}", path))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        if self.source_language != AUTO_SOURCE_LANGUAGE {
            language_utils::validate_language_code(&self.source_language)
                .context("Invalid source_language")?;
        }
        language_utils::validate_language_code(&self.target_language).context("Invalid target_language")?;
        for lang in self.download.subtitle_languages.iter().chain(&self.extraction.language_priority) {
            language_utils::validate_language_code(lang).context("Invalid caption language")?;
        }

        // Validate tools
        for (name, path) in [
            ("download.yt_dlp_path", &self.download.yt_dlp_path),
            ("extraction.whisper_path", &self.extraction.whisper_path),
            ("extraction.ffmpeg_path", &self.extraction.ffmpeg_path),
            ("embedding.ffmpeg_path", &self.embedding.ffmpeg_path),
            ("embedding.ffprobe_path", &self.embedding.ffprobe_path),
        ] {
            if path.trim().is_empty() {
                return Err(anyhow!("{} cannot be empty", name));
            }
        }

        for (name, secs) in [
            ("download.timeout_secs", self.download.timeout_secs),
            ("extraction.timeout_secs", self.extraction.timeout_secs),
            ("embedding.timeout_secs", self.embedding.timeout_secs),
        ] {
            if secs == 0 {
                return Err(anyhow!("{} must be positive", name));
            }
        }

        if self.workspace_dir.as_os_str().is_empty() {
            return Err(anyhow!("workspace_dir cannot be empty"));
        }

        // Validate the active provider
        let provider = self.translation.get_active_provider_config().ok_or_else(|| {
            anyhow!("No entry for provider '{}' in translation.available_providers", self.translation.provider)
        })?;
        let endpoint = self.translation.get_endpoint();
        url::Url::parse(&endpoint).context(format!("Invalid endpoint for provider '{}': {}", provider.provider_type, endpoint))?;
        if provider.timeout_secs == 0 {
            return Err(anyhow!("Timeout of provider '{}' must be positive", provider.provider_type));
        }
        if self.translation.provider == TranslationProvider::Ollama && self.translation.get_model().trim().is_empty() {
            return Err(anyhow!("A model is required for the Ollama provider"));
        }
        if !(0.0..=1.0).contains(&self.translation.common.temperature) {
            return Err(anyhow!("Temperature must be between 0.0 and 1.0"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            workspace_dir: default_workspace_dir(),
            embed_mode: EmbedMode::default(),
            log_level: LogLevel::default(),
            download: DownloadConfig::default(),
            extraction: ExtractionConfig::default(),
            translation: TranslationConfig::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &TranslationProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers.iter().find(|p| p.provider_type == provider_str)
    }

    /// Mutable access to the active provider configuration
    pub fn get_active_provider_config_mut(&mut self) -> Option<&mut ProviderConfig> {
        let provider_str = self.provider.to_lowercase_string();
        self.available_providers.iter_mut().find(|p| p.provider_type == provider_str)
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.model.is_empty() {
                return provider_config.model.clone();
            }
        }

        match self.provider {
            TranslationProvider::Ollama => default_ollama_model(),
            TranslationProvider::LibreTranslate => String::new(),
        }
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> Option<String> {
        self.get_active_provider_config()
            .map(|p| p.api_key.trim().to_string())
            .filter(|key| !key.is_empty())
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }

        match self.provider {
            TranslationProvider::LibreTranslate => default_libretranslate_endpoint(),
            TranslationProvider::Ollama => default_ollama_endpoint(),
        }
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        match self.get_active_provider_config() {
            Some(provider_config) if provider_config.timeout_secs > 0 => provider_config.timeout_secs,
            _ => default_timeout_secs(),
        }
    }

    /// Retry policy shared by the HTTP providers
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.common.retry_count, self.common.retry_backoff_ms)
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            available_providers: vec![
                ProviderConfig::new(TranslationProvider::LibreTranslate),
                ProviderConfig::new(TranslationProvider::Ollama),
            ],
            common: TranslationCommonConfig::default(),
        }
    }
}
