/*!
 * Tests for configuration files
 */

use yttrans::app_config::{Config, LogLevel, TranslationProvider};
use yttrans::ports::EmbedMode;

use crate::common::{create_temp_dir, create_test_file};

#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("nested").join("conf.json");

    let config = Config::load_or_create(&path).unwrap();

    assert!(path.exists());
    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "ko");
    assert_eq!(config.embed_mode, EmbedMode::Soft);
    assert_eq!(config.translation.provider, TranslationProvider::LibreTranslate);
}

#[test]
fn test_loadOrCreate_withOllamaFile_shouldReadProviderSettings() {
    let dir = create_temp_dir().unwrap();
    let json = r#"{
        "source_language": "auto",
        "target_language": "ja",
        "embed_mode": "hard",
        "log_level": "debug",
        "translation": {
            "provider": "ollama",
            "available_providers": [
                {
                    "type": "ollama",
                    "model": "qwen2.5:7b",
                    "endpoint": "http://gpu-box:11434",
                    "timeout_secs": 300
                }
            ],
            "common": { "cache_enabled": false, "retry_count": 1 }
        },
        "extraction": { "model": "small" }
    }"#;
    let path = create_test_file(dir.path(), "conf.json", json).unwrap();

    let config = Config::load_or_create(&path).unwrap();
    config.validate().unwrap();

    assert_eq!(config.embed_mode, EmbedMode::Hard);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.translation.provider, TranslationProvider::Ollama);
    assert_eq!(config.translation.get_model(), "qwen2.5:7b");
    assert_eq!(config.translation.get_endpoint(), "http://gpu-box:11434");
    assert_eq!(config.translation.get_timeout_secs(), 300);
    assert!(!config.translation.common.cache_enabled);
    assert_eq!(config.translation.retry_policy().max_retries, 1);
    assert_eq!(config.extraction.model, "small");
    assert_eq!(config.extraction.whisper_path, "whisper");
}

#[test]
fn test_loadOrCreate_withInvalidJson_shouldFail() {
    let dir = create_temp_dir().unwrap();
    let path = create_test_file(dir.path(), "conf.json", "{ not json").unwrap();

    assert!(Config::load_or_create(&path).is_err());
}

#[test]
fn test_save_thenLoad_shouldKeepOverrides() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");
    let mut config = Config::default();
    config.target_language = "fr".to_string();
    config.download.subtitle_languages = vec!["en".to_string(), "fr".to_string()];

    config.save(&path).unwrap();
    let loaded = Config::load_or_create(&path).unwrap();

    assert_eq!(loaded.target_language, "fr");
    assert_eq!(loaded.download.subtitle_languages, vec!["en", "fr"]);
}
