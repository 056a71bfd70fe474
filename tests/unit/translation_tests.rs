/*!
 * Cue translation tests with the mock engine
 */

use std::sync::Arc;

use yttrans::errors::{ErrorKind, ValidationError};
use yttrans::ports::SubtitleTranslator;
use yttrans::providers::mock::MockEngine;
use yttrans::subtitle_processor::parse_srt_cues;
use yttrans::translation::{CueTranslator, TranslationCache};

use crate::common::{SAMPLE_SRT, english_subtitle};

#[tokio::test]
async fn test_translate_shouldKeepCueCountAndTimecodes() {
    let translator = CueTranslator::new(Arc::new(MockEngine::working()));

    let translated = translator.translate(&english_subtitle(), "ja", None).await.unwrap();

    let original = parse_srt_cues(SAMPLE_SRT);
    let result = parse_srt_cues(translated.text().unwrap());
    assert_eq!(original.len(), result.len());
    for (before, after) in original.iter().zip(&result) {
        assert_eq!(before.number, after.number);
        assert_eq!(before.timecode, after.timecode);
        assert_eq!(after.text, format!("[ja] {}", before.text));
    }
}

#[tokio::test]
async fn test_sharedCache_acrossDocuments_shouldTranslateOnce() {
    let engine = Arc::new(MockEngine::working());
    let cache = TranslationCache::new(true);
    let translator = CueTranslator::new(engine.clone()).with_cache(cache.clone());

    translator.translate(&english_subtitle(), "ko", None).await.unwrap();
    translator.translate(&english_subtitle(), "ko", None).await.unwrap();

    assert_eq!(engine.request_count(), 3);
    assert_eq!(cache.stats().hits, 3);
}

#[tokio::test]
async fn test_disabledCache_shouldCallEngineEveryTime() {
    let engine = Arc::new(MockEngine::working());
    let translator = CueTranslator::new(engine.clone()).with_cache(TranslationCache::new(false));

    translator.translate(&english_subtitle(), "ko", None).await.unwrap();
    translator.translate(&english_subtitle(), "ko", None).await.unwrap();

    assert_eq!(engine.request_count(), 6);
}

#[tokio::test]
async fn test_translate_withIntermittentEngine_shouldFailWholeDocument() {
    let translator = CueTranslator::new(Arc::new(MockEngine::intermittent(2)));

    let err = translator.translate(&english_subtitle(), "ko", None).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Provider);
}

#[tokio::test]
async fn test_translate_withEngineOutage_shouldBeProviderErrorNotUnsupported() {
    let translator = CueTranslator::new(Arc::new(MockEngine::failing()));

    let err = translator.translate(&english_subtitle(), "ko", None).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Provider);
    assert!(err.as_validation().is_none());
}

#[tokio::test]
async fn test_translate_withGarbage_shouldReportNoValidCues() {
    let translator = CueTranslator::new(Arc::new(MockEngine::working()));
    let subtitle = english_subtitle().with_text("garbage\nno structure");

    let err = translator.translate(&subtitle, "ko", None).await.unwrap_err();

    assert_eq!(err.as_validation(), Some(&ValidationError::NoValidCues));
}

#[tokio::test]
async fn test_capabilityQueries_shouldReflectEngine() {
    let translator = CueTranslator::new(Arc::new(MockEngine::working().with_pairs(&[("en", "ko")])));

    assert!(translator.is_language_pair_supported("en", "ko").await.unwrap());
    assert!(!translator.is_language_pair_supported("ko", "en").await.unwrap());

    let languages = translator.list_supported_languages().await.unwrap();
    assert_eq!(languages.into_iter().collect::<Vec<_>>(), vec!["en".to_string(), "ko".to_string()]);
}
