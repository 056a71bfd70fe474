/*!
 * Use-case tests: preconditions, postconditions and error pass-through
 */

use std::path::Path;
use std::sync::Arc;

use yttrans::domain::{Subtitle, SubtitleFormat, SubtitleSource, Video};
use yttrans::errors::{ErrorKind, ResourceError, ValidationError};
use yttrans::ports::EmbedMode;
use yttrans::providers::mock::MockEngine;
use yttrans::translation::CueTranslator;
use yttrans::use_cases::{
    DownloadVideoUseCase, EmbedSubtitlesUseCase, ExtractSubtitlesUseCase, TranslateSubtitlesUseCase,
};

use crate::common::mock_providers::{
    FakeDownloader, FakeEmbedder, FakeExtractor, WrongLanguageTranslator, test_url,
};
use crate::common::{
    TEST_VIDEO_ID, create_temp_dir, create_test_file, downloaded_video, english_subtitle, test_video_id,
};

#[tokio::test]
async fn test_download_withBlankUrl_shouldFailWithoutCallingDownloader() {
    let downloader = Arc::new(FakeDownloader::new());
    let use_case = DownloadVideoUseCase::new(downloader.clone());
    let dir = create_temp_dir().unwrap();

    let err = use_case.execute("   ", dir.path(), None).await.unwrap_err();

    assert_eq!(err.as_validation(), Some(&ValidationError::EmptyUrl));
    assert_eq!(downloader.calls(), 0);
}

#[tokio::test]
async fn test_download_withProviderFailure_shouldKeepProviderKind() {
    let use_case = DownloadVideoUseCase::new(Arc::new(FakeDownloader::failing()));
    let dir = create_temp_dir().unwrap();

    let err = use_case.execute(&test_url(), dir.path(), None).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Provider);
    assert!(err.to_string().contains("Video unavailable"));
}

#[tokio::test]
async fn test_download_shouldReturnVideoUnderOutputDir() {
    let use_case = DownloadVideoUseCase::new(Arc::new(FakeDownloader::new()));
    let dir = create_temp_dir().unwrap();

    let video = use_case.execute(&test_url(), dir.path(), None).await.unwrap();

    assert_eq!(video.video_id().as_str(), TEST_VIDEO_ID);
    let path = video.file_path().unwrap();
    assert!(path.starts_with(dir.path()));
    assert!(path.exists());
}

#[tokio::test]
async fn test_extract_withBlankLanguage_shouldFail() {
    let extractor = Arc::new(FakeExtractor::new());
    let use_case = ExtractSubtitlesUseCase::new(extractor.clone());
    let dir = create_temp_dir().unwrap();
    let video = downloaded_video(dir.path()).unwrap();

    let err = use_case.execute(&video, &dir.path().join("out.srt"), " ", None).await.unwrap_err();

    assert_eq!(err.as_validation(), Some(&ValidationError::EmptyLanguage));
    assert_eq!(extractor.calls(), 0);
}

#[tokio::test]
async fn test_extract_withoutVideoFile_shouldFailBeforeExtractor() {
    let extractor = Arc::new(FakeExtractor::new());
    let use_case = ExtractSubtitlesUseCase::new(extractor.clone());
    let dir = create_temp_dir().unwrap();

    let no_path = Video::new(test_video_id(), test_url());
    let err = use_case.execute(&no_path, &dir.path().join("out.srt"), "en", None).await.unwrap_err();
    assert_eq!(err.as_validation(), Some(&ValidationError::MissingFilePath("video")));

    let missing = no_path.with_file_path(dir.path().join("gone.mp4"));
    let err = use_case.execute(&missing, &dir.path().join("out.srt"), "en", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Resource);

    assert_eq!(extractor.calls(), 0);
}

#[tokio::test]
async fn test_extract_shouldWriteOutputPath() {
    let use_case = ExtractSubtitlesUseCase::new(Arc::new(FakeExtractor::new()));
    let dir = create_temp_dir().unwrap();
    let video = downloaded_video(dir.path()).unwrap();
    let output = dir.path().join("input_subs").join(format!("{}.srt", TEST_VIDEO_ID));

    let subtitle = use_case.execute(&video, &output, "en", None).await.unwrap();

    assert_eq!(subtitle.file_path(), Some(output.as_path()));
    assert_eq!(subtitle.language(), "en");
    assert_eq!(subtitle.source(), SubtitleSource::Whisper);
    assert!(output.exists());
}

#[tokio::test]
async fn test_translate_withEmptyText_shouldFailBeforeAnyProviderCall() {
    let engine = Arc::new(MockEngine::working());
    let use_case = TranslateSubtitlesUseCase::new(Arc::new(CueTranslator::new(engine.clone())));
    let subtitle = english_subtitle().with_text("");

    let err = use_case.execute(&subtitle, "ko", None).await.unwrap_err();

    assert_eq!(err.as_validation(), Some(&ValidationError::EmptySubtitleText));
    assert_eq!(engine.pair_checks(), 0);
    assert_eq!(engine.request_count(), 0);
}

#[tokio::test]
async fn test_translate_withoutContent_shouldFail() {
    let use_case = TranslateSubtitlesUseCase::new(Arc::new(CueTranslator::new(Arc::new(MockEngine::working()))));
    let subtitle = Subtitle::new(test_video_id(), "en", SubtitleFormat::Srt, SubtitleSource::Manual);

    let err = use_case.execute(&subtitle, "ko", None).await.unwrap_err();

    assert_eq!(err.as_validation(), Some(&ValidationError::MissingSubtitleContent));
}

#[tokio::test]
async fn test_translate_withUnsupportedPair_shouldFailBeforeParsing() {
    // Garbage content would fail with NoValidCues if parsing ran first
    let engine = Arc::new(MockEngine::working().with_pairs(&[("en", "ja")]));
    let use_case = TranslateSubtitlesUseCase::new(Arc::new(CueTranslator::new(engine.clone())));
    let subtitle = english_subtitle().with_text("garbage\nno structure");

    let err = use_case.execute(&subtitle, "ko", None).await.unwrap_err();

    assert_eq!(
        err.as_validation(),
        Some(&ValidationError::UnsupportedLanguagePair {
            source_language: "en".to_string(),
            target_language: "ko".to_string(),
        })
    );
    assert_eq!(engine.request_count(), 0);
}

#[tokio::test]
async fn test_translate_withWrongResultLanguage_shouldRejectTransition() {
    let use_case = TranslateSubtitlesUseCase::new(Arc::new(WrongLanguageTranslator::new("fr")));

    let err = use_case.execute(&english_subtitle(), "ko", None).await.unwrap_err();

    assert!(matches!(err.as_validation(), Some(ValidationError::TranslationMismatch(_))));
}

#[tokio::test]
async fn test_translate_shouldRecordSourceLanguage() {
    let use_case = TranslateSubtitlesUseCase::new(Arc::new(CueTranslator::new(Arc::new(MockEngine::working()))));

    let translated = use_case.execute(&english_subtitle(), " ko ", None).await.unwrap();

    assert_eq!(translated.language(), "ko");
    assert_eq!(translated.source_language(), Some("en"));
    assert_eq!(translated.video_id(), english_subtitle().video_id());
    assert!(translated.text().unwrap().contains("[ko] For testing purposes."));
}

#[tokio::test]
async fn test_embed_softMode_shouldProduceDistinctOutput() {
    let embedder = Arc::new(FakeEmbedder::new());
    let use_case = EmbedSubtitlesUseCase::new(embedder.clone());
    let dir = create_temp_dir().unwrap();
    let video = downloaded_video(dir.path()).unwrap();
    let srt = create_test_file(dir.path(), "subs.ko.srt", crate::common::SAMPLE_SRT).unwrap();
    let subtitle = Subtitle::new(test_video_id(), "ko", SubtitleFormat::Srt, SubtitleSource::Manual).with_file_path(srt);
    let output = dir.path().join("final_videos").join("out.mp4");

    let embedded = use_case.execute(&video, &subtitle, &output, EmbedMode::Soft, None).await.unwrap();

    let embedded_path = embedded.file_path().unwrap();
    assert_ne!(embedded_path, video.file_path().unwrap());
    assert_eq!(embedded_path, output.as_path());
    assert!(embedded.has_embedded_subtitle());
    assert!(embedded.subtitles().is_empty());
    assert_eq!(embedded.title(), Some("Test Video"));
    assert_eq!(embedded.source_url(), video.source_url());
    assert_eq!(embedder.modes(), vec![EmbedMode::Soft]);
}

#[tokio::test]
async fn test_embed_withOutputEqualToInput_shouldFail() {
    let embedder = Arc::new(FakeEmbedder::new());
    let use_case = EmbedSubtitlesUseCase::new(embedder.clone());
    let dir = create_temp_dir().unwrap();
    let video = downloaded_video(dir.path()).unwrap();
    let srt = create_test_file(dir.path(), "subs.srt", crate::common::SAMPLE_SRT).unwrap();
    let subtitle = english_subtitle().with_file_path(srt);

    let input = video.file_path().unwrap().to_path_buf();
    let err = use_case.execute(&video, &subtitle, &input, EmbedMode::Hard, None).await.unwrap_err();

    assert_eq!(err.as_validation(), Some(&ValidationError::OutputOverwritesInput(input)));
    assert_eq!(embedder.calls(), 0);
}

#[tokio::test]
async fn test_embed_withMissingSubtitleFile_shouldBeNotFound() {
    let embedder = Arc::new(FakeEmbedder::new());
    let use_case = EmbedSubtitlesUseCase::new(embedder.clone());
    let dir = create_temp_dir().unwrap();
    let video = downloaded_video(dir.path()).unwrap();
    let subtitle = english_subtitle().with_file_path(dir.path().join("missing.srt"));

    let err = use_case
        .execute(&video, &subtitle, Path::new("/tmp/never-written.mp4"), EmbedMode::Soft, None)
        .await
        .unwrap_err();

    match err {
        yttrans::PipelineError::Resource(ResourceError::NotFound { what, .. }) => assert_eq!(what, "subtitle file"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(embedder.calls(), 0);
}
