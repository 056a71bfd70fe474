/*!
 * Controller tests driving all four stages with port fakes
 */

use std::sync::Arc;

use parking_lot::Mutex;

use yttrans::app_controller::{Controller, Stage, StageProgressCallback};
use yttrans::domain::SubtitleSource;
use yttrans::errors::ErrorKind;
use yttrans::ports::EmbedMode;
use yttrans::providers::mock::MockEngine;

use crate::common::mock_providers::{FakeExtractor, FakePipeline, test_url};
use crate::common::{TEST_VIDEO_ID, create_temp_dir, files_in, init_test_logging, test_config};

fn progress_recorder() -> (Arc<StageProgressCallback>, Arc<Mutex<Vec<(Stage, f32)>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let callback: Arc<StageProgressCallback> =
        Arc::new(move |stage: Stage, _message: &str, percent: f32| sink.lock().push((stage, percent)));
    (callback, events)
}

#[tokio::test]
async fn test_runPipeline_shouldFollowWorkspaceLayout() {
    init_test_logging();
    let workspace = create_temp_dir().unwrap();
    let fakes = FakePipeline::working();
    let controller = Controller::with_providers(test_config(workspace.path()), fakes.providers());

    let outcome = controller.run_pipeline(&test_url(), None).await.unwrap();

    let root = workspace.path();
    let translated_path = root.join("translated_subs").join(format!("{}.ko.srt", TEST_VIDEO_ID));
    let final_path = root.join("final_videos").join(format!("{}_translated.mp4", TEST_VIDEO_ID));

    assert!(root.join("downloads").join(TEST_VIDEO_ID).join("video.mp4").exists());
    assert!(root.join("input_subs").join(format!("{}.srt", TEST_VIDEO_ID)).exists());
    assert!(translated_path.exists());
    assert_eq!(outcome.output_path(), Some(final_path.as_path()));
    assert!(outcome.video.has_embedded_subtitle());

    let translated = outcome.translated_subtitle.unwrap();
    assert_eq!(translated.language(), "ko");
    assert_eq!(translated.source_language(), Some("en"));
    assert_eq!(translated.file_path(), Some(translated_path.as_path()));
    let written = std::fs::read_to_string(&translated_path).unwrap();
    assert!(written.contains("[ko] This is a test subtitle."));

    assert_eq!(outcome.original_subtitle.source(), SubtitleSource::Whisper);
    let stages: Vec<Stage> = outcome.timings.iter().map(|(stage, _)| *stage).collect();
    assert_eq!(stages, vec![Stage::Download, Stage::Extract, Stage::Translate, Stage::Embed]);
    assert_eq!(fakes.embedder.subtitles(), vec![translated_path]);
    assert_eq!(fakes.embedder.modes(), vec![EmbedMode::Soft]);
}

#[tokio::test]
async fn test_runPipeline_progress_shouldBeMonotonicPerStage() {
    let workspace = create_temp_dir().unwrap();
    let fakes = FakePipeline::working();
    let controller = Controller::with_providers(test_config(workspace.path()), fakes.providers());
    let (callback, events) = progress_recorder();

    controller.run_pipeline(&test_url(), Some(callback)).await.unwrap();

    let events = events.lock().clone();
    for stage in [Stage::Download, Stage::Extract, Stage::Translate, Stage::Embed] {
        let values: Vec<f32> = events.iter().filter(|(s, _)| *s == stage).map(|(_, p)| *p).collect();
        assert!(!values.is_empty(), "no progress for {stage}");
        assert!(values.windows(2).all(|w| w[0] <= w[1]), "{stage} went backwards: {values:?}");
        assert!(values.iter().all(|p| (0.0..=100.0).contains(p)));
        assert_eq!(values.last(), Some(&100.0));
    }
}

#[tokio::test]
async fn test_runPipeline_withSubtitleInTargetLanguage_shouldSkipTranslation() {
    let workspace = create_temp_dir().unwrap();
    let fakes = FakePipeline::new(FakeExtractor::in_language("ko"), MockEngine::working());
    let controller = Controller::with_providers(test_config(workspace.path()), fakes.providers());

    let outcome = controller.run_pipeline(&test_url(), None).await.unwrap();

    assert!(outcome.translated_subtitle.is_none());
    assert_eq!(fakes.engine.request_count(), 0);
    assert!(files_in(&workspace.path().join("translated_subs")).is_empty());

    let original = workspace.path().join("input_subs").join(format!("{}.srt", TEST_VIDEO_ID));
    assert_eq!(fakes.embedder.subtitles(), vec![original]);
    assert!(!outcome.timings.iter().any(|(stage, _)| *stage == Stage::Translate));
}

#[tokio::test]
async fn test_runPipeline_withFailingEngine_shouldNotWriteTranslation() {
    init_test_logging();
    let workspace = create_temp_dir().unwrap();
    let fakes = FakePipeline::new(FakeExtractor::new(), MockEngine::intermittent(3));
    let controller = Controller::with_providers(test_config(workspace.path()), fakes.providers());

    let err = controller.run_pipeline(&test_url(), None).await.unwrap_err();

    assert!(format!("{:#}", err).contains("Translation failed"));
    assert!(files_in(&workspace.path().join("translated_subs")).is_empty());
    assert_eq!(fakes.embedder.calls(), 0);
}

#[tokio::test]
async fn test_runPipeline_withBrokenSubtitle_shouldStopBeforeEmbedding() {
    let workspace = create_temp_dir().unwrap();
    let extractor = FakeExtractor::new().with_content("garbage\nno structure");
    let fakes = FakePipeline::new(extractor, MockEngine::working());
    let controller = Controller::with_providers(test_config(workspace.path()), fakes.providers());

    let err = controller.run_pipeline(&test_url(), None).await.unwrap_err();

    assert!(format!("{:#}", err).contains("no valid subtitle cues"));
    assert_eq!(fakes.embedder.calls(), 0);
}

#[tokio::test]
async fn test_runPipeline_withDownloadFailure_shouldNotExtract() {
    let workspace = create_temp_dir().unwrap();
    let mut fakes = FakePipeline::working();
    fakes.downloader = Arc::new(crate::common::mock_providers::FakeDownloader::failing());
    let controller = Controller::with_providers(test_config(workspace.path()), fakes.providers());

    let err = controller.run_pipeline(&test_url(), None).await.unwrap_err();

    assert!(format!("{:#}", err).contains("Download failed"));
    assert_eq!(fakes.extractor.calls(), 0);
}

#[tokio::test]
async fn test_stageOperations_shouldChainWithHardMode() {
    let workspace = create_temp_dir().unwrap();
    let fakes = FakePipeline::working();
    let controller = Controller::with_providers(test_config(workspace.path()), fakes.providers());

    let video = controller.download(&test_url(), None).await.unwrap();
    let original = controller.extract(&video, "en", None, None).await.unwrap();
    let translated = controller.translate_file(&original, "ja", None, None).await.unwrap();
    let output = workspace.path().join("custom").join("burned.mp4");
    let embedded = controller.embed(&video, &translated, EmbedMode::Hard, Some(output.as_path()), None).await.unwrap();

    assert_eq!(embedded.file_path(), Some(output.as_path()));
    assert!(output.exists());
    assert_eq!(fakes.embedder.modes(), vec![EmbedMode::Hard]);
    assert_eq!(
        translated.file_path(),
        Some(controller.layout().translated_subtitle(video.video_id(), "ja").as_path())
    );
}

#[tokio::test]
async fn test_translateFile_withUnsupportedPair_shouldBeValidationError() {
    let workspace = create_temp_dir().unwrap();
    let fakes = FakePipeline::new(FakeExtractor::new(), MockEngine::working().with_pairs(&[("en", "ko")]));
    let controller = Controller::with_providers(test_config(workspace.path()), fakes.providers());

    let subtitle = crate::common::english_subtitle();
    let err = controller.translate_file(&subtitle, "de", None, None).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(files_in(workspace.path()).is_empty());
}

#[tokio::test]
async fn test_supportedLanguages_shouldComeFromTranslator() {
    let workspace = create_temp_dir().unwrap();
    let fakes = FakePipeline::new(FakeExtractor::new(), MockEngine::working().with_pairs(&[("en", "ko")]));
    let controller = Controller::with_providers(test_config(workspace.path()), fakes.providers());

    let languages = controller.supported_languages().await.unwrap();

    assert!(languages.contains("en"));
    assert!(languages.contains("ko"));
}
