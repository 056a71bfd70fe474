/*!
 * File-based entry points: media and subtitles that are already on disk
 */

use yttrans::app_controller::{self, Controller};
use yttrans::domain::{SubtitleFormat, SubtitleSource};
use yttrans::errors::ErrorKind;
use yttrans::identifier;
use yttrans::ports::EmbedMode;

use crate::common::mock_providers::FakePipeline;
use crate::common::{SAMPLE_SRT, TEST_VIDEO_ID, create_temp_dir, create_test_file, test_config};

#[test]
fn test_localVideo_outsideVideoDirectory_shouldUseHashId() {
    let dir = create_temp_dir().unwrap();
    let media = create_test_file(dir.path(), "holiday clip.mkv", "media").unwrap();

    let video = app_controller::local_video(&media).unwrap();

    assert_eq!(video.video_id().as_str().len(), 11);
    assert!(identifier::is_local_source(video.source_url()));
    assert_eq!(video.title(), Some("holiday clip"));
}

#[test]
fn test_localVideo_withMissingFile_shouldBeResourceError() {
    let dir = create_temp_dir().unwrap();

    let err = app_controller::local_video(&dir.path().join("nope.mp4")).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Resource);
}

#[test]
fn test_localSubtitle_shouldDetectFormatFromExtension() {
    let dir = create_temp_dir().unwrap();
    let vtt = create_test_file(dir.path(), "talk.vtt", "WEBVTT\n").unwrap();

    let subtitle = app_controller::local_subtitle(&vtt, " en ").unwrap();

    assert_eq!(subtitle.format(), SubtitleFormat::Vtt);
    assert_eq!(subtitle.language(), "en");
    assert_eq!(subtitle.source(), SubtitleSource::Manual);
    assert_eq!(subtitle.file_path(), Some(vtt.as_path()));
}

#[tokio::test]
async fn test_translateLocalFile_shouldWriteNextToInput() {
    let workspace = create_temp_dir().unwrap();
    let fakes = FakePipeline::working();
    let controller = Controller::with_providers(test_config(workspace.path()), fakes.providers());
    let srt = create_test_file(workspace.path(), "episode1.srt", SAMPLE_SRT).unwrap();

    let subtitle = app_controller::local_subtitle(&srt, "en").unwrap();
    let output = app_controller::translated_path_for(&srt, "fr");
    let translated = controller.translate_file(&subtitle, "fr", Some(output.as_path()), None).await.unwrap();

    assert_eq!(output, workspace.path().join("episode1.fr.srt"));
    assert_eq!(translated.file_path(), Some(output.as_path()));
    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.starts_with("1\n00:00:01,000 --> 00:00:04,000\n[fr] This is a test subtitle.\n"));
}

#[tokio::test]
async fn test_embedLocalFiles_shouldKeepVideoIdFromDirectory() {
    let workspace = create_temp_dir().unwrap();
    let fakes = FakePipeline::working();
    let controller = Controller::with_providers(test_config(workspace.path()), fakes.providers());
    let media = create_test_file(workspace.path(), &format!("downloads/{}/video.mp4", TEST_VIDEO_ID), "media").unwrap();
    let srt = create_test_file(workspace.path(), "subs.ko.srt", SAMPLE_SRT).unwrap();

    let video = app_controller::local_video(&media).unwrap();
    let subtitle = app_controller::local_subtitle(&srt, "ko").unwrap();
    let embedded = controller.embed(&video, &subtitle, EmbedMode::Soft, None, None).await.unwrap();

    let expected = controller.layout().final_video(video.video_id());
    assert_eq!(video.video_id().as_str(), TEST_VIDEO_ID);
    assert_eq!(embedded.file_path(), Some(expected.as_path()));
    assert!(expected.exists());
}

#[tokio::test]
async fn test_translateLocalFile_withVtt_shouldFailWithoutWriting() {
    let workspace = create_temp_dir().unwrap();
    let fakes = FakePipeline::working();
    let controller = Controller::with_providers(test_config(workspace.path()), fakes.providers());
    let vtt = create_test_file(
        workspace.path(),
        "talk.vtt",
        "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nFirst line\nSecond line\n\n00:00:03.000 --> 00:00:04.000\nOnly line\n",
    )
    .unwrap();

    let subtitle = app_controller::local_subtitle(&vtt, "en").unwrap();
    let output = app_controller::translated_path_for(&vtt, "ko");
    let err = controller.translate_file(&subtitle, "ko", Some(output.as_path()), None).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(!output.exists());
    assert_eq!(fakes.engine.request_count(), 0);
}
