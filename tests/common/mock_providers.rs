/*!
 * Fake implementations of the four pipeline ports
 *
 * The fakes write small placeholder files where the real tools would write
 * media or subtitles, count their calls and can be switched to fail, so
 * use-cases and the controller run without yt-dlp, Whisper, ffmpeg or a
 * translation server.
 */

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use yttrans::app_controller::PipelineProviders;
use yttrans::domain::{Subtitle, SubtitleFormat, SubtitleSource, Video, VideoId};
use yttrans::errors::{PipelineError, ProviderError, ResourceError};
use yttrans::ports::{
    EmbedMode, ProgressCallback, ProgressReporter, SubtitleEmbedder, SubtitleExtractor, SubtitleTranslator,
    VideoDownloader,
};
use yttrans::providers::mock::MockEngine;
use yttrans::translation::CueTranslator;

use super::{SAMPLE_SRT, TEST_VIDEO_ID};

fn write(path: &Path, content: &str) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ResourceError::io(parent, e))?;
    }
    std::fs::write(path, content).map_err(|e| ResourceError::io(path, e))?;
    Ok(())
}

/// Downloader writing `<output_dir>/<id>/video.mp4`
#[derive(Debug, Default)]
pub struct FakeDownloader {
    calls: AtomicUsize,
    fail: bool,
}

impl FakeDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { calls: AtomicUsize::new(0), fail: true }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoDownloader for FakeDownloader {
    fn extract_video_id(&self, url: &str) -> Result<VideoId, PipelineError> {
        Ok(yttrans::identifier::extract_video_id(url)?)
    }

    async fn download(
        &self,
        url: &str,
        output_dir: &Path,
        progress: Option<&ProgressCallback>,
    ) -> Result<Video, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::ToolFailed {
                tool: "yt-dlp".to_string(),
                status: Some(1),
                diagnostic: "ERROR: Video unavailable".to_string(),
            }
            .into());
        }

        let video_id = self.extract_video_id(url)?;
        let reporter = ProgressReporter::new(progress);
        reporter.report("Downloading video", 50.0);

        let media = output_dir.join(video_id.as_str()).join("video.mp4");
        write(&media, "fake media")?;
        reporter.complete("Download complete");

        Ok(Video::new(video_id, url).with_file_path(media).with_title("Fake Video"))
    }
}

/// Extractor writing a fixed SRT document
#[derive(Debug)]
pub struct FakeExtractor {
    /// Language the extracted subtitle reports
    language: Option<String>,
    content: String,
    calls: AtomicUsize,
}

impl FakeExtractor {
    /// Extracts `SAMPLE_SRT` in the requested language
    pub fn new() -> Self {
        Self { language: None, content: SAMPLE_SRT.to_string(), calls: AtomicUsize::new(0) }
    }

    /// Always reports `language`, like a caption file found in another language
    pub fn in_language(language: &str) -> Self {
        Self { language: Some(language.to_string()), ..Self::new() }
    }

    pub fn with_content(mut self, content: &str) -> Self {
        self.content = content.to_string();
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubtitleExtractor for FakeExtractor {
    async fn extract(
        &self,
        video: &Video,
        output_path: &Path,
        language: &str,
        progress: Option<&ProgressCallback>,
    ) -> Result<Subtitle, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reporter = ProgressReporter::new(progress);

        write(output_path, &self.content)?;
        reporter.complete("Subtitle extraction complete");

        let language = self.language.clone().unwrap_or_else(|| language.to_string());
        Ok(Subtitle::new(video.video_id().clone(), language, SubtitleFormat::Srt, SubtitleSource::Whisper)
            .with_file_path(output_path))
    }

    async fn list_available_languages(&self, _video: &Video) -> Result<BTreeSet<String>, PipelineError> {
        Ok(self.language.iter().cloned().collect())
    }
}

/// Translator that answers in a fixed language, whatever was requested
#[derive(Debug)]
pub struct WrongLanguageTranslator {
    language: String,
}

impl WrongLanguageTranslator {
    pub fn new(language: &str) -> Self {
        Self { language: language.to_string() }
    }
}

#[async_trait]
impl SubtitleTranslator for WrongLanguageTranslator {
    async fn translate(
        &self,
        subtitle: &Subtitle,
        _target_language: &str,
        _progress: Option<&ProgressCallback>,
    ) -> Result<Subtitle, PipelineError> {
        Ok(subtitle.with_translation(SAMPLE_SRT, self.language.as_str()))
    }

    async fn list_supported_languages(&self) -> Result<BTreeSet<String>, PipelineError> {
        Ok(BTreeSet::from([self.language.clone()]))
    }

    async fn is_language_pair_supported(&self, _source: &str, target: &str) -> Result<bool, PipelineError> {
        Ok(target == self.language)
    }
}

/// Embedder copying the video to the output path
#[derive(Debug, Default)]
pub struct FakeEmbedder {
    calls: AtomicUsize,
    modes: Mutex<Vec<EmbedMode>>,
    /// Subtitle files handed to the embedder
    subtitles: Mutex<Vec<PathBuf>>,
}

impl FakeEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn modes(&self) -> Vec<EmbedMode> {
        self.modes.lock().clone()
    }

    pub fn subtitles(&self) -> Vec<PathBuf> {
        self.subtitles.lock().clone()
    }
}

#[async_trait]
impl SubtitleEmbedder for FakeEmbedder {
    async fn embed(
        &self,
        video: &Video,
        subtitle: &Subtitle,
        output_path: &Path,
        mode: EmbedMode,
        progress: Option<&ProgressCallback>,
    ) -> Result<PathBuf, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.modes.lock().push(mode);
        if let Some(path) = subtitle.file_path() {
            self.subtitles.lock().push(path.to_path_buf());
        }

        let reporter = ProgressReporter::new(progress);
        let source = video.file_path().map(Path::to_path_buf).unwrap_or_default();
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ResourceError::io(parent, e))?;
        }
        std::fs::copy(&source, output_path).map_err(|e| ResourceError::io(&source, e))?;
        reporter.complete("Subtitle embedding complete");

        Ok(output_path.to_path_buf())
    }
}

/// Fakes wired into a controller, with handles kept for assertions
pub struct FakePipeline {
    pub downloader: Arc<FakeDownloader>,
    pub extractor: Arc<FakeExtractor>,
    pub engine: Arc<MockEngine>,
    pub embedder: Arc<FakeEmbedder>,
}

impl FakePipeline {
    pub fn new(extractor: FakeExtractor, engine: MockEngine) -> Self {
        Self {
            downloader: Arc::new(FakeDownloader::new()),
            extractor: Arc::new(extractor),
            engine: Arc::new(engine),
            embedder: Arc::new(FakeEmbedder::new()),
        }
    }

    pub fn working() -> Self {
        Self::new(FakeExtractor::new(), MockEngine::working())
    }

    pub fn providers(&self) -> PipelineProviders {
        PipelineProviders {
            downloader: self.downloader.clone(),
            extractor: self.extractor.clone(),
            translator: Arc::new(CueTranslator::new(self.engine.clone())),
            embedder: self.embedder.clone(),
        }
    }
}

/// URL whose identifier is `TEST_VIDEO_ID`
pub fn test_url() -> String {
    format!("https://www.youtube.com/watch?v={}", TEST_VIDEO_ID)
}
