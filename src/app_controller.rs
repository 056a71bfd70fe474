use anyhow::{Context, Result};
use log::{info, warn};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::{Config, TranslationConfig, TranslationProvider};
use crate::domain::{Subtitle, SubtitleFormat, SubtitleSource, Video};
use crate::errors::{PipelineError, ResourceError, ValidationError};
use crate::file_utils::{FileManager, WorkspaceLayout};
use crate::identifier;
use crate::language_utils;
use crate::ports::{
    EmbedMode, ProgressCallback, SubtitleEmbedder, SubtitleExtractor, SubtitleTranslator, VideoDownloader,
};
use crate::providers::ffmpeg::FfmpegEmbedder;
use crate::providers::libretranslate::LibreTranslateEngine;
use crate::providers::ollama::OllamaEngine;
use crate::providers::whisper::WhisperExtractor;
use crate::providers::ytdlp::YtDlpDownloader;
use crate::translation::{CueTranslator, TranslationCache, TranslationEngine};
use crate::use_cases::{
    DownloadVideoUseCase, EmbedSubtitlesUseCase, ExtractSubtitlesUseCase, TranslateSubtitlesUseCase,
};

// @module: Application controller driving the pipeline stages

/// Stage of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Download,
    Extract,
    Translate,
    Embed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Download => write!(f, "download"),
            Self::Extract => write!(f, "extract"),
            Self::Translate => write!(f, "translate"),
            Self::Embed => write!(f, "embed"),
        }
    }
}

/// Progress of a whole pipeline run, tagged with the running stage
pub type StageProgressCallback = dyn Fn(Stage, &str, f32) + Send + Sync;

/// One provider per port
#[derive(Debug, Clone)]
pub struct PipelineProviders {
    pub downloader: Arc<dyn VideoDownloader>,
    pub extractor: Arc<dyn SubtitleExtractor>,
    pub translator: Arc<dyn SubtitleTranslator>,
    pub embedder: Arc<dyn SubtitleEmbedder>,
}

impl PipelineProviders {
    // @creates: Providers described by the configuration
    pub fn from_config(config: &Config) -> (Self, TranslationCache) {
        let cache = TranslationCache::new(config.translation.common.cache_enabled);
        let translator = CueTranslator::new(build_engine(&config.translation)).with_cache(cache.clone());

        let providers = Self {
            downloader: Arc::new(YtDlpDownloader::new(config.download.clone())),
            extractor: Arc::new(WhisperExtractor::new(config.extraction.clone())),
            translator: Arc::new(translator),
            embedder: Arc::new(FfmpegEmbedder::new(config.embedding.clone())),
        };
        (providers, cache)
    }
}

/// Translation engine of the active provider
pub fn build_engine(config: &TranslationConfig) -> Arc<dyn TranslationEngine> {
    match config.provider {
        TranslationProvider::LibreTranslate => Arc::new(LibreTranslateEngine::new(
            config.get_endpoint(),
            config.get_api_key(),
            config.get_timeout_secs(),
            config.retry_policy(),
        )),
        TranslationProvider::Ollama => Arc::new(
            OllamaEngine::new(
                config.get_endpoint(),
                config.get_model(),
                config.get_timeout_secs(),
                config.retry_policy(),
            )
            .with_system_prompt(config.common.system_prompt.clone())
            .with_temperature(config.common.temperature),
        ),
    }
}

/// Result of a full pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Video with the embedded subtitle
    pub video: Video,
    /// Subtitle produced by the extract stage
    pub original_subtitle: Subtitle,
    /// Translated subtitle, `None` when the original was already in the target language
    pub translated_subtitle: Option<Subtitle>,
    /// Wall time of each stage that ran
    pub timings: Vec<(Stage, Duration)>,
}

impl PipelineOutcome {
    pub fn output_path(&self) -> Option<&Path> {
        self.video.file_path()
    }
}

/// Main application controller for the download, extract, translate and embed pipeline
#[derive(Debug)]
pub struct Controller {
    // @field: App configuration
    config: Config,
    layout: WorkspaceLayout,
    extractor: Arc<dyn SubtitleExtractor>,
    translator: Arc<dyn SubtitleTranslator>,
    download_use_case: DownloadVideoUseCase,
    extract_use_case: ExtractSubtitlesUseCase,
    translate_use_case: TranslateSubtitlesUseCase,
    embed_use_case: EmbedSubtitlesUseCase,
    cache: Option<TranslationCache>,
}

impl Controller {
    // @method: Create a new controller with providers built from the configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;

        let (providers, cache) = PipelineProviders::from_config(&config);
        info!(
            "Translation provider: {} {}",
            config.translation.provider.display_name(),
            config.translation.get_model()
        );

        let mut controller = Self::with_providers(config, providers);
        controller.cache = Some(cache);
        Ok(controller)
    }

    /// Create a controller around the given providers
    pub fn with_providers(config: Config, providers: PipelineProviders) -> Self {
        let layout = WorkspaceLayout::new(config.workspace_dir.clone());

        Self {
            config,
            layout,
            extractor: providers.extractor.clone(),
            translator: providers.translator.clone(),
            download_use_case: DownloadVideoUseCase::new(providers.downloader),
            extract_use_case: ExtractSubtitlesUseCase::new(providers.extractor),
            translate_use_case: TranslateSubtitlesUseCase::new(providers.translator),
            embed_use_case: EmbedSubtitlesUseCase::new(providers.embedder),
            cache: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn layout(&self) -> &WorkspaceLayout {
        &self.layout
    }

    /// Download `url` into the workspace
    pub async fn download(&self, url: &str, progress: Option<&ProgressCallback>) -> Result<Video, PipelineError> {
        let output_dir = self.layout.downloads_dir();
        FileManager::ensure_dir(&output_dir)?;

        let video = self.download_use_case.execute(url, &output_dir, progress).await?;
        info!(
            "Downloaded {} ({}) with {} caption track(s)",
            video.title().unwrap_or_default(),
            video.video_id(),
            video.subtitles().len()
        );
        Ok(video)
    }

    /// Extract a `language` subtitle for `video`
    ///
    /// Written to `output_path`, or to the workspace input subtitle path.
    pub async fn extract(
        &self,
        video: &Video,
        language: &str,
        output_path: Option<&Path>,
        progress: Option<&ProgressCallback>,
    ) -> Result<Subtitle, PipelineError> {
        let output_path = output_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.layout.input_subtitle(video.video_id()));

        let subtitle = self.extract_use_case.execute(video, &output_path, language, progress).await?;
        info!("Subtitle ({}, {}) written to {:?}", subtitle.language(), subtitle.source(), output_path);
        Ok(subtitle)
    }

    /// Translate `subtitle` and write the result to disk
    ///
    /// The file is written only after the whole document is translated, so a
    /// failed translation never leaves a translated file behind.
    pub async fn translate_file(
        &self,
        subtitle: &Subtitle,
        target_language: &str,
        output_path: Option<&Path>,
        progress: Option<&ProgressCallback>,
    ) -> Result<Subtitle, PipelineError> {
        let translated = self.translate_use_case.execute(subtitle, target_language, progress).await?;

        let output_path = output_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.layout.translated_subtitle(subtitle.video_id(), translated.language()));
        let text = translated.text().ok_or(ValidationError::EmptySubtitleText)?;
        FileManager::write_atomic(&output_path, text)?;

        info!("Translated subtitle written to {:?}", output_path);
        Ok(translated.with_file_path(output_path))
    }

    /// Put `subtitle` into `video`
    pub async fn embed(
        &self,
        video: &Video,
        subtitle: &Subtitle,
        mode: EmbedMode,
        output_path: Option<&Path>,
        progress: Option<&ProgressCallback>,
    ) -> Result<Video, PipelineError> {
        let output_path = output_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.layout.final_video(video.video_id()));
        FileManager::ensure_parent(&output_path)?;

        let embedded = self.embed_use_case.execute(video, subtitle, &output_path, mode, progress).await?;
        info!("Success: {:?}", output_path);
        Ok(embedded)
    }

    /// Languages the configured translator can handle
    pub async fn supported_languages(&self) -> Result<BTreeSet<String>, PipelineError> {
        self.translator.list_supported_languages().await
    }

    /// Languages of caption tracks already stored next to `video`
    pub async fn available_caption_languages(&self, video: &Video) -> Result<BTreeSet<String>, PipelineError> {
        self.extractor.list_available_languages(video).await
    }

    /// Run Download, Extract, Translate and Embed for `url`
    pub async fn run_pipeline(
        &self,
        url: &str,
        progress: Option<Arc<StageProgressCallback>>,
    ) -> Result<PipelineOutcome> {
        let start_time = Instant::now();
        self.layout.ensure_all().context("Failed to prepare workspace")?;
        let mut timings = Vec::with_capacity(4);

        let stage_started = Instant::now();
        let on_download = stage_callback(progress.clone(), Stage::Download);
        let video = self.download(url, Some(&on_download)).await.context("Download failed")?;
        timings.push((Stage::Download, stage_started.elapsed()));

        let stage_started = Instant::now();
        let on_extract = stage_callback(progress.clone(), Stage::Extract);
        let original = self
            .extract(&video, &self.config.source_language, None, Some(&on_extract))
            .await
            .context("Subtitle extraction failed")?;
        timings.push((Stage::Extract, stage_started.elapsed()));

        let target_language = self.config.target_language.as_str();
        let translated = if language_utils::language_codes_match(original.language(), target_language) {
            warn!(
                "Subtitle is already in {}, skipping translation",
                language_utils::get_language_name(target_language).unwrap_or_else(|| target_language.to_string())
            );
            None
        } else {
            let stage_started = Instant::now();
            let on_translate = stage_callback(progress.clone(), Stage::Translate);
            let translated = self
                .translate_file(&original, target_language, None, Some(&on_translate))
                .await
                .context("Translation failed")?;
            timings.push((Stage::Translate, stage_started.elapsed()));
            Some(translated)
        };

        let stage_started = Instant::now();
        let on_embed = stage_callback(progress.clone(), Stage::Embed);
        let to_embed = translated.as_ref().unwrap_or(&original);
        let final_video = self
            .embed(&video, to_embed, self.config.embed_mode, None, Some(&on_embed))
            .await
            .context("Embedding failed")?;
        timings.push((Stage::Embed, stage_started.elapsed()));

        if let Some(cache) = &self.cache {
            let stats = cache.stats();
            if stats.hits > 0 {
                info!("Translation cache: {} hits, {} misses", stats.hits, stats.misses);
            }
        }
        info!("Pipeline complete in {}", format_duration(start_time.elapsed()));

        Ok(PipelineOutcome { video: final_video, original_subtitle: original, translated_subtitle: translated, timings })
    }
}

/// Progress callback of one stage, forwarding to the pipeline callback
fn stage_callback(
    progress: Option<Arc<StageProgressCallback>>,
    stage: Stage,
) -> impl Fn(&str, f32) + Send + Sync + 'static {
    move |message: &str, percent: f32| {
        if let Some(progress) = &progress {
            progress(stage, message, percent);
        }
    }
}

/// Video record for a media file that is already on disk
pub fn local_video(path: &Path) -> Result<Video, PipelineError> {
    if !path.is_file() {
        return Err(ResourceError::NotFound { what: "video file", path: path.to_path_buf() }.into());
    }

    let video_id = identifier::video_id_for_local_file(path)?;
    let title = path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_else(|| video_id.to_string());

    Ok(Video::new(video_id, identifier::local_source_marker(path))
        .with_file_path(path)
        .with_title(title))
}

/// Subtitle record for a subtitle file that is already on disk
pub fn local_subtitle(path: &Path, language: &str) -> Result<Subtitle, PipelineError> {
    if !path.is_file() {
        return Err(ResourceError::NotFound { what: "subtitle file", path: path.to_path_buf() }.into());
    }

    let format = SubtitleFormat::from_path(path).ok_or_else(|| ValidationError::InvalidLiteral {
        kind: "subtitle format",
        value: path.extension().map(|e| e.to_string_lossy().to_string()).unwrap_or_default(),
    })?;
    let video_id = identifier::video_id_for_local_file(path)?;

    let subtitle = Subtitle::new(video_id, language.trim(), format, SubtitleSource::Manual).with_file_path(path);
    subtitle.validate()?;
    Ok(subtitle)
}

/// Default output path of a translated local subtitle: `<stem>.<lang>.srt` next to the input
pub fn translated_path_for(input: &Path, target_language: &str) -> PathBuf {
    let dir = input.parent().unwrap_or_else(|| Path::new("."));
    FileManager::generate_output_path(input, dir, target_language)
}

// Format duration in a human-readable format (HH:MM:SS)
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}.{:03}s", seconds, duration.subsec_millis())
    }
}
