/*!
 * Subtitle extraction.
 *
 * Caption tracks downloaded next to the media file are preferred: the best
 * one is picked by language priority, then manual before auto-generated,
 * then srt before vtt. srt files are copied, vtt files converted with
 * ffmpeg. When no caption track exists the Whisper CLI transcribes the
 * audio into JSON segments, which are turned into SRT cues.
 */

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, info};
use serde::Deserialize;

use crate::app_config::ExtractionConfig;
use crate::domain::{Subtitle, SubtitleFormat, SubtitleSource, Video};
use crate::errors::{PipelineError, ProviderError, ResourceError, ValidationError};
use crate::file_utils::{FileManager, extract_lang_code, is_auto_caption};
use crate::ports::{ProgressCallback, ProgressReporter, SubtitleExtractor};
use crate::subtitle_processor::{SubtitleCue, reassemble_srt, timecode_line};
use crate::tools;

/// Language value that lets Whisper detect the spoken language
pub const AUTO_LANGUAGE: &str = "auto";

// Rank of a caption whose language is not in the priority list
const UNRANKED_LANGUAGE: usize = 99;

/// One transcribed segment of Whisper's JSON output
#[derive(Debug, Clone, Deserialize)]
pub struct WhisperSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Whisper's JSON output
#[derive(Debug, Clone, Deserialize)]
pub struct WhisperTranscript {
    #[serde(default)]
    pub segments: Vec<WhisperSegment>,
    /// Detected or forced language
    #[serde(default)]
    pub language: Option<String>,
}

/// Sort key of a caption file; lower is better
pub fn caption_rank(path: &Path, priority: &[String]) -> (usize, u8, u8) {
    let name = path.file_name().map(|n| n.to_string_lossy().to_lowercase()).unwrap_or_default();

    let language_rank = extract_lang_code(&name)
        .and_then(|code| priority.iter().position(|lang| *lang == code))
        .unwrap_or(UNRANKED_LANGUAGE);
    let auto_rank = u8::from(is_auto_caption(&name));
    let format_rank = match SubtitleFormat::from_path(path) {
        Some(SubtitleFormat::Srt) => 0,
        _ => 1,
    };

    (language_rank, auto_rank, format_rank)
}

/// Best caption file among `candidates`
pub fn select_caption(candidates: &[PathBuf], priority: &[String]) -> Option<PathBuf> {
    candidates
        .iter()
        // first of equal keys wins; candidates arrive sorted by name
        .min_by_key(|path| caption_rank(path, priority))
        .cloned()
}

/// SRT document of a transcript; blank segments are dropped and the rest renumbered
pub fn transcript_to_srt(transcript: &WhisperTranscript) -> String {
    let cues: Vec<SubtitleCue> = transcript
        .segments
        .iter()
        .filter(|segment| !segment.text.trim().is_empty())
        .enumerate()
        .map(|(i, segment)| {
            SubtitleCue::new((i + 1).to_string(), timecode_line(segment.start, segment.end), segment.text.trim())
        })
        .collect();

    reassemble_srt(&cues)
}

/// Extractor backed by downloaded captions and the Whisper CLI
#[derive(Debug, Clone)]
pub struct WhisperExtractor {
    config: ExtractionConfig,
}

impl WhisperExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Requested language first, then the configured priority list
    fn language_priority(&self, language: &str) -> Vec<String> {
        let mut priority = Vec::with_capacity(self.config.language_priority.len() + 1);
        if language != AUTO_LANGUAGE {
            priority.push(language.to_lowercase());
        }
        for lang in &self.config.language_priority {
            let lang = lang.to_lowercase();
            if !priority.contains(&lang) {
                priority.push(lang);
            }
        }
        priority
    }

    /// Copy an srt caption or convert a vtt one into `output_path`
    async fn import_caption(&self, caption: &Path, output_path: &Path) -> Result<(), PipelineError> {
        FileManager::ensure_parent(output_path)?;

        match SubtitleFormat::from_path(caption) {
            Some(SubtitleFormat::Srt) => {
                tokio::fs::copy(caption, output_path)
                    .await
                    .map_err(|e| ResourceError::io(output_path, e))?;
            }
            _ => {
                let args: Vec<OsString> = vec![
                    "-y".into(),
                    "-hide_banner".into(),
                    "-i".into(),
                    caption.as_os_str().to_os_string(),
                    output_path.as_os_str().to_os_string(),
                ];
                tools::run_tool(&self.config.ffmpeg_path, args, self.config.timeout_secs).await?;
            }
        }
        Ok(())
    }

    async fn transcribe(&self, media: &Path, language: &str) -> Result<WhisperTranscript, PipelineError> {
        let work_dir = tempfile::tempdir().map_err(|e| ResourceError::io(std::env::temp_dir(), e))?;

        let mut args: Vec<OsString> = vec![
            media.as_os_str().to_os_string(),
            "--model".into(),
            self.config.model.clone().into(),
            "--output_format".into(),
            "json".into(),
            "--output_dir".into(),
            work_dir.path().as_os_str().to_os_string(),
            "--verbose".into(),
            "False".into(),
        ];
        if language != AUTO_LANGUAGE {
            args.push("--language".into());
            args.push(language.into());
        }

        tools::run_tool(&self.config.whisper_path, args, self.config.timeout_secs).await?;

        let stem = media.file_stem().unwrap_or_default().to_string_lossy().to_string();
        let json_path = work_dir.path().join(format!("{}.json", stem));
        let content = tokio::fs::read_to_string(&json_path)
            .await
            .map_err(|e| ResourceError::io(&json_path, e))?;

        serde_json::from_str(&content)
            .map_err(|e| ProviderError::TranscriptionFailed(format!("unreadable Whisper output: {}", e)).into())
    }
}

#[async_trait]
impl SubtitleExtractor for WhisperExtractor {
    async fn extract(
        &self,
        video: &Video,
        output_path: &Path,
        language: &str,
        progress: Option<&ProgressCallback>,
    ) -> Result<Subtitle, PipelineError> {
        let media = video.file_path().ok_or(ValidationError::MissingFilePath("video"))?;
        let language = language.trim();
        let reporter = ProgressReporter::new(progress);

        reporter.report("Looking for existing captions", 0.0);
        let media_dir = media.parent().unwrap_or_else(|| Path::new("."));
        let mut candidates = FileManager::find_caption_files(media_dir)?;
        candidates.retain(|path| path.as_path() != output_path);

        if let Some(caption) = select_caption(&candidates, &self.language_priority(language)) {
            info!("Using existing caption {:?}", caption);
            reporter.report("Importing existing caption", 50.0);
            self.import_caption(&caption, output_path).await?;

            let name = caption.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
            let caption_language = extract_lang_code(&name).unwrap_or_else(|| language.to_string());
            reporter.complete("Caption ready");

            return Ok(Subtitle::new(video.video_id().clone(), caption_language, SubtitleFormat::Srt, SubtitleSource::Download)
                .with_file_path(output_path));
        }

        reporter.report(&format!("Transcribing with Whisper ({})", self.config.model), 10.0);
        let transcript = self.transcribe(media, language).await?;
        if transcript.segments.is_empty() {
            return Err(ProviderError::TranscriptionFailed("Whisper did not return any segments".to_string()).into());
        }
        debug!("Whisper produced {} segments", transcript.segments.len());

        reporter.report("Writing subtitle", 90.0);
        FileManager::write_atomic(output_path, &transcript_to_srt(&transcript))?;

        let detected_language = match transcript.language.as_deref() {
            Some(detected) if language == AUTO_LANGUAGE && !detected.trim().is_empty() => detected.trim().to_string(),
            _ => language.to_string(),
        };
        reporter.complete("Subtitle ready");

        Ok(Subtitle::new(video.video_id().clone(), detected_language, SubtitleFormat::Srt, SubtitleSource::Whisper)
            .with_file_path(output_path))
    }

    async fn list_available_languages(&self, video: &Video) -> Result<BTreeSet<String>, PipelineError> {
        let Some(media) = video.file_path() else {
            return Ok(BTreeSet::new());
        };
        let media_dir = media.parent().unwrap_or_else(|| Path::new("."));

        Ok(FileManager::find_caption_files(media_dir)?
            .iter()
            .filter_map(|path| path.file_name().and_then(|name| extract_lang_code(&name.to_string_lossy())))
            .collect())
    }
}
