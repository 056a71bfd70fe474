/*!
 * ffmpeg subtitle embedder.
 *
 * Soft mode stream-copies audio and video and adds the subtitle as a
 * `mov_text` track tagged with its language. Hard mode renders the subtitle
 * into the frames with the `subtitles` filter and a fixed style. Progress
 * comes from `-progress pipe:1`, measured against the duration reported by
 * ffprobe.
 */

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::Deserialize;

use crate::app_config::EmbeddingConfig;
use crate::domain::{Subtitle, Video};
use crate::errors::{PipelineError, ProviderError, ValidationError};
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::ports::{EmbedMode, ProgressCallback, ProgressReporter, SubtitleEmbedder};
use crate::tools::{self, ToolStream};

/// `force_style` of burned-in subtitles
pub const HARD_SUBTITLE_STYLE: &str =
    "FontName=Noto Sans CJK KR,FontSize=24,PrimaryColour=&HFFFFFF&,OutlineColour=&H000000&,Outline=2";

// Language tag used when the subtitle language has no ISO 639-2 form
const UNDETERMINED_LANGUAGE: &str = "und";

/// Format section of `ffprobe -show_format`
#[derive(Debug, Deserialize)]
pub struct ProbeFormat {
    pub duration: Option<String>,
}

/// `ffprobe -print_format json -show_format` output
#[derive(Debug, Deserialize)]
pub struct ProbeOutput {
    pub format: Option<ProbeFormat>,
}

impl ProbeOutput {
    /// Duration in seconds, if known and positive
    pub fn duration_secs(&self) -> Option<f64> {
        self.format
            .as_ref()
            .and_then(|format| format.duration.as_deref())
            .and_then(|d| d.trim().parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d > 0.0)
    }
}

/// Escape a path for use inside an ffmpeg filter argument
pub fn escape_filter_path(path: &Path) -> String {
    let mut escaped = String::new();
    for c in path.to_string_lossy().chars() {
        if matches!(c, '\\' | ':' | '\'' | ',' | '[' | ']') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Seconds of output written so far, from one `-progress` line
///
/// Both `out_time_us` and `out_time_ms` carry microseconds.
pub fn parse_progress_time(line: &str) -> Option<f64> {
    let (key, value) = line.trim().split_once('=')?;
    match key {
        "out_time_us" | "out_time_ms" => value.trim().parse::<i64>().ok().filter(|v| *v >= 0).map(|us| us as f64 / 1_000_000.0),
        _ => None,
    }
}

/// Language tag written into the subtitle track metadata
pub fn metadata_language(language: &str) -> String {
    language_utils::normalize_to_part2t(language).unwrap_or_else(|_| UNDETERMINED_LANGUAGE.to_string())
}

/// ffmpeg arguments for embedding `subtitle_path` into `video_path`
pub fn build_embed_args(
    video_path: &Path,
    subtitle_path: &Path,
    output_path: &Path,
    mode: EmbedMode,
    language: &str,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-y".into(), "-hide_banner".into(), "-nostats".into()];
    args.extend(["-progress".into(), "pipe:1".into()]);
    args.extend(["-i".into(), video_path.as_os_str().to_os_string()]);

    match mode {
        EmbedMode::Soft => {
            args.extend(["-i".into(), subtitle_path.as_os_str().to_os_string()]);
            args.extend(["-map".into(), "0:v".into(), "-map".into(), "0:a?".into(), "-map".into(), "1:0".into()]);
            args.extend(["-c:v".into(), "copy".into(), "-c:a".into(), "copy".into(), "-c:s".into(), "mov_text".into()]);
            args.extend(["-metadata:s:s:0".into(), format!("language={}", metadata_language(language)).into()]);
        }
        EmbedMode::Hard => {
            let filter = format!(
                "subtitles={}:force_style='{}'",
                escape_filter_path(subtitle_path),
                HARD_SUBTITLE_STYLE
            );
            args.extend(["-vf".into(), filter.into(), "-c:a".into(), "copy".into()]);
        }
    }

    args.push(output_path.as_os_str().to_os_string());
    args
}

/// Delete what a failed ffmpeg run left at `output_path`
async fn remove_partial_output(output_path: &Path) {
    match tokio::fs::remove_file(output_path).await {
        Ok(()) => warn!("Removed partial output {:?}", output_path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove partial output {:?}: {}", output_path, e),
    }
}

/// Embedder backed by the ffmpeg CLI
#[derive(Debug, Clone)]
pub struct FfmpegEmbedder {
    config: EmbeddingConfig,
}

impl FfmpegEmbedder {
    pub fn new(config: EmbeddingConfig) -> Self {
        Self { config }
    }

    /// Media duration in seconds; `None` when ffprobe is missing or silent
    pub async fn probe_duration(&self, path: &Path) -> Option<f64> {
        let args: Vec<OsString> = vec![
            "-v".into(),
            "quiet".into(),
            "-print_format".into(),
            "json".into(),
            "-show_format".into(),
            path.as_os_str().to_os_string(),
        ];

        let output = match tools::run_tool(&self.config.ffprobe_path, args, self.config.timeout_secs).await {
            Ok(output) => output,
            Err(e) => {
                warn!("ffprobe failed, embedding without progress: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<ProbeOutput>(&output.stdout) {
            Ok(probe) => probe.duration_secs(),
            Err(e) => {
                debug!("Unreadable ffprobe output: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl SubtitleEmbedder for FfmpegEmbedder {
    async fn embed(
        &self,
        video: &Video,
        subtitle: &Subtitle,
        output_path: &Path,
        mode: EmbedMode,
        progress: Option<&ProgressCallback>,
    ) -> Result<PathBuf, PipelineError> {
        let video_path = video.file_path().ok_or(ValidationError::MissingFilePath("video"))?;
        let subtitle_path = subtitle.file_path().ok_or(ValidationError::MissingFilePath("subtitle"))?;
        let reporter = ProgressReporter::new(progress);

        FileManager::ensure_parent(output_path)?;
        reporter.report(&format!("Embedding subtitles ({})", mode), 0.0);

        let duration = self.probe_duration(video_path).await;
        let args = build_embed_args(video_path, subtitle_path, output_path, mode, subtitle.language());
        info!("Embedding {:?} into {:?} ({} mode)", subtitle_path, video_path, mode);

        let result = tools::run_tool_streaming(&self.config.ffmpeg_path, args, self.config.timeout_secs, |stream, line| {
            if stream != ToolStream::Stdout {
                return;
            }
            if let (Some(total), Some(done)) = (duration, parse_progress_time(line)) {
                let percent = (done / total * 100.0) as f32;
                reporter.report(&format!("Embedding subtitles ({})", mode), percent.min(99.0));
            }
        })
        .await;

        if let Err(e) = result {
            remove_partial_output(output_path).await;
            return Err(e.into());
        }

        if !output_path.exists() {
            return Err(ProviderError::ToolFailed {
                tool: "ffmpeg".to_string(),
                status: Some(0),
                diagnostic: format!("no output written to {}", output_path.display()),
            }
            .into());
        }

        reporter.complete("Subtitle embedding complete");
        Ok(output_path.to_path_buf())
    }
}
