/*!
 * yt-dlp downloader.
 *
 * Downloads into `<output_dir>/<video_id>/video.<ext>`, reports the
 * `[download] NN.N%` lines as progress and captures the title with
 * `--print after_move:title`. Caption tracks are fetched afterwards in a
 * second, best-effort run; a failure there only logs a warning.
 */

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::app_config::DownloadConfig;
use crate::domain::{Subtitle, SubtitleFormat, SubtitleSource, Video, VideoId};
use crate::errors::{PipelineError, ResourceError};
use crate::file_utils::{FileManager, extract_lang_code};
use crate::identifier;
use crate::ports::{ProgressCallback, ProgressReporter, VideoDownloader};
use crate::tools::{self, ToolStream};

// @const: yt-dlp progress line, e.g. "[download]  42.3% of ~ 10.00MiB at 2.00MiB/s"
static DOWNLOAD_PROGRESS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[download\]\s+(\d+(?:\.\d+)?)%").expect("download progress regex is valid")
});

/// Share of the progress range used by the video download; captions get the rest
const VIDEO_PROGRESS_SHARE: f32 = 0.9;

/// Percentage of a yt-dlp progress line
pub fn parse_download_progress(line: &str) -> Option<f32> {
    DOWNLOAD_PROGRESS_REGEX
        .captures(line.trim())
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Video downloader backed by the yt-dlp CLI
#[derive(Debug, Clone)]
pub struct YtDlpDownloader {
    config: DownloadConfig,
}

impl YtDlpDownloader {
    pub fn new(config: DownloadConfig) -> Self {
        Self { config }
    }

    fn download_args(&self, url: &str, output_template: &Path) -> Vec<OsString> {
        let retries = self.config.retries.to_string();
        let mut args: Vec<OsString> = [
            "--no-warnings",
            "--newline",
            "--progress",
            "--no-playlist",
            "--format",
            self.config.format.as_str(),
            "--merge-output-format",
            self.config.merge_output_format.as_str(),
            "--retries",
            retries.as_str(),
            "--fragment-retries",
            retries.as_str(),
            "--print",
            "after_move:title",
            "--output",
        ]
        .iter()
        .map(OsString::from)
        .collect();
        args.push(output_template.as_os_str().to_os_string());
        args.push(OsString::from(url));
        args
    }

    fn caption_args(&self, url: &str, output_template: &Path) -> Vec<OsString> {
        let languages = self.config.subtitle_languages.join(",");
        let mut args: Vec<OsString> = [
            "--no-warnings",
            "--no-playlist",
            "--skip-download",
            "--write-subs",
            "--write-auto-subs",
            "--sub-langs",
            languages.as_str(),
            "--convert-subs",
            "srt",
            "--output",
        ]
        .iter()
        .map(OsString::from)
        .collect();
        args.push(output_template.as_os_str().to_os_string());
        args.push(OsString::from(url));
        args
    }

    async fn download_captions(&self, url: &str, output_template: &Path) {
        if self.config.subtitle_languages.is_empty() {
            return;
        }

        let args = self.caption_args(url, output_template);
        if let Err(e) = tools::run_tool(&self.config.yt_dlp_path, args, self.config.timeout_secs).await {
            warn!("Caption download failed, continuing without captions: {}", e);
        }
    }
}

/// Caption tracks stored next to a downloaded video
fn caption_subtitles(video_id: &VideoId, dir: &Path) -> Vec<Subtitle> {
    let files = match FileManager::find_caption_files(dir) {
        Ok(files) => files,
        Err(e) => {
            warn!("Could not list caption files in {:?}: {}", dir, e);
            return Vec::new();
        }
    };

    files
        .into_iter()
        .filter_map(|path| {
            let name = path.file_name()?.to_string_lossy().to_string();
            let language = extract_lang_code(&name)?;
            let format = SubtitleFormat::from_path(&path)?;
            Some(Subtitle::new(video_id.clone(), language, format, SubtitleSource::Download).with_file_path(path))
        })
        .collect()
}

#[async_trait]
impl VideoDownloader for YtDlpDownloader {
    fn extract_video_id(&self, url: &str) -> Result<VideoId, PipelineError> {
        Ok(identifier::extract_video_id(url)?)
    }

    async fn download(
        &self,
        url: &str,
        output_dir: &Path,
        progress: Option<&ProgressCallback>,
    ) -> Result<Video, PipelineError> {
        let video_id = self.extract_video_id(url)?;
        let reporter = ProgressReporter::new(progress);

        let target_dir = output_dir.join(video_id.as_str());
        FileManager::ensure_dir(&target_dir)?;
        let output_template = target_dir.join("video.%(ext)s");

        reporter.report(&format!("Downloading {}", video_id), 0.0);
        info!("Downloading {} into {:?}", url, target_dir);

        let mut title: Option<String> = None;
        let args = self.download_args(url, &output_template);
        // --print makes yt-dlp quiet, which moves the progress lines to stderr
        tools::run_tool_streaming(&self.config.yt_dlp_path, args, self.config.timeout_secs, |stream, line| {
            if let Some(percent) = parse_download_progress(line) {
                reporter.report(&format!("Downloading {}", video_id), percent * VIDEO_PROGRESS_SHARE);
            } else if stream == ToolStream::Stdout && !line.starts_with('[') && !line.trim().is_empty() {
                title = Some(line.trim().to_string());
            }
        })
        .await?;

        let video_path: PathBuf = target_dir.join(format!("video.{}", self.config.merge_output_format));
        if !video_path.exists() {
            return Err(ResourceError::NotFound { what: "downloaded video", path: video_path }.into());
        }

        if self.config.download_subtitles {
            reporter.report("Downloading captions", 90.0);
            self.download_captions(url, &output_template).await;
        }

        let subtitles = caption_subtitles(&video_id, &target_dir);
        reporter.complete("Download complete");

        Ok(Video::new(video_id.clone(), url)
            .with_file_path(video_path)
            .with_title(title.unwrap_or_else(|| video_id.to_string()))
            .with_subtitles(subtitles))
    }
}
