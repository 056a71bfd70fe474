/*!
 * Capability ports of the pipeline.
 *
 * Each stage talks to exactly one of these traits:
 * - `VideoDownloader`: fetch a video into a directory
 * - `SubtitleExtractor`: produce an SRT file for a downloaded video
 * - `SubtitleTranslator`: translate a subtitle into another language
 * - `SubtitleEmbedder`: mux or burn a subtitle into a video
 *
 * Implementations live in `providers` (external tools and engines) and in
 * the test fakes. Use-cases never look at which implementation they hold.
 */

use std::collections::BTreeSet;
use std::fmt::{self, Debug};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Subtitle, Video, VideoId};
use crate::errors::{PipelineError, ValidationError};

pub mod progress;

pub use progress::{ProgressCallback, ProgressReporter};

/// How a subtitle is put into the output video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedMode {
    /// Selectable subtitle track
    #[default]
    Soft,
    /// Rendered into the video frames
    Hard,
}

impl fmt::Display for EmbedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Soft => write!(f, "soft"),
            Self::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for EmbedMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "soft" => Ok(Self::Soft),
            "hard" => Ok(Self::Hard),
            _ => Err(ValidationError::InvalidLiteral { kind: "embed mode", value: s.to_string() }),
        }
    }
}

/// Downloads a video and locates it on disk
#[async_trait]
pub trait VideoDownloader: Send + Sync + Debug {
    /// Identifier the video at `url` will be stored under
    fn extract_video_id(&self, url: &str) -> Result<VideoId, PipelineError>;

    /// Download `url` below `output_dir`
    ///
    /// The returned video has its `file_path` set to an existing file under
    /// `output_dir`.
    async fn download(
        &self,
        url: &str,
        output_dir: &Path,
        progress: Option<&ProgressCallback>,
    ) -> Result<Video, PipelineError>;
}

/// Produces a subtitle file for a video
#[async_trait]
pub trait SubtitleExtractor: Send + Sync + Debug {
    /// Write a subtitle for `video` in `language` to `output_path`
    ///
    /// The returned subtitle's `file_path` equals `output_path` and its
    /// `source` tells whether an existing caption was used or one was
    /// generated.
    async fn extract(
        &self,
        video: &Video,
        output_path: &Path,
        language: &str,
        progress: Option<&ProgressCallback>,
    ) -> Result<Subtitle, PipelineError>;

    /// Languages of caption tracks already available for `video`
    async fn list_available_languages(&self, video: &Video) -> Result<BTreeSet<String>, PipelineError>;
}

/// Translates subtitles between languages
#[async_trait]
pub trait SubtitleTranslator: Send + Sync + Debug {
    /// Translate `subtitle` into `target_language`
    ///
    /// The result has `language == target_language` and
    /// `source_language == subtitle.language()`.
    async fn translate(
        &self,
        subtitle: &Subtitle,
        target_language: &str,
        progress: Option<&ProgressCallback>,
    ) -> Result<Subtitle, PipelineError>;

    async fn list_supported_languages(&self) -> Result<BTreeSet<String>, PipelineError>;

    async fn is_language_pair_supported(
        &self,
        source_language: &str,
        target_language: &str,
    ) -> Result<bool, PipelineError>;
}

/// Puts a subtitle into a video
#[async_trait]
pub trait SubtitleEmbedder: Send + Sync + Debug {
    /// Write a copy of `video` with `subtitle` to `output_path`
    ///
    /// Returns the path of the written file.
    async fn embed(
        &self,
        video: &Video,
        subtitle: &Subtitle,
        output_path: &Path,
        mode: EmbedMode,
        progress: Option<&ProgressCallback>,
    ) -> Result<PathBuf, PipelineError>;
}
