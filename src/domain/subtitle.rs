use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::VideoId;
use crate::errors::ValidationError;

/// Subtitle file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFormat {
    Srt,
    Vtt,
}

impl SubtitleFormat {
    /// File extension without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Srt => "srt",
            Self::Vtt => "vtt",
        }
    }

    /// Format matching a file extension, if any
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for SubtitleFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "srt" => Ok(Self::Srt),
            "vtt" => Ok(Self::Vtt),
            _ => Err(ValidationError::InvalidLiteral { kind: "subtitle format", value: s.to_string() }),
        }
    }
}

/// Where subtitle content came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleSource {
    /// Caption track shipped with the video
    Download,
    /// Generated by speech recognition
    Whisper,
    /// Produced or edited outside of a provider, including translations
    Manual,
}

impl fmt::Display for SubtitleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Download => "download",
            Self::Whisper => "whisper",
            Self::Manual => "manual",
        };
        f.write_str(name)
    }
}

impl FromStr for SubtitleSource {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "download" => Ok(Self::Download),
            "whisper" => Ok(Self::Whisper),
            "manual" => Ok(Self::Manual),
            _ => Err(ValidationError::InvalidLiteral { kind: "subtitle source", value: s.to_string() }),
        }
    }
}

/// Caption content plus its provenance
///
/// Construction does not validate, so a subtitle can be built up in steps;
/// call [`Subtitle::validate`] before handing it to a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtitle {
    video_id: VideoId,
    language: String,
    format: SubtitleFormat,
    file_path: Option<PathBuf>,
    text: Option<String>,
    source_language: Option<String>,
    source: SubtitleSource,
}

impl Subtitle {
    /// Create a subtitle without content
    pub fn new(
        video_id: VideoId,
        language: impl Into<String>,
        format: SubtitleFormat,
        source: SubtitleSource,
    ) -> Self {
        Self {
            video_id,
            language: language.into(),
            format,
            file_path: None,
            text: None,
            source_language: None,
            source,
        }
    }

    pub fn video_id(&self) -> &VideoId {
        &self.video_id
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn format(&self) -> SubtitleFormat {
        self.format
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Language this subtitle was translated from, if it is a translation
    pub fn source_language(&self) -> Option<&str> {
        self.source_language.as_deref()
    }

    pub fn source(&self) -> SubtitleSource {
        self.source
    }

    /// True when this subtitle is the result of a translation
    pub fn is_translated(&self) -> bool {
        self.source_language.is_some()
    }

    /// Copy with the file path set
    pub fn with_file_path(&self, path: impl Into<PathBuf>) -> Self {
        Self { file_path: Some(path.into()), ..self.clone() }
    }

    /// Copy with inline text set
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), ..self.clone() }
    }

    /// Copy marked as translated from `source_language`
    pub fn with_source_language(&self, source_language: impl Into<String>) -> Self {
        Self { source_language: Some(source_language.into()), ..self.clone() }
    }

    /// Translated copy of this subtitle
    ///
    /// The result carries the new language and text, remembers the current
    /// language as its source, is tagged as manual and has no file path.
    pub fn with_translation(&self, text: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            video_id: self.video_id.clone(),
            language: target_language.into(),
            format: self.format,
            file_path: None,
            text: Some(text.into()),
            source_language: Some(self.language.clone()),
            source: SubtitleSource::Manual,
        }
    }

    /// Check the subtitle invariants
    ///
    /// Language must be non-blank, inline text (when present) must be
    /// non-blank, and at least one of file path or text must be set.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.language.trim().is_empty() {
            return Err(ValidationError::EmptyLanguage);
        }

        if let Some(text) = &self.text {
            if text.trim().is_empty() {
                return Err(ValidationError::EmptySubtitleText);
            }
        }

        if self.file_path.is_none() && self.text.is_none() {
            return Err(ValidationError::MissingSubtitleContent);
        }

        Ok(())
    }
}
