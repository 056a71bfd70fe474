use std::path::{Path, PathBuf};

use crate::domain::{Subtitle, VideoId};

/// A located media asset
///
/// Updates go through the `with_*` methods, which leave `self` untouched and
/// return a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Video {
    video_id: VideoId,
    source_url: String,
    file_path: Option<PathBuf>,
    title: Option<String>,
    subtitles: Vec<Subtitle>,
    has_embedded_subtitle: bool,
}

impl Video {
    /// Create a video that has not been located on disk yet
    ///
    /// `source_url` is either a network URL or a local source marker.
    pub fn new(video_id: VideoId, source_url: impl Into<String>) -> Self {
        Self {
            video_id,
            source_url: source_url.into(),
            file_path: None,
            title: None,
            subtitles: Vec::new(),
            has_embedded_subtitle: false,
        }
    }

    pub fn video_id(&self) -> &VideoId {
        &self.video_id
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Media file on disk; existence is checked by the stage that consumes it
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn subtitles(&self) -> &[Subtitle] {
        &self.subtitles
    }

    pub fn has_embedded_subtitle(&self) -> bool {
        self.has_embedded_subtitle
    }

    pub fn with_file_path(&self, path: impl Into<PathBuf>) -> Self {
        Self { file_path: Some(path.into()), ..self.clone() }
    }

    pub fn with_title(&self, title: impl Into<String>) -> Self {
        Self { title: Some(title.into()), ..self.clone() }
    }

    /// Copy with the subtitle list replaced
    pub fn with_subtitles(&self, subtitles: Vec<Subtitle>) -> Self {
        Self { subtitles, ..self.clone() }
    }

    /// Copy with one more subtitle appended
    pub fn with_added_subtitle(&self, subtitle: Subtitle) -> Self {
        let mut subtitles = self.subtitles.clone();
        subtitles.push(subtitle);
        Self { subtitles, ..self.clone() }
    }

    pub fn with_embedded_subtitle(&self, embedded: bool) -> Self {
        Self { has_embedded_subtitle: embedded, ..self.clone() }
    }
}
