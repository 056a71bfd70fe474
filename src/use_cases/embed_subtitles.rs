use std::path::Path;
use std::sync::Arc;

use log::debug;

use crate::domain::{Subtitle, Video};
use crate::errors::{PipelineError, ValidationError};
use crate::ports::{EmbedMode, ProgressCallback, SubtitleEmbedder};
use crate::use_cases::ensure_exists;

/// Embeds a subtitle into a video
#[derive(Debug, Clone)]
pub struct EmbedSubtitlesUseCase {
    embedder: Arc<dyn SubtitleEmbedder>,
}

impl EmbedSubtitlesUseCase {
    pub fn new(embedder: Arc<dyn SubtitleEmbedder>) -> Self {
        Self { embedder }
    }

    /// Embed `subtitle` into `video`, writing `output_path`
    ///
    /// Returns a new video for the output file. It keeps the identifier,
    /// source URL and title, has no subtitle list and is flagged as having
    /// an embedded subtitle.
    pub async fn execute(
        &self,
        video: &Video,
        subtitle: &Subtitle,
        output_path: &Path,
        mode: EmbedMode,
        progress: Option<&ProgressCallback>,
    ) -> Result<Video, PipelineError> {
        let video_path = video.file_path().ok_or(ValidationError::MissingFilePath("video"))?;
        let subtitle_path = subtitle.file_path().ok_or(ValidationError::MissingFilePath("subtitle"))?;
        ensure_exists("video file", video_path)?;
        ensure_exists("subtitle file", subtitle_path)?;

        if output_path == video_path {
            return Err(ValidationError::OutputOverwritesInput(output_path.to_path_buf()).into());
        }

        debug!("Embedding {:?} into {:?} ({})", subtitle_path, video_path, mode);
        let embedded_path = self.embedder.embed(video, subtitle, output_path, mode, progress).await?;

        let mut embedded = Video::new(video.video_id().clone(), video.source_url())
            .with_file_path(embedded_path)
            .with_embedded_subtitle(true);
        if let Some(title) = video.title() {
            embedded = embedded.with_title(title);
        }

        Ok(embedded)
    }
}
