use std::path::Path;
use std::sync::Arc;

use log::debug;

use crate::domain::{Subtitle, Video};
use crate::errors::{PipelineError, ValidationError};
use crate::ports::{ProgressCallback, SubtitleExtractor};
use crate::use_cases::ensure_exists;

/// Obtains a subtitle file for a downloaded video
#[derive(Debug, Clone)]
pub struct ExtractSubtitlesUseCase {
    extractor: Arc<dyn SubtitleExtractor>,
}

impl ExtractSubtitlesUseCase {
    pub fn new(extractor: Arc<dyn SubtitleExtractor>) -> Self {
        Self { extractor }
    }

    /// Extract a `language` subtitle for `video` into `output_path`
    ///
    /// The video file must be set and exist before the extractor is called.
    pub async fn execute(
        &self,
        video: &Video,
        output_path: &Path,
        language: &str,
        progress: Option<&ProgressCallback>,
    ) -> Result<Subtitle, PipelineError> {
        if language.trim().is_empty() {
            return Err(ValidationError::EmptyLanguage.into());
        }

        let video_path = video.file_path().ok_or(ValidationError::MissingFilePath("video"))?;
        ensure_exists("video file", video_path)?;

        debug!("Extracting {} subtitles for {} into {:?}", language, video.video_id(), output_path);
        self.extractor.extract(video, output_path, language.trim(), progress).await
    }
}
