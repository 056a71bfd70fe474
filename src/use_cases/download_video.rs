use std::path::Path;
use std::sync::Arc;

use log::debug;

use crate::domain::Video;
use crate::errors::{PipelineError, ValidationError};
use crate::ports::{ProgressCallback, VideoDownloader};

/// Downloads a video through the injected downloader
#[derive(Debug, Clone)]
pub struct DownloadVideoUseCase {
    downloader: Arc<dyn VideoDownloader>,
}

impl DownloadVideoUseCase {
    pub fn new(downloader: Arc<dyn VideoDownloader>) -> Self {
        Self { downloader }
    }

    pub async fn execute(
        &self,
        url: &str,
        output_dir: &Path,
        progress: Option<&ProgressCallback>,
    ) -> Result<Video, PipelineError> {
        if url.trim().is_empty() {
            return Err(ValidationError::EmptyUrl.into());
        }

        debug!("Downloading {} into {:?}", url, output_dir);
        self.downloader.download(url.trim(), output_dir, progress).await
    }
}
