/*!
 * Pipeline use-cases.
 *
 * One orchestrator per stage, each built around a single port:
 * Download -> Extract -> Translate -> Embed. A use-case checks the inputs
 * it owns the contract for, calls its port once, and hands the resulting
 * domain value back to the caller. Port errors pass through unchanged.
 */

pub mod download_video;
pub mod embed_subtitles;
pub mod extract_subtitles;
pub mod translate_subtitles;

pub use download_video::DownloadVideoUseCase;
pub use embed_subtitles::EmbedSubtitlesUseCase;
pub use extract_subtitles::ExtractSubtitlesUseCase;
pub use translate_subtitles::TranslateSubtitlesUseCase;

use std::path::Path;

use crate::errors::{PipelineError, ResourceError};

// Shared precondition for stages that read files produced earlier
pub(crate) fn ensure_exists(what: &'static str, path: &Path) -> Result<(), PipelineError> {
    if path.exists() {
        Ok(())
    } else {
        Err(ResourceError::NotFound { what, path: path.to_path_buf() }.into())
    }
}
