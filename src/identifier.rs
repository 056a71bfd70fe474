/*!
 * Video identifier derivation.
 *
 * Known URL shapes (`watch?v=`, `/v/`, `youtu.be/`, `embed/`, `shorts/`)
 * yield the identifier embedded in the URL. Anything else falls back to the
 * first 11 hex characters of the MD5 digest of the input, which always
 * satisfies the identifier length rule but may collide.
 */

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{VIDEO_ID_LENGTH, VideoId};
use crate::errors::ValidationError;

/// Prefix of the source marker used for media that did not come from a URL
pub const LOCAL_SOURCE_PREFIX: &str = "local:";

// Checked in order, first match wins
static VIDEO_ID_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?:v=|/v/|youtu\.be/)([a-zA-Z0-9_-]{11})",
        r"(?:embed/)([a-zA-Z0-9_-]{11})",
        r"(?:shorts/)([a-zA-Z0-9_-]{11})",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Derive the identifier of a video URL
///
/// Fails only when `url` is blank.
pub fn extract_video_id(url: &str) -> Result<VideoId, ValidationError> {
    if url.trim().is_empty() {
        return Err(ValidationError::EmptyUrl);
    }

    for pattern in VIDEO_ID_PATTERNS.iter() {
        if let Some(id) = pattern.captures(url).and_then(|caps| caps.get(1)) {
            return VideoId::new(id.as_str());
        }
    }

    VideoId::new(&fallback_id(url))
}

/// Hash based identifier for inputs that match no known URL shape
pub fn fallback_id(input: &str) -> String {
    let digest = format!("{:x}", md5::compute(input.as_bytes()));
    digest[..VIDEO_ID_LENGTH].to_string()
}

/// Source marker for a media file given by local path
pub fn local_source_marker(path: &Path) -> String {
    format!("{}{}", LOCAL_SOURCE_PREFIX, path.display())
}

/// True if `source_url` is a local source marker
pub fn is_local_source(source_url: &str) -> bool {
    source_url.starts_with(LOCAL_SOURCE_PREFIX)
}

/// Identifier for a media file given by local path
///
/// Downloads are stored one directory per identifier, so a valid parent
/// directory name is reused. Otherwise the path is hashed.
pub fn video_id_for_local_file(path: &Path) -> Result<VideoId, ValidationError> {
    let parent_name = path
        .parent()
        .and_then(|parent| parent.file_name())
        .and_then(|name| name.to_str());

    if let Some(id) = parent_name.and_then(|name| VideoId::new(name).ok()) {
        return Ok(id);
    }

    VideoId::new(&fallback_id(&path.to_string_lossy()))
}
