/*!
 * Domain value types shared by every pipeline stage.
 *
 * - `VideoId`: validated 11-character identifier
 * - `Video`: a media asset and the subtitles gathered for it
 * - `Subtitle`: caption content with language and provenance
 *
 * All of them are immutable once built. Stages derive new values through
 * the `with_*` methods instead of mutating shared ones.
 */

pub mod subtitle;
pub mod video;
pub mod video_id;

pub use subtitle::{Subtitle, SubtitleFormat, SubtitleSource};
pub use video::Video;
pub use video_id::{VIDEO_ID_LENGTH, VideoId};
