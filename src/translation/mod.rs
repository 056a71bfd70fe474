/*!
 * Subtitle translation.
 *
 * - `engine`: the plain text `TranslationEngine` trait implemented by the
 *   HTTP and mock engines in `providers`
 * - `cue_translator`: the `SubtitleTranslator` port built on an engine,
 *   translating SRT documents cue by cue
 * - `cache`: per-cue translation cache
 */

pub mod cache;
pub mod cue_translator;
pub mod engine;

pub use self::cache::{CacheStats, TranslationCache};
pub use self::cue_translator::CueTranslator;
pub use self::engine::TranslationEngine;
