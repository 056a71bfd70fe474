use std::collections::BTreeSet;
use std::fmt::Debug;

use async_trait::async_trait;

use crate::errors::ProviderError;

/// A machine translation backend that translates plain text
///
/// Engines know nothing about subtitle structure; [`CueTranslator`] feeds
/// them one cue text at a time.
///
/// [`CueTranslator`]: crate::translation::CueTranslator
#[async_trait]
pub trait TranslationEngine: Send + Sync + Debug {
    /// Short engine name used in logs
    fn name(&self) -> &str;

    /// Language codes the engine can translate from or to
    async fn supported_languages(&self) -> Result<BTreeSet<String>, ProviderError>;

    /// Whether the engine can translate from `source_language` to `target_language`
    async fn is_pair_supported(&self, source_language: &str, target_language: &str) -> Result<bool, ProviderError>;

    /// Make sure the engine is ready to translate the given pair
    ///
    /// Called once per document before the first cue.
    async fn prepare(&self, source_language: &str, target_language: &str) -> Result<(), ProviderError>;

    /// Translate a single piece of text
    async fn translate_text(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError>;
}
