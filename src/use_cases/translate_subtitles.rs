use std::sync::Arc;

use log::debug;

use crate::domain::Subtitle;
use crate::errors::{PipelineError, ValidationError};
use crate::ports::{ProgressCallback, SubtitleTranslator};

/// Translates a subtitle and checks the result
#[derive(Debug, Clone)]
pub struct TranslateSubtitlesUseCase {
    translator: Arc<dyn SubtitleTranslator>,
}

impl TranslateSubtitlesUseCase {
    pub fn new(translator: Arc<dyn SubtitleTranslator>) -> Self {
        Self { translator }
    }

    /// Translate `subtitle` into `target_language`
    ///
    /// The subtitle is validated before the translator runs. The result is
    /// validated too and must be in `target_language` with the original
    /// language recorded as its source.
    pub async fn execute(
        &self,
        subtitle: &Subtitle,
        target_language: &str,
        progress: Option<&ProgressCallback>,
    ) -> Result<Subtitle, PipelineError> {
        subtitle.validate()?;

        let target_language = target_language.trim();
        if target_language.is_empty() {
            return Err(ValidationError::EmptyLanguage.into());
        }

        debug!(
            "Translating {} subtitle of {} into {}",
            subtitle.language(),
            subtitle.video_id(),
            target_language
        );
        let translated = self.translator.translate(subtitle, target_language, progress).await?;

        translated.validate()?;
        check_transition(subtitle, &translated, target_language)?;

        Ok(translated)
    }
}

fn check_transition(original: &Subtitle, translated: &Subtitle, target_language: &str) -> Result<(), ValidationError> {
    if translated.language() != target_language {
        return Err(ValidationError::TranslationMismatch(format!(
            "expected language {}, got {}",
            target_language,
            translated.language()
        )));
    }

    if translated.source_language() != Some(original.language()) {
        return Err(ValidationError::TranslationMismatch(format!(
            "expected source language {}, got {}",
            original.language(),
            translated.source_language().unwrap_or("none")
        )));
    }

    if translated.video_id() != original.video_id() {
        return Err(ValidationError::TranslationMismatch(format!(
            "expected video {}, got {}",
            original.video_id(),
            translated.video_id()
        )));
    }

    Ok(())
}
