/*!
 * Cue-level subtitle translation.
 *
 * `CueTranslator` is the subtitle translator built on top of a plain text
 * [`TranslationEngine`]. It parses the SRT content into cues, translates
 * each cue text on its own and in order, and reassembles the document, so
 * cue numbers and timecodes come out exactly as they went in.
 */

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};

use crate::domain::{Subtitle, SubtitleFormat};
use crate::errors::{PipelineError, ProviderError, ResourceError, ValidationError};
use crate::ports::{ProgressCallback, ProgressReporter, SubtitleTranslator};
use crate::subtitle_processor::{SubtitleCue, parse_srt_cues, reassemble_srt};
use crate::translation::cache::TranslationCache;
use crate::translation::engine::TranslationEngine;

/// Progress is reported every this many cues
const PROGRESS_INTERVAL: usize = 10;

/// Subtitle translator that translates SRT cue by cue
#[derive(Debug, Clone)]
pub struct CueTranslator {
    engine: Arc<dyn TranslationEngine>,
    cache: TranslationCache,
}

impl CueTranslator {
    /// Create a translator with an enabled cache
    pub fn new(engine: Arc<dyn TranslationEngine>) -> Self {
        Self { engine, cache: TranslationCache::default() }
    }

    /// Use the given cache instead of the default one
    pub fn with_cache(mut self, cache: TranslationCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    /// Inline text, or the content of the subtitle file
    async fn load_content(&self, subtitle: &Subtitle) -> Result<String, PipelineError> {
        if let Some(text) = subtitle.text() {
            return Ok(text.to_string());
        }

        let path = subtitle.file_path().ok_or(ValidationError::MissingSubtitleContent)?;
        read_subtitle_file(path).await
    }

    async fn translate_cue(
        &self,
        cue: &SubtitleCue,
        source_language: &str,
        target_language: &str,
    ) -> Result<SubtitleCue, ProviderError> {
        if let Some(cached) = self.cache.get(&cue.text, source_language, target_language) {
            return Ok(cue.with_text(cached));
        }

        let translated = self.engine.translate_text(&cue.text, source_language, target_language).await?;
        let translated = collapse_blank_lines(&translated);
        if translated.is_empty() {
            return Err(ProviderError::EmptyResponse(format!(
                "{} returned nothing for cue {}",
                self.engine.name(),
                cue.number
            )));
        }

        self.cache.store(&cue.text, source_language, target_language, &translated);
        Ok(cue.with_text(translated))
    }
}

/// Engine output as cue text: trimmed, without blank lines
///
/// A blank line ends an SRT block, so one inside a cue would split it.
fn collapse_blank_lines(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

async fn read_subtitle_file(path: &Path) -> Result<String, PipelineError> {
    if !path.exists() {
        return Err(ResourceError::NotFound { what: "subtitle file", path: path.to_path_buf() }.into());
    }

    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ResourceError::io(path, e).into())
}

#[async_trait]
impl SubtitleTranslator for CueTranslator {
    async fn translate(
        &self,
        subtitle: &Subtitle,
        target_language: &str,
        progress: Option<&ProgressCallback>,
    ) -> Result<Subtitle, PipelineError> {
        if subtitle.format() != SubtitleFormat::Srt {
            return Err(ValidationError::UntranslatableFormat(subtitle.format().to_string()).into());
        }

        let reporter = ProgressReporter::new(progress);
        reporter.report("Preparing translation", 0.0);

        let content = self.load_content(subtitle).await?;
        if content.trim().is_empty() {
            return Err(ValidationError::EmptyContent.into());
        }

        let source_language = subtitle.language();
        if !self.engine.is_pair_supported(source_language, target_language).await? {
            return Err(ValidationError::UnsupportedLanguagePair {
                source_language: source_language.to_string(),
                target_language: target_language.to_string(),
            }
            .into());
        }

        reporter.report("Loading translation engine", 10.0);
        self.engine.prepare(source_language, target_language).await?;

        reporter.report("Parsing subtitles", 20.0);
        let cues = parse_srt_cues(&content);
        if cues.is_empty() {
            return Err(ValidationError::NoValidCues.into());
        }

        let total = cues.len();
        info!(
            "Translating {} cues from {} to {} with {}",
            total,
            source_language,
            target_language,
            self.engine.name()
        );
        reporter.report(&format!("Translating {} cues", total), 30.0);

        let mut translated = Vec::with_capacity(total);
        for (index, cue) in cues.iter().enumerate() {
            translated.push(self.translate_cue(cue, source_language, target_language).await?);

            if index % PROGRESS_INTERVAL == 0 {
                let percent = 30.0 + 60.0 * (index + 1) as f32 / total as f32;
                reporter.report(&format!("Translating ({}/{})", index + 1, total), percent);
            }
        }

        reporter.report("Reassembling subtitles", 90.0);
        let output = reassemble_srt(&translated);

        let stats = self.cache.stats();
        debug!("Cue cache: {} hits, {} misses", stats.hits, stats.misses);

        reporter.complete("Translation complete");
        Ok(subtitle.with_translation(output, target_language))
    }

    async fn list_supported_languages(&self) -> Result<BTreeSet<String>, PipelineError> {
        Ok(self.engine.supported_languages().await?)
    }

    async fn is_language_pair_supported(
        &self,
        source_language: &str,
        target_language: &str,
    ) -> Result<bool, PipelineError> {
        Ok(self.engine.is_pair_supported(source_language, target_language).await?)
    }
}
