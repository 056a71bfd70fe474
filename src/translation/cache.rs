/*!
 * Per-cue translation cache.
 *
 * Subtitles repeat short lines a lot ("Thank you.", "[Music]"). The cache
 * keeps translated cue texts per (text, source language, target language)
 * so that each distinct line is sent to the engine once. Clones share the
 * same storage.
 */

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;

/// Cache key combining cue text, source language, and target language
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    text: String,
    source_language: String,
    target_language: String,
}

impl CacheKey {
    fn new(text: &str, source_language: &str, target_language: &str) -> Self {
        Self {
            text: text.to_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
        }
    }
}

/// Hit and miss counters of a cache
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub entries: usize,
}

impl CacheStats {
    /// Share of lookups answered from the cache
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 { self.hits as f64 / total as f64 } else { 0.0 }
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<CacheKey, String>,
    hits: usize,
    misses: usize,
}

/// Translation cache shared between translations
#[derive(Debug, Clone)]
pub struct TranslationCache {
    state: Arc<RwLock<CacheState>>,
    enabled: bool,
}

impl TranslationCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            state: Arc::new(RwLock::new(CacheState::default())),
            enabled,
        }
    }

    /// Cached translation of a cue text, if any
    pub fn get(&self, text: &str, source_language: &str, target_language: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }

        let key = CacheKey::new(text, source_language, target_language);
        let mut state = self.state.write();
        match state.entries.get(&key).cloned() {
            Some(translation) => {
                state.hits += 1;
                debug!("Cache hit for '{}' ({} -> {})", truncate_text(text, 30), source_language, target_language);
                Some(translation)
            }
            None => {
                state.misses += 1;
                None
            }
        }
    }

    /// Remember the translation of a cue text
    pub fn store(&self, text: &str, source_language: &str, target_language: &str, translation: &str) {
        if !self.enabled {
            return;
        }

        let key = CacheKey::new(text, source_language, target_language);
        self.state.write().entries.insert(key, translation.to_string());
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.read();
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            entries: state.entries.len(),
        }
    }

    /// Drop all entries and reset the counters
    pub fn clear(&self) {
        *self.state.write() = CacheState::default();
        debug!("Translation cache cleared");
    }

    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Truncate text to a maximum number of characters with ellipsis
fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => format!("{}...", &text[..index]),
        None => text.to_string(),
    }
}
