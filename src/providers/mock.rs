/*!
 * Mock translation engine for testing.
 *
 * `MockEngine` simulates different engine behaviors:
 * - `MockEngine::working()` - Prefixes every text with `[<target>] `
 * - `MockEngine::failing()` - Always fails with an API error
 * - `MockEngine::empty()` - Answers with an empty string
 * - `MockEngine::intermittent(n)` - Fails every Nth request
 *
 * Supported pairs default to "any two different languages" and can be
 * restricted with `with_pairs`.
 */

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::errors::ProviderError;
use crate::translation::TranslationEngine;

/// Behavior mode for the mock engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Returns empty response
    Empty,
    /// Simulates slow response (for timeout testing)
    Slow { delay_ms: u64 },
}

/// Mock engine for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockEngine {
    behavior: MockBehavior,
    /// Restricts supported pairs when set
    pairs: Option<BTreeSet<(String, String)>>,
    /// Translation requests, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Pair support queries, shared between clones
    pair_checks: Arc<AtomicUsize>,
}

impl MockEngine {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            pairs: None,
            request_count: Arc::new(AtomicUsize::new(0)),
            pair_checks: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every: fail_every.max(1) })
    }

    /// Only support the given (source, target) pairs
    pub fn with_pairs(mut self, pairs: &[(&str, &str)]) -> Self {
        self.pairs = Some(pairs.iter().map(|(s, t)| (s.to_string(), t.to_string())).collect());
        self
    }

    /// Number of translate_text calls so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Number of is_pair_supported calls so far
    pub fn pair_checks(&self) -> usize {
        self.pair_checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranslationEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn supported_languages(&self) -> Result<BTreeSet<String>, ProviderError> {
        let languages = match &self.pairs {
            Some(pairs) => pairs.iter().flat_map(|(s, t)| [s.clone(), t.clone()]).collect(),
            None => ["de", "en", "es", "fr", "ja", "ko"].iter().map(|s| s.to_string()).collect(),
        };
        Ok(languages)
    }

    async fn is_pair_supported(&self, source_language: &str, target_language: &str) -> Result<bool, ProviderError> {
        self.pair_checks.fetch_add(1, Ordering::SeqCst);

        if self.behavior == MockBehavior::Failing {
            return Err(ProviderError::ConnectionError("Simulated engine outage".to_string()));
        }

        Ok(match &self.pairs {
            Some(pairs) => pairs.contains(&(source_language.to_string(), target_language.to_string())),
            None => !source_language.is_empty() && source_language != target_language,
        })
    }

    async fn prepare(&self, _source_language: &str, _target_language: &str) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn translate_text(
        &self,
        text: &str,
        _source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Working => Ok(format!("[{}] {}", target_language, text)),

            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(format!("[{}] {}", target_language, text))
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::Empty => Ok(String::new()),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                Ok(format!("[{}] {}", target_language, text))
            }
        }
    }
}
