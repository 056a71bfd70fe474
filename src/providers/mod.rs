/*!
 * Provider implementations for the pipeline ports.
 *
 * External tools:
 * - `ytdlp`: video download through yt-dlp
 * - `whisper`: existing caption lookup, Whisper speech-to-text fallback
 * - `ffmpeg`: soft or hard subtitle embedding
 *
 * Translation engines (used through `translation::CueTranslator`):
 * - `libretranslate`: LibreTranslate HTTP server
 * - `ollama`: local LLM server
 * - `mock`: scripted engine for tests
 */

use std::time::Duration;

use log::warn;
use reqwest::{RequestBuilder, Response, StatusCode};

use crate::errors::ProviderError;

pub mod ffmpeg;
pub mod libretranslate;
pub mod mock;
pub mod ollama;
pub mod whisper;
pub mod ytdlp;

/// Retry policy of the HTTP engines
///
/// Network failures, 5xx and 429 answers are retried with exponential
/// backoff; other error statuses fail immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry, doubled on each further retry
    pub backoff_base_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_base_ms: u64) -> Self {
        Self { max_retries, backoff_base_ms }
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, 1000)
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// Send a request, retrying per `policy`
///
/// `build` is called once per attempt. Returns the first successful response.
pub(crate) async fn send_with_retry<F>(
    service: &str,
    policy: RetryPolicy,
    build: F,
) -> Result<Response, ProviderError>
where
    F: Fn() -> RequestBuilder,
{
    let mut attempt = 0;
    let mut last_error;

    loop {
        match build().send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return Ok(response);
                }

                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Failed to get error response text".to_string());
                let error = ProviderError::ApiError { status_code: status.as_u16(), message };
                if !is_retryable(status) {
                    return Err(error);
                }
                last_error = error;
            }
            Err(e) => {
                last_error = if e.is_connect() || e.is_timeout() {
                    ProviderError::ConnectionError(format!("{}: {}", service, e))
                } else {
                    ProviderError::RequestFailed(format!("{}: {}", service, e))
                };
            }
        }

        attempt += 1;
        if attempt > policy.max_retries {
            return Err(last_error);
        }

        warn!("{} request failed: {} - attempt {}/{}", service, last_error, attempt, policy.max_retries + 1);
        tokio::time::sleep(policy.backoff(attempt)).await;
    }
}

/// Join a base URL and an API path without doubling slashes
pub(crate) fn endpoint_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
