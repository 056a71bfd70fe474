use parking_lot::Mutex;

/// Progress callback shared by every port: `(message, percent)`
///
/// Callbacks run inline on the calling task, so they must return quickly.
/// They never carry errors; failures are reported through the operation's
/// `Result` only.
pub type ProgressCallback = dyn Fn(&str, f32) + Send + Sync;

/// Wraps an optional progress callback for one operation
///
/// Percentages are clamped to `[0, 100]` and never go below the last value
/// reported through the same reporter.
pub struct ProgressReporter<'a> {
    callback: Option<&'a ProgressCallback>,
    last: Mutex<f32>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(callback: Option<&'a ProgressCallback>) -> Self {
        Self { callback, last: Mutex::new(0.0) }
    }

    /// Report progress; does nothing without a callback
    pub fn report(&self, message: &str, percent: f32) {
        let Some(callback) = self.callback else {
            return;
        };

        let value = {
            let mut last = self.last.lock();
            let clamped = if percent.is_nan() { *last } else { percent.clamp(0.0, 100.0) };
            *last = last.max(clamped);
            *last
        };

        callback(message, value);
    }

    /// Report 100%
    pub fn complete(&self, message: &str) {
        self.report(message, 100.0);
    }

    /// Last value sent to the callback
    pub fn last_percent(&self) -> f32 {
        *self.last.lock()
    }
}

impl std::fmt::Debug for ProgressReporter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("has_callback", &self.callback.is_some())
            .field("last", &self.last_percent())
            .finish()
    }
}
