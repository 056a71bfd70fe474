/*!
 * Error types for the yttrans pipeline.
 *
 * Errors fall into three categories that every stage reports the same way:
 * validation errors (bad identifiers, bad subtitle fields, unsupported language
 * pairs, unparseable cues), resource errors (missing files, I/O failures) and
 * provider errors (external tools and translation engines). They are defined
 * with the thiserror crate and gathered in [`PipelineError`].
 */

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised when an input or output breaks a domain rule
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Video identifier is empty after trimming
    #[error("video_id cannot be empty")]
    EmptyVideoId,

    /// Video identifier does not have exactly 11 characters
    #[error("video_id must be 11 characters, got {0}")]
    InvalidVideoIdLength(usize),

    /// URL passed to the download stage is empty
    #[error("url cannot be empty")]
    EmptyUrl,

    /// Subtitle or requested language is empty
    #[error("language cannot be empty")]
    EmptyLanguage,

    /// Subtitle text is present but blank
    #[error("subtitle text cannot be empty if provided")]
    EmptySubtitleText,

    /// Subtitle has neither a file nor inline text
    #[error("either file_path or text must be provided")]
    MissingSubtitleContent,

    /// Loaded subtitle content is blank
    #[error("subtitle content cannot be empty or whitespace only")]
    EmptyContent,

    /// The translation engine does not offer this language pair
    #[error("translation from {source_language} to {target_language} is not supported")]
    UnsupportedLanguagePair {
        /// Source language code
        source_language: String,
        /// Target language code
        target_language: String,
    },

    /// Only SRT content goes through the cue translator
    #[error("{0} subtitles cannot be translated, convert them to srt first")]
    UntranslatableFormat(String),

    /// Parsing produced zero cues
    #[error("no valid subtitle cues found after parsing")]
    NoValidCues,

    /// A file path required by the operation is not set
    #[error("{0} file_path is required")]
    MissingFilePath(&'static str),

    /// Embedding would overwrite its own input
    #[error("output path must differ from the input video: {}", .0.display())]
    OutputOverwritesInput(PathBuf),

    /// A translated subtitle does not satisfy the translation transition
    #[error("translated subtitle is inconsistent: {0}")]
    TranslationMismatch(String),

    /// Unknown literal for one of the closed sets (format, source, mode)
    #[error("invalid {kind}: {value}")]
    InvalidLiteral {
        /// Which closed set was being parsed
        kind: &'static str,
        /// The rejected value
        value: String,
    },
}

/// Errors raised when a file or directory cannot be used
#[derive(Error, Debug)]
pub enum ResourceError {
    /// Required input file does not exist
    #[error("{what} not found: {}", .path.display())]
    NotFound {
        /// Human readable description of the missing resource
        what: &'static str,
        /// Path that was checked
        path: PathBuf,
    },

    /// File system operation failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// Path involved in the failing operation
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl ResourceError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

/// Errors raised by external tools and translation engines
#[derive(Error, Debug)]
pub enum ProviderError {
    /// External program could not be started
    #[error("failed to start {tool}: {message}")]
    ToolUnavailable {
        /// Program name
        tool: String,
        /// Reason reported by the OS
        message: String,
    },

    /// External program exited unsuccessfully
    #[error("{tool} failed (exit code {}): {diagnostic}", .status.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    ToolFailed {
        /// Program name
        tool: String,
        /// Exit code if the process exited normally
        status: Option<i32>,
        /// Filtered stderr of the program
        diagnostic: String,
    },

    /// External program exceeded its time budget
    #[error("{tool} timed out after {secs} seconds")]
    Timeout {
        /// Program name
        tool: String,
        /// Timeout that was exceeded
        secs: u64,
    },

    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Engine answered without any translated text
    #[error("engine returned an empty response: {0}")]
    EmptyResponse(String),

    /// Model needed by the engine is not installed
    #[error("model not available: {0}")]
    ModelUnavailable(String),

    /// Speech-to-text produced nothing usable
    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),

    /// Any other engine failure
    #[error("translation engine error: {0}")]
    Engine(String),
}

/// Category of a [`PipelineError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Resource,
    Provider,
}

/// Error returned by every port and use-case
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Input or output broke a domain rule
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// File or directory could not be used
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    /// External tool or engine failed
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl PipelineError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Resource(_) => ErrorKind::Resource,
            Self::Provider(_) => ErrorKind::Provider,
        }
    }

    /// Validation details, if this is a validation error
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(e) => Some(e),
            _ => None,
        }
    }
}
