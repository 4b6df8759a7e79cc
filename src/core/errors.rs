//! Custom error types for translation operations

use thiserror::Error;

/// Translation-related errors
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Selection is empty or whitespace only
    #[error("No text selected. Please select text to translate.")]
    NoSelection,

    /// Source and target languages are identical
    #[error("Source and target languages are the same")]
    SameLanguage,

    /// Language code is not in the language table
    #[error("Unsupported language: {code}")]
    UnsupportedLanguage {
        code: String,
    },

    /// Another translate action is still running
    #[error("A translation is already in progress")]
    Busy,

    /// No credential configured
    #[error("Please enter and save your API key first")]
    MissingApiKey,

    /// Credential rejected before it was stored
    #[error("Invalid API key: {reason}")]
    InvalidApiKey {
        reason: String,
    },

    /// Remote endpoint rejected the credential
    #[error("Invalid API key. Please check your key. ({message})")]
    Authentication {
        message: String,
    },

    /// Account quota exhausted
    #[error("API quota exceeded. Add credits to your OpenAI account. ({message})")]
    QuotaExceeded {
        message: String,
    },

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {message}")]
    RateLimited {
        message: String,
    },

    /// API request failed
    #[error("API error: {status} - {message}")]
    ApiError {
        status: u16,
        message: String,
    },

    /// Network error
    #[error("Failed to connect to ChatGPT. Check your internet. ({message})")]
    NetworkError {
        message: String,
    },

    /// Invalid response from API
    #[error("Unexpected API response: {message}")]
    InvalidResponseError {
        message: String,
    },

    /// Some table cells could not be translated
    #[error("Translated {translated}/{attempted} cells")]
    PartialFailure {
        translated: usize,
        attempted: usize,
    },

    /// Paragraph count and returned chunk count differ
    #[error("Translation returned {chunks} paragraphs for {paragraphs} selected paragraphs")]
    AlignmentMismatch {
        paragraphs: usize,
        chunks: usize,
    },

    /// Document location no longer exists
    #[error("Document error: {message}")]
    DocumentError {
        message: String,
    },

    /// File operation error
    #[error("File error: {path} - {message}")]
    FileError {
        path: String,
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Reqwest error
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl TranslationError {
    /// Short machine-readable code used in API error bodies
    pub fn code(&self) -> &'static str {
        match self {
            TranslationError::NoSelection => "no_selection",
            TranslationError::SameLanguage => "same_language",
            TranslationError::UnsupportedLanguage { .. } => "unsupported_language",
            TranslationError::Busy => "busy",
            TranslationError::MissingApiKey => "missing_api_key",
            TranslationError::InvalidApiKey { .. } => "invalid_api_key",
            TranslationError::Authentication { .. } => "authentication",
            TranslationError::QuotaExceeded { .. } => "quota_exceeded",
            TranslationError::RateLimited { .. } => "rate_limited",
            TranslationError::ApiError { .. } => "api_error",
            TranslationError::NetworkError { .. } => "network",
            TranslationError::InvalidResponseError { .. } => "invalid_response",
            TranslationError::PartialFailure { .. } => "partial_failure",
            TranslationError::AlignmentMismatch { .. } => "alignment_mismatch",
            TranslationError::DocumentError { .. } => "document",
            TranslationError::FileError { .. } => "file",
            TranslationError::ConfigError { .. } => "config",
            TranslationError::IoError(_) => "io",
            TranslationError::HttpError(_) => "http",
            TranslationError::JsonError(_) => "json",
        }
    }

    /// Whether the error was raised before any remote call was made
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            TranslationError::NoSelection
                | TranslationError::SameLanguage
                | TranslationError::UnsupportedLanguage { .. }
                | TranslationError::MissingApiKey
                | TranslationError::InvalidApiKey { .. }
        )
    }
}

impl From<::config::ConfigError> for TranslationError {
    fn from(err: ::config::ConfigError) -> Self {
        TranslationError::ConfigError {
            message: err.to_string(),
        }
    }
}

/// Result type for translation operations
pub type Result<T> = std::result::Result<T, TranslationError>;
