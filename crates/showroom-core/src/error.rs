//! Error types module
//!
//! All pipeline errors are unified under [`AppError`]. Only validation and
//! record-creation failures ever escape a submission; every per-file error is
//! absorbed by the upload orchestrator and folded into the progress counters.

use std::time::Duration;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like a failed attempt
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented and handled
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "VALIDATION_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is transient and the operation may be retried
    fn is_recoverable(&self) -> bool;

    /// User-facing message (may differ from the internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Batch validation failures, detected before any network call is made
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Too many photos: {count} selected (max: {max})")]
    TooManyFiles { count: usize, max: usize },

    #[error("Photo {name} is too large: {size_mb:.1} MB (max: {max_mb:.1} MB)")]
    FileTooLarge {
        name: String,
        size_mb: f64,
        max_mb: f64,
    },

    #[error("Photos are too large in total: {total_mb:.1} MB (max: {max_mb:.1} MB)")]
    TotalTooLarge { total_mb: f64, max_mb: f64 },

    #[error("Photo {name} is empty")]
    EmptyFile { name: String },

    #[error("Photo {name} has unsupported content type: {content_type}")]
    UnsupportedContentType { name: String, content_type: String },
}

impl ValidationError {
    /// Name of the file that caused the rejection, when a single file is to blame
    pub fn offending_file(&self) -> Option<&str> {
        match self {
            ValidationError::FileTooLarge { name, .. }
            | ValidationError::EmptyFile { name }
            | ValidationError::UnsupportedContentType { name, .. } => Some(name),
            ValidationError::TooManyFiles { .. } | ValidationError::TotalTooLarge { .. } => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Record creation failed: {0}")]
    RecordCreation(String),

    #[error("Presign negotiation failed: {0}")]
    Negotiation(String),

    #[error("Transport error{}: {message}", status_suffix(.status))]
    Transport {
        status: Option<u16>,
        message: String,
    },

    #[error("Attempt timed out after {0:?}")]
    Timeout(Duration),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|s| format!(" (status {})", s))
        .unwrap_or_default()
}

impl AppError {
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        AppError::Transport {
            status,
            message: message.into(),
        }
    }
}

impl ErrorMetadata for AppError {
    fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::RecordCreation(_) => "RECORD_CREATION_FAILED",
            AppError::Negotiation(_) => "PRESIGN_FAILED",
            AppError::Transport { .. } => "TRANSPORT_ERROR",
            AppError::Timeout(_) => "TIMEOUT",
            AppError::Cancelled => "CANCELLED",
            AppError::ImageProcessing(_) => "IMAGE_PROCESSING_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Transport { .. } | AppError::Timeout(_) | AppError::Negotiation(_)
        )
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Validation(e) => e.to_string(),
            AppError::RecordCreation(_) => {
                "The vehicle could not be saved. No photos were uploaded.".to_string()
            }
            AppError::Cancelled => "The upload was cancelled.".to_string(),
            AppError::Negotiation(_) | AppError::Transport { .. } | AppError::Timeout(_) => {
                "A network error occurred while uploading photos.".to_string()
            }
            AppError::ImageProcessing(_) | AppError::Config(_) | AppError::Internal(_) => {
                "An unexpected error occurred.".to_string()
            }
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            AppError::Validation(_) | AppError::Cancelled => LogLevel::Debug,
            AppError::Negotiation(_) | AppError::Transport { .. } | AppError::Timeout(_) => {
                LogLevel::Warn
            }
            AppError::RecordCreation(_)
            | AppError::ImageProcessing(_)
            | AppError::Config(_)
            | AppError::Internal(_) => LogLevel::Error,
        }
    }
}
