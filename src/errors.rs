//! Error types for the conversion workflow and record store.
//!
//! The taxonomy follows the user-facing failure classes: input validation,
//! missing configuration, remote rejection, transport failure, and local
//! I/O. Every failure is terminal for its invocation; nothing here retries.

use thiserror::Error;

/// Errors raised by the local record store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("history entry {0} not found")]
    NotFound(i64),
}

/// Result type for record store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised by the conversion workflow.
///
/// Validation and configuration variants are produced before any side
/// effect; remote and transport variants are produced after the request was
/// submitted but before anything was written locally.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The text field was empty after trimming.
    #[error("no text to convert")]
    EmptyText,

    /// The requested voice label is not in the catalog.
    #[error("unknown voice: {0}")]
    UnknownVoice(String),

    /// Settings carry no API key.
    #[error("API key is not configured; set it with `settings set --api-key`")]
    MissingApiKey,

    /// Settings carry no synthesis endpoint.
    #[error("synthesis endpoint is not configured; set it with `settings set --endpoint`")]
    MissingEndpoint,

    /// The synthesis service answered with a non-success status.
    #[error("synthesis request rejected: HTTP {status}: {body}")]
    Remote { status: u16, body: String },

    /// The request never produced a response (timeout, connection failure).
    #[error("synthesis request failed: {0}")]
    Transport(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Local filesystem failure, e.g. the output file could not be written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for conversion workflow operations.
pub type ConvertResult<T> = std::result::Result<T, ConvertError>;
