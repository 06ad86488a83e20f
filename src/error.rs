//! Decoding stream error types
//!
//! Detection problems never show up here: they are absorbed by falling back
//! to the configured default encoding. Everything in [`StreamError`] reaches
//! the consumer of the stream.

use thiserror::Error;

/// Errors surfaced by the decoding stream
#[derive(Debug, Error)]
pub enum StreamError {
    /// A chunk that is not a byte sequence was pushed into the stream
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The codec registry does not know the resolved encoding
    #[error("unknown encoding: {name}")]
    UnknownEncoding {
        name: String,
    },

    /// I/O error while reading the underlying source
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The upstream chunk stream yielded an error
    #[error("upstream error: {0}")]
    Upstream(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Input arrived after the stream was aborted
    #[error("stream aborted")]
    Aborted,

    /// Input arrived after the stream was flushed
    #[error("stream already finished")]
    Finished,

    /// Input arrived after encoding resolution failed
    #[error("stream failed earlier and cannot accept more input")]
    Failed,

    /// Configuration could not be parsed or is out of range
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl StreamError {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        StreamError::InvalidInput(msg.into())
    }

    /// Create an unknown encoding error
    pub fn unknown_encoding(name: impl Into<String>) -> Self {
        StreamError::UnknownEncoding { name: name.into() }
    }

    /// Wrap an error yielded by an upstream stream
    pub fn upstream<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        StreamError::Upstream(err.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        StreamError::InvalidConfig(msg.into())
    }
}

/// Result type for stream operations
pub type StreamResult<T> = Result<T, StreamError>;
