//! Error types for the transformation pipeline.
//!
//! Provides a hierarchy of error types using `thiserror` for ergonomic error handling.
//! Per-entry failures ([`TransformError`]) are captured on the entry and never escape
//! the coordinator; the other types describe operations the caller asked for.

use std::io;
use serde::Serialize;
use thiserror::Error;

use crate::core::EntryId;

/// Why a candidate file was refused before it entered the batch.
///
/// The set is closed so every caller can render the same message for the same cause.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum RejectionReason {
    /// File exceeds the mode's size limit
    #[error("File is too large ({size} bytes, limit is {max} bytes)")]
    TooLarge { size: u64, max: u64 },

    /// Neither the declared media type nor the extension is accepted by the mode
    #[error("Unsupported file type '{media_type}' (extension '{extension}')")]
    #[serde(rename_all = "camelCase")]
    UnsupportedType { media_type: String, extension: String },

    /// Zero-byte file
    #[error("File is empty")]
    Empty,

    /// File name is blank
    #[error("File has no name")]
    Unnamed,
}

/// Classification of a failed entry, suitable for rendering and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    UnsupportedMediaType,
    RemoteError,
    DecodeError,
    LocalEncodeError,
    TransportError,
    Internal,
}

/// Failure of a single strategy invocation.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TransformError {
    /// Local transform was handed something it cannot work on
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Remote collaborator answered with a non-2xx status
    #[error("{message}")]
    Remote { status: u16, message: String },

    /// Input or response payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Codec failure while re-encoding
    #[error("Encode error: {0}")]
    LocalEncode(String),

    /// The request never produced an HTTP response
    #[error("Network error: {0}")]
    Transport(String),

    /// The strategy task itself died
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience result type for strategy execution.
pub type TransformResult<T> = Result<T, TransformError>;

impl TransformError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::UnsupportedMediaType(_) => FailureKind::UnsupportedMediaType,
            Self::Remote { .. } => FailureKind::RemoteError,
            Self::Decode(_) => FailureKind::DecodeError,
            Self::LocalEncode(_) => FailureKind::LocalEncodeError,
            Self::Transport(_) => FailureKind::TransportError,
            Self::Internal(_) => FailureKind::Internal,
        }
    }

    pub fn unsupported<T: Into<String>>(msg: T) -> Self {
        Self::UnsupportedMediaType(msg.into())
    }

    pub fn decode<T: Into<String>>(msg: T) -> Self {
        Self::Decode(msg.into())
    }

    pub fn encode<T: Into<String>>(msg: T) -> Self {
        Self::LocalEncode(msg.into())
    }

    pub fn remote<T: Into<String>>(status: u16, msg: T) -> Self {
        Self::Remote { status, message: msg.into() }
    }
}

/// A request that failed before any HTTP status was received.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<TransportError> for TransformError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err.0)
    }
}

impl From<reqwest::Error> for TransportError {
    // The request URL can carry credentials in its query
    fn from(err: reqwest::Error) -> Self {
        Self(err.without_url().to_string())
    }
}

/// Errors from coordinator operations invoked by the user.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BatchError {
    /// No entry with this id in the current batch
    #[error("Entry not found: {0}")]
    EntryNotFound(EntryId),

    /// Entry is in the wrong state for the requested operation
    #[error("Invalid state transition: entry {id} is '{state}', expected '{expected}'")]
    InvalidState {
        id: EntryId,
        state: String,
        expected: String,
    },
}

impl BatchError {
    pub fn invalid_state(id: &EntryId, state: &str, expected: &str) -> Self {
        Self::InvalidState {
            id: id.clone(),
            state: state.to_string(),
            expected: expected.to_string(),
        }
    }
}

/// Errors while materializing artifacts as saved files.
#[derive(Error, Debug, Serialize)]
pub enum ExportError {
    /// Only successful entries carry an artifact
    #[error("Entry {id} is '{state}', only successful entries can be downloaded")]
    NotDownloadable { id: EntryId, state: String },

    /// File IO error
    #[error("IO error: {0}")]
    IO(String),
}

impl From<io::Error> for ExportError {
    fn from(err: io::Error) -> Self {
        Self::IO(err.to_string())
    }
}

/// Errors while loading or checking configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file: {0}")]
    IO(#[from] io::Error),

    #[error("Cannot parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Returned when a target format name is not recognised.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported format: {0}")]
pub struct UnknownFormat(pub String);
