// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Unified error hierarchy for the GEP register client.
//!
//! # Error Categories
//!
//! ```text
//! GepError
//! ├── Transport - sending failed, no response, gateway not running
//! ├── Protocol  - non-OK status, malformed or truncated messages
//! ├── Codec     - value not convertible, rejected decode
//! ├── Config    - configuration parsing and validation
//! └── argument / state errors raised at call sites
//! ```
//!
//! Transport and protocol failures are transient from the caller's point of
//! view: a register absorbs them during polling and they only surface through
//! the failure counters. Codec, config, and argument errors are permanent.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::types::ValueType;

/// Convenience alias for results carrying a [`GepError`].
pub type GepResult<T> = Result<T, GepError>;

/// Convenience alias for results carrying a [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// GepError - Root Error Type
// =============================================================================

/// The root error type of the GEP register client.
#[derive(Debug, Error)]
pub enum GepError {
    /// Transport-level failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Protocol-level failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Value codec failure.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A register id outside the 15-bit address space.
    #[error("register id {id} is out of range (0-32767)")]
    InvalidRegisterId {
        /// The offending id.
        id: u32,
    },

    /// A registry id outside the 4-bit address space.
    #[error("registry id {id} is out of range (0-15)")]
    InvalidRegistryId {
        /// The offending id.
        id: u32,
    },

    /// An attempt to write a read-only register.
    #[error("value of a read-only register cannot be changed")]
    ReadOnlyRegister,

    /// A write operation failed; the underlying cause is attached.
    #[error("write to register failed")]
    WriteFailed {
        /// The failure that aborted the write.
        #[source]
        source: Box<GepError>,
    },
}

impl GepError {
    /// Wraps an error as the cause of a failed register write.
    pub fn write_failed(source: GepError) -> Self {
        Self::WriteFailed {
            source: Box::new(source),
        }
    }

    /// Returns `true` if a later retry of the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            GepError::Transport(e) => e.is_retryable(),
            GepError::Protocol(e) => e.is_retryable(),
            GepError::WriteFailed { source } => source.is_retryable(),
            _ => false,
        }
    }

    /// Returns the error category as a string for logging and metrics.
    pub fn category(&self) -> &'static str {
        match self {
            GepError::Transport(_) => "transport",
            GepError::Protocol(_) => "protocol",
            GepError::Codec(_) => "codec",
            GepError::Config(_) => "config",
            GepError::InvalidRegisterId { .. } | GepError::InvalidRegistryId { .. } => "argument",
            GepError::ReadOnlyRegister => "read-only",
            GepError::WriteFailed { .. } => "write",
        }
    }
}

// =============================================================================
// TransportError
// =============================================================================

/// Failures between the gateway and the message framing layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Handing the request to the messenger failed.
    #[error("sending of request failed: {message}")]
    SendFailed {
        /// Description from the messenger.
        message: String,
    },

    /// No response arrived within the allotted time.
    #[error("no response from registry{}", format_timeout(.timeout))]
    NoResponse {
        /// The timeout that elapsed, if one was set.
        timeout: Option<Duration>,
    },

    /// The gateway (or its messenger) is not running.
    #[error("gateway is not running")]
    NotRunning,

    /// Starting the messenger session failed.
    #[error("start of messenger session failed: {message}")]
    StartFailed {
        /// Description from the messenger.
        message: String,
    },

    /// The request was abandoned before completion.
    #[error("request cancelled before completion")]
    Cancelled,
}

fn format_timeout(timeout: &Option<Duration>) -> String {
    match timeout {
        Some(t) => format!(" within {} ms", t.as_millis()),
        None => String::new(),
    }
}

impl TransportError {
    /// Creates a send failure.
    pub fn send_failed(message: impl Into<String>) -> Self {
        Self::SendFailed {
            message: message.into(),
        }
    }

    /// Creates a start failure.
    pub fn start_failed(message: impl Into<String>) -> Self {
        Self::StartFailed {
            message: message.into(),
        }
    }

    /// Creates a no-response failure.
    pub fn no_response(timeout: Option<Duration>) -> Self {
        Self::NoResponse { timeout }
    }

    /// Returns `true` if a later retry may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TransportError::StartFailed { .. })
    }
}

// =============================================================================
// ProtocolError
// =============================================================================

/// Violations of the request/response protocol.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The registry answered with a non-OK status byte.
    #[error("request failed on registry (status 0x{status:02x})")]
    RequestFailed {
        /// The status byte of the response.
        status: u8,
    },

    /// A write was answered with the unwritable-register status.
    #[error("register is not writable on the registry")]
    UnwritableRegister,

    /// A message could not be decoded.
    #[error("invalid message format: {message}")]
    InvalidMessage {
        /// Description of the malformation.
        message: String,
    },

    /// A response was shorter than its layout requires.
    #[error("response too short: expected at least {expected} bytes, got {actual}")]
    TruncatedResponse {
        /// Minimal number of bytes the layout requires.
        expected: usize,
        /// Number of bytes received.
        actual: usize,
    },
}

impl ProtocolError {
    /// Creates an invalid-message failure.
    pub fn invalid_message(message: impl Into<String>) -> Self {
        Self::InvalidMessage {
            message: message.into(),
        }
    }

    /// Returns `true` if a later retry may succeed.
    ///
    /// A failed status is transient (the device may simply have been busy);
    /// an unwritable register or a malformed frame will not heal on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProtocolError::RequestFailed { .. })
    }
}

// =============================================================================
// CodecError
// =============================================================================

/// Failures converting between device-side and local values.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The local value has a type the codec does not accept.
    #[error("value of type {actual} is not convertible ({expected} expected)")]
    NotConvertible {
        /// The type the codec accepts.
        expected: ValueType,
        /// The type that was supplied.
        actual: ValueType,
    },

    /// The numeric value does not fit the wire representation.
    #[error("value {value} does not fit the remote register range")]
    ValueOutOfRange {
        /// The value after inverse scaling.
        value: f64,
    },

    /// A hex string contained an odd number of digits.
    #[error("hex value has an odd number of digits ({digits})")]
    OddHexLength {
        /// The digit count.
        digits: usize,
    },

    /// A hex string contained a non-hex character.
    #[error("invalid hex digit {character:?}")]
    InvalidHexDigit {
        /// The offending character.
        character: char,
    },

    /// A binary value violates the codec's length bounds.
    #[error("binary value of {length} bytes is outside the allowed range {min}-{max}")]
    LengthOutOfRange {
        /// Length of the supplied value.
        length: usize,
        /// Minimal allowed length.
        min: usize,
        /// Maximal allowed length.
        max: usize,
    },
}

impl CodecError {
    /// Creates a not-convertible failure.
    pub fn not_convertible(expected: ValueType, actual: ValueType) -> Self {
        Self::NotConvertible { expected, actual }
    }
}

// =============================================================================
// ConfigError
// =============================================================================

/// Configuration loading and validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration file could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Io {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration file could not be parsed.
    #[error("failed to parse config file '{path}': {message}")]
    Parse {
        /// Path of the file.
        path: PathBuf,
        /// Parser diagnostics.
        message: String,
    },

    /// The file extension does not map to a supported format.
    #[error("unsupported config format '{extension}' (yaml, toml, json expected)")]
    UnsupportedFormat {
        /// The offending extension.
        extension: String,
    },

    /// A field failed validation.
    #[error("validation failed for '{field}': {message}")]
    Validation {
        /// The offending field.
        field: String,
        /// Why it is invalid.
        message: String,
    },
}

impl ConfigError {
    /// Creates a validation failure.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a parse failure.
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryability() {
        assert!(GepError::from(TransportError::no_response(None)).is_retryable());
        assert!(GepError::from(ProtocolError::RequestFailed { status: 0 }).is_retryable());
        assert!(!GepError::from(ProtocolError::UnwritableRegister).is_retryable());
        assert!(!GepError::ReadOnlyRegister.is_retryable());
        assert!(!GepError::from(TransportError::start_failed("refused")).is_retryable());
    }

    #[test]
    fn test_write_failed_wraps_cause() {
        let error = GepError::write_failed(TransportError::no_response(None).into());
        assert!(error.is_retryable());
        assert_eq!(error.category(), "write");
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_messages() {
        let error = TransportError::no_response(Some(Duration::from_millis(250)));
        assert_eq!(error.to_string(), "no response from registry within 250 ms");

        let error = ProtocolError::RequestFailed { status: 0x02 };
        assert_eq!(
            error.to_string(),
            "request failed on registry (status 0x02)"
        );
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            GepError::from(CodecError::OddHexLength { digits: 3 }).category(),
            "codec"
        );
        assert_eq!(GepError::InvalidRegisterId { id: 70000 }.category(), "argument");
    }
}
