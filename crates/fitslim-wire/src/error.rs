// crates/fitslim-wire/src/error.rs
// ============================================================================
// Module: Wire Errors
// Description: Failures raised while framing or decoding Slim messages.
// Purpose: Give transports one error type for every malformed-input case.
// Dependencies: fitslim-core, thiserror
// ============================================================================

//! ## Overview
//! [`CodecError`] covers both layers of the wire format: the outer
//! length-prefixed frame and the list encoding inside it. Byte offsets are
//! relative to the text being decoded at the time of failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use fitslim_core::SlimError;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Wire framing and list decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Underlying stream failure.
    #[error("wire io error: {0}")]
    Io(String),
    /// A length or count prefix is missing, non-numeric or too long.
    #[error("invalid length prefix at byte {offset}")]
    InvalidLength {
        /// Offset of the offending byte.
        offset: usize,
    },
    /// Input ended before the announced content.
    #[error("truncated input at byte {offset}")]
    Truncated {
        /// Offset where more input was expected.
        offset: usize,
    },
    /// A structural delimiter was missing.
    #[error("expected '{expected}' at byte {offset}")]
    MissingDelimiter {
        /// Delimiter that was required.
        expected: char,
        /// Offset where it was required.
        offset: usize,
    },
    /// Bytes remained after a complete list.
    #[error("unexpected trailing data at byte {offset}")]
    TrailingData {
        /// Offset of the first trailing byte.
        offset: usize,
    },
    /// A frame announced more bytes than the configured limit.
    #[error("frame of {len} bytes exceeds limit of {limit}")]
    TooLarge {
        /// Announced frame length.
        len: usize,
        /// Configured maximum.
        limit: usize,
    },
    /// Frame payload is not valid UTF-8.
    #[error("frame payload must be utf-8")]
    InvalidUtf8,
}

impl CodecError {
    /// Returns a stable label for audit records.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::InvalidLength {
                ..
            } => "invalid_length",
            Self::Truncated {
                ..
            } => "truncated",
            Self::MissingDelimiter {
                ..
            } => "missing_delimiter",
            Self::TrailingData {
                ..
            } => "trailing_data",
            Self::TooLarge {
                ..
            } => "too_large",
            Self::InvalidUtf8 => "invalid_utf8",
        }
    }
}

impl From<CodecError> for SlimError {
    fn from(error: CodecError) -> Self {
        Self::malformed([error.to_string()])
    }
}
