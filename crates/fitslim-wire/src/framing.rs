// crates/fitslim-wire/src/framing.rs
// ============================================================================
// Module: Slim Connection Framing
// Description: Greeting line and length-prefixed message frames.
// Purpose: Move whole messages across blocking and async byte streams.
// Dependencies: tokio
// ============================================================================

//! ## Overview
//! After the server writes its greeting line, every message in either
//! direction is a zero-padded decimal byte length, `:`, then the payload.
//! The payload `bye` ends the session.
//!
//! Readers return `Ok(None)` when the stream closes cleanly between frames
//! and an error when it closes inside one. Frames longer than the caller's
//! limit are rejected before the payload is read.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::ErrorKind;
use std::io::Read;
use std::io::Write;

use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;

use crate::codec::LENGTH_WIDTH;
use crate::codec::MAX_LENGTH_DIGITS;
use crate::error::CodecError;

// ============================================================================
// SECTION: Protocol Constants
// ============================================================================

/// Greeting prefix written before the protocol version.
pub const GREETING_PREFIX: &str = "Slim -- V";
/// Protocol version announced when none is configured.
pub const DEFAULT_PROTOCOL_VERSION: &str = "0.3";
/// Payload that ends a session.
pub const BYE: &str = "bye";

/// Returns the greeting line for a protocol version.
#[must_use]
pub fn greeting(version: &str) -> String {
    format!("{GREETING_PREFIX}{version}\n")
}

/// Returns `payload` with its length prefix.
#[must_use]
pub fn frame(payload: &str) -> String {
    format!("{:0width$}:{payload}", payload.len(), width = LENGTH_WIDTH)
}

// ============================================================================
// SECTION: Header Parsing
// ============================================================================

/// Incremental parser for a frame length prefix.
#[derive(Default)]
struct LengthHeader {
    /// Accumulated value.
    value: usize,
    /// Digits consumed so far.
    digits: usize,
}

impl LengthHeader {
    /// Feeds one header byte, returning the length once `:` is seen.
    fn push(&mut self, byte: u8) -> Result<Option<usize>, CodecError> {
        match byte {
            b':' if self.digits > 0 => Ok(Some(self.value)),
            b'0' ..= b'9' if self.digits < MAX_LENGTH_DIGITS => {
                self.value = self.value * 10 + usize::from(byte - b'0');
                self.digits += 1;
                Ok(None)
            }
            _ => Err(CodecError::InvalidLength {
                offset: self.digits,
            }),
        }
    }
}

/// Rejects frames above the configured limit.
const fn check_limit(len: usize, limit: usize) -> Result<(), CodecError> {
    if len > limit {
        return Err(CodecError::TooLarge {
            len,
            limit,
        });
    }
    Ok(())
}

/// Converts a frame payload to text.
fn payload_text(bytes: Vec<u8>) -> Result<String, CodecError> {
    String::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)
}

/// Maps a payload read failure.
fn payload_error(err: &std::io::Error, len: usize) -> CodecError {
    if err.kind() == ErrorKind::UnexpectedEof {
        CodecError::Truncated {
            offset: len,
        }
    } else {
        CodecError::Io(err.to_string())
    }
}

// ============================================================================
// SECTION: Blocking Streams
// ============================================================================

/// Reads one frame from a blocking stream.
///
/// Callers should pass a buffered reader; the header is read byte by byte.
///
/// # Errors
///
/// Returns [`CodecError`] on a malformed header, an oversized or truncated
/// frame, non-UTF-8 payload, or stream failure.
pub fn read_frame(reader: &mut impl Read, max_bytes: usize) -> Result<Option<String>, CodecError> {
    let Some(first) = read_byte(reader)? else {
        return Ok(None);
    };
    let mut header = LengthHeader::default();
    let mut next = first;
    let len = loop {
        if let Some(len) = header.push(next)? {
            break len;
        }
        next = read_byte(reader)?.ok_or(CodecError::Truncated {
            offset: header.digits,
        })?;
    };
    check_limit(len, max_bytes)?;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).map_err(|err| payload_error(&err, len))?;
    payload_text(buf).map(Some)
}

/// Writes one frame to a blocking stream and flushes it.
///
/// # Errors
///
/// Returns [`CodecError::Io`] when the stream rejects the write.
pub fn write_frame(writer: &mut impl Write, payload: &str) -> Result<(), CodecError> {
    writer
        .write_all(frame(payload).as_bytes())
        .map_err(|err| CodecError::Io(err.to_string()))?;
    writer.flush().map_err(|err| CodecError::Io(err.to_string()))
}

/// Writes raw text, such as the greeting, and flushes it.
///
/// # Errors
///
/// Returns [`CodecError::Io`] when the stream rejects the write.
pub fn write_raw(writer: &mut impl Write, text: &str) -> Result<(), CodecError> {
    writer.write_all(text.as_bytes()).map_err(|err| CodecError::Io(err.to_string()))?;
    writer.flush().map_err(|err| CodecError::Io(err.to_string()))
}

/// Reads a single byte, returning `None` at end of stream.
fn read_byte(reader: &mut impl Read) -> Result<Option<u8>, CodecError> {
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            Err(err) => return Err(CodecError::Io(err.to_string())),
        }
    }
}

// ============================================================================
// SECTION: Async Streams
// ============================================================================

/// Reads one frame from an async stream.
///
/// # Errors
///
/// Returns [`CodecError`] under the same conditions as [`read_frame`].
pub async fn read_frame_async<R>(
    reader: &mut R,
    max_bytes: usize,
) -> Result<Option<String>, CodecError>
where
    R: AsyncRead + Unpin,
{
    let Some(first) = read_byte_async(reader).await? else {
        return Ok(None);
    };
    let mut header = LengthHeader::default();
    let mut next = first;
    let len = loop {
        if let Some(len) = header.push(next)? {
            break len;
        }
        next = read_byte_async(reader).await?.ok_or(CodecError::Truncated {
            offset: header.digits,
        })?;
    };
    check_limit(len, max_bytes)?;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await.map_err(|err| payload_error(&err, len))?;
    payload_text(buf).map(Some)
}

/// Writes one frame to an async stream and flushes it.
///
/// # Errors
///
/// Returns [`CodecError::Io`] when the stream rejects the write.
pub async fn write_frame_async<W>(writer: &mut W, payload: &str) -> Result<(), CodecError>
where
    W: AsyncWrite + Unpin,
{
    write_raw_async(writer, &frame(payload)).await
}

/// Writes raw text to an async stream and flushes it.
///
/// # Errors
///
/// Returns [`CodecError::Io`] when the stream rejects the write.
pub async fn write_raw_async<W>(writer: &mut W, text: &str) -> Result<(), CodecError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(text.as_bytes()).await.map_err(|err| CodecError::Io(err.to_string()))?;
    writer.flush().await.map_err(|err| CodecError::Io(err.to_string()))
}

/// Reads a single byte from an async stream, returning `None` at end of stream.
async fn read_byte_async<R>(reader: &mut R) -> Result<Option<u8>, CodecError>
where
    R: AsyncRead + Unpin,
{
    let mut byte = [0u8; 1];
    match reader.read(&mut byte).await {
        Ok(0) => Ok(None),
        Ok(_) => Ok(Some(byte[0])),
        Err(err) => Err(CodecError::Io(err.to_string())),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
