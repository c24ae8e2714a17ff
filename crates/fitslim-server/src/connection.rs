// crates/fitslim-server/src/connection.rs
// ============================================================================
// Module: Connection Driver
// Description: Drives one Slim session across a framed byte stream.
// Purpose: Turn request frames into response frames for a single peer.
// Dependencies: fitslim-core, fitslim-wire, tokio
// ============================================================================

//! ## Overview
//! A [`SessionDriver`] owns the [`Session`] for one connection. Each request
//! frame is decoded, executed as a batch and answered with one response
//! frame. A payload that is not a valid list is answered with a single
//! malformed-instruction entry and the session continues. A broken frame
//! ends the connection. `bye` ends it cleanly.
//!
//! The same driver runs over blocking streams ([`serve_blocking`]) and tokio
//! streams ([`serve_async`]). Fixture code runs on the calling thread; on a
//! multi-thread runtime it is shifted into a blocking section.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::io::Write;
use std::sync::Arc;

use fitslim_core::Session;
use fitslim_core::SlimError;
use fitslim_core::Tree;
use fitslim_wire::BYE;
use fitslim_wire::CodecError;
use fitslim_wire::decode;
use fitslim_wire::encode;
use fitslim_wire::framing::write_raw;
use fitslim_wire::framing::write_raw_async;
use fitslim_wire::read_frame;
use fitslim_wire::read_frame_async;
use fitslim_wire::write_frame;
use fitslim_wire::write_frame_async;
use tokio::io::AsyncRead;
use tokio::io::AsyncWrite;

use crate::audit::AuditContext;
use crate::audit::MessageStats;
use crate::audit::SessionAuditEvent;
use crate::audit::SessionAuditSink;
use crate::server::ServerError;

// ============================================================================
// SECTION: Session Driver
// ============================================================================

/// Driver response to one request payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Send this payload back to the peer.
    Respond(String),
    /// The peer ended the session.
    End,
}

/// Per-connection session state plus its audit trail.
pub struct SessionDriver {
    /// Session executing the connection's batches.
    session: Session,
    /// Destination for audit events.
    audit: Arc<dyn SessionAuditSink>,
    /// Identity recorded with every event.
    context: AuditContext,
    /// Messages handled so far.
    messages: u64,
}

impl SessionDriver {
    /// Creates a driver and records `session_started`.
    #[must_use]
    pub fn new(session: Session, audit: Arc<dyn SessionAuditSink>, context: AuditContext) -> Self {
        audit.record(&SessionAuditEvent::session_started(&context));
        Self {
            session,
            audit,
            context,
            messages: 0,
        }
    }

    /// Returns the driven session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the number of messages handled so far.
    #[must_use]
    pub const fn messages(&self) -> u64 {
        self.messages
    }

    /// Handles one request payload.
    pub fn handle_message(&mut self, payload: &str) -> Reply {
        if payload == BYE {
            return Reply::End;
        }
        self.messages += 1;
        match decode(payload) {
            Ok(batch) => {
                let outcome = self.session.execute(&batch);
                let response = encode(&outcome.results);
                self.audit.record(&SessionAuditEvent::message_processed(&self.context, MessageStats {
                    message_index: self.messages,
                    instructions: outcome.executed,
                    failures: outcome.failures,
                    request_bytes: payload.len(),
                    response_bytes: response.len(),
                }));
                Reply::Respond(response)
            }
            Err(error) => {
                self.audit.record(&SessionAuditEvent::message_rejected(
                    &self.context,
                    self.messages,
                    error.kind(),
                    error.to_string(),
                    Some(payload.len()),
                ));
                let failure = SlimError::from(error);
                let entry = Tree::list(vec![Tree::text(""), self.session.compose_error(&failure)]);
                Reply::Respond(encode(&Tree::list(vec![entry])))
            }
        }
    }

    /// Records a frame that could not be read.
    pub fn reject_frame(&self, error: &CodecError) {
        self.audit.record(&SessionAuditEvent::message_rejected(
            &self.context,
            self.messages + 1,
            error.kind(),
            error.to_string(),
            None,
        ));
    }

    /// Releases session state and records `session_ended`.
    pub fn finish(mut self, reason: &'static str, error: Option<String>) {
        self.session.end();
        self.audit.record(&SessionAuditEvent::session_ended(
            &self.context,
            self.messages,
            reason,
            error,
        ));
    }
}

// ============================================================================
// SECTION: Blocking Streams
// ============================================================================

/// Serves one session over blocking streams until `bye`, close or error.
///
/// # Errors
///
/// Returns [`ServerError::Transport`] when a frame cannot be read or written.
pub fn serve_blocking<R, W>(
    mut driver: SessionDriver,
    reader: &mut R,
    writer: &mut W,
    greeting: &str,
    max_message_bytes: usize,
) -> Result<(), ServerError>
where
    R: Read,
    W: Write,
{
    let result = drive_blocking(&mut driver, reader, writer, greeting, max_message_bytes);
    driver.finish(end_reason(&result), end_error(&result));
    result.map(|_| ())
}

/// Runs the blocking request loop and returns the end reason.
fn drive_blocking<R, W>(
    driver: &mut SessionDriver,
    reader: &mut R,
    writer: &mut W,
    greeting: &str,
    max_message_bytes: usize,
) -> Result<&'static str, ServerError>
where
    R: Read,
    W: Write,
{
    write_raw(writer, greeting).map_err(transport_error)?;
    loop {
        let payload = match read_frame(reader, max_message_bytes) {
            Ok(Some(payload)) => payload,
            Ok(None) => return Ok("closed"),
            Err(error) => {
                driver.reject_frame(&error);
                return Err(transport_error(error));
            }
        };
        match driver.handle_message(&payload) {
            Reply::End => return Ok("bye"),
            Reply::Respond(response) => {
                write_frame(writer, &response).map_err(transport_error)?;
            }
        }
    }
}

// ============================================================================
// SECTION: Async Streams
// ============================================================================

/// Serves one session over tokio streams until `bye`, close or error.
///
/// # Errors
///
/// Returns [`ServerError::Transport`] when a frame cannot be read or written.
pub async fn serve_async<R, W>(
    mut driver: SessionDriver,
    reader: &mut R,
    writer: &mut W,
    greeting: &str,
    max_message_bytes: usize,
) -> Result<(), ServerError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let result = drive_async(&mut driver, reader, writer, greeting, max_message_bytes).await;
    driver.finish(end_reason(&result), end_error(&result));
    result.map(|_| ())
}

/// Runs the async request loop and returns the end reason.
async fn drive_async<R, W>(
    driver: &mut SessionDriver,
    reader: &mut R,
    writer: &mut W,
    greeting: &str,
    max_message_bytes: usize,
) -> Result<&'static str, ServerError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    write_raw_async(writer, greeting).await.map_err(transport_error)?;
    loop {
        let payload = match read_frame_async(reader, max_message_bytes).await {
            Ok(Some(payload)) => payload,
            Ok(None) => return Ok("closed"),
            Err(error) => {
                driver.reject_frame(&error);
                return Err(transport_error(error));
            }
        };
        match run_blocking(|| driver.handle_message(&payload)) {
            Reply::End => return Ok("bye"),
            Reply::Respond(response) => {
                write_frame_async(writer, &response).await.map_err(transport_error)?;
            }
        }
    }
}

/// Runs fixture work, shifting to a blocking context when available.
pub fn run_blocking<T>(work: impl FnOnce() -> T) -> T {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == tokio::runtime::RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(work)
        }
        _ => work(),
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps a loop result to the `session_ended` reason label.
const fn end_reason(result: &Result<&'static str, ServerError>) -> &'static str {
    match result {
        Ok(reason) => *reason,
        Err(_) => "transport_error",
    }
}

/// Returns the error text recorded with `session_ended`.
fn end_error(result: &Result<&'static str, ServerError>) -> Option<String> {
    result.as_ref().err().map(ToString::to_string)
}

/// Wraps a wire failure as a transport error.
fn transport_error(error: CodecError) -> ServerError {
    ServerError::Transport(error.to_string())
}
