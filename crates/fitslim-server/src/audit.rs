// crates/fitslim-server/src/audit.rs
// ============================================================================
// Module: Session Audit Logging
// Description: Structured audit events for Slim session handling.
// Purpose: Emit JSON-lines session records without hard dependencies.
// Dependencies: fitslim-config, serde, serde_json
// ============================================================================

//! ## Overview
//! Every connection produces a `session_started` record, one record per
//! message (`message_processed` or `message_rejected`), and a closing
//! `session_ended` record. A TCP listener that fails to accept records
//! `accept_failed` under session id 0. Sinks serialize events as JSON lines;
//! payload text is never logged, only sizes and counts.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use fitslim_config::AuditConfig;
use fitslim_config::AuditSinkKind;
use fitslim_config::ServerTransport;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Identity of the session an event belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditContext {
    /// Server-assigned session identifier.
    pub session_id: u64,
    /// Transport carrying the session.
    pub transport: ServerTransport,
    /// Peer address when known.
    pub peer: Option<String>,
}

/// Counts describing one processed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageStats {
    /// One-based message index within the session.
    pub message_index: u64,
    /// Instructions executed.
    pub instructions: usize,
    /// Instructions that produced exception results.
    pub failures: usize,
    /// Request payload size in bytes.
    pub request_bytes: usize,
    /// Response payload size in bytes.
    pub response_bytes: usize,
}

/// Session audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct SessionAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Server-assigned session identifier.
    pub session_id: u64,
    /// Transport carrying the session.
    pub transport: ServerTransport,
    /// Peer address when known.
    pub peer: Option<String>,
    /// One-based message index within the session.
    pub message_index: Option<u64>,
    /// Instructions executed.
    pub instructions: Option<usize>,
    /// Instructions that produced exception results.
    pub failures: Option<usize>,
    /// Request payload size in bytes.
    pub request_bytes: Option<usize>,
    /// Response payload size in bytes.
    pub response_bytes: Option<usize>,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Error description.
    pub error: Option<String>,
    /// Why the session ended.
    pub reason: Option<&'static str>,
}

impl SessionAuditEvent {
    /// Creates an event with a consistent timestamp and no optional fields.
    fn base(event: &'static str, context: &AuditContext) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event,
            timestamp_ms,
            session_id: context.session_id,
            transport: context.transport,
            peer: context.peer.clone(),
            message_index: None,
            instructions: None,
            failures: None,
            request_bytes: None,
            response_bytes: None,
            error_kind: None,
            error: None,
            reason: None,
        }
    }

    /// Records a new connection.
    #[must_use]
    pub fn session_started(context: &AuditContext) -> Self {
        Self::base("session_started", context)
    }

    /// Records a message that decoded and executed.
    #[must_use]
    pub fn message_processed(context: &AuditContext, stats: MessageStats) -> Self {
        Self {
            message_index: Some(stats.message_index),
            instructions: Some(stats.instructions),
            failures: Some(stats.failures),
            request_bytes: Some(stats.request_bytes),
            response_bytes: Some(stats.response_bytes),
            ..Self::base("message_processed", context)
        }
    }

    /// Records a frame or message that could not be decoded.
    #[must_use]
    pub fn message_rejected(
        context: &AuditContext,
        message_index: u64,
        error_kind: &'static str,
        error: String,
        request_bytes: Option<usize>,
    ) -> Self {
        Self {
            message_index: Some(message_index),
            request_bytes,
            error_kind: Some(error_kind),
            error: Some(error),
            ..Self::base("message_rejected", context)
        }
    }

    /// Records the end of a connection, with the transport error if any.
    #[must_use]
    pub fn session_ended(
        context: &AuditContext,
        messages: u64,
        reason: &'static str,
        error: Option<String>,
    ) -> Self {
        Self {
            message_index: Some(messages),
            reason: Some(reason),
            error,
            ..Self::base("session_ended", context)
        }
    }

    /// Records a listener accept failure.
    #[must_use]
    pub fn accept_failed(context: &AuditContext, error_kind: &'static str, error: String) -> Self {
        Self {
            error_kind: Some(error_kind),
            error: Some(error),
            ..Self::base("accept_failed", context)
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for session events.
pub trait SessionAuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &SessionAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl SessionAuditSink for StderrAuditSink {
    fn record(&self, event: &SessionAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl SessionAuditSink for FileAuditSink {
    fn record(&self, event: &SessionAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl SessionAuditSink for NoopAuditSink {
    fn record(&self, _event: &SessionAuditEvent) {}
}

/// Builds the sink selected by configuration.
///
/// # Errors
///
/// Returns an error if the file sink cannot open its path.
pub fn build_audit_sink(config: &AuditConfig) -> io::Result<Arc<dyn SessionAuditSink>> {
    let sink: Arc<dyn SessionAuditSink> = match config.sink {
        AuditSinkKind::Stderr => Arc::new(StderrAuditSink),
        AuditSinkKind::None => Arc::new(NoopAuditSink),
        AuditSinkKind::File => {
            let path = config.path.as_deref().ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "audit.sink=file requires audit.path")
            })?;
            Arc::new(FileAuditSink::new(Path::new(path))?)
        }
    };
    Ok(sink)
}
