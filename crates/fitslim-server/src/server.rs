// crates/fitslim-server/src/server.rs
// ============================================================================
// Module: Slim Server
// Description: Slim server for TCP and stdio transports.
// Purpose: Accept connections and give each its own execution session.
// Dependencies: fitslim-config, fitslim-core, tokio
// ============================================================================

//! ## Overview
//! [`SlimServer`] owns the fixture registry, the operator processor and the
//! audit sink. The TCP transport accepts any number of concurrent
//! connections, each served by its own task with its own [`Session`]. The
//! stdio transport serves exactly one session and returns when it ends.
//! Accept failures never stop the listener: they are audited, and failures
//! that are not tied to a single dropped connection back off briefly.
//! Security posture: peers are untrusted; frame sizes are capped by
//! configuration and non-loopback binds require an explicit opt-in.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::BufReader;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use fitslim_config::FitSlimConfig;
use fitslim_config::ServerTransport;
use fitslim_core::FixtureRegistry;
use fitslim_core::Processor;
use fitslim_core::Session;
use fitslim_wire::greeting;
use tokio::net::TcpListener;
use tokio::net::TcpStream;

use crate::audit::AuditContext;
use crate::audit::SessionAuditEvent;
use crate::audit::SessionAuditSink;
use crate::audit::build_audit_sink;
use crate::connection::SessionDriver;
use crate::connection::run_blocking;
use crate::connection::serve_async;
use crate::connection::serve_blocking;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Pause after an accept failure that is not a single dropped connection.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Session id used for listener-level audit events.
const LISTENER_SESSION_ID: u64 = 0;

// ============================================================================
// SECTION: Slim Server
// ============================================================================

/// Slim server instance.
pub struct SlimServer {
    /// Server configuration.
    config: FitSlimConfig,
    /// Fixture classes shared by every session.
    registry: Arc<FixtureRegistry>,
    /// Operator chains copied into every session.
    processor: Processor,
    /// Destination for session audit events.
    audit: Arc<dyn SessionAuditSink>,
    /// Next session identifier.
    next_session: AtomicU64,
}

impl SlimServer {
    /// Builds a new server from configuration and a fixture registry.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the config is invalid or the audit sink
    /// cannot be opened.
    pub fn from_config(
        config: FitSlimConfig,
        registry: Arc<FixtureRegistry>,
    ) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let audit =
            build_audit_sink(&config.audit).map_err(|err| ServerError::Init(err.to_string()))?;
        Ok(Self {
            config,
            registry,
            processor: Processor::standard(),
            audit,
            next_session: AtomicU64::new(1),
        })
    }

    /// Replaces the operator processor used by new sessions.
    #[must_use]
    pub fn with_processor(mut self, processor: Processor) -> Self {
        self.processor = processor;
        self
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit_sink(mut self, audit: Arc<dyn SessionAuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Returns the server configuration.
    #[must_use]
    pub const fn config(&self) -> &FitSlimConfig {
        &self.config
    }

    /// Serves sessions using the configured transport.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the server fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        match self.config.server.transport {
            ServerTransport::Tcp => {
                let addr = self
                    .config
                    .server
                    .bind_addr()
                    .map_err(|err| ServerError::Config(err.to_string()))?;
                let listener = TcpListener::bind(addr)
                    .await
                    .map_err(|err| ServerError::Transport(format!("bind failed: {err}")))?;
                self.serve_listener(listener).await;
                Ok(())
            }
            ServerTransport::Stdio => run_blocking(|| self.serve_stdio()),
        }
    }

    /// Accepts connections from a bound listener until the task is dropped.
    pub async fn serve_listener(self, listener: TcpListener) {
        let server = Arc::new(self);
        let listener_context = AuditContext {
            session_id: LISTENER_SESSION_ID,
            transport: ServerTransport::Tcp,
            peer: listener.local_addr().ok().map(|addr| addr.to_string()),
        };
        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    let kind = accept_error_kind(&err);
                    server.audit.record(&SessionAuditEvent::accept_failed(
                        &listener_context,
                        kind,
                        err.to_string(),
                    ));
                    if kind != "connection" {
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                    continue;
                }
            };
            let server = Arc::clone(&server);
            tokio::spawn(async move {
                // The session audit trail already records the failure.
                let _ = server.serve_connection(stream, peer).await;
            });
        }
    }

    /// Serves one TCP connection.
    async fn serve_connection(&self, stream: TcpStream, peer: SocketAddr) -> Result<(), ServerError> {
        let _ = stream.set_nodelay(true);
        let driver = self.new_driver(ServerTransport::Tcp, Some(peer.to_string()));
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = tokio::io::BufReader::new(read_half);
        serve_async(
            driver,
            &mut reader,
            &mut write_half,
            &self.greeting(),
            self.config.server.max_message_bytes,
        )
        .await
    }

    /// Serves a single session over stdin/stdout.
    fn serve_stdio(&self) -> Result<(), ServerError> {
        let driver = self.new_driver(ServerTransport::Stdio, None);
        let mut reader = BufReader::new(std::io::stdin().lock());
        let mut writer = std::io::stdout().lock();
        serve_blocking(
            driver,
            &mut reader,
            &mut writer,
            &self.greeting(),
            self.config.server.max_message_bytes,
        )
    }

    /// Creates a session driver with a fresh session identifier.
    #[must_use]
    pub fn new_driver(&self, transport: ServerTransport, peer: Option<String>) -> SessionDriver {
        let session = Session::new(Arc::clone(&self.registry), self.processor.clone());
        let context = AuditContext {
            session_id: self.next_session.fetch_add(1, Ordering::Relaxed),
            transport,
            peer,
        };
        SessionDriver::new(session, Arc::clone(&self.audit), context)
    }

    /// Returns the greeting line for the configured protocol version.
    #[must_use]
    pub fn greeting(&self) -> String {
        greeting(&self.config.server.protocol_version)
    }
}

/// Classifies an accept failure for auditing and backoff.
///
/// `connection` failures affect only the peer being accepted; everything
/// else (for example running out of file descriptors) is `listener`.
#[must_use]
pub fn accept_error_kind(error: &std::io::Error) -> &'static str {
    match error.kind() {
        std::io::ErrorKind::ConnectionRefused
        | std::io::ErrorKind::ConnectionAborted
        | std::io::ErrorKind::ConnectionReset
        | std::io::ErrorKind::Interrupted => "connection",
        _ => "listener",
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Slim server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}
