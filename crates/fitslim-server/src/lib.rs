// crates/fitslim-server/src/lib.rs
// ============================================================================
// Module: FitSlim Server Library
// Description: Slim protocol server over TCP and stdio.
// Purpose: Bind the execution engine to connections with audit logging.
// Dependencies: fitslim-config, fitslim-core, fitslim-wire, serde, tokio
// ============================================================================

//! ## Overview
//! `fitslim-server` greets each peer, reads framed instruction batches,
//! executes them in a per-connection [`fitslim_core::Session`] and writes the
//! framed results back. Session lifecycle and message outcomes are recorded
//! through a [`SessionAuditSink`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod connection;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditContext;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::SessionAuditEvent;
pub use audit::SessionAuditSink;
pub use audit::StderrAuditSink;
pub use connection::Reply;
pub use connection::SessionDriver;
pub use connection::serve_async;
pub use connection::serve_blocking;
pub use server::ServerError;
pub use server::accept_error_kind;
pub use server::SlimServer;
