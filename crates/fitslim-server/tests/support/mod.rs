// crates/fitslim-server/tests/support/mod.rs
// ============================================================================
// Module: Server Test Support
// Description: Counter fixture, capturing audit sink and frame helpers.
// ============================================================================
//! ## Overview
//! Shared helpers for driving servers over in-memory and TCP streams.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    dead_code,
    reason = "Test-only helpers; not every test binary uses every helper."
)]

use std::sync::Arc;
use std::sync::Mutex;

use fitslim_config::FitSlimConfig;
use fitslim_core::FixtureClass;
use fitslim_core::FixtureRegistry;
use fitslim_core::Tree;
use fitslim_core::Value;
use fitslim_core::ValueType;
use fitslim_server::SessionAuditEvent;
use fitslim_server::SessionAuditSink;
use fitslim_server::SlimServer;
use fitslim_wire::encode;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Counter fixture.
pub struct Counter {
    /// Current count.
    pub count: i64,
}

/// Registry holding `demo.Counter`.
pub fn registry() -> Arc<FixtureRegistry> {
    let counter = FixtureClass::builder::<Counter>("demo.Counter")
        .constructor(&[], |_| {
            Ok(Counter {
                count: 0,
            })
        })
        .action("increment", &[], |counter, _| {
            counter.count += 1;
            Ok(())
        })
        .method("count", &[], ValueType::Int, |counter, _| Ok(Some(Value::Int(counter.count))))
        .build();
    let mut registry = FixtureRegistry::new();
    registry.register(counter);
    Arc::new(registry)
}

// ============================================================================
// SECTION: Audit Capture
// ============================================================================

/// Audit sink that keeps every event in memory.
#[derive(Default)]
pub struct CaptureSink {
    /// Recorded events.
    events: Mutex<Vec<SessionAuditEvent>>,
}

impl CaptureSink {
    /// Returns the recorded event names in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|event| event.event).collect()
    }

    /// Returns a copy of every recorded event.
    pub fn events(&self) -> Vec<SessionAuditEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl SessionAuditSink for CaptureSink {
    fn record(&self, event: &SessionAuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ============================================================================
// SECTION: Servers And Messages
// ============================================================================

/// Builds a server over stdio defaults with a capturing sink.
pub fn server(config_toml: &str) -> (SlimServer, Arc<CaptureSink>) {
    let config: FitSlimConfig = toml::from_str(config_toml).unwrap();
    let sink = Arc::new(CaptureSink::default());
    let server = SlimServer::from_config(config, registry())
        .unwrap()
        .with_audit_sink(Arc::clone(&sink) as Arc<dyn SessionAuditSink>);
    (server, sink)
}

/// Encodes instructions given as string slices into one message.
pub fn message(instructions: &[&[&str]]) -> String {
    encode(&Tree::list(
        instructions.iter().map(|elements| Tree::text_list(elements.iter().copied())).collect(),
    ))
}

/// Frames payloads back to back.
pub fn frames(payloads: &[&str]) -> Vec<u8> {
    payloads.iter().map(|payload| fitslim_wire::framing::frame(payload)).collect::<String>().into_bytes()
}

/// Splits server output into the greeting and decoded response trees.
pub fn responses(output: &[u8]) -> (String, Vec<Tree<String>>) {
    let text = std::str::from_utf8(output).unwrap();
    let (greeting, rest) = text.split_at(text.find('\n').unwrap() + 1);
    let mut reader = std::io::Cursor::new(rest.as_bytes());
    let mut trees = Vec::new();
    while let Some(payload) = fitslim_wire::read_frame(&mut reader, 1 << 20).unwrap() {
        trees.push(fitslim_wire::decode(&payload).unwrap());
    }
    (greeting.to_string(), trees)
}

/// Returns the result text of entry `index` in a response.
pub fn result_text(response: &Tree<String>, index: usize) -> String {
    response.value_at(&[index, 1]).unwrap().clone()
}
