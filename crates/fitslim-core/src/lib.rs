// crates/fitslim-core/src/lib.rs
// ============================================================================
// Module: FitSlim Core Library
// Description: Tree model, typed values and the operator-dispatch engine.
// Purpose: Execute Slim instruction batches against registered fixtures.
// Dependencies: regex, serde, thiserror
// ============================================================================

//! ## Overview
//! `fitslim-core` is the transport-free heart of the Slim execution engine.
//! Instruction trees flow through a [`Session`], which decodes each
//! instruction, resolves fixtures through a [`FixtureRegistry`], coerces
//! arguments with the parse chain, and composes results back into trees with
//! the compose chain. Every failure becomes a composed exception entry.
//!
//! Operator chains live in a [`Processor`]. New value types and expression
//! grammars are added by appending operators, never by editing dispatch.
//!
//! Security posture: fixture code is trusted host code; instruction input is
//! untrusted and is validated by [`Instruction::decode`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod error;
pub mod fixture;
pub mod format;
pub mod instruction;
pub mod operators;
pub mod run;
pub mod session;
pub mod tree;
pub mod value;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use error::Capability;
pub use error::SlimError;
pub use error::SlimResult;
pub use fixture::Args;
pub use fixture::FixtureClass;
pub use fixture::FixtureRegistry;
pub use format::FormatContext;
pub use instruction::Instruction;
pub use instruction::Operation;
pub use operators::Comparison;
pub use operators::Processor;
pub use operators::ProcessorBuilder;
pub use run::MemoryWriter;
pub use run::RunDispatcher;
pub use run::RunTestOperator;
pub use run::StoryTestWriter;
pub use run::TestCounts;
pub use session::BatchOutcome;
pub use session::Session;
pub use tree::Tree;
pub use tree::TreeError;
pub use value::TypedValue;
pub use value::Value;
pub use value::ValueType;
