// crates/fitslim-core/src/error.rs
// ============================================================================
// Module: Slim Error Taxonomy
// Description: Closed set of engine failure kinds with structured codes.
// Purpose: Turn every failure into a composable result instead of a fault.
// Dependencies: crate::value, thiserror
// ============================================================================

//! ## Overview
//! Every failure the engine can observe is a [`SlimError`] variant. Missing
//! entity kinds carry a protocol code (`NO_CLASS`, `NO_INSTANCE`, ...) and
//! positional arguments; [`SlimError::message_block`] renders the
//! `message:<<CODE args>> ` prefix the wire protocol expects. Kinds without a
//! protocol code render an empty block, so only the diagnostic text follows
//! the exception sentinel.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use thiserror::Error;

use crate::tree::TreeError;
use crate::value::ValueType;

// ============================================================================
// SECTION: Protocol Codes
// ============================================================================

/// Code for an unresolved class name.
pub const NO_CLASS: &str = "NO_CLASS";
/// Code for a class without a constructor of the requested arity.
pub const NO_CONSTRUCTOR: &str = "NO_CONSTRUCTOR";
/// Code for a method missing by name and arity.
pub const NO_METHOD_IN_CLASS: &str = "NO_METHOD_IN_CLASS";
/// Code for an unknown instance id.
pub const NO_INSTANCE: &str = "NO_INSTANCE";
/// Code for an instruction with an unrecognized shape.
pub const MALFORMED_INSTRUCTION: &str = "MALFORMED_INSTRUCTION";

// ============================================================================
// SECTION: Capability
// ============================================================================

/// Operator capability names used in unmatched-operator errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Runtime value to wire tree.
    Compose,
    /// Wire text to runtime value.
    Parse,
    /// Expected expression against actual value.
    Compare,
    /// Member invocation on a held instance.
    Invoke,
    /// Whole-test execution by a run handler.
    RunTest,
}

impl Capability {
    /// Returns the stable lowercase label for the capability.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compose => "compose",
            Self::Parse => "parse",
            Self::Compare => "compare",
            Self::Invoke => "invoke",
            Self::RunTest => "run_test",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Slim Error
// ============================================================================

/// Failure kinds surfaced by the execution engine.
///
/// # Invariants
/// - Variants are closed; every one resolves to a textual result entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlimError {
    /// Symbolic class name does not resolve.
    #[error("type '{class}' not found (searched: {})", searched_label(.searched))]
    TypeMissing {
        /// Class name as requested.
        class: String,
        /// Import prefixes consulted during resolution.
        searched: Vec<String>,
    },
    /// No constructor accepts the argument count.
    #[error("constructor with {arity} parameter(s) not found for type '{class}'")]
    ConstructorMissing {
        /// Resolved class name.
        class: String,
        /// Requested argument count.
        arity: usize,
    },
    /// No method matches name and argument count.
    #[error("member '{member}' with {arity} parameter(s) not found for type '{class}'")]
    MemberMissing {
        /// Resolved class name.
        class: String,
        /// Requested method name.
        member: String,
        /// Requested argument count.
        arity: usize,
    },
    /// Instance id is not bound in the instance table.
    #[error("instance '{id}' not found")]
    MemoryMissing {
        /// Requested instance id.
        id: String,
    },
    /// Instruction does not decode into a known verb and argument shape.
    #[error("malformed instruction [{}]", .elements.join(","))]
    MalformedInstruction {
        /// Raw instruction elements in wire order.
        elements: Vec<String>,
    },
    /// No operator in a capability chain accepted the input.
    #[error("no {capability} operator accepts type '{declared}'")]
    OperatorMissing {
        /// Capability whose chain was exhausted.
        capability: Capability,
        /// Declared type of the rejected input.
        declared: ValueType,
    },
    /// A parse operator accepted the target type but rejected the text.
    #[error("cannot parse '{text}' as {target}")]
    ParseFailed {
        /// Requested target type.
        target: ValueType,
        /// Offending input text.
        text: String,
    },
    /// Fixture code reported a failure during construction or invocation.
    #[error("{type_name}: {message}")]
    Fixture {
        /// Fixture-defined failure type name.
        type_name: String,
        /// Fixture-defined failure message.
        message: String,
    },
    /// A tree path could not be resolved.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl SlimError {
    /// Creates a fixture failure with a type name and message.
    pub fn fixture(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fixture {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// Creates a malformed-instruction error from raw elements.
    pub fn malformed<I, S>(elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MalformedInstruction {
            elements: elements.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the protocol code for kinds that carry one.
    #[must_use]
    pub const fn code(&self) -> Option<&'static str> {
        match self {
            Self::TypeMissing {
                ..
            } => Some(NO_CLASS),
            Self::ConstructorMissing {
                ..
            } => Some(NO_CONSTRUCTOR),
            Self::MemberMissing {
                ..
            } => Some(NO_METHOD_IN_CLASS),
            Self::MemoryMissing {
                ..
            } => Some(NO_INSTANCE),
            Self::MalformedInstruction {
                ..
            } => Some(MALFORMED_INSTRUCTION),
            Self::OperatorMissing {
                ..
            }
            | Self::ParseFailed {
                ..
            }
            | Self::Fixture {
                ..
            }
            | Self::Tree(_) => None,
        }
    }

    /// Returns the positional arguments that follow the protocol code.
    #[must_use]
    pub fn code_args(&self) -> Vec<String> {
        match self {
            Self::TypeMissing {
                class,
                ..
            }
            | Self::ConstructorMissing {
                class,
                ..
            } => vec![class.clone()],
            Self::MemberMissing {
                class,
                member,
                ..
            } => vec![member.clone(), class.clone()],
            Self::MemoryMissing {
                id,
            } => vec![id.clone()],
            Self::MalformedInstruction {
                elements,
            } => vec![elements.join(",")],
            Self::OperatorMissing {
                ..
            }
            | Self::ParseFailed {
                ..
            }
            | Self::Fixture {
                ..
            }
            | Self::Tree(_) => Vec::new(),
        }
    }

    /// Renders the structured `message:<<CODE args>> ` block.
    ///
    /// Returns an empty string for kinds without a protocol code.
    #[must_use]
    pub fn message_block(&self) -> String {
        let Some(code) = self.code() else {
            return String::new();
        };
        let args = self.code_args();
        if args.is_empty() {
            format!("message:<<{code}>> ")
        } else {
            format!("message:<<{code} {}>> ", args.join(" "))
        }
    }

    /// Returns the stable kind label used in audit records.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::TypeMissing {
                ..
            } => "type_missing",
            Self::ConstructorMissing {
                ..
            } => "constructor_missing",
            Self::MemberMissing {
                ..
            } => "member_missing",
            Self::MemoryMissing {
                ..
            } => "memory_missing",
            Self::MalformedInstruction {
                ..
            } => "malformed_instruction",
            Self::OperatorMissing {
                ..
            } => "operator_missing",
            Self::ParseFailed {
                ..
            } => "parse_failed",
            Self::Fixture {
                ..
            } => "fixture",
            Self::Tree(_) => "tree",
        }
    }
}

/// Renders the searched import prefixes for type resolution errors.
fn searched_label(searched: &[String]) -> String {
    if searched.is_empty() { "<none>".to_string() } else { searched.join(", ") }
}

/// Convenient result type for engine operations.
pub type SlimResult<T> = Result<T, SlimError>;
