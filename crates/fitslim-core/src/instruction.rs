// crates/fitslim-core/src/instruction.rs
// ============================================================================
// Module: Instructions
// Description: Decoding of instruction trees into typed operations.
// Purpose: Reject unrecognized shapes as malformed before execution.
// Dependencies: crate::{error, tree}
// ============================================================================

//! ## Overview
//! An instruction is a list `[id, verb, ...args]`. Verbs are case-sensitive:
//! `make`, `call`, `callAndAssign`, `import` and `assign`. Any other verb,
//! too few elements, or a nested list where a name is required decodes to
//! [`SlimError::MalformedInstruction`] carrying the raw elements.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::error::SlimError;
use crate::error::SlimResult;
use crate::tree::Tree;

// ============================================================================
// SECTION: Verbs
// ============================================================================

/// Verb constructing and binding an instance.
pub const MAKE: &str = "make";
/// Verb invoking a method and returning its composed result.
pub const CALL: &str = "call";
/// Verb invoking a method and binding its result to a symbol.
pub const CALL_AND_ASSIGN: &str = "callAndAssign";
/// Verb appending a namespace prefix to the class search path.
pub const IMPORT: &str = "import";
/// Verb binding a literal value to a symbol.
pub const ASSIGN: &str = "assign";

// ============================================================================
// SECTION: Operations
// ============================================================================

/// Decoded instruction body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Construct `class` with `args` and bind it under `instance`.
    Make {
        /// Instance id to bind.
        instance: String,
        /// Class name to resolve.
        class: String,
        /// Constructor arguments.
        args: Vec<Tree<String>>,
    },
    /// Invoke `method` on `instance`.
    Call {
        /// Target instance id.
        instance: String,
        /// Method name.
        method: String,
        /// Method arguments.
        args: Vec<Tree<String>>,
    },
    /// Invoke `method` on `instance` and bind the result to `symbol`.
    CallAndAssign {
        /// Symbol name receiving the result.
        symbol: String,
        /// Target instance id.
        instance: String,
        /// Method name.
        method: String,
        /// Method arguments.
        args: Vec<Tree<String>>,
    },
    /// Append `path` to the class search path.
    Import {
        /// Namespace prefix.
        path: String,
    },
    /// Bind `value` to `symbol`.
    Assign {
        /// Symbol name.
        symbol: String,
        /// Literal value.
        value: Tree<String>,
    },
}

/// Instruction with its correlation id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Correlation id echoed in the result.
    pub id: String,
    /// Decoded operation.
    pub operation: Operation,
}

impl Instruction {
    /// Decodes an instruction tree.
    ///
    /// # Errors
    ///
    /// Returns [`SlimError::MalformedInstruction`] for unknown verbs, missing
    /// elements, or nested lists in name positions.
    pub fn decode(tree: &Tree<String>) -> SlimResult<Self> {
        let elements = tree.branches();
        let malformed = || SlimError::malformed(raw_elements(tree));
        let name = |index: usize| -> SlimResult<String> {
            elements
                .get(index)
                .filter(|element| element.is_leaf())
                .map(|element| element.value().clone())
                .ok_or_else(malformed)
        };
        let id = name(0)?;
        let verb = name(1)?;
        let rest = |from: usize| elements.get(from ..).map(<[Tree<String>]>::to_vec).unwrap_or_default();
        let operation = match verb.as_str() {
            MAKE => Operation::Make {
                instance: name(2)?,
                class: name(3)?,
                args: rest(4),
            },
            CALL => Operation::Call {
                instance: name(2)?,
                method: name(3)?,
                args: rest(4),
            },
            CALL_AND_ASSIGN => Operation::CallAndAssign {
                symbol: name(2)?,
                instance: name(3)?,
                method: name(4)?,
                args: rest(5),
            },
            IMPORT if elements.len() == 3 => Operation::Import {
                path: name(2)?,
            },
            ASSIGN if elements.len() == 4 => Operation::Assign {
                symbol: name(2)?,
                value: elements.get(3).cloned().ok_or_else(malformed)?,
            },
            _ => return Err(malformed()),
        };
        Ok(Self {
            id,
            operation,
        })
    }

    /// Returns the correlation id of a possibly malformed instruction tree.
    ///
    /// Falls back to an empty id when the first element is missing or nested.
    #[must_use]
    pub fn peek_id(tree: &Tree<String>) -> String {
        tree.branches()
            .first()
            .filter(|element| element.is_leaf())
            .map(|element| element.value().clone())
            .unwrap_or_default()
    }
}

/// Flattens instruction elements to text for malformed-instruction reports.
///
/// Nested lists render as `[a,b]`.
#[must_use]
pub fn raw_elements(tree: &Tree<String>) -> Vec<String> {
    if tree.is_leaf() {
        return vec![tree.value().clone()];
    }
    tree.branches().iter().map(flatten).collect()
}

/// Renders one element, bracketing nested lists.
fn flatten(tree: &Tree<String>) -> String {
    if tree.is_leaf() {
        return tree.value().clone();
    }
    format!("[{}]", tree.branches().iter().map(flatten).collect::<Vec<_>>().join(","))
}
