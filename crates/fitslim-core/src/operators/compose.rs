// crates/fitslim-core/src/operators/compose.rs
// ============================================================================
// Module: Compose Operators
// Description: Runtime value to wire tree conversions.
// Purpose: Produce byte-exact result text for every value shape.
// Dependencies: crate::{error, operators, tree, value}
// ============================================================================

//! ## Overview
//! The standard compose chain, most specific first: void sentinel, null,
//! exceptions, booleans, lists, then the scalar fallback. Sentinel texts are
//! protocol literals and must not change.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::error::SlimError;
use crate::error::SlimResult;
use crate::operators::ComposeOperator;
use crate::operators::Processor;
use crate::tree::Tree;
use crate::value::TypedValue;
use crate::value::Value;

// ============================================================================
// SECTION: Sentinels
// ============================================================================

/// Composed text for a void result.
pub const VOID_SENTINEL: &str = "/__VOID__/";
/// Composed text for an absent value.
pub const NULL_SENTINEL: &str = "null";
/// Prefix marking a composed failure.
pub const EXCEPTION_PREFIX: &str = "__EXCEPTION__:";

/// Renders an error as exception text without consulting a processor.
#[must_use]
pub fn exception_text(error: &SlimError) -> String {
    format!("{EXCEPTION_PREFIX}{}{error}", error.message_block())
}

// ============================================================================
// SECTION: Operators
// ============================================================================

/// Composes any void-declared value as the void sentinel.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComposeVoid;

impl ComposeOperator for ComposeVoid {
    fn can_compose(&self, value: &TypedValue) -> bool {
        value.is_void()
    }

    fn compose(&self, _processor: &Processor, _value: &TypedValue) -> SlimResult<Tree<String>> {
        Ok(Tree::text(VOID_SENTINEL))
    }
}

/// Composes an absent value of any declared type as `null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComposeNull;

impl ComposeOperator for ComposeNull {
    fn can_compose(&self, value: &TypedValue) -> bool {
        value.is_null()
    }

    fn compose(&self, _processor: &Processor, _value: &TypedValue) -> SlimResult<Tree<String>> {
        Ok(Tree::text(NULL_SENTINEL))
    }
}

/// Composes error values as `__EXCEPTION__:` text with the code block.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComposeException;

impl ComposeOperator for ComposeException {
    fn can_compose(&self, value: &TypedValue) -> bool {
        matches!(value.value(), Some(Value::Error(_)))
    }

    fn compose(&self, processor: &Processor, value: &TypedValue) -> SlimResult<Tree<String>> {
        match value.value() {
            Some(Value::Error(error)) => Ok(Tree::text(exception_text(error))),
            _ => ComposeDefault.compose(processor, value),
        }
    }
}

/// Composes booleans as lower-case `true`/`false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComposeBoolean;

impl ComposeOperator for ComposeBoolean {
    fn can_compose(&self, value: &TypedValue) -> bool {
        matches!(value.value(), Some(Value::Bool(_)))
    }

    fn compose(&self, processor: &Processor, value: &TypedValue) -> SlimResult<Tree<String>> {
        match value.value() {
            Some(Value::Bool(flag)) => Ok(Tree::text(if *flag { "true" } else { "false" })),
            _ => ComposeDefault.compose(processor, value),
        }
    }
}

/// Composes sequences as one branch per element, recursing through the chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComposeList;

impl ComposeOperator for ComposeList {
    fn can_compose(&self, value: &TypedValue) -> bool {
        matches!(value.value(), Some(Value::List(_)))
    }

    fn compose(&self, processor: &Processor, value: &TypedValue) -> SlimResult<Tree<String>> {
        match value.value() {
            Some(Value::List(elements)) => {
                let branches = elements
                    .iter()
                    .map(|element| processor.compose(element))
                    .collect::<SlimResult<Vec<_>>>()?;
                Ok(Tree::list(branches))
            }
            _ => ComposeDefault.compose(processor, value),
        }
    }
}

/// Scalar fallback that accepts every value.
///
/// Numbers use the processor's [`crate::FormatContext`]. Booleans use the
/// generic capitalized display, which [`ComposeBoolean`] supersedes when it
/// is registered ahead of this operator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComposeDefault;

impl ComposeOperator for ComposeDefault {
    fn can_compose(&self, _value: &TypedValue) -> bool {
        true
    }

    fn compose(&self, processor: &Processor, value: &TypedValue) -> SlimResult<Tree<String>> {
        if value.is_void() {
            return Ok(Tree::text(VOID_SENTINEL));
        }
        let Some(inner) = value.value() else {
            return Ok(Tree::text(NULL_SENTINEL));
        };
        Ok(Tree::text(display_scalar(processor, inner)))
    }
}

/// Renders a value with the generic scalar display.
fn display_scalar(processor: &Processor, value: &Value) -> String {
    let format = processor.format();
    match value {
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Int(number) => format.format_int(*number),
        Value::Float(number) => format.format_float(*number),
        Value::Text(text) => text.clone(),
        Value::List(elements) => {
            let items = elements
                .iter()
                .map(|element| {
                    element
                        .value()
                        .map_or_else(|| NULL_SENTINEL.to_string(), |inner| display_scalar(processor, inner))
                })
                .collect::<Vec<_>>();
            format!("[{}]", items.join(", "))
        }
        Value::Error(error) => error.to_string(),
    }
}
