// crates/fitslim-core/src/operators/parse.rs
// ============================================================================
// Module: Parse Operators
// Description: Wire text to typed runtime value conversions.
// Purpose: Coerce instruction arguments into fixture parameter types.
// Dependencies: crate::{error, operators, tree, value}
// ============================================================================

//! ## Overview
//! Scalar parsers accept only leaf input. [`ParseList`] accepts either a
//! branch per element or a single leaf written as `[a, b, c]` or `a, b, c`.
//! Every parser rejects invalid text with [`SlimError::ParseFailed`] instead
//! of falling back to a default value.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::error::SlimError;
use crate::error::SlimResult;
use crate::operators::ParseOperator;
use crate::operators::Processor;
use crate::tree::Tree;
use crate::value::TypedValue;
use crate::value::ValueType;

/// Builds a parse failure for the target type and text.
fn failed(target: &ValueType, text: &str) -> SlimError {
    SlimError::ParseFailed {
        target: target.clone(),
        text: text.to_string(),
    }
}

// ============================================================================
// SECTION: Scalars
// ============================================================================

/// Passes leaf text through for text and untyped targets.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseText;

impl ParseOperator for ParseText {
    fn can_parse(&self, target: &ValueType, input: &Tree<String>) -> bool {
        matches!(target, ValueType::Text | ValueType::Any) && input.is_leaf()
    }

    fn parse(
        &self,
        _processor: &Processor,
        target: &ValueType,
        input: &Tree<String>,
    ) -> SlimResult<TypedValue> {
        let mut value = TypedValue::text(input.value().clone());
        if matches!(target, ValueType::Any) {
            value = TypedValue::new(value.into_value(), ValueType::Any);
        }
        Ok(value)
    }
}

/// Parses `true`/`false` (case-insensitive) into booleans.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseBoolean;

impl ParseOperator for ParseBoolean {
    fn can_parse(&self, target: &ValueType, input: &Tree<String>) -> bool {
        matches!(target, ValueType::Bool) && input.is_leaf()
    }

    fn parse(
        &self,
        _processor: &Processor,
        target: &ValueType,
        input: &Tree<String>,
    ) -> SlimResult<TypedValue> {
        let text = input.value().trim();
        if text.eq_ignore_ascii_case("true") {
            Ok(TypedValue::bool(true))
        } else if text.eq_ignore_ascii_case("false") {
            Ok(TypedValue::bool(false))
        } else {
            Err(failed(target, input.value()))
        }
    }
}

/// Parses signed decimal integers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseInteger;

impl ParseOperator for ParseInteger {
    fn can_parse(&self, target: &ValueType, input: &Tree<String>) -> bool {
        target.is_integer() && input.is_leaf()
    }

    fn parse(
        &self,
        _processor: &Processor,
        target: &ValueType,
        input: &Tree<String>,
    ) -> SlimResult<TypedValue> {
        input
            .value()
            .trim()
            .parse::<i64>()
            .map(TypedValue::int)
            .map_err(|_| failed(target, input.value()))
    }
}

/// Parses floats in the invariant convention.
///
/// Accepts the same `NaN`/`Infinity` spellings the compose side emits.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseFloat;

impl ParseOperator for ParseFloat {
    fn can_parse(&self, target: &ValueType, input: &Tree<String>) -> bool {
        matches!(target, ValueType::Float) && input.is_leaf()
    }

    fn parse(
        &self,
        _processor: &Processor,
        target: &ValueType,
        input: &Tree<String>,
    ) -> SlimResult<TypedValue> {
        let text = input.value().trim();
        let parsed = match text {
            "NaN" => Some(f64::NAN),
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            // Rust also accepts "inf"/"nan"; those are not protocol spellings.
            _ if text.bytes().all(is_decimal_byte) => text.parse::<f64>().ok(),
            _ => None,
        };
        parsed.map(TypedValue::float).ok_or_else(|| failed(target, input.value()))
    }
}

/// Returns true for bytes allowed in decimal float text.
const fn is_decimal_byte(byte: u8) -> bool {
    byte.is_ascii_digit() || matches!(byte, b'+' | b'-' | b'.' | b'e' | b'E')
}

// ============================================================================
// SECTION: Lists
// ============================================================================

/// Reconstructs lists from branch trees or delimited leaf text.
///
/// Untyped targets with branched input parse as a list of untyped elements.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseList;

impl ParseOperator for ParseList {
    fn can_parse(&self, target: &ValueType, input: &Tree<String>) -> bool {
        match target {
            ValueType::List(_) => true,
            ValueType::Any => !input.is_leaf(),
            _ => false,
        }
    }

    fn parse(
        &self,
        processor: &Processor,
        target: &ValueType,
        input: &Tree<String>,
    ) -> SlimResult<TypedValue> {
        let element = target.element().cloned().unwrap_or(ValueType::Any);
        let values = if input.is_leaf() {
            split_leaf(input.value())
                .into_iter()
                .map(|text| processor.parse_text(&element, text))
                .collect::<SlimResult<Vec<_>>>()?
        } else {
            input
                .branches()
                .iter()
                .map(|branch| processor.parse(&element, branch))
                .collect::<SlimResult<Vec<_>>>()?
        };
        Ok(TypedValue::list(element, values))
    }
}

/// Splits `[a, b]` or `a, b` leaf text into trimmed element texts.
fn split_leaf(text: &str) -> Vec<&str> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(trimmed)
        .trim();
    if body.is_empty() {
        return Vec::new();
    }
    body.split(',').map(str::trim).collect()
}
