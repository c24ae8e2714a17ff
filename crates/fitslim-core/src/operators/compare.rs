// crates/fitslim-core/src/operators/compare.rs
// ============================================================================
// Module: Compare Operators
// Description: Expected-expression grammars evaluated against actual values.
// Purpose: Decide assertion cells with a tri-state, declinable contract.
// Dependencies: crate::{error, operators, tree, value}, regex
// ============================================================================

//! ## Overview
//! Each comparator recognizes one expression grammar. When the grammar does
//! not match, or the actual type is outside its domain, it reports
//! [`Comparison::NotApplicable`] so dispatch moves on. [`CompareDefault`] is
//! the catch-all and compares composed text for equality.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::LazyLock;

use regex::Regex;

use crate::error::SlimResult;
use crate::operators::CompareOperator;
use crate::operators::Comparison;
use crate::operators::Processor;
use crate::tree::Tree;
use crate::value::TypedValue;
use crate::value::Value;

// ============================================================================
// SECTION: Grammars
// ============================================================================

/// Integral range grammar, `low..high` with optional signs.
pub const RANGE_PATTERN: &str = r"^-?[0-9]+\.\.-?[0-9]+$";

/// Relational grammar, an operator followed by a decimal bound.
const RELATIONAL_PATTERN: &str = r"^(<=|>=|!=|<|>)\s*(-?[0-9]+(?:\.[0-9]+)?)$";

/// Compiled range grammar; `None` only if the literal fails to compile.
static RANGE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(RANGE_PATTERN).ok());

/// Compiled relational grammar.
static RELATIONAL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(RELATIONAL_PATTERN).ok());

// ============================================================================
// SECTION: Range
// ============================================================================

/// Matches integer actuals against an inclusive `low..high` range.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompareIntegralRange;

impl CompareIntegralRange {
    /// Splits a range expression into its bounds.
    ///
    /// The first and last `.`-separated segments are the bounds, so a
    /// negative high bound survives the split.
    fn bounds(expression: &str) -> Option<(i64, i64)> {
        let grammar = RANGE.as_ref()?;
        if !grammar.is_match(expression) {
            return None;
        }
        let mut segments = expression.split('.');
        let low = segments.next()?.parse::<i64>().ok()?;
        let high = segments.next_back()?.parse::<i64>().ok()?;
        Some((low, high))
    }
}

impl CompareOperator for CompareIntegralRange {
    fn try_compare(
        &self,
        _processor: &Processor,
        actual: &TypedValue,
        expected: &Tree<String>,
    ) -> SlimResult<Comparison> {
        if !actual.declared().is_integer() || !expected.is_leaf() {
            return Ok(Comparison::NotApplicable);
        }
        let Some((low, high)) = Self::bounds(expected.value()) else {
            return Ok(Comparison::NotApplicable);
        };
        let Some(value) = actual.value().and_then(Value::as_int) else {
            return Ok(Comparison::Mismatched);
        };
        Ok(Comparison::from(low <= value && value <= high))
    }
}

// ============================================================================
// SECTION: Relational
// ============================================================================

/// Matches numeric actuals against `<n`, `<=n`, `>n`, `>=n`, `!=n`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompareRelational;

impl CompareOperator for CompareRelational {
    fn try_compare(
        &self,
        _processor: &Processor,
        actual: &TypedValue,
        expected: &Tree<String>,
    ) -> SlimResult<Comparison> {
        if !actual.declared().is_numeric() || !expected.is_leaf() {
            return Ok(Comparison::NotApplicable);
        }
        let Some(grammar) = RELATIONAL.as_ref() else {
            return Ok(Comparison::NotApplicable);
        };
        let Some(captures) = grammar.captures(expected.value().trim()) else {
            return Ok(Comparison::NotApplicable);
        };
        let (Some(operator), Some(bound)) = (captures.get(1), captures.get(2)) else {
            return Ok(Comparison::NotApplicable);
        };
        let Some(value) = actual.value() else {
            return Ok(Comparison::Mismatched);
        };
        let ordering = match (value, bound.as_str().parse::<i64>()) {
            (Value::Int(actual), Ok(bound)) => Some(actual.cmp(&bound)),
            _ => {
                let bound = bound.as_str().parse::<f64>().ok();
                value.as_float().zip(bound).and_then(|(left, right)| left.partial_cmp(&right))
            }
        };
        let Some(ordering) = ordering else {
            return Ok(Comparison::Mismatched);
        };
        let matched = match operator.as_str() {
            "<" => ordering.is_lt(),
            "<=" => ordering.is_le(),
            ">" => ordering.is_gt(),
            ">=" => ordering.is_ge(),
            _ => ordering.is_ne(),
        };
        Ok(Comparison::from(matched))
    }
}

// ============================================================================
// SECTION: Regex
// ============================================================================

/// Matches composed actual text against a `/pattern/` expression.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompareRegex;

impl CompareOperator for CompareRegex {
    fn try_compare(
        &self,
        processor: &Processor,
        actual: &TypedValue,
        expected: &Tree<String>,
    ) -> SlimResult<Comparison> {
        if !expected.is_leaf() {
            return Ok(Comparison::NotApplicable);
        }
        let text = expected.value();
        let Some(pattern) = text
            .strip_prefix('/')
            .and_then(|rest| rest.strip_suffix('/'))
            .filter(|pattern| !pattern.is_empty())
        else {
            return Ok(Comparison::NotApplicable);
        };
        let Ok(regex) = Regex::new(pattern) else {
            return Ok(Comparison::NotApplicable);
        };
        let composed = processor.compose(actual)?;
        if !composed.is_leaf() {
            return Ok(Comparison::NotApplicable);
        }
        Ok(Comparison::from(regex.is_match(composed.value())))
    }
}

// ============================================================================
// SECTION: Default
// ============================================================================

/// Compares the composed actual tree with the expected tree for equality.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompareDefault;

impl CompareOperator for CompareDefault {
    fn try_compare(
        &self,
        processor: &Processor,
        actual: &TypedValue,
        expected: &Tree<String>,
    ) -> SlimResult<Comparison> {
        let composed = processor.compose(actual)?;
        Ok(Comparison::from(&composed == expected))
    }
}
