// crates/fitslim-core/src/operators/mod.rs
// ============================================================================
// Module: Operator Registry
// Description: Capability contracts and ordered dispatch over operator chains.
// Purpose: Let new value types and grammars plug in without touching dispatch.
// Dependencies: crate::{error, fixture, format, tree, value}
// ============================================================================

//! ## Overview
//! Each capability (compose, parse, compare, invoke) is an ordered list of
//! operator objects. Dispatch walks the list in registration order and hands
//! the input to the first operator that accepts it. Registration order is
//! precedence: specific operators are registered ahead of general fallbacks.
//!
//! A [`Processor`] is an immutable snapshot of the four chains plus the
//! session's [`FormatContext`]. Cloning it is cheap; chains are shared by
//! `Arc` and never reordered after [`ProcessorBuilder::build`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod compare;
pub mod compose;
pub mod invoke;
pub mod parse;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::error::Capability;
use crate::error::SlimError;
use crate::error::SlimResult;
use crate::fixture::InstanceTable;
use crate::format::FormatContext;
use crate::tree::Tree;
use crate::value::TypedValue;
use crate::value::ValueType;

// ============================================================================
// SECTION: Capability Contracts
// ============================================================================

/// Converts a runtime value into a wire tree.
pub trait ComposeOperator: Send + Sync {
    /// Returns true when this operator handles the value.
    fn can_compose(&self, value: &TypedValue) -> bool;

    /// Composes the value; nested values recurse through `processor`.
    ///
    /// # Errors
    ///
    /// Returns [`SlimError`] when a nested composition fails.
    fn compose(&self, processor: &Processor, value: &TypedValue) -> SlimResult<Tree<String>>;
}

/// Converts wire text into a runtime value of a target type.
pub trait ParseOperator: Send + Sync {
    /// Returns true when this operator handles the target type and input shape.
    fn can_parse(&self, target: &ValueType, input: &Tree<String>) -> bool;

    /// Parses the input; nested elements recurse through `processor`.
    ///
    /// # Errors
    ///
    /// Returns [`SlimError::ParseFailed`] when the text is invalid for the type.
    fn parse(
        &self,
        processor: &Processor,
        target: &ValueType,
        input: &Tree<String>,
    ) -> SlimResult<TypedValue>;
}

/// Outcome of a single compare operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Expression grammar or actual type is outside this operator's domain.
    NotApplicable,
    /// Actual value satisfies the expression.
    Matched,
    /// Actual value does not satisfy the expression.
    Mismatched,
}

impl Comparison {
    /// Returns the match flag for applicable outcomes.
    #[must_use]
    pub const fn matched(self) -> Option<bool> {
        match self {
            Self::NotApplicable => None,
            Self::Matched => Some(true),
            Self::Mismatched => Some(false),
        }
    }
}

impl From<bool> for Comparison {
    fn from(matched: bool) -> Self {
        if matched { Self::Matched } else { Self::Mismatched }
    }
}

/// Evaluates an expected wire expression against an actual value.
pub trait CompareOperator: Send + Sync {
    /// Compares `actual` with `expected`, declining when not applicable.
    ///
    /// # Errors
    ///
    /// Returns [`SlimError`] when composing the actual value fails.
    fn try_compare(
        &self,
        processor: &Processor,
        actual: &TypedValue,
        expected: &Tree<String>,
    ) -> SlimResult<Comparison>;
}

/// Member invocation request against the session's instance table.
#[derive(Debug, Clone, Copy)]
pub struct InvokeRequest<'a> {
    /// Target instance id.
    pub instance: &'a str,
    /// Method name.
    pub member: &'a str,
    /// Raw wire arguments, symbols already substituted.
    pub args: &'a [Tree<String>],
}

impl InvokeRequest<'_> {
    /// Returns the argument count used for arity matching.
    #[must_use]
    pub const fn arity(&self) -> usize {
        self.args.len()
    }
}

/// Resolves and runs a member on a held instance.
pub trait InvokeOperator: Send + Sync {
    /// Returns true when this operator can run the request.
    fn can_invoke(&self, instances: &InstanceTable, request: &InvokeRequest<'_>) -> bool;

    /// Runs the request and returns the member's typed result.
    ///
    /// # Errors
    ///
    /// Returns [`SlimError`] when argument coercion or fixture code fails.
    fn invoke(
        &self,
        processor: &Processor,
        instances: &mut InstanceTable,
        request: &InvokeRequest<'_>,
    ) -> SlimResult<TypedValue>;
}

// ============================================================================
// SECTION: Processor
// ============================================================================

/// Immutable snapshot of the operator chains for one session.
///
/// # Invariants
/// - Chains keep registration order; the first accepting operator wins.
#[derive(Clone)]
pub struct Processor {
    /// Compose chain.
    composers: Arc<[Arc<dyn ComposeOperator>]>,
    /// Parse chain.
    parsers: Arc<[Arc<dyn ParseOperator>]>,
    /// Compare chain.
    comparers: Arc<[Arc<dyn CompareOperator>]>,
    /// Invoke chain.
    invokers: Arc<[Arc<dyn InvokeOperator>]>,
    /// Formatting context read by compose operators.
    format: FormatContext,
}

impl Processor {
    /// Returns an empty builder.
    #[must_use]
    pub fn builder() -> ProcessorBuilder {
        ProcessorBuilder::default()
    }

    /// Returns a processor with the standard operator chains.
    #[must_use]
    pub fn standard() -> Self {
        ProcessorBuilder::standard().build()
    }

    /// Returns a builder seeded with this processor's chains.
    #[must_use]
    pub fn to_builder(&self) -> ProcessorBuilder {
        ProcessorBuilder {
            composers: self.composers.to_vec(),
            parsers: self.parsers.to_vec(),
            comparers: self.comparers.to_vec(),
            invokers: self.invokers.to_vec(),
            format: self.format,
        }
    }

    /// Returns a copy of this processor using a different format context.
    #[must_use]
    pub fn with_format(&self, format: FormatContext) -> Self {
        let mut processor = self.clone();
        processor.format = format;
        processor
    }

    /// Returns the formatting context.
    #[must_use]
    pub const fn format(&self) -> &FormatContext {
        &self.format
    }

    /// Composes a value through the compose chain.
    ///
    /// # Errors
    ///
    /// Returns [`SlimError::OperatorMissing`] when no operator accepts the value.
    pub fn compose(&self, value: &TypedValue) -> SlimResult<Tree<String>> {
        for operator in self.composers.iter() {
            if operator.can_compose(value) {
                return operator.compose(self, value);
            }
        }
        Err(SlimError::OperatorMissing {
            capability: Capability::Compose,
            declared: value.declared().clone(),
        })
    }

    /// Parses wire input into the target type through the parse chain.
    ///
    /// # Errors
    ///
    /// Returns [`SlimError::OperatorMissing`] when no operator accepts the
    /// target, or the accepting operator's parse error.
    pub fn parse(&self, target: &ValueType, input: &Tree<String>) -> SlimResult<TypedValue> {
        for operator in self.parsers.iter() {
            if operator.can_parse(target, input) {
                return operator.parse(self, target, input);
            }
        }
        Err(SlimError::OperatorMissing {
            capability: Capability::Parse,
            declared: target.clone(),
        })
    }

    /// Parses a text leaf into the target type.
    ///
    /// # Errors
    ///
    /// See [`Processor::parse`].
    pub fn parse_text(&self, target: &ValueType, text: &str) -> SlimResult<TypedValue> {
        self.parse(target, &Tree::text(text))
    }

    /// Compares an actual value with an expected expression.
    ///
    /// # Errors
    ///
    /// Returns [`SlimError::OperatorMissing`] when every operator declines.
    pub fn compare(&self, actual: &TypedValue, expected: &Tree<String>) -> SlimResult<bool> {
        for operator in self.comparers.iter() {
            if let Some(matched) = operator.try_compare(self, actual, expected)?.matched() {
                return Ok(matched);
            }
        }
        Err(SlimError::OperatorMissing {
            capability: Capability::Compare,
            declared: actual.declared().clone(),
        })
    }

    /// Invokes a member on a held instance through the invoke chain.
    ///
    /// # Errors
    ///
    /// Returns [`SlimError::MemoryMissing`] for an unbound instance id and
    /// [`SlimError::MemberMissing`] when no operator can run the member.
    pub fn invoke(
        &self,
        instances: &mut InstanceTable,
        request: &InvokeRequest<'_>,
    ) -> SlimResult<TypedValue> {
        let class = instances.require(request.instance)?.class_name().to_string();
        for operator in self.invokers.iter() {
            if operator.can_invoke(instances, request) {
                return operator.invoke(self, instances, request);
            }
        }
        Err(SlimError::MemberMissing {
            class,
            member: request.member.to_string(),
            arity: request.arity(),
        })
    }

    /// Parses each argument against the matching parameter type.
    ///
    /// # Errors
    ///
    /// Returns the first parse failure.
    pub fn parse_args(
        &self,
        params: &[ValueType],
        args: &[Tree<String>],
    ) -> SlimResult<Vec<TypedValue>> {
        params.iter().zip(args).map(|(param, arg)| self.parse(param, arg)).collect()
    }
}

impl Default for Processor {
    fn default() -> Self {
        Self::standard()
    }
}

// ============================================================================
// SECTION: Processor Builder
// ============================================================================

/// Builder that appends operators in precedence order.
#[derive(Default)]
pub struct ProcessorBuilder {
    /// Compose chain under construction.
    composers: Vec<Arc<dyn ComposeOperator>>,
    /// Parse chain under construction.
    parsers: Vec<Arc<dyn ParseOperator>>,
    /// Compare chain under construction.
    comparers: Vec<Arc<dyn CompareOperator>>,
    /// Invoke chain under construction.
    invokers: Vec<Arc<dyn InvokeOperator>>,
    /// Formatting context for the built processor.
    format: FormatContext,
}

impl ProcessorBuilder {
    /// Returns a builder with the standard chains registered.
    #[must_use]
    pub fn standard() -> Self {
        Self::default()
            .add_compose(compose::ComposeVoid)
            .add_compose(compose::ComposeNull)
            .add_compose(compose::ComposeException)
            .add_compose(compose::ComposeBoolean)
            .add_compose(compose::ComposeList)
            .add_compose(compose::ComposeDefault)
            .add_parse(parse::ParseText)
            .add_parse(parse::ParseBoolean)
            .add_parse(parse::ParseInteger)
            .add_parse(parse::ParseFloat)
            .add_parse(parse::ParseList)
            .add_compare(compare::CompareIntegralRange)
            .add_compare(compare::CompareRelational)
            .add_compare(compare::CompareRegex)
            .add_compare(compare::CompareDefault)
            .add_invoke(invoke::InvokeInstanceMethod)
            .add_invoke(invoke::InvokeLibraryMethod)
    }

    /// Appends a compose operator.
    #[must_use]
    pub fn add_compose(mut self, operator: impl ComposeOperator + 'static) -> Self {
        self.composers.push(Arc::new(operator));
        self
    }

    /// Appends a parse operator.
    #[must_use]
    pub fn add_parse(mut self, operator: impl ParseOperator + 'static) -> Self {
        self.parsers.push(Arc::new(operator));
        self
    }

    /// Appends a compare operator.
    #[must_use]
    pub fn add_compare(mut self, operator: impl CompareOperator + 'static) -> Self {
        self.comparers.push(Arc::new(operator));
        self
    }

    /// Appends an invoke operator.
    #[must_use]
    pub fn add_invoke(mut self, operator: impl InvokeOperator + 'static) -> Self {
        self.invokers.push(Arc::new(operator));
        self
    }

    /// Sets the formatting context.
    #[must_use]
    pub fn with_format(mut self, format: FormatContext) -> Self {
        self.format = format;
        self
    }

    /// Freezes the chains into a processor.
    #[must_use]
    pub fn build(self) -> Processor {
        Processor {
            composers: self.composers.into(),
            parsers: self.parsers.into(),
            comparers: self.comparers.into(),
            invokers: self.invokers.into(),
            format: self.format,
        }
    }
}
