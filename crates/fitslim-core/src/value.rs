// crates/fitslim-core/src/value.rs
// ============================================================================
// Module: Typed Values
// Description: Runtime values paired with their declared types.
// Purpose: Define the unit passed into and out of every operator.
// Dependencies: crate::error, serde
// ============================================================================

//! ## Overview
//! A [`TypedValue`] couples an optional runtime [`Value`] with a declared
//! [`ValueType`]. The declared type is always supplied explicitly by the
//! producer (a fixture signature, a parse target, a list element) and is never
//! inferred from the value, because the value may be absent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::error::SlimError;

// ============================================================================
// SECTION: Value Types
// ============================================================================

/// Declared type descriptor for runtime values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// No value is produced.
    Void,
    /// Any value; parse keeps the text as-is.
    Any,
    /// Boolean.
    Bool,
    /// Signed 64-bit integer.
    Int,
    /// 64-bit float.
    Float,
    /// Text.
    Text,
    /// Homogeneous sequence of the element type.
    List(Box<ValueType>),
    /// Engine or fixture failure.
    Error,
}

impl ValueType {
    /// Creates a list type of the given element type.
    #[must_use]
    pub fn list_of(element: Self) -> Self {
        Self::List(Box::new(element))
    }

    /// Returns true for integer types.
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Self::Int)
    }

    /// Returns true for integer and float types.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }

    /// Returns the element type for list types.
    #[must_use]
    pub fn element(&self) -> Option<&Self> {
        match self {
            Self::List(element) => Some(element),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => f.write_str("void"),
            Self::Any => f.write_str("any"),
            Self::Bool => f.write_str("bool"),
            Self::Int => f.write_str("int"),
            Self::Float => f.write_str("float"),
            Self::Text => f.write_str("text"),
            Self::List(element) => write!(f, "list<{element}>"),
            Self::Error => f.write_str("error"),
        }
    }
}

// ============================================================================
// SECTION: Runtime Values
// ============================================================================

/// Runtime value produced by fixtures or parse operators.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Sequence whose elements carry their own declared types.
    List(Vec<TypedValue>),
    /// Failure captured as a value for composition.
    Error(SlimError),
}

impl Value {
    /// Returns the boolean payload, if any.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the integer payload, if any.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the float payload, widening integers.
    #[must_use]
    #[allow(clippy::cast_precision_loss, reason = "Widening for numeric comparison.")]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            Self::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    /// Returns the text payload, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the list payload, if any.
    #[must_use]
    pub fn as_list(&self) -> Option<&[TypedValue]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Typed Value
// ============================================================================

/// Runtime value paired with its declared type.
///
/// # Invariants
/// - `declared` is always set by the producer; `value` may be absent.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedValue {
    /// Runtime value, absent for null and void.
    value: Option<Value>,
    /// Declared/static type.
    declared: ValueType,
}

impl TypedValue {
    /// Creates a typed value from its parts.
    #[must_use]
    pub const fn new(value: Option<Value>, declared: ValueType) -> Self {
        Self {
            value,
            declared,
        }
    }

    /// Creates the void result.
    #[must_use]
    pub const fn void() -> Self {
        Self::new(None, ValueType::Void)
    }

    /// Creates a null value of the declared type.
    #[must_use]
    pub const fn null(declared: ValueType) -> Self {
        Self::new(None, declared)
    }

    /// Creates a boolean value.
    #[must_use]
    pub const fn bool(value: bool) -> Self {
        Self::new(Some(Value::Bool(value)), ValueType::Bool)
    }

    /// Creates an integer value.
    #[must_use]
    pub const fn int(value: i64) -> Self {
        Self::new(Some(Value::Int(value)), ValueType::Int)
    }

    /// Creates a float value.
    #[must_use]
    pub const fn float(value: f64) -> Self {
        Self::new(Some(Value::Float(value)), ValueType::Float)
    }

    /// Creates a text value.
    pub fn text(value: impl Into<String>) -> Self {
        Self::new(Some(Value::Text(value.into())), ValueType::Text)
    }

    /// Creates a list value with the given element type.
    #[must_use]
    pub fn list(element: ValueType, values: Vec<Self>) -> Self {
        Self::new(Some(Value::List(values)), ValueType::list_of(element))
    }

    /// Creates an error value.
    #[must_use]
    pub const fn error(error: SlimError) -> Self {
        Self::new(Some(Value::Error(error)), ValueType::Error)
    }

    /// Returns the runtime value, if present.
    #[must_use]
    pub const fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Returns the declared type.
    #[must_use]
    pub const fn declared(&self) -> &ValueType {
        &self.declared
    }

    /// Returns true when the declared type is void.
    #[must_use]
    pub const fn is_void(&self) -> bool {
        matches!(self.declared, ValueType::Void)
    }

    /// Returns true when no runtime value is present.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.value.is_none()
    }

    /// Consumes the typed value and returns the runtime value.
    #[must_use]
    pub fn into_value(self) -> Option<Value> {
        self.value
    }
}

impl From<SlimError> for TypedValue {
    fn from(error: SlimError) -> Self {
        Self::error(error)
    }
}
