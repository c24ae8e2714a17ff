// crates/fitslim-core/tests/support/mod.rs
// ============================================================================
// Module: Test Support
// Description: Sample fixtures and tree helpers for engine integration tests.
// ============================================================================
//! ## Overview
//! Registers a small calculator fixture family and offers helpers for
//! building instruction batches and reading result entries.

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

use fitslim_core::FixtureClass;
use fitslim_core::FixtureRegistry;
use fitslim_core::Processor;
use fitslim_core::Session;
use fitslim_core::SlimError;
use fitslim_core::Tree;
use fitslim_core::TypedValue;
use fitslim_core::Value;
use fitslim_core::ValueType;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Running-total calculator.
pub struct Calculator {
    /// Current total.
    pub total: i64,
}

/// Library helper consulted when the target lacks a method.
pub struct Helper {
    /// Greeting prefix.
    pub prefix: String,
}

/// Builds the calculator class under `demo.Calculator`.
pub fn calculator_class() -> FixtureClass {
    FixtureClass::builder::<Calculator>("demo.Calculator")
        .constructor(&[], |_| {
            Ok(Calculator {
                total: 0,
            })
        })
        .constructor(&[ValueType::Int], |args| {
            Ok(Calculator {
                total: args.int(0)?,
            })
        })
        .action("add", &[ValueType::Int], |calc, args| {
            calc.total += args.int(0)?;
            Ok(())
        })
        .method("total", &[], ValueType::Int, |calc, _| Ok(Some(Value::Int(calc.total))))
        .method("isPositive", &[], ValueType::Bool, |calc, _| Ok(Some(Value::Bool(calc.total > 0))))
        .method("half", &[], ValueType::Float, |calc, _| {
            Ok(Some(Value::Float(f64::from(i32::try_from(calc.total).unwrap_or(0)) / 2.0)))
        })
        .method("divide", &[ValueType::Int], ValueType::Int, |calc, args| {
            let divisor = args.int(0)?;
            if divisor == 0 {
                return Err(SlimError::fixture("DivideByZero", "cannot divide by zero"));
            }
            Ok(Some(Value::Int(calc.total / divisor)))
        })
        .method("echo", &[ValueType::Text], ValueType::Text, |_, args| {
            Ok(Some(Value::Text(args.text(0)?.to_string())))
        })
        .method("pick", &[ValueType::Int], ValueType::Text, |_, _| {
            Ok(Some(Value::Text("first".to_string())))
        })
        .method("pick", &[ValueType::Text], ValueType::Text, |_, _| {
            Ok(Some(Value::Text("second".to_string())))
        })
        .method("nothing", &[], ValueType::Text, |_, _| Ok(None))
        .method("digits", &[], ValueType::list_of(ValueType::Int), |calc, _| {
            let digits = calc
                .total
                .to_string()
                .chars()
                .filter_map(|ch| ch.to_digit(10))
                .map(|digit| TypedValue::int(i64::from(digit)))
                .collect();
            Ok(Some(Value::List(digits)))
        })
        .method("oddDigits", &[], ValueType::list_of(ValueType::Int), |calc, _| {
            let odd = calc
                .total
                .to_string()
                .chars()
                .filter_map(|ch| ch.to_digit(10))
                .filter(|digit| digit % 2 == 1)
                .map(|digit| TypedValue::int(i64::from(digit)))
                .collect();
            Ok(Some(Value::List(odd)))
        })
        .method("sum", &[ValueType::list_of(ValueType::Int)], ValueType::Int, |_, args| {
            let total = args.list(0)?.iter().filter_map(|value| value.value()?.as_int()).sum();
            Ok(Some(Value::Int(total)))
        })
        .build()
}

/// Builds the library helper class under `demo.Helper`.
pub fn helper_class() -> FixtureClass {
    FixtureClass::builder::<Helper>("demo.Helper")
        .constructor(&[ValueType::Text], |args| {
            Ok(Helper {
                prefix: args.text(0)?.to_string(),
            })
        })
        .method("greet", &[ValueType::Text], ValueType::Text, |helper, args| {
            Ok(Some(Value::Text(format!("{} {}", helper.prefix, args.text(0)?))))
        })
        .method("total", &[], ValueType::Int, |_, _| Ok(Some(Value::Int(-1))))
        .build()
}

/// Returns a registry holding the sample fixtures.
pub fn registry() -> Arc<FixtureRegistry> {
    let mut registry = FixtureRegistry::new();
    registry.register(calculator_class()).register(helper_class());
    Arc::new(registry)
}

/// Returns a session over the sample fixtures and the standard processor.
pub fn session() -> Session {
    Session::new(registry(), Processor::standard())
}

// ============================================================================
// SECTION: Tree Helpers
// ============================================================================

/// Builds one instruction from text elements.
pub fn instruction(elements: &[&str]) -> Tree<String> {
    Tree::text_list(elements.iter().copied())
}

/// Builds a batch from instructions.
pub fn batch(instructions: Vec<Tree<String>>) -> Tree<String> {
    Tree::list(instructions)
}

/// Returns the id of the result entry at `index`.
pub fn result_id(results: &Tree<String>, index: usize) -> String {
    results.value_at(&[index, 0]).unwrap().clone()
}

/// Returns the leaf result text of the entry at `index`.
pub fn result_text(results: &Tree<String>, index: usize) -> String {
    results.value_at(&[index, 1]).unwrap().clone()
}
