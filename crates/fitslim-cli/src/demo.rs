// crates/fitslim-cli/src/demo.rs
// ============================================================================
// Module: Demo Fixtures
// Description: Fixture classes bundled with the `fitslim` binary.
// Purpose: Give the server something to execute out of the box.
// Dependencies: fitslim-core
// ============================================================================

//! ## Overview
//! Registers the `demo` namespace. Test pages can `import` `demo` and then
//! `make` a `Calculator` or `Greeter` without the qualified name.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use fitslim_core::FixtureClass;
use fitslim_core::FixtureRegistry;
use fitslim_core::SlimError;
use fitslim_core::Value;
use fitslim_core::ValueType;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Two-operand integer calculator.
#[derive(Debug, Default)]
struct Calculator {
    /// Left operand.
    left: i64,
    /// Right operand.
    right: i64,
}

/// Greets a fixed name.
#[derive(Debug)]
struct Greeter {
    /// Name used by `greet`.
    name: String,
}

/// Builds the `demo.Calculator` class.
fn calculator() -> FixtureClass {
    FixtureClass::builder::<Calculator>("demo.Calculator")
        .constructor(&[], |_| Ok(Calculator::default()))
        .action("setLeft", &[ValueType::Int], |calc, args| {
            calc.left = args.int(0)?;
            Ok(())
        })
        .action("setRight", &[ValueType::Int], |calc, args| {
            calc.right = args.int(0)?;
            Ok(())
        })
        .method("sum", &[], ValueType::Int, |calc, _| {
            calc.left
                .checked_add(calc.right)
                .map(|sum| Some(Value::Int(sum)))
                .ok_or_else(|| SlimError::fixture("Overflow", "sum exceeds the integer range"))
        })
        .method("quotient", &[], ValueType::Int, |calc, _| {
            calc.left
                .checked_div(calc.right)
                .map(|quotient| Some(Value::Int(quotient)))
                .ok_or_else(|| SlimError::fixture("DivideByZero", "right operand is zero"))
        })
        .method("isEven", &[ValueType::Int], ValueType::Bool, |_, args| {
            Ok(Some(Value::Bool(args.int(0)? % 2 == 0)))
        })
        .build()
}

/// Builds the `demo.Greeter` class.
fn greeter() -> FixtureClass {
    FixtureClass::builder::<Greeter>("demo.Greeter")
        .constructor(&[ValueType::Text], |args| {
            Ok(Greeter {
                name: args.text(0)?.to_string(),
            })
        })
        .method("greet", &[], ValueType::Text, |greeter, _| {
            Ok(Some(Value::Text(format!("Hello, {}!", greeter.name))))
        })
        .method("rename", &[ValueType::Text], ValueType::Void, |greeter, args| {
            greeter.name = args.text(0)?.to_string();
            Ok(None)
        })
        .build()
}

/// Returns the registry of bundled demo fixtures.
pub fn registry() -> Arc<FixtureRegistry> {
    let mut registry = FixtureRegistry::new();
    registry.register(calculator()).register(greeter());
    Arc::new(registry)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
