// crates/fitslim-core/tests/session.rs
// ============================================================================
// Module: Session Tests
// Description: End-to-end batch execution against sample fixtures.
// Purpose: Verify ordering, partial failure, symbols, imports and libraries.
// ============================================================================
//! ## Overview
//! Drives a [`fitslim_core::Session`] with instruction batches and checks the
//! composed result entries.

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
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod support;

use fitslim_core::Tree;
use support::batch;
use support::instruction;
use support::result_id;
use support::result_text;
use support::session;

// ============================================================================
// SECTION: Ordering And Partial Failure
// ============================================================================

#[test]
fn failed_make_does_not_stop_later_instructions() {
    let mut session = session();
    let outcome = session.execute(&batch(vec![
        instruction(&["id1", "make", "foo", "ClassName"]),
        instruction(&["id2", "call", "foo", "methodName", "5"]),
    ]));
    assert_eq!(outcome.executed, 2);
    assert_eq!(outcome.failures, 2);
    assert_eq!(result_id(&outcome.results, 0), "id1");
    assert_eq!(result_id(&outcome.results, 1), "id2");
    assert!(
        result_text(&outcome.results, 0).starts_with("__EXCEPTION__:message:<<NO_CLASS ClassName>> ")
    );
    assert!(result_text(&outcome.results, 1).starts_with("__EXCEPTION__:message:<<NO_INSTANCE foo>> "));
}

#[test]
fn make_and_call_compose_results_in_order() {
    let mut session = session();
    let outcome = session.execute(&batch(vec![
        instruction(&["m", "make", "calc", "demo.Calculator", "10"]),
        instruction(&["a", "call", "calc", "add", "5"]),
        instruction(&["t", "call", "calc", "total"]),
        instruction(&["p", "call", "calc", "isPositive"]),
        instruction(&["h", "call", "calc", "half"]),
        instruction(&["n", "call", "calc", "nothing"]),
    ]));
    assert_eq!(outcome.failures, 0);
    let texts: Vec<String> = (0 .. 6).map(|index| result_text(&outcome.results, index)).collect();
    assert_eq!(texts, ["OK", "/__VOID__/", "15", "true", "7.5", "null"]);
}

#[test]
fn list_results_compose_as_nested_trees() {
    let mut session = session();
    let outcome = session.execute(&batch(vec![
        instruction(&["m", "make", "calc", "demo.Calculator", "305"]),
        instruction(&["d", "call", "calc", "digits"]),
    ]));
    let digits = outcome.results.branch_at(&[1, 1]).unwrap();
    assert_eq!(digits, &Tree::text_list(["3", "0", "5"]));
}

#[test]
fn empty_list_results_stay_lists() {
    let mut session = session();
    let outcome = session.execute(&batch(vec![
        instruction(&["m", "make", "calc", "demo.Calculator", "20"]),
        instruction(&["o", "call", "calc", "oddDigits"]),
    ]));
    assert_eq!(outcome.failures, 0);
    let odd = outcome.results.branch_at(&[1, 1]).unwrap();
    assert!(odd.is_list());
    assert!(odd.branches().is_empty());
    assert_ne!(odd, &Tree::text(""));
}

#[test]
fn empty_list_argument_parses_as_empty_list() {
    let mut session = session();
    let call = Tree::list(vec![
        Tree::text("s"),
        Tree::text("call"),
        Tree::text("calc"),
        Tree::text("sum"),
        Tree::list(Vec::new()),
    ]);
    let outcome = session.execute(&batch(vec![
        instruction(&["m", "make", "calc", "demo.Calculator"]),
        call,
    ]));
    assert_eq!(result_text(&outcome.results, 1), "0");
}

#[test]
fn list_arguments_are_parsed_from_nested_trees() {
    let mut session = session();
    let call = Tree::list(vec![
        Tree::text("s"),
        Tree::text("call"),
        Tree::text("calc"),
        Tree::text("sum"),
        Tree::text_list(["1", "2", "39"]),
    ]);
    let outcome = session.execute(&batch(vec![
        instruction(&["m", "make", "calc", "demo.Calculator"]),
        call,
    ]));
    assert_eq!(result_text(&outcome.results, 1), "42");
}

#[test]
fn missing_members_and_constructors_report_codes() {
    let mut session = session();
    let outcome = session.execute(&batch(vec![
        instruction(&["m1", "make", "calc", "demo.Calculator", "1", "2"]),
        instruction(&["m2", "make", "calc", "demo.Calculator"]),
        instruction(&["c1", "call", "calc", "garbage"]),
        instruction(&["c2", "call", "calc", "add"]),
    ]));
    assert!(
        result_text(&outcome.results, 0)
            .starts_with("__EXCEPTION__:message:<<NO_CONSTRUCTOR demo.Calculator>> ")
    );
    assert_eq!(result_text(&outcome.results, 1), "OK");
    assert!(
        result_text(&outcome.results, 2)
            .starts_with("__EXCEPTION__:message:<<NO_METHOD_IN_CLASS garbage demo.Calculator>> ")
    );
    assert!(
        result_text(&outcome.results, 3)
            .starts_with("__EXCEPTION__:message:<<NO_METHOD_IN_CLASS add demo.Calculator>> ")
    );
}

#[test]
fn fixture_failures_embed_type_and_message() {
    let mut session = session();
    let outcome = session.execute(&batch(vec![
        instruction(&["m", "make", "calc", "demo.Calculator", "9"]),
        instruction(&["d", "call", "calc", "divide", "0"]),
        instruction(&["p", "call", "calc", "divide", "nine"]),
    ]));
    assert_eq!(result_text(&outcome.results, 1), "__EXCEPTION__:DivideByZero: cannot divide by zero");
    assert_eq!(result_text(&outcome.results, 2), "__EXCEPTION__:cannot parse 'nine' as int");
}

#[test]
fn malformed_instructions_keep_their_slot() {
    let mut session = session();
    let outcome = session.execute(&batch(vec![
        instruction(&["x1", "frobnicate", "stuff"]),
        instruction(&["x2"]),
        instruction(&["ok", "import", "demo"]),
    ]));
    assert_eq!(outcome.executed, 3);
    assert_eq!(
        result_text(&outcome.results, 0),
        "__EXCEPTION__:message:<<MALFORMED_INSTRUCTION x1,frobnicate,stuff>> \
         malformed instruction [x1,frobnicate,stuff]"
    );
    assert_eq!(result_id(&outcome.results, 1), "x2");
    assert_eq!(result_text(&outcome.results, 2), "OK");
}

#[test]
fn rebinding_an_instance_id_replaces_it() {
    let mut session = session();
    let outcome = session.execute(&batch(vec![
        instruction(&["m1", "make", "calc", "demo.Calculator", "1"]),
        instruction(&["m2", "make", "calc", "demo.Calculator", "2"]),
        instruction(&["t", "call", "calc", "total"]),
    ]));
    assert_eq!(result_text(&outcome.results, 2), "2");
    assert_eq!(session.instances().len(), 1);
}

// ============================================================================
// SECTION: Overloads, Imports, Symbols, Libraries
// ============================================================================

#[test]
fn first_registered_overload_wins_for_equal_arity() {
    let mut session = session();
    let outcome = session.execute(&batch(vec![
        instruction(&["m", "make", "calc", "demo.Calculator"]),
        instruction(&["p1", "call", "calc", "pick", "5"]),
        instruction(&["p2", "call", "calc", "pick", "text"]),
    ]));
    assert_eq!(result_text(&outcome.results, 1), "first");
    assert!(result_text(&outcome.results, 2).starts_with("__EXCEPTION__:cannot parse 'text' as int"));
}

#[test]
fn imports_extend_class_resolution() {
    let mut session = session();
    let outcome = session.execute(&batch(vec![
        instruction(&["m1", "make", "calc", "Calculator"]),
        instruction(&["i", "import", "demo"]),
        instruction(&["m2", "make", "calc", "Calculator"]),
    ]));
    assert!(result_text(&outcome.results, 0).contains("<<NO_CLASS Calculator>>"));
    assert_eq!(result_text(&outcome.results, 2), "OK");
    assert_eq!(session.search_path(), ["demo".to_string()]);
}

#[test]
fn call_and_assign_binds_symbols_for_later_arguments() {
    let mut session = session();
    let outcome = session.execute(&batch(vec![
        instruction(&["m", "make", "calc", "demo.Calculator", "20"]),
        instruction(&["s", "callAndAssign", "value", "calc", "total"]),
        instruction(&["a", "call", "calc", "add", "$value"]),
        instruction(&["e", "call", "calc", "echo", "total=$value, missing=$nope"]),
        instruction(&["t", "call", "calc", "total"]),
    ]));
    assert_eq!(result_text(&outcome.results, 1), "20");
    assert_eq!(result_text(&outcome.results, 3), "total=20, missing=$nope");
    assert_eq!(result_text(&outcome.results, 4), "40");
    assert_eq!(session.symbols().get("value"), Some(&Tree::text("20")));
}

#[test]
fn library_instances_answer_missing_methods_most_recent_first() {
    let mut session = session();
    let outcome = session.execute(&batch(vec![
        instruction(&["m", "make", "calc", "demo.Calculator", "3"]),
        instruction(&["l1", "make", "library1", "demo.Helper", "hello"]),
        instruction(&["l2", "make", "library2", "demo.Helper", "hi"]),
        instruction(&["g", "call", "calc", "greet", "bob"]),
        instruction(&["t", "call", "calc", "total"]),
    ]));
    assert_eq!(result_text(&outcome.results, 3), "hi bob");
    assert_eq!(result_text(&outcome.results, 4), "3");
}

#[test]
fn state_persists_across_batches_until_end() {
    let mut session = session();
    session.execute(&batch(vec![instruction(&["m", "make", "calc", "demo.Calculator", "4"])]));
    let second = session.execute(&batch(vec![instruction(&["t", "call", "calc", "total"])]));
    assert_eq!(result_text(&second.results, 0), "4");

    session.end();
    let third = session.execute(&batch(vec![instruction(&["t", "call", "calc", "total"])]));
    assert!(result_text(&third.results, 0).contains("<<NO_INSTANCE calc>>"));
}

#[test]
fn sessions_do_not_share_instances() {
    let mut first = session();
    let mut second = session();
    first.execute(&batch(vec![instruction(&["m", "make", "calc", "demo.Calculator"])]));
    let outcome = second.execute(&batch(vec![instruction(&["t", "call", "calc", "total"])]));
    assert!(result_text(&outcome.results, 0).contains("<<NO_INSTANCE calc>>"));
}
