// crates/fitslim-core/tests/tree.rs
// ============================================================================
// Module: Tree And Instruction Tests
// Description: Tree addressing, equality and instruction decoding.
// Purpose: Ensure structural semantics and malformed shapes are detected.
// ============================================================================
//! ## Overview
//! Covers path addressing, structural equality, and verb decoding.

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

use fitslim_core::Instruction;
use fitslim_core::Operation;
use fitslim_core::SlimError;
use fitslim_core::Tree;
use fitslim_core::TreeError;

// ============================================================================
// SECTION: Tree
// ============================================================================

#[test]
fn value_at_descends_one_branch_per_index() {
    let tree = Tree::text("root")
        .add_branch_value("a".to_string())
        .with_branch(Tree::text_list(["b", "c"]));
    assert_eq!(tree.value_at(&[]).unwrap(), "root");
    assert_eq!(tree.value_at(&[0]).unwrap(), "a");
    assert_eq!(tree.value_at(&[1, 1]).unwrap(), "c");
    assert!(tree.branch_at(&[0]).unwrap().is_leaf());
}

#[test]
fn value_at_rejects_out_of_range_paths() {
    let tree = Tree::text_list(["a"]);
    let error = tree.value_at(&[0, 2]).unwrap_err();
    assert_eq!(error, TreeError::PathOutOfRange {
        path: vec![0, 2],
    });
    assert_eq!(error.to_string(), "tree path out of range: [0,2]");
}

#[test]
fn equality_is_structural() {
    let left = Tree::text_list(["x", "y"]);
    let right = Tree::list(vec![Tree::text("x"), Tree::text("y")]);
    assert_eq!(left, right);
    assert_ne!(left, Tree::text_list(["y", "x"]));
    assert_ne!(Tree::text("x"), Tree::text_list(["x"]));
}

#[test]
fn empty_list_is_not_an_empty_leaf() {
    let empty = Tree::<String>::list(Vec::new());
    assert!(empty.is_list());
    assert!(!empty.is_leaf());
    assert_ne!(empty, Tree::text(""));
    assert!(Tree::text("").with_branch(Tree::text("a")).is_list());
    assert!(empty.map(&String::len).is_list());
}

#[test]
fn map_preserves_shape() {
    let tree = Tree::text_list(["1", "22"]);
    let lengths = tree.map(&String::len);
    assert_eq!(lengths.value_at(&[1]).unwrap(), &2);
    assert_eq!(lengths.branches().len(), 2);
}

// ============================================================================
// SECTION: Instructions
// ============================================================================

#[test]
fn verbs_decode_into_operations() {
    let make = Instruction::decode(&Tree::text_list(["1", "make", "c", "Calc", "7"])).unwrap();
    assert_eq!(make.id, "1");
    assert_eq!(make.operation, Operation::Make {
        instance: "c".to_string(),
        class: "Calc".to_string(),
        args: vec![Tree::text("7")],
    });

    let assign =
        Instruction::decode(&Tree::text_list(["2", "callAndAssign", "v", "c", "total"])).unwrap();
    assert_eq!(assign.operation, Operation::CallAndAssign {
        symbol: "v".to_string(),
        instance: "c".to_string(),
        method: "total".to_string(),
        args: Vec::new(),
    });

    let import = Instruction::decode(&Tree::text_list(["3", "import", "demo"])).unwrap();
    assert_eq!(import.operation, Operation::Import {
        path: "demo".to_string(),
    });
}

#[test]
fn verbs_are_case_sensitive() {
    let error = Instruction::decode(&Tree::text_list(["1", "Make", "c", "Calc"])).unwrap_err();
    assert_eq!(error, SlimError::malformed(["1", "Make", "c", "Calc"]));
}

#[test]
fn short_or_nested_names_are_malformed() {
    let short = Instruction::decode(&Tree::text_list(["1", "call", "c"])).unwrap_err();
    assert_eq!(short.code(), Some("MALFORMED_INSTRUCTION"));

    let nested = Tree::list(vec![
        Tree::text("1"),
        Tree::text("call"),
        Tree::text_list(["a", "b"]),
        Tree::text("m"),
    ]);
    let error = Instruction::decode(&nested).unwrap_err();
    assert_eq!(error.message_block(), "message:<<MALFORMED_INSTRUCTION 1,call,[a,b],m>> ");
    assert_eq!(Instruction::peek_id(&nested), "1");
}
