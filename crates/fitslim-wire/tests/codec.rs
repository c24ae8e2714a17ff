// crates/fitslim-wire/tests/codec.rs
// ============================================================================
// Module: Codec Tests
// Description: Byte-exact list encoding and malformed input handling.
// Purpose: Pin the Slim list format and its failure modes.
// ============================================================================
//! ## Overview
//! Checks literal encodings, nested lists, multi-byte text, malformed
//! prefixes, and decoding as the inverse of encoding.

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

use fitslim_core::SlimError;
use fitslim_core::Processor;
use fitslim_core::Tree;
use fitslim_core::TypedValue;
use fitslim_core::ValueType;
use fitslim_wire::CodecError;
use fitslim_wire::decode;
use fitslim_wire::encode;
use proptest::prelude::*;

// ============================================================================
// SECTION: Encoding
// ============================================================================

#[test]
fn flat_list_encodes_with_counts_and_lengths() {
    let tree = Tree::text_list(["hello", "world"]);
    assert_eq!(encode(&tree), "[000002:000005:hello:000005:world:]");
}

#[test]
fn empty_list_encodes_as_zero_count() {
    assert_eq!(encode(&Tree::list(Vec::new())), "[000000:]");
}

#[test]
fn composed_empty_list_result_travels_as_a_list() {
    let composed =
        Processor::standard().compose(&TypedValue::list(ValueType::Text, Vec::new())).unwrap();
    assert_ne!(composed, Tree::text(""));
    let response = Tree::list(vec![Tree::list(vec![Tree::text("id"), composed])]);
    let wire = encode(&response);
    assert_eq!(wire, "[000001:000036:[000002:000002:id:000009:[000000:]:]:]");
    let decoded = decode(&wire).unwrap();
    assert!(decoded.branch_at(&[0, 1]).unwrap().is_list());
    assert!(decoded.branch_at(&[0, 1]).unwrap().branches().is_empty());
}

#[test]
fn nested_list_is_an_element_holding_an_encoded_list() {
    let tree = Tree::list(vec![Tree::text("id"), Tree::text_list(["a", "bc"])]);
    assert_eq!(encode(&tree), "[000002:000002:id:000028:[000002:000001:a:000002:bc:]:]");
}

#[test]
fn lengths_count_utf8_bytes() {
    let tree = Tree::text_list(["caf\u{e9}"]);
    assert_eq!(encode(&tree), "[000001:000005:caf\u{e9}:]");
}

#[test]
fn instruction_batch_matches_reference_message() {
    let batch = Tree::list(vec![Tree::text_list(["id1", "make", "foo", "ClassName"])]);
    assert_eq!(
        encode(&batch),
        "[000001:000060:[000004:000003:id1:000004:make:000003:foo:000009:ClassName:]:]"
    );
}

// ============================================================================
// SECTION: Decoding
// ============================================================================

#[test]
fn decodes_nested_instruction_lists() {
    let text = "[000002:000049:[000004:000002:m1:000004:make:000001:c:000001:C:]:\
                000049:[000004:000002:c1:000004:call:000001:c:000001:f:]:]";
    let tree = decode(text).unwrap();
    assert_eq!(tree.branches().len(), 2);
    assert_eq!(tree.branch_at(&[0]).unwrap(), &Tree::text_list(["m1", "make", "c", "C"]));
    assert_eq!(tree.value_at(&[1, 1]).unwrap(), "call");
}

#[test]
fn element_text_may_contain_delimiters() {
    let tree = decode("[000001:000005:a:]b[:]").unwrap();
    assert_eq!(tree, Tree::text_list(["a:]b["]));
}

#[test]
fn truncated_input_is_rejected() {
    assert!(matches!(decode("[000001:000001:a:"), Err(CodecError::Truncated { .. })));
    assert!(matches!(decode("[000001:000009:abc:]"), Err(CodecError::Truncated { .. })));
}

#[test]
fn malformed_prefixes_are_rejected() {
    assert!(matches!(decode("[x00001:]"), Err(CodecError::InvalidLength { .. })));
    assert!(matches!(decode("000001:000001:a:]"), Err(CodecError::MissingDelimiter {
        expected: '[',
        ..
    })));
    assert!(matches!(decode("[000001:000001:ab]"), Err(CodecError::MissingDelimiter {
        expected: ':',
        ..
    })));
    assert!(matches!(decode("[000000:]extra"), Err(CodecError::TrailingData {
        offset: 9,
    })));
}

#[test]
fn bracketed_leaf_text_survives_when_it_is_not_a_list() {
    let tree = Tree::text_list(["[", "[]", "[x]", "]["]);
    assert_eq!(decode(&encode(&tree)).unwrap(), tree);
}

#[test]
fn bracketed_leaf_that_is_a_list_decodes_as_a_list() {
    let tree = Tree::text_list(["[0:]"]);
    let decoded = decode(&encode(&tree)).unwrap();
    assert_eq!(decoded, Tree::list(vec![Tree::list(Vec::new())]));
}

#[test]
fn codec_errors_become_malformed_instructions() {
    let error = SlimError::from(CodecError::Truncated {
        offset: 3,
    });
    assert_eq!(error.code(), Some("MALFORMED_INSTRUCTION"));
    assert_eq!(error.message_block(), "message:<<MALFORMED_INSTRUCTION truncated input at byte 3>> ");
}

// ============================================================================
// SECTION: Properties
// ============================================================================

/// Generates text trees with empty nested lists and bracketed leaf text.
///
/// Leaf text that spells a well-formed list is skipped; it decodes as that
/// list, which `bracketed_leaf_that_is_a_list_decodes_as_a_list` pins.
fn tree_strategy() -> impl Strategy<Value = Tree<String>> {
    let leaf = "[a-z0-9 :\\[\\]\u{e9}]{0,8}"
        .prop_filter("leaf text spelling a list decodes as a list", |text| decode(text).is_err())
        .prop_map(Tree::text);
    leaf.prop_recursive(4, 64, 5, |inner| {
        prop::collection::vec(inner, 0 .. 5).prop_map(Tree::list)
    })
}

proptest! {
    #[test]
    fn decode_inverts_encode(branches in prop::collection::vec(tree_strategy(), 0 .. 5)) {
        let tree = Tree::list(branches);
        let decoded = decode(&encode(&tree)).unwrap();
        prop_assert_eq!(decoded, tree);
    }
}
