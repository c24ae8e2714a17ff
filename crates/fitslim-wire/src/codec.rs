// crates/fitslim-wire/src/codec.rs
// ============================================================================
// Module: Slim List Codec
// Description: Depth-first length-prefixed encoding of text trees.
// Purpose: Convert instruction and result trees to and from message text.
// Dependencies: fitslim-core
// ============================================================================

//! ## Overview
//! A list is written as `[`, a six-digit zero-padded element count and `:`,
//! then each element as its six-digit byte length, `:`, its text and `:`,
//! and finally `]`. A list branch, empty or not, is written as an element
//! whose text is the nested encoded list, so an empty list travels as
//! `[000000:]` and never as empty text. Lengths count UTF-8 bytes and grow
//! past six digits only when a value needs it.
//!
//! Decoding is the inverse. An element whose text is itself a well-formed
//! list decodes as a nested tree; anything else stays a text leaf. Leaf text
//! that happens to be a well-formed list is indistinguishable on the wire and
//! decodes as a list.
//!
//! Security posture: message text is untrusted. Counts are checked against
//! the remaining input before allocating, and nesting deeper than
//! [`MAX_NESTING_DEPTH`] is kept as leaf text.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write;

use fitslim_core::Tree;

use crate::error::CodecError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Minimum digits written for every length or count prefix.
pub const LENGTH_WIDTH: usize = 6;
/// Maximum digits accepted in a length or count prefix.
pub const MAX_LENGTH_DIGITS: usize = 9;
/// Nested lists below this depth are not expanded.
pub const MAX_NESTING_DEPTH: usize = 64;
/// Smallest encoded element: `000000::`.
const MIN_ELEMENT_BYTES: usize = LENGTH_WIDTH + 2;

// ============================================================================
// SECTION: Encoding
// ============================================================================

/// Encodes the branches of `tree` as a Slim list.
///
/// The root value is not carried; only its branches are.
#[must_use]
pub fn encode(tree: &Tree<String>) -> String {
    let mut out = String::new();
    encode_into(tree, &mut out);
    out
}

/// Appends the encoded list for `tree` to `out`.
fn encode_into(tree: &Tree<String>, out: &mut String) {
    out.push('[');
    push_length(out, tree.branches().len());
    for branch in tree.branches() {
        if branch.is_list() {
            push_element(out, &encode(branch));
        } else {
            push_element(out, branch.value());
        }
    }
    out.push(']');
}

/// Appends one length-prefixed element.
fn push_element(out: &mut String, text: &str) {
    push_length(out, text.len());
    out.push_str(text);
    out.push(':');
}

/// Appends a zero-padded length prefix and its separator.
fn push_length(out: &mut String, length: usize) {
    let _ = write!(out, "{length:0width$}:", width = LENGTH_WIDTH);
}

// ============================================================================
// SECTION: Decoding
// ============================================================================

/// Decodes a complete Slim list into a tree.
///
/// # Errors
///
/// Returns [`CodecError`] when the text is not exactly one well-formed list.
pub fn decode(text: &str) -> Result<Tree<String>, CodecError> {
    decode_at_depth(text, 0)
}

/// Decodes a complete list, tracking nesting depth.
fn decode_at_depth(text: &str, depth: usize) -> Result<Tree<String>, CodecError> {
    let mut cursor = Cursor {
        text,
        offset: 0,
    };
    let tree = cursor.list(depth)?;
    if cursor.offset < text.len() {
        return Err(CodecError::TrailingData {
            offset: cursor.offset,
        });
    }
    Ok(tree)
}

/// Turns element text into a nested list when it is one, else a leaf.
fn decode_element(text: &str, depth: usize) -> Tree<String> {
    if depth < MAX_NESTING_DEPTH
        && text.starts_with('[')
        && text.ends_with(']')
        && let Ok(nested) = decode_at_depth(text, depth + 1)
    {
        return nested;
    }
    Tree::text(text)
}

/// Read position over list text.
struct Cursor<'a> {
    /// Full text being decoded.
    text: &'a str,
    /// Byte offset of the next unread byte.
    offset: usize,
}

impl<'a> Cursor<'a> {
    /// Returns the unread remainder.
    fn rest(&self) -> &'a str {
        self.text.get(self.offset ..).unwrap_or_default()
    }

    /// Consumes one list starting at the cursor.
    fn list(&mut self, depth: usize) -> Result<Tree<String>, CodecError> {
        self.expect('[')?;
        let count = self.length()?;
        if count > self.rest().len() / MIN_ELEMENT_BYTES {
            return Err(CodecError::InvalidLength {
                offset: self.offset,
            });
        }
        let mut branches = Vec::with_capacity(count);
        for _ in 0 .. count {
            let length = self.length()?;
            let text = self.take(length)?;
            self.expect(':')?;
            branches.push(decode_element(text, depth));
        }
        self.expect(']')?;
        Ok(Tree::list(branches))
    }

    /// Consumes a digit run terminated by `:` and returns its value.
    fn length(&mut self) -> Result<usize, CodecError> {
        let rest = self.rest();
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 || digits > MAX_LENGTH_DIGITS {
            return Err(CodecError::InvalidLength {
                offset: self.offset,
            });
        }
        let value = rest
            .get(.. digits)
            .and_then(|digits| digits.parse::<usize>().ok())
            .ok_or(CodecError::InvalidLength {
                offset: self.offset,
            })?;
        self.offset += digits;
        self.expect(':')?;
        Ok(value)
    }

    /// Consumes exactly `length` bytes of text.
    fn take(&mut self, length: usize) -> Result<&'a str, CodecError> {
        let end = self.offset.saturating_add(length);
        if end > self.text.len() {
            return Err(CodecError::Truncated {
                offset: self.text.len(),
            });
        }
        let text = self.text.get(self.offset .. end).ok_or(CodecError::InvalidLength {
            offset: self.offset,
        })?;
        self.offset = end;
        Ok(text)
    }

    /// Consumes one expected delimiter.
    fn expect(&mut self, delimiter: char) -> Result<(), CodecError> {
        if self.rest().starts_with(delimiter) {
            self.offset += delimiter.len_utf8();
            return Ok(());
        }
        if self.rest().is_empty() {
            return Err(CodecError::Truncated {
                offset: self.offset,
            });
        }
        Err(CodecError::MissingDelimiter {
            expected: delimiter,
            offset: self.offset,
        })
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
