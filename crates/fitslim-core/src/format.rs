// crates/fitslim-core/src/format.rs
// ============================================================================
// Module: Format Context
// Description: Explicit, locale-free formatting rules for composed text.
// Purpose: Keep numeric output byte-exact across hosts and sessions.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Composition never consults process or thread state to format values. Each
//! [`crate::Processor`] owns a [`FormatContext`] value, which defaults to the
//! invariant convention (`.` decimal separator, `Infinity`/`NaN` spellings).
//! A session that installs a different context affects only its own
//! processor.

// ============================================================================
// SECTION: Format Context
// ============================================================================

/// Formatting rules applied by the compose subsystem.
///
/// # Invariants
/// - [`FormatContext::invariant`] output is identical on every host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatContext {
    /// Character placed between integral and fractional digits.
    decimal_separator: char,
}

impl FormatContext {
    /// Returns the invariant formatting convention.
    #[must_use]
    pub const fn invariant() -> Self {
        Self {
            decimal_separator: '.',
        }
    }

    /// Returns a context using a custom decimal separator.
    #[must_use]
    pub const fn with_decimal_separator(decimal_separator: char) -> Self {
        Self {
            decimal_separator,
        }
    }

    /// Returns the configured decimal separator.
    #[must_use]
    pub const fn decimal_separator(&self) -> char {
        self.decimal_separator
    }

    /// Formats a signed integer.
    #[must_use]
    pub fn format_int(&self, value: i64) -> String {
        value.to_string()
    }

    /// Formats a float using the shortest round-trip representation.
    #[must_use]
    pub fn format_float(&self, value: f64) -> String {
        if value.is_nan() {
            return "NaN".to_string();
        }
        if value.is_infinite() {
            return if value.is_sign_positive() { "Infinity" } else { "-Infinity" }.to_string();
        }
        let text = value.to_string();
        if self.decimal_separator == '.' {
            text
        } else {
            text.replace('.', &self.decimal_separator.to_string())
        }
    }
}

impl Default for FormatContext {
    fn default() -> Self {
        Self::invariant()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
