// crates/fitslim-config/src/exclusions.rs
// ============================================================================
// Module: File Exclusions
// Description: Ordered regular-expression list for skipping test files.
// Purpose: Decide which test file names a run should ignore.
// Dependencies: regex
// ============================================================================

//! ## Overview
//! A name is excluded when any pattern matches anywhere in it. Patterns are
//! unanchored, so `^` and `$` must be written explicitly when needed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regex::Regex;

use crate::config::ConfigError;

// ============================================================================
// SECTION: File Exclusions
// ============================================================================

/// Compiled exclusion patterns in configuration order.
#[derive(Debug, Clone, Default)]
pub struct FileExclusions {
    /// Compiled patterns.
    patterns: Vec<Regex>,
}

impl FileExclusions {
    /// Compiles the given patterns.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first pattern that fails
    /// to compile.
    pub fn new<I, S>(patterns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut compiled = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let regex = Regex::new(pattern).map_err(|err| {
                ConfigError::Invalid(format!("exclusions.patterns: invalid pattern {pattern}: {err}"))
            })?;
            compiled.push(regex);
        }
        Ok(Self {
            patterns: compiled,
        })
    }

    /// Returns true when any pattern matches `name`.
    #[must_use]
    pub fn is_excluded(&self, name: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(name))
    }

    /// Returns the first pattern matching `name`.
    #[must_use]
    pub fn matching_pattern(&self, name: &str) -> Option<&str> {
        self.patterns.iter().find(|pattern| pattern.is_match(name)).map(Regex::as_str)
    }

    /// Returns the number of patterns.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns true when no patterns are configured.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
