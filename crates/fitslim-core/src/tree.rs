// crates/fitslim-core/src/tree.rs
// ============================================================================
// Module: Tree Model
// Description: Ordered n-ary tree of values used for instructions and results.
// Purpose: Provide the universal in-memory shape exchanged by every subsystem.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! A [`Tree`] is a value plus an ordered list of child trees. Instructions
//! decoded from the wire, composed results, and test tables all share this
//! shape. Trees are built by value (each builder method consumes `self`) and
//! are read-only once handed to a consumer. Equality is structural.
//!
//! Invariants:
//! - A node is either a leaf or a list. A list stays a list when it has no
//!   branches, so an empty list and an empty text leaf are distinct.
//! - Path addressing descends one branch index per path element.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while addressing a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// A path element indexed past the end of a branch list.
    #[error("tree path out of range: [{}]", format_path(.path))]
    PathOutOfRange {
        /// Full path that failed to resolve.
        path: Vec<usize>,
    },
}

/// Renders a tree path as comma-separated indices.
fn format_path(path: &[usize]) -> String {
    path.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}

// ============================================================================
// SECTION: Tree
// ============================================================================

/// Ordered n-ary tree carrying a value at every node.
///
/// # Invariants
/// - Branch order is significant and preserved by every operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tree<T> {
    /// Value held at this node.
    value: T,
    /// Ordered child trees.
    branches: Vec<Self>,
    /// True for list nodes, including empty ones.
    list: bool,
}

impl<T> Tree<T> {
    /// Creates a leaf tree holding `value`.
    #[must_use]
    pub const fn leaf(value: T) -> Self {
        Self {
            value,
            branches: Vec::new(),
            list: false,
        }
    }

    /// Creates a list node from a node value and its branches.
    #[must_use]
    pub const fn node(value: T, branches: Vec<Self>) -> Self {
        Self {
            value,
            branches,
            list: true,
        }
    }

    /// Appends a branch and returns the extended tree, which is now a list.
    #[must_use]
    pub fn with_branch(mut self, branch: Self) -> Self {
        self.branches.push(branch);
        self.list = true;
        self
    }

    /// Appends a leaf branch holding `value` and returns the extended tree.
    #[must_use]
    pub fn add_branch_value(self, value: T) -> Self {
        self.with_branch(Self::leaf(value))
    }

    /// Returns the value held at this node.
    #[must_use]
    pub const fn value(&self) -> &T {
        &self.value
    }

    /// Returns the ordered branches of this node.
    #[must_use]
    pub fn branches(&self) -> &[Self] {
        &self.branches
    }

    /// Returns true when the node is not a list.
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        !self.list
    }

    /// Returns true for list nodes, including empty ones.
    #[must_use]
    pub const fn is_list(&self) -> bool {
        self.list
    }

    /// Consumes the tree and returns its value and branches.
    #[must_use]
    pub fn into_parts(self) -> (T, Vec<Self>) {
        (self.value, self.branches)
    }

    /// Resolves the subtree at `path`.
    ///
    /// An empty path resolves to `self`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::PathOutOfRange`] when any index is out of bounds.
    pub fn branch_at(&self, path: &[usize]) -> Result<&Self, TreeError> {
        let mut current = self;
        for index in path {
            current = current.branches.get(*index).ok_or_else(|| TreeError::PathOutOfRange {
                path: path.to_vec(),
            })?;
        }
        Ok(current)
    }

    /// Resolves the value at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::PathOutOfRange`] when any index is out of bounds.
    pub fn value_at(&self, path: &[usize]) -> Result<&T, TreeError> {
        self.branch_at(path).map(Self::value)
    }

    /// Maps every value in the tree, preserving shape.
    #[must_use]
    pub fn map<U>(&self, f: &impl Fn(&T) -> U) -> Tree<U> {
        Tree {
            value: f(&self.value),
            branches: self.branches.iter().map(|branch| branch.map(f)).collect(),
            list: self.list,
        }
    }
}

impl<T: Default> Tree<T> {
    /// Creates a node with a default value and the given branches.
    #[must_use]
    pub fn list(branches: Vec<Self>) -> Self {
        Self::node(T::default(), branches)
    }
}

impl<T> From<T> for Tree<T> {
    fn from(value: T) -> Self {
        Self::leaf(value)
    }
}

impl Tree<String> {
    /// Creates a text leaf.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::leaf(value.into())
    }

    /// Creates a list node whose branches are text leaves.
    #[must_use]
    pub fn text_list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::list(values.into_iter().map(Self::text).collect())
    }

    /// Returns the leaf values of the direct branches as text.
    ///
    /// Nested branches contribute their node value, which is empty for lists.
    #[must_use]
    pub fn branch_texts(&self) -> Vec<&str> {
        self.branches.iter().map(|branch| branch.value.as_str()).collect()
    }
}
