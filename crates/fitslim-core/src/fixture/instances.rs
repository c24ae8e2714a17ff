// crates/fitslim-core/src/fixture/instances.rs
// ============================================================================
// Module: Session Tables
// Description: Instance and symbol tables owned by one session.
// Purpose: Hold fixture objects and assigned symbols between instructions.
// Dependencies: crate::{error, fixture, tree}
// ============================================================================

//! ## Overview
//! The instance table maps ids to live fixture objects; binding an existing
//! id replaces it. The table remembers binding order so library instances
//! can be consulted most recent first. The symbol table holds composed
//! values assigned by `callAndAssign` and substitutes `$name` references.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::SlimError;
use crate::error::SlimResult;
use crate::fixture::FixtureClass;
use crate::fixture::FixtureObject;
use crate::tree::Tree;

/// Id prefix that marks library instances.
pub const LIBRARY_PREFIX: &str = "library";

// ============================================================================
// SECTION: Instances
// ============================================================================

/// Fixture object bound in an instance table.
pub struct Instance {
    /// Class the object was constructed from.
    class: Arc<FixtureClass>,
    /// Live fixture object.
    object: FixtureObject,
}

impl Instance {
    /// Pairs a constructed object with its class.
    #[must_use]
    pub fn new(class: Arc<FixtureClass>, object: FixtureObject) -> Self {
        Self {
            class,
            object,
        }
    }

    /// Returns the instance's class.
    #[must_use]
    pub fn class(&self) -> &Arc<FixtureClass> {
        &self.class
    }

    /// Returns the instance's class name.
    #[must_use]
    pub fn class_name(&self) -> &str {
        self.class.name()
    }

    /// Returns the object for method invocation.
    pub fn object_mut(&mut self) -> &mut (dyn Any + Send) {
        self.object.as_mut()
    }
}

/// Session-scoped mapping from instance id to fixture object.
///
/// # Invariants
/// - Each id is bound at most once; rebinding replaces the previous object.
/// - `order` lists every bound id exactly once, oldest first.
#[derive(Default)]
pub struct InstanceTable {
    /// Bound instances.
    entries: HashMap<String, Instance>,
    /// Binding order, oldest first.
    order: Vec<String>,
}

impl InstanceTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds an instance under `id`, replacing any previous binding.
    pub fn bind(&mut self, id: impl Into<String>, instance: Instance) {
        let id = id.into();
        self.order.retain(|existing| existing != &id);
        self.order.push(id.clone());
        self.entries.insert(id, instance);
    }

    /// Returns the instance bound under `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Instance> {
        self.entries.get(id)
    }

    /// Returns the instance bound under `id` for mutation.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Instance> {
        self.entries.get_mut(id)
    }

    /// Returns the instance bound under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`SlimError::MemoryMissing`] when `id` is unbound.
    pub fn require(&self, id: &str) -> SlimResult<&Instance> {
        self.entries.get(id).ok_or_else(|| SlimError::MemoryMissing {
            id: id.to_string(),
        })
    }

    /// Returns true when `id` is bound.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Returns the number of bound instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no instance is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns library instance ids, most recently bound first.
    pub fn library_ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().rev().map(String::as_str).filter(|id| id.starts_with(LIBRARY_PREFIX))
    }

    /// Releases every instance.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

// ============================================================================
// SECTION: Symbols
// ============================================================================

/// Session-scoped symbol assignments.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    /// Composed values by symbol name, without the `$` sigil.
    values: HashMap<String, Tree<String>>,
}

impl SymbolTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a composed value to a symbol, replacing any previous value.
    pub fn assign(&mut self, name: impl Into<String>, value: Tree<String>) {
        self.values.insert(name.into(), value);
    }

    /// Returns the value assigned to `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Tree<String>> {
        self.values.get(name)
    }

    /// Substitutes symbol references throughout an argument tree.
    ///
    /// A leaf that is exactly `$name` is replaced by the assigned tree, so
    /// list values survive. Otherwise each `$name` inside leaf text is
    /// replaced by the assigned leaf text; unknown names stay verbatim.
    #[must_use]
    pub fn substitute(&self, argument: &Tree<String>) -> Tree<String> {
        if !argument.is_leaf() {
            let branches = argument.branches().iter().map(|branch| self.substitute(branch)).collect();
            return Tree::node(argument.value().clone(), branches);
        }
        let text = argument.value();
        if let Some(value) = text.strip_prefix('$').and_then(|name| self.values.get(name)) {
            return value.clone();
        }
        Tree::text(self.substitute_text(text))
    }

    /// Replaces each `$name` in `text` with the assigned leaf text.
    #[must_use]
    pub fn substitute_text(&self, text: &str) -> String {
        if self.values.is_empty() || !text.contains('$') {
            return text.to_string();
        }
        let mut output = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find('$') {
            output.push_str(&rest[.. start]);
            let after = &rest[start + 1 ..];
            let name_len = after
                .char_indices()
                .find(|(_, ch)| !(ch.is_alphanumeric() || *ch == '_'))
                .map_or(after.len(), |(index, _)| index);
            let name = &after[.. name_len];
            match self.values.get(name).filter(|value| value.is_leaf()) {
                Some(value) if !name.is_empty() => output.push_str(value.value()),
                _ => {
                    output.push('$');
                    output.push_str(name);
                }
            }
            rest = &after[name_len ..];
        }
        output.push_str(rest);
        output
    }
}
