// crates/fitslim-core/src/run/mod.rs
// ============================================================================
// Module: Run Dispatch
// Description: Whole-test dispatch across table-style handlers.
// Purpose: Let several table conventions share one engine entry point.
// Dependencies: crate::{error, tree, value}
// ============================================================================

//! ## Overview
//! A test is a tree of tables, each table a list of rows, each row a list of
//! cells. [`RunDispatcher`] asks its handlers in order whether they can run
//! the tables and lets the first that accepts drive the test, reporting
//! cell marks and final counts to a [`StoryTestWriter`].

// ============================================================================
// SECTION: Modules
// ============================================================================

mod script;

pub use script::InstructionTableRunner;
pub use script::ScriptTableRunner;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::error::Capability;
use crate::error::SlimError;
use crate::error::SlimResult;
use crate::tree::Tree;
use crate::value::TypedValue;
use crate::value::Value;
use crate::value::ValueType;

// ============================================================================
// SECTION: Counts
// ============================================================================

/// Tally of cell outcomes for one test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TestCounts {
    /// Passing assertions.
    pub right: u64,
    /// Failing assertions.
    pub wrong: u64,
    /// Skipped cells.
    pub ignores: u64,
    /// Cells that raised failures.
    pub exceptions: u64,
}

impl TestCounts {
    /// Records one cell mark.
    pub fn tally(&mut self, mark: &CellMark) {
        match mark {
            CellMark::Right => self.right += 1,
            CellMark::Wrong {
                ..
            } => self.wrong += 1,
            CellMark::Ignore => self.ignores += 1,
            CellMark::Exception {
                ..
            } => self.exceptions += 1,
            CellMark::Show {
                ..
            } => {}
        }
    }

    /// Returns true when nothing failed.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.wrong == 0 && self.exceptions == 0
    }

    /// Returns the counts as an integer list value.
    #[must_use]
    pub fn to_typed_value(&self) -> TypedValue {
        let counts = [self.right, self.wrong, self.ignores, self.exceptions];
        TypedValue::list(
            ValueType::Int,
            counts
                .iter()
                .map(|count| TypedValue::int(i64::try_from(*count).unwrap_or(i64::MAX)))
                .collect(),
        )
    }

    /// Reads counts back from a summary value.
    #[must_use]
    pub fn from_typed_value(value: &TypedValue) -> Option<Self> {
        let elements = value.value().and_then(Value::as_list)?;
        let mut counts = elements
            .iter()
            .map(|element| element.value().and_then(Value::as_int).and_then(|n| u64::try_from(n).ok()));
        let summary = Self {
            right: counts.next()??,
            wrong: counts.next()??,
            ignores: counts.next()??,
            exceptions: counts.next()??,
        };
        if counts.next().is_some() {
            return None;
        }
        Some(summary)
    }
}

// ============================================================================
// SECTION: Story Test Writer
// ============================================================================

/// Outcome reported for one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellMark {
    /// Assertion passed.
    Right,
    /// Assertion failed; carries the composed actual text.
    Wrong {
        /// Actual text.
        actual: String,
    },
    /// Cell was not evaluated.
    Ignore,
    /// Cell raised a failure; carries composed exception text.
    Exception {
        /// Exception text.
        message: String,
    },
    /// Informational value that is not counted.
    Show {
        /// Displayed text.
        value: String,
    },
}

/// Cell address inside a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    /// Table index.
    pub table: usize,
    /// Row index within the table.
    pub row: usize,
    /// Cell index within the row.
    pub cell: usize,
}

/// Progress sink for a running test.
pub trait StoryTestWriter {
    /// Records the mark for one cell.
    fn write_cell(&mut self, cell: CellRef, mark: &CellMark);

    /// Records the final counts.
    fn write_counts(&mut self, counts: &TestCounts);
}

/// Writer that keeps every notification in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter {
    /// Cell marks in report order.
    cells: Vec<(CellRef, CellMark)>,
    /// Final counts, once reported.
    counts: Option<TestCounts>,
}

impl MemoryWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded cell marks.
    #[must_use]
    pub fn cells(&self) -> &[(CellRef, CellMark)] {
        &self.cells
    }

    /// Returns the mark recorded for a cell, if any.
    #[must_use]
    pub fn mark_at(&self, table: usize, row: usize, cell: usize) -> Option<&CellMark> {
        let target = CellRef {
            table,
            row,
            cell,
        };
        self.cells.iter().find(|(at, _)| *at == target).map(|(_, mark)| mark)
    }

    /// Returns the final counts, if reported.
    #[must_use]
    pub const fn counts(&self) -> Option<&TestCounts> {
        self.counts.as_ref()
    }
}

impl StoryTestWriter for MemoryWriter {
    fn write_cell(&mut self, cell: CellRef, mark: &CellMark) {
        self.cells.push((cell, mark.clone()));
    }

    fn write_counts(&mut self, counts: &TestCounts) {
        self.counts = Some(*counts);
    }
}

// ============================================================================
// SECTION: Dispatch
// ============================================================================

/// Test-style handler driven by the run dispatcher.
pub trait RunTestOperator: Send + Sync {
    /// Returns true when this handler recognizes the tables.
    fn can_run_test(&self, tables: &Tree<String>, writer: &dyn StoryTestWriter) -> bool;

    /// Runs the tables and returns a summary value.
    ///
    /// # Errors
    ///
    /// Returns [`SlimError`] when the tables cannot be run at all; per-cell
    /// failures are reported through `writer` instead.
    fn run_test(
        &self,
        tables: &Tree<String>,
        writer: &mut dyn StoryTestWriter,
    ) -> SlimResult<TypedValue>;
}

/// Ordered list of run handlers.
#[derive(Clone, Default)]
pub struct RunDispatcher {
    /// Handlers in precedence order.
    handlers: Vec<Arc<dyn RunTestOperator>>,
}

impl RunDispatcher {
    /// Creates a dispatcher with no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler.
    #[must_use]
    pub fn with_handler(mut self, handler: impl RunTestOperator + 'static) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true when no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Runs the tables with the first accepting handler.
    ///
    /// # Errors
    ///
    /// Returns [`SlimError::OperatorMissing`] when no handler accepts.
    pub fn run(
        &self,
        tables: &Tree<String>,
        writer: &mut dyn StoryTestWriter,
    ) -> SlimResult<TypedValue> {
        for handler in &self.handlers {
            if handler.can_run_test(tables, writer) {
                return handler.run_test(tables, writer);
            }
        }
        Err(SlimError::OperatorMissing {
            capability: Capability::RunTest,
            declared: ValueType::list_of(ValueType::Any),
        })
    }
}

/// Returns the text of the first cell of the first table, if present.
#[must_use]
pub fn first_cell(tables: &Tree<String>) -> Option<&str> {
    tables.branch_at(&[0, 0, 0]).ok().filter(|cell| cell.is_leaf()).map(|cell| cell.value().as_str())
}
