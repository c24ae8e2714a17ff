// crates/fitslim-core/src/run/script.rs
// ============================================================================
// Module: Table Runners
// Description: Script-table and instruction-table test handlers.
// Purpose: Drive sessions from tables and report per-cell outcomes.
// Dependencies: crate::{fixture, operators, run, session, tree, value}
// ============================================================================

//! ## Overview
//! [`ScriptTableRunner`] handles tables headed `script | Class | args...`.
//! The header constructs the actor; each following row is an action,
//! `check`/`check not` assertion, `ensure`/`reject` boolean assertion, `show`
//! display, or `note` comment. [`InstructionTableRunner`] handles tables
//! headed `instructions`, where each following row is a raw instruction.
//! Each test runs in a fresh session shared by all of its tables.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::error::SlimResult;
use crate::fixture::FixtureRegistry;
use crate::operators::Processor;
use crate::run::CellMark;
use crate::run::CellRef;
use crate::run::RunTestOperator;
use crate::run::StoryTestWriter;
use crate::run::TestCounts;
use crate::run::first_cell;
use crate::session::Session;
use crate::tree::Tree;
use crate::value::TypedValue;
use crate::value::Value;

/// Instance id the script header binds.
const SCRIPT_ACTOR: &str = "scriptTableActor";

/// Header keyword for script tables.
const SCRIPT_KEYWORD: &str = "script";

/// Header keyword for instruction tables.
const INSTRUCTIONS_KEYWORD: &str = "instructions";

/// Renders a composed tree as display text.
fn display(tree: &Tree<String>) -> String {
    if tree.is_leaf() {
        return tree.value().clone();
    }
    format!("[{}]", tree.branches().iter().map(display).collect::<Vec<_>>().join(", "))
}

/// Reporting state shared by the runners.
struct Reporter<'a> {
    /// Destination for cell marks.
    writer: &'a mut dyn StoryTestWriter,
    /// Running tally.
    counts: TestCounts,
}

impl<'a> Reporter<'a> {
    /// Wraps a writer with a zeroed tally.
    fn new(writer: &'a mut dyn StoryTestWriter) -> Self {
        Self {
            writer,
            counts: TestCounts::default(),
        }
    }

    /// Tallies and writes one mark.
    fn mark(&mut self, table: usize, row: usize, cell: usize, mark: CellMark) {
        self.counts.tally(&mark);
        self.writer.write_cell(
            CellRef {
                table,
                row,
                cell,
            },
            &mark,
        );
    }

    /// Writes the final counts and returns the summary value.
    fn finish(self) -> TypedValue {
        self.writer.write_counts(&self.counts);
        self.counts.to_typed_value()
    }
}

// ============================================================================
// SECTION: Script Tables
// ============================================================================

/// Row kinds recognized by the script runner.
enum ScriptRow<'a> {
    /// Comment row.
    Note,
    /// Call and compare the result with the last cell.
    Check {
        /// True for `check not`.
        negate: bool,
        /// Method name.
        method: &'a str,
        /// Arguments between the method and the expected cell.
        args: &'a [Tree<String>],
        /// Expected expression.
        expected: &'a Tree<String>,
    },
    /// Call and require a boolean result.
    Ensure {
        /// Required boolean.
        expect: bool,
        /// Method name.
        method: &'a str,
        /// Method arguments.
        args: &'a [Tree<String>],
    },
    /// Call and display the result.
    Show {
        /// Method name.
        method: &'a str,
        /// Method arguments.
        args: &'a [Tree<String>],
    },
    /// Plain action; boolean results count as assertions.
    Action {
        /// Method name.
        method: &'a str,
        /// Method arguments.
        args: &'a [Tree<String>],
    },
    /// Row shape is not usable.
    Invalid,
}

impl<'a> ScriptRow<'a> {
    /// Classifies a row by its first cell.
    fn classify(cells: &'a [Tree<String>]) -> Self {
        let Some((first, rest)) = cells.split_first() else {
            return Self::Note;
        };
        let keyword = first.value().trim();
        if keyword.is_empty() || keyword == "note" || keyword.starts_with('#') {
            return Self::Note;
        }
        let method_and_args = |cells: &'a [Tree<String>]| {
            cells.split_first().map(|(method, args)| (method.value().as_str(), args))
        };
        match keyword {
            "check" | "check not" => match rest.split_last() {
                Some((expected, call)) => match method_and_args(call) {
                    Some((method, args)) => Self::Check {
                        negate: keyword == "check not",
                        method,
                        args,
                        expected,
                    },
                    None => Self::Invalid,
                },
                None => Self::Invalid,
            },
            "ensure" | "reject" => method_and_args(rest).map_or(Self::Invalid, |(method, args)| {
                Self::Ensure {
                    expect: keyword == "ensure",
                    method,
                    args,
                }
            }),
            "show" => method_and_args(rest).map_or(Self::Invalid, |(method, args)| Self::Show {
                method,
                args,
            }),
            _ => Self::Action {
                method: first.value().as_str(),
                args: rest,
            },
        }
    }
}

/// Runs script tables against a fixture registry.
#[derive(Clone)]
pub struct ScriptTableRunner {
    /// Fixture classes available to the actor.
    registry: Arc<FixtureRegistry>,
    /// Operator chains for each session.
    processor: Processor,
}

impl ScriptTableRunner {
    /// Creates a runner over a registry and processor.
    #[must_use]
    pub const fn new(registry: Arc<FixtureRegistry>, processor: Processor) -> Self {
        Self {
            registry,
            processor,
        }
    }

    /// Runs one script table in `session`.
    fn run_table(
        session: &mut Session,
        reporter: &mut Reporter<'_>,
        index: usize,
        table: &Tree<String>,
    ) {
        let Some((header, rows)) = table.branches().split_first() else {
            return;
        };
        let header_cells = header.branches();
        if header_cells.first().map(|cell| cell.value().trim()) != Some(SCRIPT_KEYWORD) {
            reporter.mark(index, 0, 0, CellMark::Ignore);
            return;
        }
        if let Some((class, args)) = header_cells.get(1 ..).and_then(<[Tree<String>]>::split_first)
            && let Err(error) = session.make(SCRIPT_ACTOR, class.value(), args)
        {
            let message = display(&session.compose_error(&error));
            reporter.mark(index, 0, 1, CellMark::Exception {
                message,
            });
            for row in 1 ..= rows.len() {
                reporter.mark(index, row, 0, CellMark::Ignore);
            }
            return;
        }
        for (offset, row) in rows.iter().enumerate() {
            Self::run_row(session, reporter, index, offset + 1, row.branches());
        }
    }

    /// Runs one script row.
    fn run_row(
        session: &mut Session,
        reporter: &mut Reporter<'_>,
        table: usize,
        row: usize,
        cells: &[Tree<String>],
    ) {
        match ScriptRow::classify(cells) {
            ScriptRow::Note => {}
            ScriptRow::Invalid => {
                let message = format!("unrecognized script row with {} cell(s)", cells.len());
                reporter.mark(table, row, 0, CellMark::Exception {
                    message,
                });
            }
            ScriptRow::Check {
                negate,
                method,
                args,
                expected,
            } => {
                let expected_cell = cells.len() - 1;
                let mark = match call_and_compare(session, method, args, expected) {
                    Ok((matched, actual)) => {
                        if matched == negate {
                            CellMark::Wrong {
                                actual,
                            }
                        } else {
                            CellMark::Right
                        }
                    }
                    Err(message) => CellMark::Exception {
                        message,
                    },
                };
                reporter.mark(table, row, expected_cell, mark);
            }
            ScriptRow::Ensure {
                expect,
                method,
                args,
            } => {
                let mark = match session.call(SCRIPT_ACTOR, method, args) {
                    Ok(value) => match value.value().and_then(Value::as_bool) {
                        Some(flag) if flag == expect => CellMark::Right,
                        _ => CellMark::Wrong {
                            actual: composed_text(session, &value),
                        },
                    },
                    Err(error) => CellMark::Exception {
                        message: display(&session.compose_error(&error)),
                    },
                };
                reporter.mark(table, row, 0, mark);
            }
            ScriptRow::Show {
                method,
                args,
            } => {
                let mark = match session.call(SCRIPT_ACTOR, method, args) {
                    Ok(value) => CellMark::Show {
                        value: composed_text(session, &value),
                    },
                    Err(error) => CellMark::Exception {
                        message: display(&session.compose_error(&error)),
                    },
                };
                reporter.mark(table, row, cells.len(), mark);
            }
            ScriptRow::Action {
                method,
                args,
            } => match session.call(SCRIPT_ACTOR, method, args) {
                Ok(value) => match value.value().and_then(Value::as_bool) {
                    Some(true) => reporter.mark(table, row, 0, CellMark::Right),
                    Some(false) => reporter.mark(table, row, 0, CellMark::Wrong {
                        actual: "false".to_string(),
                    }),
                    None => {}
                },
                Err(error) => {
                    let message = display(&session.compose_error(&error));
                    reporter.mark(table, row, 0, CellMark::Exception {
                        message,
                    });
                }
            },
        }
    }
}

/// Calls a method on the actor and compares the result with `expected`.
fn call_and_compare(
    session: &mut Session,
    method: &str,
    args: &[Tree<String>],
    expected: &Tree<String>,
) -> Result<(bool, String), String> {
    let value = match session.call(SCRIPT_ACTOR, method, args) {
        Ok(value) => value,
        Err(error) => return Err(display(&session.compose_error(&error))),
    };
    match session.processor().compare(&value, expected) {
        Ok(matched) => Ok((matched, composed_text(session, &value))),
        Err(error) => Err(display(&session.compose_error(&error))),
    }
}

/// Composes a value to display text, falling back to exception text.
fn composed_text(session: &Session, value: &TypedValue) -> String {
    match session.processor().compose(value) {
        Ok(tree) => display(&tree),
        Err(error) => display(&session.compose_error(&error)),
    }
}

impl RunTestOperator for ScriptTableRunner {
    fn can_run_test(&self, tables: &Tree<String>, _writer: &dyn StoryTestWriter) -> bool {
        first_cell(tables).is_some_and(|cell| cell.trim() == SCRIPT_KEYWORD)
    }

    fn run_test(
        &self,
        tables: &Tree<String>,
        writer: &mut dyn StoryTestWriter,
    ) -> SlimResult<TypedValue> {
        let mut reporter = Reporter::new(writer);
        let mut session = Session::new(Arc::clone(&self.registry), self.processor.clone());
        for (index, table) in tables.branches().iter().enumerate() {
            Self::run_table(&mut session, &mut reporter, index, table);
        }
        session.end();
        Ok(reporter.finish())
    }
}

// ============================================================================
// SECTION: Instruction Tables
// ============================================================================

/// Runs tables whose rows are raw instructions.
#[derive(Clone)]
pub struct InstructionTableRunner {
    /// Fixture classes available to `make` rows.
    registry: Arc<FixtureRegistry>,
    /// Operator chains for each session.
    processor: Processor,
}

impl InstructionTableRunner {
    /// Creates a runner over a registry and processor.
    #[must_use]
    pub const fn new(registry: Arc<FixtureRegistry>, processor: Processor) -> Self {
        Self {
            registry,
            processor,
        }
    }
}

impl RunTestOperator for InstructionTableRunner {
    fn can_run_test(&self, tables: &Tree<String>, _writer: &dyn StoryTestWriter) -> bool {
        first_cell(tables).is_some_and(|cell| cell.trim() == INSTRUCTIONS_KEYWORD)
    }

    fn run_test(
        &self,
        tables: &Tree<String>,
        writer: &mut dyn StoryTestWriter,
    ) -> SlimResult<TypedValue> {
        let mut reporter = Reporter::new(writer);
        let mut session = Session::new(Arc::clone(&self.registry), self.processor.clone());
        for (index, table) in tables.branches().iter().enumerate() {
            let Some((header, rows)) = table.branches().split_first() else {
                continue;
            };
            if header.value_at(&[0]).ok().map(|cell| cell.trim()) != Some(INSTRUCTIONS_KEYWORD) {
                reporter.mark(index, 0, 0, CellMark::Ignore);
                continue;
            }
            for (offset, row) in rows.iter().enumerate() {
                let outcome = session.execute_instruction(row);
                let mark = match outcome.error {
                    Some(_) => CellMark::Exception {
                        message: display(&outcome.result),
                    },
                    None => CellMark::Right,
                };
                reporter.mark(index, offset + 1, 0, mark);
            }
        }
        session.end();
        Ok(reporter.finish())
    }
}
