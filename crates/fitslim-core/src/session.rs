// crates/fitslim-core/src/session.rs
// ============================================================================
// Module: Session Executor
// Description: Sequential execution of instruction batches for one connection.
// Purpose: Own per-session state and turn every outcome into a result entry.
// Dependencies: crate::{error, fixture, instruction, operators, tree, value}
// ============================================================================

//! ## Overview
//! A [`Session`] owns one instance table, one symbol table, one search path
//! and one [`Processor`] snapshot. [`Session::execute`] runs a batch strictly
//! in order and returns exactly one `[id, result]` entry per instruction,
//! even when earlier instructions fail.
//!
//! Invariants:
//! - Failures never abort the batch; each becomes composed exception text.
//! - State persists across batches until [`Session::end`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::error::SlimError;
use crate::error::SlimResult;
use crate::fixture::FixtureRegistry;
use crate::fixture::Instance;
use crate::fixture::InstanceTable;
use crate::fixture::SymbolTable;
use crate::instruction::Instruction;
use crate::instruction::Operation;
use crate::operators::InvokeRequest;
use crate::operators::Processor;
use crate::operators::compose::exception_text;
use crate::tree::Tree;
use crate::value::TypedValue;

/// Result text for successful `make`, `import` and `assign`.
pub const OK: &str = "OK";

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Result of one executed instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct InstructionOutcome {
    /// Correlation id, empty when the instruction had none.
    pub id: String,
    /// Composed result tree.
    pub result: Tree<String>,
    /// Failure captured for this instruction, if any.
    pub error: Option<SlimError>,
}

impl InstructionOutcome {
    /// Returns the `[id, result]` wire entry.
    #[must_use]
    pub fn to_entry(&self) -> Tree<String> {
        Tree::list(vec![Tree::text(self.id.clone()), self.result.clone()])
    }
}

/// Result of one executed batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    /// Result list, one `[id, result]` entry per instruction in input order.
    pub results: Tree<String>,
    /// Number of instructions executed.
    pub executed: usize,
    /// Number of instructions that produced exception results.
    pub failures: usize,
}

// ============================================================================
// SECTION: Session
// ============================================================================

/// Per-connection execution state.
pub struct Session {
    /// Operator chains and formatting context.
    processor: Processor,
    /// Fixture classes available to `make`.
    registry: Arc<FixtureRegistry>,
    /// Bound fixture instances.
    instances: InstanceTable,
    /// Assigned symbols.
    symbols: SymbolTable,
    /// Imported namespace prefixes in import order.
    search_path: Vec<String>,
}

impl Session {
    /// Creates a session over a fixture registry and processor snapshot.
    #[must_use]
    pub fn new(registry: Arc<FixtureRegistry>, processor: Processor) -> Self {
        Self {
            processor,
            registry,
            instances: InstanceTable::new(),
            symbols: SymbolTable::new(),
            search_path: Vec::new(),
        }
    }

    /// Returns the session's processor.
    #[must_use]
    pub const fn processor(&self) -> &Processor {
        &self.processor
    }

    /// Returns the instance table.
    #[must_use]
    pub const fn instances(&self) -> &InstanceTable {
        &self.instances
    }

    /// Returns the symbol table.
    #[must_use]
    pub const fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Returns the imported search path.
    #[must_use]
    pub fn search_path(&self) -> &[String] {
        &self.search_path
    }

    /// Executes a batch in order and collects one result entry per instruction.
    pub fn execute(&mut self, batch: &Tree<String>) -> BatchOutcome {
        let mut entries = Vec::with_capacity(batch.branches().len());
        let mut failures = 0;
        if batch.is_leaf() && !batch.value().is_empty() {
            let outcome = self.execute_instruction(batch);
            failures += usize::from(outcome.error.is_some());
            entries.push(outcome.to_entry());
        }
        for instruction in batch.branches() {
            let outcome = self.execute_instruction(instruction);
            failures += usize::from(outcome.error.is_some());
            entries.push(outcome.to_entry());
        }
        BatchOutcome {
            executed: entries.len(),
            failures,
            results: Tree::list(entries),
        }
    }

    /// Decodes and executes one instruction tree.
    pub fn execute_instruction(&mut self, tree: &Tree<String>) -> InstructionOutcome {
        let (id, result) = match Instruction::decode(tree) {
            Ok(instruction) => {
                let result = self.run(&instruction.operation);
                (instruction.id, result)
            }
            Err(error) => (Instruction::peek_id(tree), Err(error)),
        };
        match result {
            Ok(result) => InstructionOutcome {
                id,
                result,
                error: None,
            },
            Err(error) => InstructionOutcome {
                id,
                result: self.compose_error(&error),
                error: Some(error),
            },
        }
    }

    /// Runs a decoded operation and returns its composed result.
    ///
    /// # Errors
    ///
    /// Returns the invocation, parse or compose failure.
    pub fn run(&mut self, operation: &Operation) -> SlimResult<Tree<String>> {
        match operation {
            Operation::Make {
                instance,
                class,
                args,
            } => {
                self.make(instance, class, args)?;
                Ok(Tree::text(OK))
            }
            Operation::Call {
                instance,
                method,
                args,
            } => {
                let value = self.call(instance, method, args)?;
                self.processor.compose(&value)
            }
            Operation::CallAndAssign {
                symbol,
                instance,
                method,
                args,
            } => {
                let value = self.call(instance, method, args)?;
                let composed = self.processor.compose(&value)?;
                self.symbols.assign(symbol.clone(), composed.clone());
                Ok(composed)
            }
            Operation::Import {
                path,
            } => {
                self.import(path);
                Ok(Tree::text(OK))
            }
            Operation::Assign {
                symbol,
                value,
            } => {
                let value = self.symbols.substitute(value);
                self.symbols.assign(symbol.clone(), value);
                Ok(Tree::text(OK))
            }
        }
    }

    /// Resolves a class, constructs it and binds the instance.
    ///
    /// # Errors
    ///
    /// Returns [`SlimError::TypeMissing`], [`SlimError::ConstructorMissing`],
    /// or the argument coercion or fixture failure.
    pub fn make(&mut self, instance: &str, class: &str, args: &[Tree<String>]) -> SlimResult<()> {
        let class_name = self.symbols.substitute_text(class);
        let class = self.registry.resolve(&class_name, &self.search_path)?;
        let constructor =
            class.constructor(args.len()).ok_or_else(|| SlimError::ConstructorMissing {
                class: class.name().to_string(),
                arity: args.len(),
            })?;
        let args = self.substitute_args(args);
        let values = self.processor.parse_args(constructor.params(), &args)?;
        let object = constructor.construct(&values)?;
        self.instances.bind(instance, Instance::new(Arc::clone(&class), object));
        Ok(())
    }

    /// Invokes a method and returns its typed result.
    ///
    /// # Errors
    ///
    /// Returns [`SlimError::MemoryMissing`], [`SlimError::MemberMissing`], or
    /// the argument coercion or fixture failure.
    pub fn call(
        &mut self,
        instance: &str,
        method: &str,
        args: &[Tree<String>],
    ) -> SlimResult<TypedValue> {
        let args = self.substitute_args(args);
        let request = InvokeRequest {
            instance,
            member: method,
            args: &args,
        };
        self.processor.invoke(&mut self.instances, &request)
    }

    /// Appends a namespace prefix to the search path, ignoring duplicates.
    pub fn import(&mut self, path: &str) {
        if !self.search_path.iter().any(|existing| existing == path) {
            self.search_path.push(path.to_string());
        }
    }

    /// Releases every instance and symbol.
    pub fn end(&mut self) {
        self.instances.clear();
        self.symbols = SymbolTable::new();
        self.search_path.clear();
    }

    /// Composes a failure, falling back to plain exception text.
    #[must_use]
    pub fn compose_error(&self, error: &SlimError) -> Tree<String> {
        self.processor
            .compose(&TypedValue::error(error.clone()))
            .unwrap_or_else(|_| Tree::text(exception_text(error)))
    }

    /// Substitutes symbol references in each argument.
    fn substitute_args(&self, args: &[Tree<String>]) -> Vec<Tree<String>> {
        args.iter().map(|arg| self.symbols.substitute(arg)).collect()
    }
}
