// crates/fitslim-core/src/fixture/mod.rs
// ============================================================================
// Module: Fixture Registry
// Description: Explicit capability registry of constructible fixture classes.
// Purpose: Resolve class names, constructors and methods without reflection.
// Dependencies: crate::{error, value}
// ============================================================================

//! ## Overview
//! Fixture authors register each class once at startup. A class maps
//! constructor arity to a factory and `(method name, arity)` to a typed
//! handle. Parameter and return types are declared with the signature, so the
//! engine coerces arguments and tags results without inspecting values.
//!
//! Resolution is by arity only. When two methods share a name and argument
//! count, the one registered first wins.
//!
//! Security posture: fixture code is trusted; the engine only runs what the
//! host process registered.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod instances;

pub use instances::Instance;
pub use instances::InstanceTable;
pub use instances::SymbolTable;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::any::Any;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::SlimError;
use crate::error::SlimResult;
use crate::value::TypedValue;
use crate::value::Value;
use crate::value::ValueType;

// ============================================================================
// SECTION: Handles
// ============================================================================

/// Type-erased fixture instance.
pub type FixtureObject = Box<dyn Any + Send>;

/// Type-erased constructor handle.
type ConstructorFn = Arc<dyn Fn(&Args<'_>) -> SlimResult<FixtureObject> + Send + Sync>;

/// Type-erased method handle.
type MethodFn =
    Arc<dyn Fn(&mut (dyn Any + Send), &Args<'_>) -> SlimResult<Option<Value>> + Send + Sync>;

/// Constructor registered for one arity.
#[derive(Clone)]
pub struct Constructor {
    /// Declared parameter types.
    params: Vec<ValueType>,
    /// Factory handle.
    build: ConstructorFn,
}

impl Constructor {
    /// Returns the declared parameter types.
    #[must_use]
    pub fn params(&self) -> &[ValueType] {
        &self.params
    }

    /// Runs the factory with coerced arguments.
    ///
    /// # Errors
    ///
    /// Returns the fixture's own failure.
    pub fn construct(&self, args: &[TypedValue]) -> SlimResult<FixtureObject> {
        (self.build)(&Args::new(args))
    }
}

/// Method registered under a name and arity.
#[derive(Clone)]
pub struct Method {
    /// Method name.
    name: String,
    /// Declared parameter types.
    params: Vec<ValueType>,
    /// Declared return type; `Void` for actions.
    returns: ValueType,
    /// Invocation handle.
    call: MethodFn,
}

impl Method {
    /// Returns the method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared parameter types.
    #[must_use]
    pub fn params(&self) -> &[ValueType] {
        &self.params
    }

    /// Returns the declared return type.
    #[must_use]
    pub const fn returns(&self) -> &ValueType {
        &self.returns
    }

    /// Invokes the method and tags the result with the declared return type.
    ///
    /// # Errors
    ///
    /// Returns the fixture's own failure.
    pub fn invoke(&self, target: &mut (dyn Any + Send), args: &[TypedValue]) -> SlimResult<TypedValue> {
        let value = (self.call)(target, &Args::new(args))?;
        if matches!(self.returns, ValueType::Void) {
            return Ok(TypedValue::void());
        }
        Ok(TypedValue::new(value, self.returns.clone()))
    }
}

// ============================================================================
// SECTION: Fixture Class
// ============================================================================

/// Registered fixture class.
#[derive(Clone)]
pub struct FixtureClass {
    /// Fully qualified class name.
    name: String,
    /// Constructors in registration order.
    constructors: Vec<Constructor>,
    /// Methods in registration order.
    methods: Vec<Method>,
}

impl FixtureClass {
    /// Starts a class definition for instances of `T`.
    pub fn builder<T: Any + Send>(name: impl Into<String>) -> ClassBuilder<T> {
        ClassBuilder {
            class: Self {
                name: name.into(),
                constructors: Vec::new(),
                methods: Vec::new(),
            },
            marker: PhantomData,
        }
    }

    /// Returns the class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the first constructor with the given arity.
    #[must_use]
    pub fn constructor(&self, arity: usize) -> Option<&Constructor> {
        self.constructors.iter().find(|constructor| constructor.params.len() == arity)
    }

    /// Returns the first method with the given name and arity.
    #[must_use]
    pub fn method(&self, name: &str, arity: usize) -> Option<&Method> {
        self.methods.iter().find(|method| method.name == name && method.params.len() == arity)
    }

    /// Returns every registered method in registration order.
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }
}

/// Typed builder for a [`FixtureClass`].
pub struct ClassBuilder<T> {
    /// Class under construction.
    class: FixtureClass,
    /// Instance type captured by handles.
    marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send> ClassBuilder<T> {
    /// Registers a constructor taking `params`.
    #[must_use]
    pub fn constructor<F>(mut self, params: &[ValueType], build: F) -> Self
    where
        F: Fn(&Args<'_>) -> SlimResult<T> + Send + Sync + 'static,
    {
        self.class.constructors.push(Constructor {
            params: params.to_vec(),
            build: Arc::new(move |args: &Args<'_>| {
                build(args).map(|object| Box::new(object) as FixtureObject)
            }),
        });
        self
    }

    /// Registers a method returning a value of `returns`.
    ///
    /// Returning `Ok(None)` yields a null of the declared type.
    #[must_use]
    pub fn method<F>(mut self, name: &str, params: &[ValueType], returns: ValueType, call: F) -> Self
    where
        F: Fn(&mut T, &Args<'_>) -> SlimResult<Option<Value>> + Send + Sync + 'static,
    {
        let class = self.class.name.clone();
        self.class.methods.push(Method {
            name: name.to_string(),
            params: params.to_vec(),
            returns,
            call: Arc::new(move |target: &mut (dyn Any + Send), args: &Args<'_>| {
                let Some(target) = target.downcast_mut::<T>() else {
                    return Err(SlimError::fixture(
                        "InstanceTypeMismatch",
                        format!("held instance is not a {class}"),
                    ));
                };
                call(target, args)
            }),
        });
        self
    }

    /// Registers a method that returns nothing.
    #[must_use]
    pub fn action<F>(self, name: &str, params: &[ValueType], call: F) -> Self
    where
        F: Fn(&mut T, &Args<'_>) -> SlimResult<()> + Send + Sync + 'static,
    {
        self.method(name, params, ValueType::Void, move |target, args| {
            call(target, args).map(|()| None)
        })
    }

    /// Finishes the class definition.
    #[must_use]
    pub fn build(self) -> FixtureClass {
        self.class
    }
}

// ============================================================================
// SECTION: Arguments
// ============================================================================

/// Coerced arguments handed to fixture handles.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    /// Arguments in declaration order.
    values: &'a [TypedValue],
}

impl<'a> Args<'a> {
    /// Wraps coerced argument values.
    #[must_use]
    pub const fn new(values: &'a [TypedValue]) -> Self {
        Self {
            values,
        }
    }

    /// Returns the argument count.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true when there are no arguments.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the typed argument at `index`.
    ///
    /// # Errors
    ///
    /// Returns a fixture failure when the index is out of range.
    pub fn typed(&self, index: usize) -> SlimResult<&'a TypedValue> {
        self.values.get(index).ok_or_else(|| {
            SlimError::fixture("ArgumentMissing", format!("no argument at position {index}"))
        })
    }

    /// Returns the runtime value at `index`.
    fn value(&self, index: usize) -> SlimResult<&'a Value> {
        self.typed(index)?
            .value()
            .ok_or_else(|| SlimError::fixture("ArgumentNull", format!("argument {index} is null")))
    }

    /// Returns the boolean argument at `index`.
    ///
    /// # Errors
    ///
    /// Returns a fixture failure when the argument is missing or not a boolean.
    pub fn bool(&self, index: usize) -> SlimResult<bool> {
        self.value(index)?.as_bool().ok_or_else(|| mismatch(index, "bool"))
    }

    /// Returns the integer argument at `index`.
    ///
    /// # Errors
    ///
    /// Returns a fixture failure when the argument is missing or not an integer.
    pub fn int(&self, index: usize) -> SlimResult<i64> {
        self.value(index)?.as_int().ok_or_else(|| mismatch(index, "int"))
    }

    /// Returns the numeric argument at `index` as a float.
    ///
    /// # Errors
    ///
    /// Returns a fixture failure when the argument is missing or not numeric.
    pub fn float(&self, index: usize) -> SlimResult<f64> {
        self.value(index)?.as_float().ok_or_else(|| mismatch(index, "float"))
    }

    /// Returns the text argument at `index`.
    ///
    /// # Errors
    ///
    /// Returns a fixture failure when the argument is missing or not text.
    pub fn text(&self, index: usize) -> SlimResult<&'a str> {
        self.value(index)?.as_text().ok_or_else(|| mismatch(index, "text"))
    }

    /// Returns the list argument at `index`.
    ///
    /// # Errors
    ///
    /// Returns a fixture failure when the argument is missing or not a list.
    pub fn list(&self, index: usize) -> SlimResult<&'a [TypedValue]> {
        self.value(index)?.as_list().ok_or_else(|| mismatch(index, "list"))
    }
}

/// Builds an argument type mismatch failure.
fn mismatch(index: usize, expected: &str) -> SlimError {
    SlimError::fixture("ArgumentType", format!("argument {index} is not {expected}"))
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Name-indexed set of fixture classes.
#[derive(Clone, Default)]
pub struct FixtureRegistry {
    /// Classes by fully qualified name.
    classes: BTreeMap<String, Arc<FixtureClass>>,
}

impl FixtureRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a class, replacing any class with the same name.
    pub fn register(&mut self, class: FixtureClass) -> &mut Self {
        self.classes.insert(class.name.clone(), Arc::new(class));
        self
    }

    /// Returns the class registered under exactly `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<FixtureClass>> {
        self.classes.get(name)
    }

    /// Returns the registered class names in sorted order.
    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    /// Resolves a class name, trying the literal name then each prefix.
    ///
    /// # Errors
    ///
    /// Returns [`SlimError::TypeMissing`] when no candidate is registered.
    pub fn resolve(&self, name: &str, search_path: &[String]) -> SlimResult<Arc<FixtureClass>> {
        if let Some(class) = self.classes.get(name) {
            return Ok(Arc::clone(class));
        }
        for prefix in search_path {
            if let Some(class) = self.classes.get(&format!("{prefix}.{name}")) {
                return Ok(Arc::clone(class));
            }
        }
        Err(SlimError::TypeMissing {
            class: name.to_string(),
            searched: search_path.to_vec(),
        })
    }
}
