// crates/fitslim-core/src/operators/invoke.rs
// ============================================================================
// Module: Invoke Operators
// Description: Method resolution on held instances and library fallbacks.
// Purpose: Run fixture methods with coerced arguments.
// Dependencies: crate::{error, fixture, operators, value}
// ============================================================================

//! ## Overview
//! [`InvokeInstanceMethod`] runs a method found on the target instance's
//! class. [`InvokeLibraryMethod`] extends the chain: when the target lacks
//! the method, library instances (ids starting with `library`) are tried
//! most recently bound first.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::error::SlimError;
use crate::error::SlimResult;
use crate::fixture::InstanceTable;
use crate::operators::InvokeOperator;
use crate::operators::InvokeRequest;
use crate::operators::Processor;
use crate::value::TypedValue;

/// Coerces arguments and runs `member` on the instance bound under `id`.
fn invoke_on(
    processor: &Processor,
    instances: &mut InstanceTable,
    id: &str,
    request: &InvokeRequest<'_>,
) -> SlimResult<TypedValue> {
    let instance = instances.get_mut(id).ok_or_else(|| SlimError::MemoryMissing {
        id: id.to_string(),
    })?;
    let class = Arc::clone(instance.class());
    let method = class.method(request.member, request.arity()).ok_or_else(|| {
        SlimError::MemberMissing {
            class: class.name().to_string(),
            member: request.member.to_string(),
            arity: request.arity(),
        }
    })?;
    let args = processor.parse_args(method.params(), request.args)?;
    method.invoke(instance.object_mut(), &args)
}

/// Returns true when the instance under `id` has the requested method.
fn has_method(instances: &InstanceTable, id: &str, request: &InvokeRequest<'_>) -> bool {
    instances
        .get(id)
        .is_some_and(|instance| instance.class().method(request.member, request.arity()).is_some())
}

// ============================================================================
// SECTION: Operators
// ============================================================================

/// Invokes a method declared on the target instance's class.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvokeInstanceMethod;

impl InvokeOperator for InvokeInstanceMethod {
    fn can_invoke(&self, instances: &InstanceTable, request: &InvokeRequest<'_>) -> bool {
        has_method(instances, request.instance, request)
    }

    fn invoke(
        &self,
        processor: &Processor,
        instances: &mut InstanceTable,
        request: &InvokeRequest<'_>,
    ) -> SlimResult<TypedValue> {
        invoke_on(processor, instances, request.instance, request)
    }
}

/// Invokes the method on the most recent library instance that has it.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvokeLibraryMethod;

impl InvokeLibraryMethod {
    /// Returns the first library id, most recent first, offering the method.
    fn find_library(instances: &InstanceTable, request: &InvokeRequest<'_>) -> Option<String> {
        instances
            .library_ids()
            .find(|id| has_method(instances, id, request))
            .map(ToString::to_string)
    }
}

impl InvokeOperator for InvokeLibraryMethod {
    fn can_invoke(&self, instances: &InstanceTable, request: &InvokeRequest<'_>) -> bool {
        Self::find_library(instances, request).is_some()
    }

    fn invoke(
        &self,
        processor: &Processor,
        instances: &mut InstanceTable,
        request: &InvokeRequest<'_>,
    ) -> SlimResult<TypedValue> {
        let Some(id) = Self::find_library(instances, request) else {
            let class = instances.require(request.instance)?.class_name().to_string();
            return Err(SlimError::MemberMissing {
                class,
                member: request.member.to_string(),
                arity: request.arity(),
            });
        };
        invoke_on(processor, instances, &id, request)
    }
}
