//! Hooks - stateful primitives for function components.
//!
//! Hooks resolve through the dispatcher installed for the component being
//! rendered. Outside a function component render (or inside a class
//! component) every hook fails with `UnsupportedPrimitive`.
//!
//! # Example
//!
//! ```ignore
//! use spark_prepass::hooks::use_state;
//! use spark_prepass::{FunctionComponent, Node};
//!
//! let counter = FunctionComponent::new("Counter", |_props| {
//!     let (count, set_count) = use_state(0.into())?;
//!     if count.as_i64() == Some(0) {
//!         set_count.set(1);
//!     }
//!     Ok(Node::from(count.as_i64()))
//! });
//! ```
//!
//! During a prepass, effects never run and setters fired while rendering
//! cause the component to render again until its state settles.

mod dispatcher;
mod prepass;

use std::rc::Rc;

use crate::context::Context;
use crate::error::VisitResult;
use crate::types::{NodeRef, RenderFn, Value};

pub use dispatcher::{current_dispatcher, install, is_rendering, Dispatcher, DispatcherGuard};
pub use prepass::{render_with_hooks, Dispatch, HookDispatcher, Reducer, StateSetter};

pub(crate) use dispatcher::with_dispatcher;

/// Local state. Returns the current value and its setter.
pub fn use_state(initial: Value) -> VisitResult<(Value, StateSetter)> {
    with_dispatcher("use_state", |d| d.use_state(initial))
}

/// State driven by a reducer.
pub fn use_reducer(
    reducer: impl Fn(&Value, &Value) -> Value + 'static,
    initial: Value,
) -> VisitResult<(Value, Dispatch)> {
    with_dispatcher("use_reducer", |d| d.use_reducer(Rc::new(reducer), initial))
}

/// Value of the nearest provider for `context`, or its default.
pub fn use_context(context: &Context) -> VisitResult<Value> {
    with_dispatcher("use_context", |d| d.use_context(context))
}

/// Memoized value, recomputed when `deps` change. `None` recomputes every pass.
pub fn use_memo(
    mut compute: impl FnMut() -> Value,
    deps: Option<&[Value]>,
) -> VisitResult<Value> {
    with_dispatcher("use_memo", |d| d.use_memo(&mut compute, deps))
}

/// Memoized callback.
pub fn use_callback(callback: RenderFn, deps: Option<&[Value]>) -> VisitResult<RenderFn> {
    let value = use_memo(|| Value::Func(callback.clone()), deps)?;
    Ok(match value {
        Value::Func(memoized) => memoized,
        _ => callback,
    })
}

/// Mutable cell that keeps its identity across render passes.
pub fn use_ref(initial: Value) -> VisitResult<NodeRef> {
    with_dispatcher("use_ref", |d| d.use_ref(initial))
}

/// Registers an effect. Effects never run during a prepass.
pub fn use_effect(_effect: impl FnOnce(), deps: Option<&[Value]>) -> VisitResult<()> {
    with_dispatcher("use_effect", |d| d.use_effect(deps))
}

/// Registers a layout effect. Never runs during a prepass.
pub fn use_layout_effect(_effect: impl FnOnce(), deps: Option<&[Value]>) -> VisitResult<()> {
    with_dispatcher("use_layout_effect", |d| d.use_layout_effect(deps))
}

pub fn use_debug_value(value: impl Into<Value>) -> VisitResult<()> {
    let value = value.into();
    with_dispatcher("use_debug_value", |d| d.use_debug_value(&value))
}

/// Subscribe to an external store. Not supported by the prepass dispatcher.
pub fn use_sync_external_store(get_snapshot: impl Fn() -> Value) -> VisitResult<Value> {
    with_dispatcher("use_sync_external_store", |d| {
        d.use_sync_external_store(&get_snapshot)
    })
}
