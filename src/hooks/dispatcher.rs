//! Dispatcher slot - the active hook backend.
//!
//! Hooks resolve through whichever [`Dispatcher`] is installed on the current
//! thread. [`install`] swaps one in and returns a guard that puts the
//! previous one back when dropped, so the slot is restored on every exit
//! path, errors and panics included.

use std::cell::RefCell;
use std::rc::Rc;

use crate::context::Context;
use crate::error::{VisitError, VisitResult};
use crate::types::{NodeRef, Value};

use super::{Dispatch, Reducer, StateSetter};

/// Backend for the stateful primitives a component may call while rendering.
///
/// Every method defaults to [`VisitError::UnsupportedPrimitive`], so a
/// backend only implements what it supports.
pub trait Dispatcher {
    fn use_state(&self, _initial: Value) -> VisitResult<(Value, StateSetter)> {
        Err(VisitError::unsupported("use_state"))
    }

    fn use_reducer(&self, _reducer: Reducer, _initial: Value) -> VisitResult<(Value, Dispatch)> {
        Err(VisitError::unsupported("use_reducer"))
    }

    fn use_context(&self, _context: &Context) -> VisitResult<Value> {
        Err(VisitError::unsupported("use_context"))
    }

    fn use_memo(
        &self,
        _compute: &mut dyn FnMut() -> Value,
        _deps: Option<&[Value]>,
    ) -> VisitResult<Value> {
        Err(VisitError::unsupported("use_memo"))
    }

    fn use_ref(&self, _initial: Value) -> VisitResult<NodeRef> {
        Err(VisitError::unsupported("use_ref"))
    }

    fn use_effect(&self, _deps: Option<&[Value]>) -> VisitResult<()> {
        Err(VisitError::unsupported("use_effect"))
    }

    fn use_layout_effect(&self, _deps: Option<&[Value]>) -> VisitResult<()> {
        Err(VisitError::unsupported("use_layout_effect"))
    }

    fn use_debug_value(&self, _value: &Value) -> VisitResult<()> {
        Err(VisitError::unsupported("use_debug_value"))
    }

    fn use_sync_external_store(&self, _get_snapshot: &dyn Fn() -> Value) -> VisitResult<Value> {
        Err(VisitError::unsupported("use_sync_external_store"))
    }
}

// =============================================================================
// Installed dispatcher
// =============================================================================

thread_local! {
    /// Dispatcher hooks currently resolve through.
    static CURRENT: RefCell<Option<Rc<dyn Dispatcher>>> = const { RefCell::new(None) };
}

/// Restores the previously installed dispatcher on drop.
#[must_use = "the dispatcher is uninstalled as soon as the guard drops"]
pub struct DispatcherGuard {
    previous: Option<Rc<dyn Dispatcher>>,
}

impl Drop for DispatcherGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT.with(|current| *current.borrow_mut() = previous);
    }
}

/// Install a dispatcher until the returned guard drops.
pub fn install(dispatcher: Rc<dyn Dispatcher>) -> DispatcherGuard {
    let previous = CURRENT.with(|current| current.replace(Some(dispatcher)));
    DispatcherGuard { previous }
}

/// The installed dispatcher, if any.
pub fn current_dispatcher() -> Option<Rc<dyn Dispatcher>> {
    CURRENT.with(|current| current.borrow().clone())
}

/// Whether a component render is in progress on this thread.
pub fn is_rendering() -> bool {
    CURRENT.with(|current| current.borrow().is_some())
}

/// Resolve a primitive through the installed dispatcher.
///
/// Without one (a class component, or code outside any render) the
/// primitive is unsupported.
pub(crate) fn with_dispatcher<T>(
    primitive: &'static str,
    f: impl FnOnce(&dyn Dispatcher) -> VisitResult<T>,
) -> VisitResult<T> {
    match current_dispatcher() {
        Some(dispatcher) => f(&*dispatcher),
        None => Err(VisitError::unsupported(primitive)),
    }
}
