//! Prepass dispatcher - hooks for one synchronous render.
//!
//! Each function component render gets a fresh [`HookDispatcher`]. Hook
//! slots are positional and survive the re-render passes of that one visit,
//! then are dropped with it; nothing persists between visits.
//!
//! # Re-render to fixed point
//!
//! A state setter fired while the component renders stores the new value
//! and flags a re-render. [`render_with_hooks`] then calls the render
//! function again from the top, with the new value visible, until a pass
//! completes without a state change. Setting a value equal to the current
//! one does not flag a re-render. The loop is capped by
//! [`Config::max_render_passes`](crate::config::Config).

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use spark_signals::{signal, Signal};
use tracing::{trace, warn};

use super::dispatcher::{install, Dispatcher};
use crate::context::{Context, ContextStack};
use crate::error::{VisitError, VisitResult};
use crate::types::{Node, NodeRef, Value};

/// Reducer for [`use_reducer`](super::use_reducer): `(state, action) -> state`.
pub type Reducer = Rc<dyn Fn(&Value, &Value) -> Value>;

// =============================================================================
// State cells
// =============================================================================

/// Render-phase bookkeeping shared by the dispatcher and its setters.
struct RenderPhase {
    component: Rc<str>,
    active: Cell<bool>,
    rerender: Cell<bool>,
}

struct StateCell {
    value: Signal<Value>,
    reducer: Option<Reducer>,
    phase: Rc<RenderPhase>,
}

impl StateCell {
    fn apply(&self, next: Value) {
        if !self.phase.active.get() {
            warn!(
                component = %self.phase.component,
                "state update after render finished ignored"
            );
            return;
        }
        if self.value.get() == next {
            return;
        }
        self.value.set(next);
        self.phase.rerender.set(true);
    }
}

/// Setter returned by [`use_state`](super::use_state).
#[derive(Clone)]
pub struct StateSetter(Rc<StateCell>);

impl StateSetter {
    /// Replace the state value.
    pub fn set(&self, value: impl Into<Value>) {
        self.0.apply(value.into());
    }

    /// Compute the next value from the latest one.
    pub fn update(&self, f: impl FnOnce(&Value) -> Value) {
        let next = f(&self.0.value.get());
        self.0.apply(next);
    }
}

impl fmt::Debug for StateSetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateSetter({})", self.0.phase.component)
    }
}

/// Dispatch function returned by [`use_reducer`](super::use_reducer).
#[derive(Clone)]
pub struct Dispatch(Rc<StateCell>);

impl Dispatch {
    pub fn dispatch(&self, action: impl Into<Value>) {
        let action = action.into();
        let next = match &self.0.reducer {
            Some(reducer) => reducer(&self.0.value.get(), &action),
            None => action,
        };
        self.0.apply(next);
    }
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dispatch({})", self.0.phase.component)
    }
}

// =============================================================================
// Hook slots
// =============================================================================

enum Hook {
    State(Rc<StateCell>),
    Memo {
        value: Value,
        deps: Option<Vec<Value>>,
    },
    Ref(NodeRef),
    /// Effect slot, tagged with the hook that claimed it.
    Effect(&'static str),
}

impl Hook {
    fn name(&self) -> &'static str {
        match self {
            Hook::State(_) => "use_state",
            Hook::Memo { .. } => "use_memo",
            Hook::Ref(_) => "use_ref",
            Hook::Effect(name) => *name,
        }
    }
}

fn deps_changed(previous: Option<&[Value]>, next: Option<&[Value]>) -> bool {
    match (previous, next) {
        (Some(previous), Some(next)) => previous != next,
        _ => true,
    }
}

// =============================================================================
// HookDispatcher
// =============================================================================

/// Dispatcher installed around one function component render.
pub struct HookDispatcher {
    contexts: Rc<RefCell<ContextStack>>,
    phase: Rc<RenderPhase>,
    hooks: RefCell<Vec<Hook>>,
    cursor: Cell<usize>,
    passes: Cell<usize>,
}

impl HookDispatcher {
    pub fn new(component: &str, contexts: Rc<RefCell<ContextStack>>) -> Self {
        Self {
            contexts,
            phase: Rc::new(RenderPhase {
                component: component.into(),
                active: Cell::new(true),
                rerender: Cell::new(false),
            }),
            hooks: RefCell::new(Vec::new()),
            cursor: Cell::new(0),
            passes: Cell::new(0),
        }
    }

    /// Reset the cursor for a new render pass.
    fn begin_pass(&self) {
        self.cursor.set(0);
        self.phase.rerender.set(false);
        self.passes.set(self.passes.get() + 1);
    }

    fn needs_rerender(&self) -> bool {
        self.phase.rerender.get()
    }

    /// Number of render passes started so far.
    pub fn passes(&self) -> usize {
        self.passes.get()
    }

    /// Claim the next slot. Returns its index and whether it already exists.
    fn claim(&self, name: &'static str) -> VisitResult<(usize, bool)> {
        let index = self.cursor.get();
        self.cursor.set(index + 1);

        let hooks = self.hooks.borrow();
        match hooks.get(index) {
            Some(hook) if hook.name() != name => Err(VisitError::HookOrder {
                index,
                expected: hook.name(),
                found: name,
            }),
            Some(_) => Ok((index, true)),
            None if self.passes.get() > 1 => Err(VisitError::HookOrder {
                index,
                expected: "no hook",
                found: name,
            }),
            None => Ok((index, false)),
        }
    }

    fn state_cell(&self, name: &'static str, reducer: Option<Reducer>, initial: Value) -> VisitResult<Rc<StateCell>> {
        let (index, exists) = self.claim(name)?;
        let mut hooks = self.hooks.borrow_mut();
        if !exists {
            hooks.push(Hook::State(Rc::new(StateCell {
                value: signal(initial),
                reducer,
                phase: self.phase.clone(),
            })));
        }
        match &hooks[index] {
            Hook::State(cell) => Ok(cell.clone()),
            other => Err(VisitError::HookOrder {
                index,
                expected: other.name(),
                found: name,
            }),
        }
    }

    fn mark_effect(&self, name: &'static str) -> VisitResult<()> {
        let (_, exists) = self.claim(name)?;
        if !exists {
            self.hooks.borrow_mut().push(Hook::Effect(name));
        }
        Ok(())
    }
}

impl Drop for HookDispatcher {
    fn drop(&mut self) {
        // Setters kept by the component turn into no-ops from here on.
        self.phase.active.set(false);
    }
}

impl Dispatcher for HookDispatcher {
    fn use_state(&self, initial: Value) -> VisitResult<(Value, StateSetter)> {
        let cell = self.state_cell("use_state", None, initial)?;
        Ok((cell.value.get(), StateSetter(cell)))
    }

    fn use_reducer(&self, reducer: Reducer, initial: Value) -> VisitResult<(Value, Dispatch)> {
        // Reducers share the state slot kind, as `use_state` is a reducer
        // that returns its action.
        let cell = self.state_cell("use_state", Some(reducer), initial)?;
        Ok((cell.value.get(), Dispatch(cell)))
    }

    fn use_context(&self, context: &Context) -> VisitResult<Value> {
        Ok(self.contexts.borrow().current_value(context))
    }

    fn use_memo(
        &self,
        compute: &mut dyn FnMut() -> Value,
        deps: Option<&[Value]>,
    ) -> VisitResult<Value> {
        let (index, exists) = self.claim("use_memo")?;
        if exists {
            if let Hook::Memo {
                value,
                deps: previous,
            } = &self.hooks.borrow()[index]
            {
                if !deps_changed(previous.as_deref(), deps) {
                    return Ok(value.clone());
                }
            }
        }

        let cursor = self.cursor.get();
        let value = compute();
        if self.cursor.get() != cursor {
            return Err(VisitError::unsupported("hook call inside use_memo"));
        }

        let hook = Hook::Memo {
            value: value.clone(),
            deps: deps.map(<[Value]>::to_vec),
        };
        let mut hooks = self.hooks.borrow_mut();
        if exists {
            hooks[index] = hook;
        } else {
            hooks.push(hook);
        }
        Ok(value)
    }

    fn use_ref(&self, initial: Value) -> VisitResult<NodeRef> {
        let (index, exists) = self.claim("use_ref")?;
        let mut hooks = self.hooks.borrow_mut();
        if !exists {
            hooks.push(Hook::Ref(NodeRef::new(initial)));
        }
        match &hooks[index] {
            Hook::Ref(node_ref) => Ok(node_ref.clone()),
            other => Err(VisitError::HookOrder {
                index,
                expected: other.name(),
                found: "use_ref",
            }),
        }
    }

    fn use_effect(&self, _deps: Option<&[Value]>) -> VisitResult<()> {
        self.mark_effect("use_effect")
    }

    fn use_layout_effect(&self, _deps: Option<&[Value]>) -> VisitResult<()> {
        self.mark_effect("use_layout_effect")
    }

    fn use_debug_value(&self, _value: &Value) -> VisitResult<()> {
        Ok(())
    }
}

// =============================================================================
// Fixed-point render
// =============================================================================

/// Render with a fresh [`HookDispatcher`] installed, re-rendering until no
/// state update fires during a pass.
///
/// The dispatcher is uninstalled on every exit path.
pub fn render_with_hooks(
    component: &str,
    contexts: &Rc<RefCell<ContextStack>>,
    max_passes: usize,
    mut render: impl FnMut() -> VisitResult<Node>,
) -> VisitResult<Node> {
    let dispatcher = Rc::new(HookDispatcher::new(component, contexts.clone()));
    let _guard = install(dispatcher.clone());

    loop {
        dispatcher.begin_pass();
        let node = render()?;
        if !dispatcher.needs_rerender() {
            return Ok(node);
        }
        let passes = dispatcher.passes();
        if passes >= max_passes {
            return Err(VisitError::TooManyRenders {
                component: component.to_string(),
                passes,
            });
        }
        trace!(component, pass = passes + 1, "state changed during render, re-rendering");
    }
}
