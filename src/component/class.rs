//! Class-style components.
//!
//! A class component is a Rust type implementing [`Component`], registered
//! as an element type through [`ClassType::of`]. Each visit constructs a
//! fresh instance and runs, in order:
//!
//! 1. [`Component::construct`] with props and the resolved context
//! 2. [`Component::get_derived_state_from_props`], merged into state
//! 3. [`Component::component_will_mount`] then
//!    [`Component::unsafe_component_will_mount`], followed by their queued
//!    [`Instance::set_state`] updates; skipped for classes whose
//!    [`Component::defines_derived_state`] is true
//! 4. [`Component::render`]
//! 5. [`Component::get_child_context`], merged into the legacy table
//!
//! Nothing here unmounts. [`Component::component_will_unmount`] runs only
//! when the caller retires an instance it kept through
//! [`InstanceHandle::retire`].

use std::any::Any;
use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::context::Context;
use crate::error::VisitResult;
use crate::types::{Node, Object, Props, State, Value};

// =============================================================================
// Lifecycle flags
// =============================================================================

bitflags::bitflags! {
    /// Lifecycle steps an instance went through.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Lifecycle: u8 {
        const CONSTRUCTED = 1 << 0;
        const DERIVED_STATE = 1 << 1;
        const WILL_MOUNT = 1 << 2;
        const RENDERED = 1 << 3;
        const CHILD_CONTEXT = 1 << 4;
        const RETIRED = 1 << 5;
    }
}

// =============================================================================
// Instance - props, state, context and the update queue
// =============================================================================

/// Queued state change.
pub enum StateUpdate {
    /// Shallow-merged into state.
    Partial(State),
    /// Computes a partial state from the latest state and props.
    Updater(Box<dyn FnOnce(&State, &Props) -> State>),
}

impl fmt::Debug for StateUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateUpdate::Partial(state) => f.debug_tuple("Partial").field(state).finish(),
            StateUpdate::Updater(_) => f.write_str("Updater(..)"),
        }
    }
}

/// The framework-managed half of a class instance.
#[derive(Debug, Default)]
pub struct Instance {
    pub props: Props,
    pub state: State,
    /// Modern context value or the masked legacy context object.
    pub context: Value,
    queue: Vec<StateUpdate>,
}

impl Instance {
    pub fn new(props: Props, context: Value) -> Self {
        Self {
            props,
            state: State::new(),
            context,
            queue: Vec::new(),
        }
    }

    /// Queue a partial state.
    pub fn set_state(&mut self, partial: State) {
        self.queue.push(StateUpdate::Partial(partial));
    }

    /// Queue an updater computing a partial state.
    pub fn update_state(&mut self, updater: impl FnOnce(&State, &Props) -> State + 'static) {
        self.queue.push(StateUpdate::Updater(Box::new(updater)));
    }

    /// Apply queued updates in order. Returns how many were applied.
    fn flush_updates(&mut self) -> usize {
        let queue = std::mem::take(&mut self.queue);
        let count = queue.len();
        for update in queue {
            let partial = match update {
                StateUpdate::Partial(partial) => partial,
                StateUpdate::Updater(updater) => updater(&self.state, &self.props),
            };
            self.state.merge(&partial);
        }
        count
    }
}

// =============================================================================
// Component trait
// =============================================================================

/// A class-style component.
///
/// Associated functions bounded by `Self: Sized` play the role of static
/// class members; methods are instance members.
pub trait Component: Any {
    /// Build the component. Props and context are already set on `this`;
    /// assign the initial `this.state` here. Updates queued from the
    /// constructor are discarded.
    fn construct(this: &mut Instance) -> Self
    where
        Self: Sized;

    /// Partial state derived from props, merged before the first render.
    fn get_derived_state_from_props(_props: &Props, _state: &State) -> Option<State>
    where
        Self: Sized,
    {
        None
    }

    /// Whether the class implements [`Component::get_derived_state_from_props`].
    ///
    /// Such classes skip `component_will_mount` and
    /// `unsafe_component_will_mount`.
    fn defines_derived_state() -> bool
    where
        Self: Sized,
    {
        false
    }

    /// Legacy context keys this component reads.
    fn context_types() -> &'static [&'static str]
    where
        Self: Sized,
    {
        &[]
    }

    fn component_will_mount(&mut self, _this: &mut Instance) {}

    /// Legacy alias of [`Component::component_will_mount`].
    fn unsafe_component_will_mount(&mut self, _this: &mut Instance) {}

    fn render(&self, this: &Instance) -> VisitResult<Node>;

    /// Legacy context contributed to descendants.
    fn get_child_context(&self, _this: &Instance) -> Option<Object> {
        None
    }

    fn component_will_unmount(&mut self, _this: &mut Instance) {}
}

// =============================================================================
// ClassType - type-erased component class
// =============================================================================

#[derive(Clone)]
struct ClassTypeInner {
    name: Rc<str>,
    derives_state: bool,
    construct: fn(&mut Instance) -> Box<dyn Component>,
    derive_state: fn(&Props, &State) -> Option<State>,
    context_types: fn() -> &'static [&'static str],
    context_type: Option<Context>,
}

/// Element type for a [`Component`] implementation.
///
/// Equality is identity of the registration.
#[derive(Clone)]
pub struct ClassType {
    inner: Rc<ClassTypeInner>,
}

fn construct_erased<C: Component>(this: &mut Instance) -> Box<dyn Component> {
    Box::new(C::construct(this))
}

impl ClassType {
    /// Register `C` as an element type.
    pub fn of<C: Component>(name: &str) -> Self {
        Self {
            inner: Rc::new(ClassTypeInner {
                name: name.into(),
                derives_state: C::defines_derived_state(),
                construct: construct_erased::<C>,
                derive_state: C::get_derived_state_from_props,
                context_types: C::context_types,
                context_type: None,
            }),
        }
    }

    /// Read `context` as the instance context instead of legacy context.
    pub fn with_context_type(mut self, context: Context) -> Self {
        Rc::make_mut(&mut self.inner).context_type = Some(context);
        self
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn context_type(&self) -> Option<&Context> {
        self.inner.context_type.as_ref()
    }

    pub fn context_types(&self) -> &'static [&'static str] {
        (self.inner.context_types)()
    }
}

impl PartialEq for ClassType {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassType({})", self.inner.name)
    }
}

// =============================================================================
// ClassInstance
// =============================================================================

/// A constructed class component together with its framework state.
pub struct ClassInstance {
    class: ClassType,
    instance: Instance,
    component: Box<dyn Component>,
    lifecycle: Lifecycle,
}

impl ClassInstance {
    /// Construct and run the pre-render lifecycle.
    pub(crate) fn mount(class: &ClassType, props: Props, context: Value) -> Self {
        let mut instance = Instance::new(props, context);
        let mut component = (class.inner.construct)(&mut instance);
        let mut lifecycle = Lifecycle::CONSTRUCTED;

        let discarded = std::mem::take(&mut instance.queue);
        if !discarded.is_empty() {
            debug!(
                component = class.name(),
                count = discarded.len(),
                "state updates queued in constructor ignored"
            );
        }

        if let Some(partial) = (class.inner.derive_state)(&instance.props, &instance.state) {
            instance.state.merge(&partial);
            lifecycle |= Lifecycle::DERIVED_STATE;
        }

        if class.inner.derives_state {
            trace!(component = class.name(), "derived state, will-mount hooks skipped");
        } else {
            component.component_will_mount(&mut instance);
            component.unsafe_component_will_mount(&mut instance);
            lifecycle |= Lifecycle::WILL_MOUNT;
        }

        let applied = instance.flush_updates();
        if applied > 0 {
            trace!(component = class.name(), applied, "applied will-mount updates");
        }

        Self {
            class: class.clone(),
            instance,
            component,
            lifecycle,
        }
    }

    pub(crate) fn render(&mut self) -> VisitResult<Node> {
        let node = self.component.render(&self.instance)?;
        self.lifecycle |= Lifecycle::RENDERED;
        Ok(node)
    }

    pub(crate) fn child_context(&mut self) -> Option<Object> {
        let child_context = self.component.get_child_context(&self.instance)?;
        self.lifecycle |= Lifecycle::CHILD_CONTEXT;
        Some(child_context)
    }

    fn retire(&mut self) -> bool {
        if self.lifecycle.contains(Lifecycle::RETIRED) {
            return false;
        }
        self.component.component_will_unmount(&mut self.instance);
        self.lifecycle |= Lifecycle::RETIRED;
        true
    }

    pub fn class(&self) -> &ClassType {
        &self.class
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn props(&self) -> &Props {
        &self.instance.props
    }

    pub fn state(&self) -> &State {
        &self.instance.state
    }

    pub fn context(&self) -> &Value {
        &self.instance.context
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Downcast to the concrete component.
    pub fn component<C: Component>(&self) -> Option<&C> {
        let component: &dyn Any = &*self.component;
        component.downcast_ref::<C>()
    }
}

impl fmt::Debug for ClassInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInstance")
            .field("class", &self.class)
            .field("instance", &self.instance)
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}

/// Shared handle to a class instance, handed to the visitor.
///
/// Keeping a clone is how a caller decides instance identity across visits.
#[derive(Clone, Debug)]
pub struct InstanceHandle(Rc<RefCell<ClassInstance>>);

impl InstanceHandle {
    pub(crate) fn new(instance: ClassInstance) -> Self {
        Self(Rc::new(RefCell::new(instance)))
    }

    pub fn borrow(&self) -> Ref<'_, ClassInstance> {
        self.0.borrow()
    }

    pub(crate) fn with_mut<R>(&self, f: impl FnOnce(&mut ClassInstance) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }

    /// Run `component_will_unmount`. Returns `false` if already retired.
    pub fn retire(&self) -> bool {
        self.0.borrow_mut().retire()
    }

    pub fn is_retired(&self) -> bool {
        self.0.borrow().lifecycle.contains(Lifecycle::RETIRED)
    }

    pub fn ptr_eq(&self, other: &InstanceHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
