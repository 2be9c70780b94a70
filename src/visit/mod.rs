//! Visit - render one element and return its children.
//!
//! [`Prepass::visit_element`] is the whole traversal primitive. It renders a
//! single element under the session's context state and returns the
//! element's children, normalized. It never descends: the caller decides the
//! order, and visits each returned child with further calls.
//!
//! # Example
//!
//! ```ignore
//! use spark_prepass::{Element, Node, Prepass};
//!
//! let prepass = Prepass::new();
//! let mut queue = Vec::new();
//! let mut stack = vec![Node::from(root)];
//!
//! while let Some(node) = stack.pop() {
//!     let Node::Element(element) = node else { continue };
//!     let children = prepass.visit_element(&element, &mut queue, &mut |el: &Element, _| {
//!         println!("rendering {}", el.element_type().name());
//!     })?;
//!     stack.extend(children.into_iter().rev());
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! classify(element) -> Kind
//!        │
//!        ├── host / fragment ──────────► children
//!        ├── provider ── push ─ capture ─ pop ─► children
//!        ├── consumer ── render fn(current value)
//!        ├── lazy ─┬─ settled ──► visit(resolved type)
//!        │         └─ pending ──► queue DeferredWork
//!        ├── memo ─────────────────────► visit(inner type)
//!        ├── forward_ref ── render_with_hooks
//!        ├── class ── mount ─ visitor ─ render ─ child context
//!        └── function ── visitor ─ render_with_hooks
//! ```

mod queue;

pub use queue::{DeferredWork, FrameKind};

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::component::{
    ClassInstance, ClassType, ForwardRef, FunctionComponent, InstanceHandle, Lazy, LazyStatus,
};
use crate::config::config;
use crate::context::{Context, ContextMap, ContextStack};
use crate::element::{classify, normalize, normalize_node, Element, ElementType, Kind};
use crate::error::{VisitError, VisitResult};
use crate::hooks::render_with_hooks;
use crate::types::{Node, Object, Value};

// =============================================================================
// Visitor
// =============================================================================

/// Callback run for every class and function component, before it renders.
///
/// Class components pass their freshly mounted instance; keeping a clone of
/// the handle is how the caller tracks instance identity.
pub trait Visitor {
    fn visit(&mut self, element: &Element, instance: Option<&InstanceHandle>);
}

impl<F> Visitor for F
where
    F: FnMut(&Element, Option<&InstanceHandle>),
{
    fn visit(&mut self, element: &Element, instance: Option<&InstanceHandle>) {
        self(element, instance)
    }
}

// =============================================================================
// Prepass session
// =============================================================================

/// One traversal session: the context stack and legacy context table every
/// visit reads and writes.
///
/// State persists across [`visit_element`](Self::visit_element) calls until
/// [`clear`](Self::clear).
#[derive(Debug, Default)]
pub struct Prepass {
    contexts: Rc<RefCell<ContextStack>>,
}

impl Prepass {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `element` and return its normalized children.
    ///
    /// Pending lazy elements are appended to `queue`. The visitor runs once
    /// for each class or function component rendered, memo and lazy wrappers
    /// included through the type they unwrap to.
    pub fn visit_element(
        &self,
        element: &Element,
        queue: &mut Vec<DeferredWork>,
        visitor: &mut impl Visitor,
    ) -> VisitResult<Vec<Node>> {
        let kind = classify(element)?;
        debug!(kind = kind.as_str(), node = %element.element_type().name(), "visit");

        match (kind, element.element_type()) {
            (Kind::Host | Kind::Fragment, _) => Ok(normalize(element.children())),
            (Kind::Portal, _) => Ok(Vec::new()),
            (Kind::Invalid(invalid), _) => {
                warn!(%invalid, "skipping invalid node");
                Ok(Vec::new())
            }
            (Kind::Provider, ElementType::Provider(context)) => {
                Ok(self.visit_provider(context, element))
            }
            (Kind::Consumer, ElementType::Consumer(context)) => {
                self.visit_consumer(context, element)
            }
            (Kind::Lazy, ElementType::Lazy(lazy)) => {
                self.visit_lazy(lazy, element, queue, visitor)
            }
            (Kind::Memo, ElementType::Memo(inner)) => {
                let unwrapped = element.retype(ElementType::clone(inner));
                self.visit_element(&unwrapped, queue, visitor)
            }
            (Kind::ForwardRef, ElementType::ForwardRef(forward)) => {
                self.visit_forward_ref(forward, element)
            }
            (Kind::Class, ElementType::Class(class)) => {
                self.visit_class(class, element, visitor)
            }
            (Kind::Function, ElementType::Function(function)) => {
                self.visit_function(function, element, visitor)
            }
            (kind, ty) => Err(VisitError::mismatch(format!(
                "`{}` classified as {}",
                ty.name(),
                kind.as_str()
            ))),
        }
    }

    /// Visit the element a deferred lazy node stood for, under the context
    /// state captured when it was deferred.
    ///
    /// The captured state replaces the session's and stays current so the
    /// returned children see it. What it replaced goes to the restore log;
    /// pass [`take_restore_log`](Self::take_restore_log) to
    /// [`restore_contexts`](Self::restore_contexts) after the subtree. A
    /// resource that is still pending is queued again.
    pub fn resume(
        &self,
        work: &DeferredWork,
        queue: &mut Vec<DeferredWork>,
        visitor: &mut impl Visitor,
    ) -> VisitResult<Vec<Node>> {
        self.contexts
            .borrow_mut()
            .enter(&work.context_map, work.legacy_context.clone());
        trace!(kind = %work.kind, node = %work.element_type.name(), "resume");
        self.visit_element(&work.element(), queue, visitor)
    }

    // =========================================================================
    // Per-kind rules
    // =========================================================================

    fn visit_provider(&self, context: &Context, element: &Element) -> Vec<Node> {
        let value = element.props().get("value").cloned().unwrap_or(Value::Null);
        self.contexts.borrow_mut().push(context, value);
        let children = normalize(element.children());
        // The frame was opened just above, so the pop always matches.
        if let Err(err) = self.contexts.borrow_mut().pop(context) {
            warn!(%err, "provider frame out of order");
        }
        children
    }

    fn visit_consumer(&self, context: &Context, element: &Element) -> VisitResult<Vec<Node>> {
        let value = self.contexts.borrow().current_value(context);
        let node = match element.children() {
            Some(Value::Func(render)) => render.call(&value)?,
            _ => Node::Empty,
        };
        Ok(normalize_node(node))
    }

    fn visit_lazy(
        &self,
        lazy: &Lazy,
        element: &Element,
        queue: &mut Vec<DeferredWork>,
        visitor: &mut impl Visitor,
    ) -> VisitResult<Vec<Node>> {
        match lazy.status() {
            LazyStatus::Resolved(ty) => {
                if !ty.is_component() {
                    return Err(VisitError::mismatch(format!(
                        "lazy must resolve to a component, got `{}`",
                        ty.name()
                    )));
                }
                let resolved = element.retype(ty);
                self.visit_element(&resolved, queue, visitor)
            }
            LazyStatus::Rejected(reason) => Err(VisitError::ResourceRejected(reason.to_string())),
            LazyStatus::Pending(thenable) => {
                let contexts = self.contexts.borrow();
                queue.push(DeferredWork {
                    context_map: contexts.snapshot(),
                    legacy_context: contexts.legacy().values().clone(),
                    thenable,
                    kind: FrameKind::Lazy,
                    element_type: element.element_type().clone(),
                    props: element.props().clone(),
                });
                debug!(queued = queue.len(), "deferred pending lazy node");
                Ok(Vec::new())
            }
        }
    }

    fn visit_forward_ref(&self, forward: &ForwardRef, element: &Element) -> VisitResult<Vec<Node>> {
        let max_passes = config().max_render_passes;
        let node = render_with_hooks(forward.name(), &self.contexts, max_passes, || {
            forward.render(element.props(), element.node_ref())
        })?;
        Ok(normalize_node(node))
    }

    fn visit_class(
        &self,
        class: &ClassType,
        element: &Element,
        visitor: &mut impl Visitor,
    ) -> VisitResult<Vec<Node>> {
        let context = self.class_context(class);
        let handle = InstanceHandle::new(ClassInstance::mount(
            class,
            element.props().clone(),
            context,
        ));

        visitor.visit(element, Some(&handle));

        let (node, child_context) = handle.with_mut(|instance| {
            let node = instance.render()?;
            VisitResult::Ok((node, instance.child_context()))
        })?;

        if let Some(child_context) = child_context {
            trace!(component = class.name(), keys = child_context.len(), "legacy context contributed");
            self.contexts.borrow_mut().legacy_mut().contribute(&child_context);
        }
        Ok(normalize_node(node))
    }

    /// Context handed to a class constructor: the modern context value when
    /// the class names one, else the legacy table masked to its keys.
    fn class_context(&self, class: &ClassType) -> Value {
        let contexts = self.contexts.borrow();
        if let Some(context) = class.context_type() {
            return contexts.current_value(context);
        }
        match class.context_types() {
            [] => Value::Object(Object::new()),
            keys => Value::Object(contexts.legacy().mask(keys)),
        }
    }

    fn visit_function(
        &self,
        function: &FunctionComponent,
        element: &Element,
        visitor: &mut impl Visitor,
    ) -> VisitResult<Vec<Node>> {
        visitor.visit(element, None);

        let max_passes = config().max_render_passes;
        let node = render_with_hooks(function.name(), &self.contexts, max_passes, || {
            function.render(element.props())
        })?;
        Ok(normalize_node(node))
    }

    // =========================================================================
    // Session state
    // =========================================================================

    /// Current value of a context, or its default.
    pub fn current_value(&self, context: &Context) -> Value {
        self.contexts.borrow().current_value(context)
    }

    /// Copy of every provided context value.
    pub fn current_contexts(&self) -> ContextMap {
        self.contexts.borrow().snapshot()
    }

    /// Copy of the legacy context table.
    pub fn legacy_context(&self) -> Object {
        self.contexts.borrow().legacy().values().clone()
    }

    /// Values overwritten by providers since the last call. Pass them to
    /// [`restore_contexts`](Self::restore_contexts) when leaving the
    /// providers' subtrees.
    pub fn take_restore_log(&self) -> ContextMap {
        self.contexts.borrow_mut().take_restore_log()
    }

    pub fn restore_contexts(&self, map: &ContextMap) {
        self.contexts.borrow_mut().restore(map);
    }

    /// Reset context values and the legacy table between traversals.
    pub fn clear(&self) {
        self.contexts.borrow_mut().clear();
    }
}
