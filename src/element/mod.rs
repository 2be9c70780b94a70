//! Elements - immutable descriptions of one node in a component tree.
//!
//! An [`Element`] pairs an [`ElementType`] with its [`Props`]. Elements are
//! built by callers and never mutated by a visit; cloning one is a pointer
//! copy.
//!
//! # Example
//!
//! ```
//! use spark_prepass::element::Element;
//!
//! let list = Element::host("ul")
//!     .with_key("todos")
//!     .with_children(vec![
//!         Element::host("li").with_child("first"),
//!         Element::host("li").with_child("second"),
//!     ]);
//!
//! assert_eq!(list.element_type().name(), "ul");
//! assert_eq!(list.key(), Some("todos"));
//! ```
//!
//! - [`kind`] - the node classifier
//! - [`children`] - child normalization

pub mod children;
pub mod kind;

use std::fmt;
use std::rc::Rc;

use crate::component::{ClassType, ForwardRef, FunctionComponent, Lazy};
use crate::context::Context;
use crate::types::{Node, NodeRef, Props, Value};

pub use children::{normalize, normalize_node};
pub use kind::{classify, Kind};

// =============================================================================
// ElementType
// =============================================================================

/// The rendering implementation behind an element.
#[derive(Clone)]
pub enum ElementType {
    /// Host tag such as `"div"`. Rendered by a backend, never by the core.
    Host(Rc<str>),
    /// Grouping wrapper without output of its own.
    Fragment,
    /// Subtree that belongs to a different render root.
    Portal,
    /// Provides a value for a context to its subtree.
    Provider(Context),
    /// Reads a context through a render-prop child.
    Consumer(Context),
    /// Type resolved from an asynchronous resource.
    Lazy(Lazy),
    /// Memoized wrapper around another component type.
    Memo(Rc<ElementType>),
    /// Render function receiving the element's ref.
    ForwardRef(ForwardRef),
    /// Class-style component with lifecycle hooks.
    Class(ClassType),
    /// Function-style component.
    Function(FunctionComponent),
}

impl ElementType {
    /// Host tag type.
    pub fn host(tag: impl Into<Rc<str>>) -> Self {
        ElementType::Host(tag.into())
    }

    /// Wrap a component type in a memo marker.
    pub fn memo(inner: impl Into<ElementType>) -> Self {
        ElementType::Memo(Rc::new(inner.into()))
    }

    /// Display name used in logs and errors.
    pub fn name(&self) -> String {
        match self {
            ElementType::Host(tag) => tag.to_string(),
            ElementType::Fragment => "Fragment".to_string(),
            ElementType::Portal => "Portal".to_string(),
            ElementType::Provider(ctx) => format!("{}.Provider", ctx.name()),
            ElementType::Consumer(ctx) => format!("{}.Consumer", ctx.name()),
            ElementType::Lazy(_) => "Lazy".to_string(),
            ElementType::Memo(inner) => format!("Memo({})", inner.name()),
            ElementType::ForwardRef(f) => format!("ForwardRef({})", f.name()),
            ElementType::Class(c) => c.name().to_string(),
            ElementType::Function(f) => f.name().to_string(),
        }
    }

    /// Whether this type is something a memo or lazy wrapper may resolve to.
    pub fn is_component(&self) -> bool {
        matches!(
            self,
            ElementType::Class(_)
                | ElementType::Function(_)
                | ElementType::ForwardRef(_)
                | ElementType::Memo(_)
                | ElementType::Lazy(_)
        )
    }
}

impl PartialEq for ElementType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ElementType::Host(a), ElementType::Host(b)) => a == b,
            (ElementType::Fragment, ElementType::Fragment) => true,
            (ElementType::Portal, ElementType::Portal) => true,
            (ElementType::Provider(a), ElementType::Provider(b)) => a == b,
            (ElementType::Consumer(a), ElementType::Consumer(b)) => a == b,
            (ElementType::Lazy(a), ElementType::Lazy(b)) => a == b,
            (ElementType::Memo(a), ElementType::Memo(b)) => a == b,
            (ElementType::ForwardRef(a), ElementType::ForwardRef(b)) => a == b,
            (ElementType::Class(a), ElementType::Class(b)) => a == b,
            (ElementType::Function(a), ElementType::Function(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl From<&str> for ElementType {
    fn from(tag: &str) -> Self {
        ElementType::Host(tag.into())
    }
}

impl From<FunctionComponent> for ElementType {
    fn from(value: FunctionComponent) -> Self {
        ElementType::Function(value)
    }
}

impl From<ClassType> for ElementType {
    fn from(value: ClassType) -> Self {
        ElementType::Class(value)
    }
}

impl From<ForwardRef> for ElementType {
    fn from(value: ForwardRef) -> Self {
        ElementType::ForwardRef(value)
    }
}

impl From<Lazy> for ElementType {
    fn from(value: Lazy) -> Self {
        ElementType::Lazy(value)
    }
}

// =============================================================================
// Element
// =============================================================================

#[derive(Clone)]
struct ElementData {
    ty: ElementType,
    props: Props,
    key: Option<Rc<str>>,
    node_ref: Option<NodeRef>,
}

/// Immutable description of one node.
///
/// Builder methods (`with_*`) copy-on-write, so an element shared with a
/// previous visit is never changed underneath it.
#[derive(Clone)]
pub struct Element {
    data: Rc<ElementData>,
}

impl Element {
    /// Create an element from a type and props.
    pub fn new(ty: impl Into<ElementType>, props: Props) -> Self {
        Self {
            data: Rc::new(ElementData {
                ty: ty.into(),
                props,
                key: None,
                node_ref: None,
            }),
        }
    }

    /// Host element with no props.
    pub fn host(tag: &str) -> Self {
        Self::new(ElementType::host(tag), Props::new())
    }

    /// Grouping element around the given children.
    pub fn fragment(children: impl Into<Node>) -> Self {
        Self::new(ElementType::Fragment, Props::new()).with_children(children)
    }

    /// Portal element. Its children are never visited by the core.
    pub fn portal(children: impl Into<Node>) -> Self {
        Self::new(ElementType::Portal, Props::new()).with_children(children)
    }

    pub fn element_type(&self) -> &ElementType {
        &self.data.ty
    }

    pub fn props(&self) -> &Props {
        &self.data.props
    }

    pub fn key(&self) -> Option<&str> {
        self.data.key.as_deref()
    }

    pub fn node_ref(&self) -> Option<&NodeRef> {
        self.data.node_ref.as_ref()
    }

    /// The reserved `children` prop.
    pub fn children(&self) -> Option<&Value> {
        self.data.props.children()
    }

    /// Set one prop.
    pub fn with_prop(mut self, key: &str, value: impl Into<Value>) -> Self {
        Rc::make_mut(&mut self.data).props.insert(key, value);
        self
    }

    /// Replace the `children` prop.
    pub fn with_children(self, children: impl Into<Node>) -> Self {
        self.with_prop("children", Value::Node(children.into()))
    }

    /// Replace the `children` prop with a single child.
    pub fn with_child(self, child: impl Into<Node>) -> Self {
        self.with_children(child)
    }

    pub fn with_key(mut self, key: &str) -> Self {
        Rc::make_mut(&mut self.data).key = Some(key.into());
        self
    }

    pub fn with_ref(mut self, node_ref: NodeRef) -> Self {
        Rc::make_mut(&mut self.data).node_ref = Some(node_ref);
        self
    }

    /// Same props, key and ref under a different type.
    ///
    /// Used to unwrap memo and lazy wrappers.
    pub fn retype(&self, ty: ElementType) -> Self {
        Self {
            data: Rc::new(ElementData {
                ty,
                props: self.data.props.clone(),
                key: self.data.key.clone(),
                node_ref: self.data.node_ref.clone(),
            }),
        }
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Element) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Element");
        s.field("type", &self.data.ty);
        if let Some(key) = &self.data.key {
            s.field("key", key);
        }
        s.field("props", &self.data.props.keys().collect::<Vec<_>>());
        s.finish()
    }
}
