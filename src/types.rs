//! Core types for spark-prepass.
//!
//! These are the payloads that flow through a visit: prop and state values,
//! the ordered maps that hold them, and the renderable [`Node`] children a
//! visit produces.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::element::Element;
use crate::error::VisitResult;

// =============================================================================
// Value
// =============================================================================

/// A dynamic prop, state or context value.
///
/// Equality is structural for data and by identity for functions and
/// elements, which is what state bail-out and memo deps compare against.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    List(Vec<Value>),
    Object(Object),
    Node(Node),
    Func(RenderFn),
    Ref(NodeRef),
}

impl Value {
    /// Check if this is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_func(&self) -> Option<&RenderFn> {
        match self {
            Value::Func(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_ref_cell(&self) -> Option<&NodeRef> {
        match self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Int(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value.into())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

impl From<Node> for Value {
    fn from(value: Node) -> Self {
        Value::Node(value)
    }
}

impl From<Element> for Value {
    fn from(value: Element) -> Self {
        Value::Node(Node::Element(value))
    }
}

impl From<RenderFn> for Value {
    fn from(value: RenderFn) -> Self {
        Value::Func(value)
    }
}

impl From<NodeRef> for Value {
    fn from(value: NodeRef) -> Self {
        Value::Ref(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

// =============================================================================
// Object - ordered string map
// =============================================================================

/// Insertion-ordered map from keys to values.
///
/// Used for props, class state and legacy context objects. Maps stay small,
/// so lookups are linear.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Object {
    entries: Vec<(Rc<str>, Value)>,
}

/// Element props. `children` is the reserved key for child content.
pub type Props = Object;

/// Class component state.
pub type State = Object;

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<Rc<str>>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| &**k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace a value, keeping the original position on replace.
    pub fn insert(&mut self, key: impl Into<Rc<str>>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let position = self.entries.iter().position(|(k, _)| &**k == key)?;
        Some(self.entries.remove(position).1)
    }

    /// Shallow merge: every entry of `other` overwrites the same key here.
    pub fn merge(&mut self, other: &Object) {
        for (key, value) in &other.entries {
            self.insert(key.clone(), value.clone());
        }
    }

    /// Copy of this object with only the given keys, skipping absent ones.
    pub fn pick(&self, keys: &[&str]) -> Object {
        let mut picked = Object::new();
        for key in keys {
            if let Some(value) = self.get(key) {
                picked.insert(*key, value.clone());
            }
        }
        picked
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (&**k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| &**k)
    }

    /// The reserved `children` prop.
    pub fn children(&self) -> Option<&Value> {
        self.get("children")
    }
}

impl<K: Into<Rc<str>>, V: Into<Value>> FromIterator<(K, V)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut object = Object::new();
        for (key, value) in iter {
            object.insert(key, value);
        }
        object
    }
}

// =============================================================================
// Node - renderable children
// =============================================================================

/// Renderable child content.
///
/// Visits only ever return `Element` and `Text` nodes; `Empty` and `List`
/// are removed by normalization.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Node {
    /// Renders nothing (`null`, `false`, unit).
    #[default]
    Empty,
    /// Text content. Numbers render as text.
    Text(Rc<str>),
    Element(Element),
    /// Unkeyed list of children.
    List(Vec<Node>),
}

impl Node {
    pub fn text(content: impl Into<Rc<str>>) -> Self {
        Node::Text(content.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Node::Empty)
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(t) => Some(t),
            _ => None,
        }
    }
}

impl From<Element> for Node {
    fn from(value: Element) -> Self {
        Node::Element(value)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Text(value.into())
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::Text(value.into())
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Self {
        Node::Text(value.to_string().into())
    }
}

impl From<i32> for Node {
    fn from(value: i32) -> Self {
        Node::Text(value.to_string().into())
    }
}

impl From<bool> for Node {
    fn from(_: bool) -> Self {
        Node::Empty
    }
}

impl From<()> for Node {
    fn from(_: ()) -> Self {
        Node::Empty
    }
}

impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Node::Empty)
    }
}

impl<T: Into<Node>> From<Vec<T>> for Node {
    fn from(value: Vec<T>) -> Self {
        Node::List(value.into_iter().map(Into::into).collect())
    }
}

// =============================================================================
// RenderFn - render prop
// =============================================================================

/// A function child, e.g. the render prop of a context consumer.
#[derive(Clone)]
pub struct RenderFn(Rc<dyn Fn(&Value) -> VisitResult<Node>>);

impl RenderFn {
    pub fn new(f: impl Fn(&Value) -> VisitResult<Node> + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, value: &Value) -> VisitResult<Node> {
        (self.0)(value)
    }
}

impl PartialEq for RenderFn {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for RenderFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RenderFn(..)")
    }
}

// =============================================================================
// NodeRef - mutable ref cell
// =============================================================================

/// Shared mutable cell used for element refs and `use_ref`.
///
/// Compared by identity.
#[derive(Clone, Default)]
pub struct NodeRef(Rc<RefCell<Value>>);

impl NodeRef {
    pub fn new(initial: impl Into<Value>) -> Self {
        Self(Rc::new(RefCell::new(initial.into())))
    }

    pub fn get(&self) -> Value {
        self.0.borrow().clone()
    }

    pub fn set(&self, value: impl Into<Value>) {
        *self.0.borrow_mut() = value.into();
    }

    pub fn ptr_eq(&self, other: &NodeRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeRef").field(&*self.0.borrow()).finish()
    }
}
