//! Contexts - stack-scoped value channels.
//!
//! A [`Context`] is created once per UI description. Providers write a value
//! for it, consumers and components read it back through the
//! [`ContextStack`] owned by the visiting session.
//!
//! - [`stack`] - current values, provider frames, restore log
//! - [`legacy`] - the session-scoped legacy context table
//!
//! # Example
//!
//! ```
//! use spark_prepass::context::{create_context, ContextStack};
//! use spark_prepass::types::Value;
//!
//! let theme = create_context("light");
//! let mut stack = ContextStack::new();
//!
//! assert_eq!(stack.current_value(&theme), Value::from("light"));
//! stack.push(&theme, "dark".into());
//! assert_eq!(stack.current_value(&theme), Value::from("dark"));
//! ```

pub mod legacy;
pub mod stack;

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::element::{Element, ElementType};
use crate::types::{Node, Props, RenderFn, Value};

pub use legacy::LegacyContext;
pub use stack::{ContextMap, ContextStack};

thread_local! {
    /// Counter for context identities.
    static CONTEXT_COUNTER: Cell<u64> = const { Cell::new(0) };
}

/// Identity of a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

struct ContextInner {
    id: ContextId,
    default_value: Value,
    name: Option<Rc<str>>,
}

/// Identity-keyed value channel with a default value.
#[derive(Clone)]
pub struct Context {
    inner: Rc<ContextInner>,
}

/// Create a context with the given default value.
pub fn create_context(default_value: impl Into<Value>) -> Context {
    Context::new(default_value, None)
}

impl Context {
    fn new(default_value: impl Into<Value>, name: Option<Rc<str>>) -> Self {
        let id = CONTEXT_COUNTER.with(|counter| {
            let id = counter.get();
            counter.set(id + 1);
            ContextId(id)
        });
        Self {
            inner: Rc::new(ContextInner {
                id,
                default_value: default_value.into(),
                name,
            }),
        }
    }

    /// Create a context with a display name used in logs.
    pub fn named(name: &str, default_value: impl Into<Value>) -> Self {
        Self::new(default_value, Some(name.into()))
    }

    pub fn id(&self) -> ContextId {
        self.inner.id
    }

    pub fn default_value(&self) -> &Value {
        &self.inner.default_value
    }

    pub fn name(&self) -> String {
        match &self.inner.name {
            Some(name) => name.to_string(),
            None => format!("Context#{}", self.inner.id.0),
        }
    }

    /// Provider element for this context.
    pub fn provider(&self, value: impl Into<Value>, children: impl Into<Node>) -> Element {
        let props = Props::new()
            .with("value", value)
            .with("children", Value::Node(children.into()));
        Element::new(ElementType::Provider(self.clone()), props)
    }

    /// Consumer element whose child renders from the current value.
    pub fn consumer(&self, render: RenderFn) -> Element {
        let props = Props::new().with("children", render);
        Element::new(ElementType::Consumer(self.clone()), props)
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Context {}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("name", &self.name())
            .field("default", &self.inner.default_value)
            .finish()
    }
}
