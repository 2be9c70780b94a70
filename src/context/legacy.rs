//! Legacy context table.
//!
//! Class components contribute named values through
//! [`Component::get_child_context`](crate::component::Component::get_child_context)
//! and descendants read them through their declared
//! [`Component::context_types`](crate::component::Component::context_types).
//!
//! Contributions are merged into one session-scoped object and are never
//! popped: a child visited in a separate call, outside its parent's call
//! stack, still sees what the parent contributed. The table lives until
//! [`LegacyContext::clear`].

use crate::types::Object;

/// Session-scoped merged legacy context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegacyContext {
    values: Object,
}

impl LegacyContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a child-context contribution over the current values.
    pub fn contribute(&mut self, child_context: &Object) {
        self.values.merge(child_context);
    }

    /// The values a component declaring `keys` gets to see.
    pub fn mask(&self, keys: &[&str]) -> Object {
        self.values.pick(keys)
    }

    /// Every contributed value.
    pub fn values(&self) -> &Object {
        &self.values
    }

    /// Replace all values, e.g. from a deferred-work snapshot.
    pub fn replace(&mut self, values: Object) {
        self.values = values;
    }

    pub fn clear(&mut self) {
        self.values = Object::new();
    }
}
