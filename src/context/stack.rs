//! Context Stack - current values and provider frames.
//!
//! A provider visit opens a frame with [`ContextStack::push`] and closes it
//! with [`ContextStack::pop`] before the visit returns. Closing a frame does
//! not revert the value: the caller visits the provider's subtree in later
//! calls and those must still observe it. The overwritten value goes to a
//! restore log instead, which the caller takes with
//! [`ContextStack::take_restore_log`] and reapplies with
//! [`ContextStack::restore`] once it leaves the subtree.
//!
//! "Nearest ancestor provider" is therefore only correct when the caller
//! visits a subtree depth-first before its siblings. The stack guarantees
//! frame pairing, not traversal order.

use std::collections::HashMap;

use tracing::trace;

use super::{Context, ContextId, LegacyContext};
use crate::error::{VisitError, VisitResult};
use crate::types::{Object, Value};

// =============================================================================
// ContextMap
// =============================================================================

/// Copy of context values keyed by identity.
///
/// `None` marks a context that had no provided value, so restoring it falls
/// back to the default. A restore log may also carry the legacy table that
/// [`ContextStack::enter`] replaced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextMap {
    values: HashMap<ContextId, Option<Value>>,
    legacy: Option<Object>,
}

impl ContextMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provided value for a context, if the map has one.
    pub fn get(&self, context: &Context) -> Option<&Value> {
        self.values.get(&context.id()).and_then(Option::as_ref)
    }

    pub fn contains(&self, context: &Context) -> bool {
        self.values.contains_key(&context.id())
    }

    /// Legacy table to put back, if one was replaced.
    pub fn legacy(&self) -> Option<&Object> {
        self.legacy.as_ref()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.legacy.is_none()
    }
}

// =============================================================================
// ContextStack
// =============================================================================

#[derive(Debug)]
struct Frame {
    context: Context,
    previous: Option<Value>,
}

/// Current context values for one traversal session.
#[derive(Debug, Default)]
pub struct ContextStack {
    current: HashMap<ContextId, Value>,
    frames: Vec<Frame>,
    restore_log: HashMap<ContextId, Option<Value>>,
    legacy_log: Option<Object>,
    legacy: LegacyContext,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a provider frame and make `value` current.
    pub fn push(&mut self, context: &Context, value: Value) {
        trace!(context = %context.name(), "push context");
        let previous = self.current.insert(context.id(), value);
        self.frames.push(Frame {
            context: context.clone(),
            previous,
        });
    }

    /// Close the innermost provider frame, which must belong to `context`.
    ///
    /// The provided value stays current; the value it replaced is recorded in
    /// the restore log.
    pub fn pop(&mut self, context: &Context) -> VisitResult<()> {
        let Some(frame) = self.frames.pop() else {
            return Err(VisitError::mismatch(format!(
                "pop of `{}` without an open provider frame",
                context.name()
            )));
        };
        if frame.context != *context {
            let expected = frame.context.name();
            self.frames.push(frame);
            return Err(VisitError::mismatch(format!(
                "pop of `{}` while `{}` is innermost",
                context.name(),
                expected
            )));
        }
        trace!(context = %context.name(), "pop context");
        // Keep the oldest value: that is what the enclosing scope had.
        self.restore_log
            .entry(context.id())
            .or_insert(frame.previous);
        Ok(())
    }

    /// Current value of a context, or its default.
    pub fn current_value(&self, context: &Context) -> Value {
        self.current
            .get(&context.id())
            .cloned()
            .unwrap_or_else(|| context.default_value().clone())
    }

    /// Number of open provider frames.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Copy of every provided value.
    pub fn snapshot(&self) -> ContextMap {
        ContextMap {
            values: self
                .current
                .iter()
                .map(|(id, value)| (*id, Some(value.clone())))
                .collect(),
            legacy: None,
        }
    }

    /// Replace every current value with `map` and the legacy table with
    /// `legacy`, as captured when a node was deferred.
    ///
    /// Contexts missing from `map` fall back to their default. Everything
    /// overwritten goes to the restore log.
    pub fn enter(&mut self, map: &ContextMap, legacy: Object) {
        let stale: Vec<ContextId> = self
            .current
            .keys()
            .filter(|id| !matches!(map.values.get(*id), Some(Some(_))))
            .copied()
            .collect();
        for id in stale {
            let previous = self.current.remove(&id);
            self.restore_log.entry(id).or_insert(previous);
        }
        for (id, value) in &map.values {
            if let Some(value) = value {
                let previous = self.current.insert(*id, value.clone());
                self.restore_log.entry(*id).or_insert(previous);
            }
        }

        let previous = self.legacy.values().clone();
        self.legacy.replace(legacy);
        self.legacy_log.get_or_insert(previous);
        trace!(contexts = map.len(), "entered captured contexts");
    }

    /// Take the values overwritten by providers since the last call.
    pub fn take_restore_log(&mut self) -> ContextMap {
        ContextMap {
            values: std::mem::take(&mut self.restore_log),
            legacy: self.legacy_log.take(),
        }
    }

    /// Reapply a snapshot or restore log on top of the current values.
    pub fn restore(&mut self, map: &ContextMap) {
        for (id, value) in &map.values {
            match value {
                Some(value) => {
                    self.current.insert(*id, value.clone());
                }
                None => {
                    self.current.remove(id);
                }
            }
        }
        if let Some(legacy) = &map.legacy {
            self.legacy.replace(legacy.clone());
        }
    }

    pub fn legacy(&self) -> &LegacyContext {
        &self.legacy
    }

    pub fn legacy_mut(&mut self) -> &mut LegacyContext {
        &mut self.legacy
    }

    /// Reset values, frames, restore log and the legacy table.
    pub fn clear(&mut self) {
        self.current.clear();
        self.frames.clear();
        self.restore_log.clear();
        self.legacy_log = None;
        self.legacy.clear();
    }
}
