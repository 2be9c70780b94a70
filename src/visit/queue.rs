//! Deferred-work queue items.
//!
//! The visit never awaits. A lazy element whose resource is still pending
//! becomes one [`DeferredWork`] appended to the caller's queue; the caller
//! awaits [`DeferredWork::thenable`] and hands the item back to
//! [`Prepass::resume`](super::Prepass::resume).

use std::fmt;

use crate::component::LazyResource;
use crate::context::ContextMap;
use crate::element::{Element, ElementType};
use crate::types::{Object, Props};

/// Kind tag of a deferred work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Pending lazy component.
    Lazy,
}

impl FrameKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameKind::Lazy => "frame.lazy",
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node the visit could not finish synchronously.
#[derive(Clone)]
pub struct DeferredWork {
    /// Provided context values at deferral time.
    pub context_map: ContextMap,
    /// Legacy context table at deferral time.
    pub legacy_context: Object,
    /// Resource to await before resuming.
    pub thenable: LazyResource,
    pub kind: FrameKind,
    pub element_type: ElementType,
    pub props: Props,
}

impl DeferredWork {
    /// Element to visit once the resource settles.
    pub fn element(&self) -> Element {
        Element::new(self.element_type.clone(), self.props.clone())
    }
}

impl fmt::Debug for DeferredWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredWork")
            .field("kind", &self.kind)
            .field("element_type", &self.element_type)
            .field("props", &self.props)
            .field("contexts", &self.context_map.len())
            .finish()
    }
}
