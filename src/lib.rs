//! # spark-prepass
//!
//! Single-pass element visitor for declarative component trees.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! hook state and configuration.
//!
//! ## Architecture
//!
//! A prepass walks a component tree before the real render, so a host can
//! discover every component that would render and every lazy resource it
//! would need. The walk itself belongs to the caller: [`Prepass::visit_element`]
//! renders exactly one element and returns its children.
//!
//! ```text
//! caller ──► visit_element(element, queue, visitor)
//!                 │
//!                 ├── classify ──► Kind
//!                 ├── context stack / legacy table (session state)
//!                 ├── hooks dispatcher (function components, fixed point)
//!                 └── queue ◄── DeferredWork for pending lazy nodes
//!            ◄── Vec<Node> children
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Values, props, nodes, render functions, refs
//! - [`element`] - Elements, element types, the node classifier
//! - [`context`] - Contexts, the context stack, legacy context
//! - [`component`] - Function, forward-ref, class and lazy component types
//! - [`hooks`] - Hook primitives and the prepass dispatcher
//! - [`visit`] - The visit orchestrator and deferred work
//! - [`config`] - Per-thread configuration signals
//! - [`error`] - Error types

pub mod component;
pub mod config;
pub mod context;
pub mod element;
pub mod error;
pub mod hooks;
pub mod types;
pub mod visit;

// Re-export commonly used items
pub use types::*;

pub use component::{
    ClassInstance, ClassType, Component, ForwardRef, FunctionComponent, Instance, InstanceHandle,
    Lazy, LazyResource, LazyStatus, Lifecycle, StateUpdate,
};

pub use config::{config, reset_config, set_config, Config};

pub use context::{create_context, Context, ContextMap, ContextStack, LegacyContext};

pub use element::{classify, normalize, Element, ElementType, Kind};

pub use error::{InvalidNode, VisitError, VisitResult};

pub use hooks::{
    use_callback, use_context, use_debug_value, use_effect, use_layout_effect, use_memo,
    use_reducer, use_ref, use_state, use_sync_external_store, Dispatch, StateSetter,
};

pub use visit::{DeferredWork, FrameKind, Prepass, Visitor};
