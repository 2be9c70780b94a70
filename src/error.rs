//! Visit error types.

use thiserror::Error;

/// Why a node was skipped instead of rendered.
///
/// Carried by [`Kind::Invalid`](crate::element::Kind::Invalid). Never
/// surfaced to the caller: the node simply contributes no children.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {node}: {reason}")]
pub struct InvalidNode {
    /// Display name of the offending node.
    pub node: String,
    /// Human readable reason.
    pub reason: &'static str,
}

/// Errors that can occur while visiting an element.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VisitError {
    /// Malformed node. Recovered locally by the orchestrator.
    #[error(transparent)]
    InvalidNode(#[from] InvalidNode),

    /// A component used a primitive the prepass runtime does not provide.
    #[error("unsupported primitive `{primitive}`")]
    UnsupportedPrimitive { primitive: &'static str },

    /// A lazy resource settled in a failure state.
    #[error("lazy resource rejected: {0}")]
    ResourceRejected(String),

    /// An element with an unrecognized or self-contradictory shape.
    #[error("classifier mismatch: {0}")]
    ClassifierMismatch(String),

    /// A function component kept scheduling state updates.
    #[error("`{component}` did not settle after {passes} render passes")]
    TooManyRenders { component: String, passes: usize },

    /// Hooks were called in a different order on a re-render pass.
    #[error("hook #{index} changed from `{expected}` to `{found}` between render passes")]
    HookOrder {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    /// Error returned by user render code.
    #[error("component error: {0}")]
    Component(String),
}

impl VisitError {
    /// Creates an unsupported primitive error.
    pub fn unsupported(primitive: &'static str) -> Self {
        Self::UnsupportedPrimitive { primitive }
    }

    /// Creates a classifier mismatch error.
    pub fn mismatch(message: impl Into<String>) -> Self {
        Self::ClassifierMismatch(message.into())
    }

    /// Creates a component error.
    pub fn component(message: impl Into<String>) -> Self {
        Self::Component(message.into())
    }
}

/// Result alias used across the crate.
pub type VisitResult<T> = Result<T, VisitError>;
