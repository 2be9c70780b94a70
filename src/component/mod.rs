//! Component types an element can render through.
//!
//! - [`FunctionComponent`] / [`ForwardRef`] - render functions, may use hooks
//! - [`Component`] / [`ClassType`] - class-style components with lifecycle
//! - [`Lazy`] - component type resolved from an asynchronous resource

mod class;
mod function;
mod lazy;

pub use class::{
    ClassInstance, ClassType, Component, Instance, InstanceHandle, Lifecycle, StateUpdate,
};
pub use function::{ForwardRef, FunctionComponent};
pub use lazy::{Lazy, LazyResource, LazyStatus};
