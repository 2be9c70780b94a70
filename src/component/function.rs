//! Function-style components.

use std::fmt;
use std::rc::Rc;

use crate::error::VisitResult;
use crate::types::{Node, NodeRef, Props};

type RenderProps = dyn Fn(&Props) -> VisitResult<Node>;
type RenderWithRef = dyn Fn(&Props, Option<&NodeRef>) -> VisitResult<Node>;

/// Function component: props in, rendered node out.
///
/// Hooks from [`crate::hooks`] may be called from the render function.
/// Equality is identity of the render function.
#[derive(Clone)]
pub struct FunctionComponent {
    name: Rc<str>,
    render: Rc<RenderProps>,
}

impl FunctionComponent {
    pub fn new(name: &str, render: impl Fn(&Props) -> VisitResult<Node> + 'static) -> Self {
        Self {
            name: name.into(),
            render: Rc::new(render),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn render(&self, props: &Props) -> VisitResult<Node> {
        (self.render)(props)
    }
}

impl PartialEq for FunctionComponent {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.render, &other.render)
    }
}

impl fmt::Debug for FunctionComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionComponent({})", self.name)
    }
}

/// Render function that also receives the element's ref.
#[derive(Clone)]
pub struct ForwardRef {
    name: Rc<str>,
    render: Rc<RenderWithRef>,
}

impl ForwardRef {
    pub fn new(
        name: &str,
        render: impl Fn(&Props, Option<&NodeRef>) -> VisitResult<Node> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            render: Rc::new(render),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn render(&self, props: &Props, node_ref: Option<&NodeRef>) -> VisitResult<Node> {
        (self.render)(props, node_ref)
    }
}

impl PartialEq for ForwardRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.render, &other.render)
    }
}

impl fmt::Debug for ForwardRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ForwardRef({})", self.name)
    }
}
