//! Node Classifier - which rendering rule applies to an element.

use crate::element::{Element, ElementType};
use crate::error::{InvalidNode, VisitError, VisitResult};
use crate::types::Value;

/// Classification of an element. One variant per rendering rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    Host,
    /// Grouping node (fragment).
    Fragment,
    Provider,
    Consumer,
    Lazy,
    Memo,
    ForwardRef,
    Portal,
    Class,
    Function,
    /// Malformed node, skipped without failing the traversal.
    Invalid(InvalidNode),
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Host => "host",
            Kind::Fragment => "fragment",
            Kind::Provider => "provider",
            Kind::Consumer => "consumer",
            Kind::Lazy => "lazy",
            Kind::Memo => "memo",
            Kind::ForwardRef => "forward_ref",
            Kind::Portal => "portal",
            Kind::Class => "class",
            Kind::Function => "function",
            Kind::Invalid(_) => "invalid",
        }
    }
}

/// Classify an element.
///
/// Pure and total: every element maps to a [`Kind`] or to a
/// [`VisitError::ClassifierMismatch`] when its shape contradicts itself
/// (a memo around something that is not a component).
pub fn classify(element: &Element) -> VisitResult<Kind> {
    let kind = match element.element_type() {
        ElementType::Portal => Kind::Portal,
        ElementType::Fragment => Kind::Fragment,
        ElementType::Provider(_) => Kind::Provider,
        ElementType::Consumer(_) => match element.children() {
            Some(Value::Func(_)) => Kind::Consumer,
            _ => Kind::Invalid(InvalidNode {
                node: element.element_type().name(),
                reason: "children is not a render function",
            }),
        },
        ElementType::Lazy(_) => Kind::Lazy,
        ElementType::Memo(inner) => {
            if !inner.is_component() {
                return Err(VisitError::mismatch(format!(
                    "memo must wrap a component, got `{}`",
                    inner.name()
                )));
            }
            Kind::Memo
        }
        ElementType::ForwardRef(_) => Kind::ForwardRef,
        ElementType::Class(_) => Kind::Class,
        ElementType::Function(_) => Kind::Function,
        ElementType::Host(_) => Kind::Host,
    };
    Ok(kind)
}
