//! Child normalization.
//!
//! Lists are flattened, empty children and non-renderable values dropped,
//! text and elements kept in their original order.

use crate::types::{Node, Value};

/// Normalize a `children` prop value into the list a visit returns.
pub fn normalize(children: Option<&Value>) -> Vec<Node> {
    let mut out = Vec::new();
    if let Some(value) = children {
        push_value(value, &mut out);
    }
    out
}

/// Normalize rendered output into the list a visit returns.
pub fn normalize_node(node: Node) -> Vec<Node> {
    let mut out = Vec::new();
    push_node(node, &mut out);
    out
}

fn push_value(value: &Value, out: &mut Vec<Node>) {
    match value {
        Value::Node(node) => push_node(node.clone(), out),
        Value::Str(s) => out.push(Node::Text(s.clone())),
        Value::Int(i) => out.push(Node::text(i.to_string())),
        Value::Float(f) => out.push(Node::text(f.to_string())),
        Value::List(items) => {
            for item in items {
                push_value(item, out);
            }
        }
        // null, booleans, objects, functions and refs render nothing
        _ => {}
    }
}

fn push_node(node: Node, out: &mut Vec<Node>) {
    match node {
        Node::Empty => {}
        Node::List(items) => {
            for item in items {
                push_node(item, out);
            }
        }
        other => out.push(other),
    }
}
