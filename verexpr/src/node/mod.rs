//! Expression node model.
//!
//! A [`Node`] is an immutable tree of boolean checks over a [`Value`]:
//!
//! - [`leaf`]: a single native [`Function`].
//! - [`and`] / [`all_of`], [`or`] / [`any_of`]: short-circuiting junctions over an
//!   ordered list of children.
//! - [`not`]: inverts its child, which stays visible in the trace.
//! - [`transform_and_check`]: maps the input, then checks the mapped value.
//! - [`sequence_predicate`]: checks the elements of a sequence until one of them
//!   produces the trigger outcome ([`all_match`], [`any_match`], [`none_match`]).
//!
//! Nodes compare and hash structurally: the closures they wrap do not take part, only the
//! [identity](function::Identity) of each function.
//!
//! ```rust
//! use verexpr::prelude::*;
//! use vertype::Value;
//!
//! let small = transform_and_check(length(), leaf(less_than(4)));
//! let node = and(leaf(is_not_null()), small);
//! assert_eq!(node.test(&Value::from("abc")).unwrap(), true);
//! assert_eq!(node.test(&Value::Null).unwrap(), false);
//! assert_eq!(node, and(leaf(is_not_null()), transform_and_check(length(), leaf(less_than(4)))));
//! ```
use std::sync::Arc;

use once_cell::sync::OnceCell;
use smallvec::SmallVec;
use strum::{Display, EnumDiscriminants, EnumIs};
use vertype::Value;

use crate::error::EvaluationFault;

pub mod function;

pub use function::Function;

/// Kind-specific payload of a [`Node`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIs, EnumDiscriminants)]
#[strum_discriminants(name(NodeType), derive(Hash, Display, EnumIs))]
pub enum NodeKind {
    Leaf(Function),
    Conjunction(SmallVec<[Node; 2]>),
    Disjunction(SmallVec<[Node; 2]>),
    Negation(Node),
    Transformation {
        mapper: Function,
        checker: Node,
    },
    SequencePredicate {
        element: Node,
        trigger: bool,
        default: bool,
    },
}

struct NodeData {
    kind: NodeKind,
    label: OnceCell<Arc<str>>,
}

/// An immutable expression node. Cloning is cheap.
#[derive(Clone)]
pub struct Node(Arc<NodeData>);

impl Node {
    fn from_kind(kind: NodeKind) -> Self {
        Self(Arc::new(NodeData {
            kind,
            label: OnceCell::new(),
        }))
    }

    pub fn kind(&self) -> &NodeKind {
        &self.0.kind
    }

    pub fn node_type(&self) -> NodeType {
        NodeType::from(&self.0.kind)
    }

    /// Direct children, in evaluation order. The mapper of a transformation is not a node
    /// and is not listed.
    pub fn children(&self) -> &[Node] {
        match &self.0.kind {
            NodeKind::Leaf(_) => &[],
            NodeKind::Conjunction(children) | NodeKind::Disjunction(children) => children,
            NodeKind::Negation(child) => std::slice::from_ref(child),
            NodeKind::Transformation { checker, .. } => std::slice::from_ref(checker),
            NodeKind::SequencePredicate { element, .. } => std::slice::from_ref(element),
        }
    }

    /// Display label, computed on first use.
    pub fn label(&self) -> &str {
        self.shared_label()
    }

    pub(crate) fn shared_label(&self) -> &Arc<str> {
        self.0.label.get_or_init(|| {
            let joined = |children: &[Node], separator: &str| {
                let labels: Vec<&str> = children.iter().map(Node::label).collect();
                format!("({})", labels.join(separator))
            };

            match &self.0.kind {
                NodeKind::Leaf(function) => return function.shared_label().clone(),
                NodeKind::Conjunction(children) => Arc::from(joined(children, " and ")),
                NodeKind::Disjunction(children) => Arc::from(joined(children, " or ")),
                NodeKind::Negation(child) => Arc::from(format!("not {}", child.label())),
                NodeKind::Transformation { mapper, checker } => {
                    Arc::from(format!("({} => {})", mapper.label(), checker.label()))
                }
                NodeKind::SequencePredicate {
                    element,
                    trigger,
                    default,
                } => Arc::from(match (trigger, default) {
                    (false, true) => format!("all_match({})", element.label()),
                    (true, false) => format!("any_match({})", element.label()),
                    _ => format!(
                        "sequence_predicate({}, trigger = {trigger}, default = {default})",
                        element.label()
                    ),
                }),
            }
        })
    }

    /// Evaluate without recording a trace.
    ///
    /// Applies the same operators as the [`Evaluator`](crate::Evaluator) in the same
    /// order, so both agree on the outcome; panics raised by native callables are caught.
    pub fn test(&self, input: &Value) -> Result<bool, EvaluationFault> {
        let value = self.compute(input)?;
        self.as_bool(value)
    }

    fn compute(&self, input: &Value) -> Result<Value, EvaluationFault> {
        match &self.0.kind {
            NodeKind::Leaf(function) => function.invoke(input, true),
            NodeKind::Conjunction(children) => junction(children, input, false),
            NodeKind::Disjunction(children) => junction(children, input, true),
            NodeKind::Negation(child) => Ok(Value::Bool(!child.test(input)?)),
            NodeKind::Transformation { mapper, checker } => {
                checker.compute(&mapper.invoke(input, true)?)
            }
            NodeKind::SequencePredicate {
                element,
                trigger,
                default,
            } => {
                let items = self.as_sequence(input)?;
                for item in items.iter() {
                    if element.test(item)? == *trigger {
                        return Ok(Value::Bool(*trigger));
                    }
                }
                Ok(Value::Bool(*default))
            }
        }
    }

    pub(crate) fn as_bool(&self, value: Value) -> Result<bool, EvaluationFault> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(EvaluationFault::NotABoolean {
                label: self.label().to_string(),
                value: other.to_string(),
            }),
        }
    }

    pub(crate) fn as_sequence(&self, input: &Value) -> Result<Arc<[Value]>, EvaluationFault> {
        match input {
            Value::Seq(items) => Ok(items.clone()),
            other => Err(EvaluationFault::NotASequence {
                label: self.label().to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Children are tested in order until one yields `stop`.
fn junction(children: &[Node], input: &Value, stop: bool) -> Result<Value, EvaluationFault> {
    let mut last = !stop;
    for child in children {
        last = child.test(input)?;
        if last == stop {
            break;
        }
    }
    Ok(Value::Bool(last))
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.kind == other.0.kind
    }
}

impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.kind.hash(state);
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.node_type(), self.label())
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A node invoking `function` on its input.
pub fn leaf(function: Function) -> Node {
    Node::from_kind(NodeKind::Leaf(function))
}

/// `a` and then, if it held, `b`.
pub fn and(a: Node, b: Node) -> Node {
    Node::from_kind(NodeKind::Conjunction(SmallVec::from_buf([a, b])))
}

/// `a` or else `b`.
pub fn or(a: Node, b: Node) -> Node {
    Node::from_kind(NodeKind::Disjunction(SmallVec::from_buf([a, b])))
}

/// Conjunction of `nodes`, tested in order.
///
/// # Panics
/// If `nodes` is empty.
pub fn all_of(nodes: impl IntoIterator<Item = Node>) -> Node {
    let children: SmallVec<[Node; 2]> = nodes.into_iter().collect();
    assert!(!children.is_empty(), "all_of requires at least one node");
    Node::from_kind(NodeKind::Conjunction(children))
}

/// Disjunction of `nodes`, tested in order.
///
/// # Panics
/// If `nodes` is empty.
pub fn any_of(nodes: impl IntoIterator<Item = Node>) -> Node {
    let children: SmallVec<[Node; 2]> = nodes.into_iter().collect();
    assert!(!children.is_empty(), "any_of requires at least one node");
    Node::from_kind(NodeKind::Disjunction(children))
}

pub fn not(node: Node) -> Node {
    Node::from_kind(NodeKind::Negation(node))
}

/// Check `checker` against `mapper(input)`.
pub fn transform_and_check(mapper: Function, checker: Node) -> Node {
    Node::from_kind(NodeKind::Transformation { mapper, checker })
}

/// Test `element` on each item of the input sequence, stopping with `trigger` at the
/// first item whose check equals `trigger`; `default` if none does.
pub fn sequence_predicate(element: Node, trigger: bool, default: bool) -> Node {
    Node::from_kind(NodeKind::SequencePredicate {
        element,
        trigger,
        default,
    })
}

pub fn all_match(element: Node) -> Node {
    sequence_predicate(element, false, true)
}

pub fn any_match(element: Node) -> Node {
    sequence_predicate(element, true, false)
}

pub fn none_match(element: Node) -> Node {
    not(any_match(element))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::predicates::*;

    #[test]
    fn structurally_equal_nodes_hash_alike() {
        let a = leaf(is_equal_to(5));
        let b = leaf(is_equal_to(5));
        assert_eq!(a, b);

        let set: HashSet<Node> = [a, b, leaf(is_equal_to(6))].into_iter().collect();
        assert_eq!(set.len(), 2);

        let x = not(and(leaf(is_not_null()), leaf(is_true())));
        let y = not(and(leaf(is_not_null()), leaf(is_true())));
        let z = not(or(leaf(is_not_null()), leaf(is_true())));
        assert_eq!(x, y);
        assert_ne!(x, z);
    }

    #[test]
    fn binary_and_nary_junctions_coincide() {
        assert_eq!(
            and(leaf(is_null()), leaf(is_true())),
            all_of([leaf(is_null()), leaf(is_true())])
        );
        assert_ne!(
            and(leaf(is_null()), leaf(is_true())),
            any_of([leaf(is_null()), leaf(is_true())])
        );
    }

    #[test]
    #[should_panic(expected = "at least one node")]
    fn empty_junction_panics() {
        all_of(Vec::new());
    }

    #[test]
    fn labels_reflect_structure() {
        let node = and(
            leaf(is_not_null()),
            not(transform_and_check(length(), leaf(less_than(3)))),
        );
        assert_eq!(node.label(), "(is_not_null and not (length => less_than(3)))");
        assert_eq!(
            transform_and_check(length(), not(leaf(is_true()))).label(),
            "(length => not is_true)"
        );
        assert_eq!(all_match(leaf(is_true())).label(), "all_match(is_true)");
        assert_eq!(none_match(leaf(is_true())).label(), "not any_match(is_true)");
        assert_eq!(
            sequence_predicate(leaf(is_true()), true, true).label(),
            "sequence_predicate(is_true, trigger = true, default = true)"
        );
    }

    #[test]
    fn node_types_and_children() {
        let node = transform_and_check(length(), leaf(is_equal_to(0)));
        assert_eq!(node.node_type(), NodeType::Transformation);
        assert_eq!(node.children().len(), 1);
        assert!(leaf(is_null()).children().is_empty());
        assert_eq!(NodeType::SequencePredicate.to_string(), "SequencePredicate");
    }

    #[test]
    fn untraced_test_short_circuits() {
        let guarded = and(leaf(is_not_null()), transform_and_check(length(), leaf(less_than(3))));
        assert!(!guarded.test(&Value::Null).unwrap());
        assert!(guarded.test(&Value::from("ab")).unwrap());

        let unguarded = transform_and_check(length(), leaf(less_than(3)));
        assert!(unguarded.test(&Value::Null).unwrap_err().is_callable());
    }

    #[test]
    fn sequence_predicates_stop_at_trigger() {
        let words = Value::seq(["hello", "world"]);
        assert!(any_match(leaf(is_equal_to("world"))).test(&words).unwrap());
        assert!(!all_match(leaf(is_equal_to("world"))).test(&words).unwrap());
        assert!(all_match(leaf(is_not_null())).test(&Value::seq(Vec::<Value>::new())).unwrap());
        assert!(none_match(leaf(is_null())).test(&words).unwrap());
        assert!(
            any_match(leaf(is_null()))
                .test(&Value::from(3))
                .unwrap_err()
                .is_not_a_sequence()
        );
    }

    #[test]
    fn non_boolean_results_are_faults() {
        let node = not(leaf(length()));
        assert!(node.test(&Value::from("abc")).unwrap_err().is_not_a_boolean());
    }
}
