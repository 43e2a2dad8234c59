//! Tracing evaluator.
//!
//! [`Evaluator::evaluate`] walks a [`Node`] depth first and records one [`Entry`] per
//! visited node that produces a value of its own:
//!
//! | Node | Entries |
//! |---|---|
//! | leaf | one, with the callable's output or fault |
//! | `and` / `or` | none of its own; children at depth + 1, stopping at the first `false` / `true` |
//! | `not` | the child's entries, then its own with the inverted result |
//! | transformation | the mapper's, then the checker's at depth + 1 on the mapped value |
//! | sequence predicate | element checks at depth + 1; a closing entry with the default outcome if nothing triggered |
//!
//! A fault stops the evaluation: the entry that failed carries it, and it becomes the
//! outcome of the trace. Entries recorded before it are kept.
use log::debug;
use vertype::Value;

use crate::{
    conf::EvaluatorConfig,
    error::{AssertError, EvaluationFault},
    node::{Node, NodeKind},
};

pub mod trace;

use trace::{Entry, Trace};

#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    config: EvaluatorConfig,
}

impl Evaluator {
    pub fn new(config: EvaluatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Evaluate `node` against `input`, recording a trace.
    pub fn evaluate(&self, node: &Node, input: &Value) -> Trace {
        let mut walk = Walk {
            config: &self.config,
            entries: Vec::new(),
        };
        let outcome = walk.visit(node, input, 0);
        if let Err(fault) = &outcome {
            debug!(
                "Evaluation of `{}` stopped after {} entries: {fault}",
                node.label(),
                walk.entries.len()
            );
        }
        Trace::new(walk.entries, outcome)
    }

    /// Evaluate `node` against `input` and require a `true` outcome.
    ///
    /// A non-boolean outcome is reported as [`EvaluationFault::NotABoolean`].
    pub fn check(&self, node: &Node, input: &Value) -> Result<(), AssertError> {
        let trace = self.evaluate(node, input);
        let verdict = trace.outcome().clone().and_then(|value| node.as_bool(value));
        match verdict {
            Ok(true) => Ok(()),
            Ok(false) => Err(AssertError::Violation {
                report: trace.render(&self.config),
                trace,
            }),
            Err(fault) => Err(AssertError::Fault {
                fault,
                report: trace.render(&self.config),
                trace,
            }),
        }
    }
}

struct Walk<'a> {
    config: &'a EvaluatorConfig,
    entries: Vec<Entry>,
}

impl Walk<'_> {
    fn visit(&mut self, node: &Node, input: &Value, depth: usize) -> Result<Value, EvaluationFault> {
        log::trace!(
            "Visiting {} `{}` at depth {depth}.",
            node.node_type(),
            node.label()
        );

        match node.kind() {
            NodeKind::Leaf(function) => {
                let output = function.invoke(input, self.config.catch_panics);
                self.record(depth, input, node, output.clone());
                output
            }
            NodeKind::Conjunction(children) => self.junction(node, children, input, depth, false),
            NodeKind::Disjunction(children) => self.junction(node, children, input, depth, true),
            NodeKind::Negation(child) => {
                let value = self.visit(child, input, depth + 1)?;
                let inverted = !self.require_bool(node, input, depth, value)?;
                self.record(depth, input, node, Ok(Value::Bool(inverted)));
                Ok(Value::Bool(inverted))
            }
            NodeKind::Transformation { mapper, checker } => {
                let mapped = mapper.invoke(input, self.config.catch_panics);
                self.entries.push(Entry {
                    depth,
                    input: input.clone(),
                    label: mapper.shared_label().clone(),
                    output: mapped.clone(),
                });
                self.visit(checker, &mapped?, depth + 1)
            }
            NodeKind::SequencePredicate {
                element,
                trigger,
                default,
            } => {
                let items = node.as_sequence(input).inspect_err(|fault| {
                    self.record(depth, input, node, Err(fault.clone()));
                })?;

                for item in items.iter() {
                    let value = self.visit(element, item, depth + 1)?;
                    if self.require_bool(node, input, depth, value)? == *trigger {
                        return Ok(Value::Bool(*trigger));
                    }
                }

                self.record(depth, input, node, Ok(Value::Bool(*default)));
                Ok(Value::Bool(*default))
            }
        }
    }

    /// Visit `children` in order until one yields `stop`. The junction itself records
    /// no entry unless a child produces a non-boolean.
    fn junction(
        &mut self,
        node: &Node,
        children: &[Node],
        input: &Value,
        depth: usize,
        stop: bool,
    ) -> Result<Value, EvaluationFault> {
        let mut last = !stop;
        for child in children {
            let value = self.visit(child, input, depth + 1)?;
            last = self.require_bool(node, input, depth, value)?;
            if last == stop {
                break;
            }
        }
        Ok(Value::Bool(last))
    }

    /// `value` produced by a child of `node`, which combines it as a boolean.
    fn require_bool(
        &mut self,
        node: &Node,
        input: &Value,
        depth: usize,
        value: Value,
    ) -> Result<bool, EvaluationFault> {
        node.as_bool(value).inspect_err(|fault| {
            self.record(depth, input, node, Err(fault.clone()));
        })
    }

    fn record(
        &mut self,
        depth: usize,
        input: &Value,
        node: &Node,
        output: Result<Value, EvaluationFault>,
    ) {
        self.entries.push(Entry {
            depth,
            input: input.clone(),
            label: node.shared_label().clone(),
            output,
        });
    }
}
