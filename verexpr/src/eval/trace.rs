//! Diagnostic trace of one evaluation.
use std::{fmt::Write as _, sync::Arc};

use vertype::Value;

use crate::{conf::EvaluatorConfig, error::EvaluationFault};

/// What happened at one visited node.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Nesting depth; the root is at 0 and children at their parent's depth + 1.
    pub depth: usize,
    /// Value fed to the node.
    pub input: Value,
    pub label: Arc<str>,
    /// Value produced, or the fault captured instead.
    pub output: Result<Value, EvaluationFault>,
}

impl Entry {
    pub fn is_fault(&self) -> bool {
        self.output.is_err()
    }

    /// Output, if it is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self.output {
            Ok(Value::Bool(b)) => Some(b),
            _ => None,
        }
    }
}

/// Ordered entries of an evaluation (depth first, in visiting order) and its outcome.
#[derive(Debug, Clone)]
pub struct Trace {
    entries: Vec<Entry>,
    outcome: Result<Value, EvaluationFault>,
}

impl Trace {
    pub(crate) fn new(entries: Vec<Entry>, outcome: Result<Value, EvaluationFault>) -> Self {
        Self { entries, outcome }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Result of the root node, or the fault that stopped the evaluation.
    pub fn outcome(&self) -> &Result<Value, EvaluationFault> {
        &self.outcome
    }

    /// Returns `true` if the root produced `true`.
    pub fn passed(&self) -> bool {
        matches!(self.outcome, Ok(Value::Bool(true)))
    }

    pub fn fault(&self) -> Option<&EvaluationFault> {
        self.outcome.as_ref().err()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One line per entry, indented by depth: `<input> -> <label> -> <output>`.
    pub fn render(&self, config: &EvaluatorConfig) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            let indent = entry.depth * config.indent;
            let input = summarize(&entry.input.to_string(), config.max_value_width);
            // Writing into a `String` never fails
            let _ = match &entry.output {
                Ok(value) => {
                    let output = summarize(&value.to_string(), config.max_value_width);
                    writeln!(out, "{:indent$}{input} -> {} -> {output}", "", entry.label)
                }
                Err(fault) => writeln!(out, "{:indent$}{input} -> {} -> fault: {fault}", "", entry.label),
            };
        }
        out
    }
}

impl std::fmt::Display for Trace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render(&EvaluatorConfig::default()))
    }
}

/// Elide the middle of `text` if it is longer than `width` characters.
fn summarize(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width || width < 5 {
        return text.to_string();
    }
    let keep = width - 3;
    let head: String = text.chars().take(keep - keep / 2).collect();
    let tail: String = text.chars().skip(count - keep / 2).collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_values_are_elided() {
        assert_eq!(summarize("short", 40), "short");
        let long = "abcdefghijklmnopqrstuvwxyz";
        let summary = summarize(long, 10);
        assert_eq!(summary, "abcd...xyz");
        assert_eq!(summary.chars().count(), 10);
    }

    #[test]
    fn rendering_indents_by_depth() {
        let trace = Trace::new(
            vec![
                Entry {
                    depth: 1,
                    input: Value::from("abc"),
                    label: Arc::from("length"),
                    output: Ok(Value::from(3)),
                },
                Entry {
                    depth: 2,
                    input: Value::from(3),
                    label: Arc::from("less_than(2)"),
                    output: Ok(Value::from(false)),
                },
            ],
            Ok(Value::from(false)),
        );

        let config = EvaluatorConfig {
            indent: 4,
            ..EvaluatorConfig::default()
        };
        assert_eq!(
            trace.render(&config),
            "    \"abc\" -> length -> 3\n        3 -> less_than(2) -> false\n"
        );
        assert!(!trace.passed());
        assert_eq!(trace.len(), 2);
    }
}
