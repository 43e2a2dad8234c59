use std::sync::Arc;

use strum::EnumIs;
use thiserror::Error;

use crate::eval::trace::Trace;

/// A failure captured while evaluating a node.
///
/// Faults end up in the [`Trace`] (as the output of the entry that failed) and replace
/// the boolean outcome of the evaluation.
#[derive(Debug, Clone, EnumIs, Error)]
pub enum EvaluationFault {
    /// A native callable returned an error.
    #[error("`{label}` failed: {source}")]
    Callable {
        label: String,
        #[source]
        source: Arc<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// A native callable panicked.
    #[error("`{label}` panicked: {message}")]
    Panic { label: String, message: String },

    /// A node whose result is combined as a boolean produced something else.
    #[error("`{label}` must produce a boolean, but produced {value}")]
    NotABoolean { label: String, value: String },

    /// A sequence predicate was fed something that is not a sequence.
    #[error("`{label}` expects a sequence, but was given {value}")]
    NotASequence { label: String, value: String },
}

/// Failure of [`assert_that`](crate::assert_that).
#[derive(Debug, EnumIs, Error)]
pub enum AssertError {
    /// The expression evaluated to `false`.
    #[error("Expectation not met:\n{report}")]
    Violation { trace: Trace, report: String },

    /// Evaluation stopped on a fault; `trace` holds every entry recorded before it.
    #[error("Evaluation failed: {fault}\n{report}")]
    Fault {
        fault: EvaluationFault,
        trace: Trace,
        report: String,
    },
}

impl AssertError {
    pub fn trace(&self) -> &Trace {
        match self {
            AssertError::Violation { trace, .. } | AssertError::Fault { trace, .. } => trace,
        }
    }

    /// The rendered trace.
    pub fn report(&self) -> &str {
        match self {
            AssertError::Violation { report, .. } | AssertError::Fault { report, .. } => report,
        }
    }
}

/// The evaluator configuration could not be parsed.
#[derive(Debug, Error)]
#[error("Failed to parse evaluator configuration: {source}")]
pub struct ConfigError {
    #[from]
    source: toml::de::Error,
}
