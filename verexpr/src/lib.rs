//! Verexpr: assertions as expression trees, with a diagnostic evaluator.
//!
//! Build a [`Node`] from leaves wrapping native [`Function`]s and the composite
//! constructors of [`node`], then evaluate it against a [`Value`]. The [`Trace`] records
//! what every visited node was given and what it produced, so a failed check can be
//! explained rather than just reported.
//!
//! Leaves may also call a named operation through the overload resolver of `vercall`
//! ([`Function::call`]) or finish a staged operation ([`Function::staged`]).
//!
//! ```rust
//! use verexpr::prelude::*;
//! use vertype::Value;
//!
//! let short_greeting = all_of([
//!     leaf(is_not_null()),
//!     leaf(starts_with("he")),
//!     transform_and_check(length(), leaf(less_than(6))),
//! ]);
//! assert!(assert_that(&short_greeting, "hello").is_ok());
//!
//! let err = assert_that(&short_greeting, "hello world").unwrap_err();
//! assert!(err.is_violation());
//! assert!(err.report().contains("length -> 11"));
//! ```

pub mod conf;
pub mod error;
pub mod eval;
pub mod node;
pub mod predicates;

pub use conf::EvaluatorConfig;
pub use error::{AssertError, EvaluationFault};
pub use eval::{
    Evaluator,
    trace::{Entry, Trace},
};
pub use node::{Function, Node, NodeKind, NodeType};
use vertype::Value;

/// Evaluate `node` against `input` with the default configuration.
pub fn evaluate(node: &Node, input: &Value) -> Trace {
    Evaluator::default().evaluate(node, input)
}

/// Require `node` to hold for `value`, with the default configuration.
pub fn assert_that(node: &Node, value: impl Into<Value>) -> Result<(), AssertError> {
    Evaluator::default().check(node, &value.into())
}

pub mod prelude {
    //! Convenient re-exports for end users.
    //!
    //! - Node constructors and the [`Node`](crate::Node) / [`Function`](crate::Function) types
    //! - Standard predicates and functions
    //! - Evaluation entry points
    pub use crate::node::{
        Function, Node, all_match, all_of, and, any_match, any_of, leaf, none_match, not, or,
        sequence_predicate, transform_and_check,
    };
    pub use crate::predicates::*;
    pub use crate::{
        AssertError, EvaluationFault, Evaluator, EvaluatorConfig, Trace, assert_that, evaluate,
    };
}
