//! Named-call plumbing for verity.
//!
//! Expression leaves may be specified as "call this named operation" rather than as a
//! closure. This crate turns such a description into a native function:
//!
//! - [`candidate`]: method descriptors and the [`MethodTable`](candidate::MethodTable)
//!   they are registered in, statically through [`register_methods!`] or explicitly.
//! - [`resolver`]: overload resolution with a concurrent memo
//!   ([`Resolver`](resolver::Resolver)).
//! - [`query`]: deferred calls with placeholders ([`MethodQuery`](query::MethodQuery)).
//! - [`curry`]: staged application of multi-parameter operations
//!   ([`Stage`](curry::Stage)).

mod builtins;
pub mod candidate;
pub mod conf;
pub mod curry;
pub mod error;
pub mod query;
pub mod resolver;

pub extern crate inventory;

pub use candidate::{MethodCandidate, MethodTable};
pub use curry::{NativeOperation, Operation, Stage};
pub use error::{BoxError, CallError, CallResult};
pub use query::{Argument, MethodQuery, Target, placeholder};
pub use resolver::Resolver;
