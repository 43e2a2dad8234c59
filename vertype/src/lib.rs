//! Runtime type model for verity.
//!
//! - [`types`]: primitive types, the widening table, classes and the class registry,
//!   plus the compatibility ([`types::Type::accepts`]) and specificity
//!   ([`types::Type::is_narrower_than`]) rules used by overload resolution.
//! - [`value`]: dynamically typed, immutable, hashable values.

pub mod types;
pub mod utils;
pub mod value;

pub use types::{Conversion, Type, class::ClassRef, class::ClassRegistry, primary::PrimitiveType};
pub use utils::Error;
pub use value::{Object, Value};
