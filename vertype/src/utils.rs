use strum::{EnumIs, EnumTryAs};
use thiserror::Error;

use crate::types::class::ClassRef;

#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIs, EnumTryAs, Error)]
pub enum Error {
    /// A class reference does not belong to the registry.
    #[error("Class reference `{0}` is not registered. Classes must be declared before being used as a supertype.")]
    UnknownClass(ClassRef),

    /// A class name was declared twice with different supertypes.
    #[error(
        "Class `{name}` is already declared with supertypes {existing:?}; it cannot be redeclared with supertypes {requested:?}."
    )]
    ClassConflict {
        name: String,
        existing: Vec<String>,
        requested: Vec<String>,
    },

    /// Class names cannot be empty.
    #[error("Class names cannot be empty.")]
    EmptyClassName,
}

pub type Result<T> = std::result::Result<T, Error>;
