//! Types module
//!
//! This module contains the type model used to decide whether a dynamic
//! [`Value`] may be passed where a declared type is expected. It is built on two
//! layers:
//!
//! - Primitive types and their fixed widening table (see `primary.rs`).
//! - Classes, stored in a [`ClassRegistry`] that records the hierarchy (see `class.rs`).
//!
//! [`Type::accepts`] answers "is this argument compatible with this parameter, and
//! how", and [`Type::is_narrower_than`] orders two declared types by specificity.
//! Both drive overload resolution in `vercall`.
use strum::{Display, EnumIs};

use crate::{
    types::{class::ClassRef, class::ClassRegistry, primary::PrimitiveType},
    value::Value,
};

pub mod class;
pub mod primary;

/// A declared type: either a primitive or a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs)]
pub enum Type {
    Primitive(PrimitiveType),
    Class(ClassRef),
}

impl From<PrimitiveType> for Type {
    fn from(value: PrimitiveType) -> Self {
        Type::Primitive(value)
    }
}

impl From<ClassRef> for Type {
    fn from(value: ClassRef) -> Self {
        Type::Class(value)
    }
}

/// How an argument was found compatible with a parameter.
///
/// Variants are ordered from least to most preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIs)]
pub enum Conversion {
    /// A boxed primitive was unboxed and widened (e.g. `Integer` into `i64`).
    Widening,
    /// The argument's class is a proper subclass of the parameter class, or the
    /// argument is `null` for a class parameter.
    Assignable,
    /// The argument's runtime type is exactly the parameter type.
    Exact,
}

impl Type {
    pub const OBJECT: Self = Type::Class(ClassRef::OBJECT);
    pub const STRING: Self = Type::Class(ClassRef::STRING);

    /// Decide whether `value` may be bound to a parameter declared with this type.
    ///
    /// - Primitive parameters reject `null`; they accept boxed values of the same
    ///   primitive ([`Conversion::Exact`]) or of a primitive that widens to it.
    /// - Class parameters accept `null` and any value whose runtime class is a subclass.
    pub fn accepts(&self, value: &Value, registry: &ClassRegistry) -> Option<Conversion> {
        let runtime = value.runtime_class();
        match (*self, runtime) {
            (Type::Primitive(_), None) => None,
            (Type::Class(_), None) => Some(Conversion::Assignable),
            (Type::Primitive(param), Some(class)) => {
                let arg = PrimitiveType::unboxed(class)?;
                if arg == param {
                    Some(Conversion::Exact)
                } else if arg.widens_to(param) {
                    Some(Conversion::Widening)
                } else {
                    None
                }
            }
            (Type::Class(param), Some(class)) => {
                if class == param {
                    Some(Conversion::Exact)
                } else if registry.is_subclass(class, param) {
                    Some(Conversion::Assignable)
                } else {
                    None
                }
            }
        }
    }

    /// Returns `true` if every value accepted by `self` is also accepted by `other`,
    /// that is, `self` is the same or a more specific type.
    ///
    /// Primitive types are narrower than the primitives they widen to and than any class
    /// their box class extends. A class is never narrower than a primitive.
    pub fn is_narrower_than(&self, other: &Type, registry: &ClassRegistry) -> bool {
        match (*self, *other) {
            (a, b) if a == b => true,
            (Type::Primitive(a), Type::Primitive(b)) => a.widens_to(b),
            (Type::Primitive(a), Type::Class(b)) => registry.is_subclass(a.box_class(), b),
            (Type::Class(_), Type::Primitive(_)) => false,
            (Type::Class(a), Type::Class(b)) => registry.is_subclass(a, b),
        }
    }

    /// Format this type using `registry` to resolve class names.
    pub fn fmt<'a>(&'a self, registry: &'a ClassRegistry) -> impl std::fmt::Display + 'a {
        struct Fmt<'a> {
            ty: &'a Type,
            registry: &'a ClassRegistry,
        }

        impl std::fmt::Display for Fmt<'_> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self.ty {
                    Type::Primitive(p) => write!(f, "{p}"),
                    Type::Class(c) => write!(f, "{}", self.registry.fmt(*c)),
                }
            }
        }

        Fmt { ty: self, registry }
    }
}

impl std::fmt::Display for Type {
    /// Formats through the [global registry](ClassRegistry::global).
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Type::fmt(self, ClassRegistry::global()))
    }
}
