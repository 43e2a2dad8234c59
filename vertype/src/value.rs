//! Dynamic values.
//!
//! A [`Value`] is what flows through expression trees and what named operations are
//! invoked with. Values are immutable and cheap to clone: strings, sequences and
//! objects are reference counted.
//!
//! Values implement `Eq` and `Hash` (floating-point payloads compare by bit pattern)
//! so they can be part of the structural identity of an expression node.
use std::{
    collections::BTreeMap,
    hash::{Hash, Hasher},
    sync::Arc,
};

use strum::{EnumDiscriminants, EnumIs, EnumTryAs};

use crate::types::{class::ClassRef, class::ClassRegistry, primary::PrimitiveType};

/// An instance of a user-declared class: its class and named fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Object {
    pub class: ClassRef,
    pub fields: BTreeMap<Arc<str>, Value>,
}

impl Object {
    pub fn new(class: ClassRef) -> Self {
        Self {
            class,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field insertion.
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(Arc::from(name), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// A dynamically typed value.
#[derive(Debug, Clone, Default, EnumIs, EnumTryAs, EnumDiscriminants)]
#[strum_discriminants(name(ValueKind), derive(Hash, strum::Display))]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    Char(char),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(Arc<str>),
    Seq(Arc<[Value]>),
    Object(Arc<Object>),
}

impl Value {
    /// Build a sequence value from any iterator of convertible items.
    pub fn seq<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        Value::Seq(items.into_iter().map(Into::into).collect())
    }

    /// Class of this value at runtime; [`None`] for `null`.
    ///
    /// Primitive payloads report their box class.
    pub fn runtime_class(&self) -> Option<ClassRef> {
        Some(match self {
            Value::Null => return None,
            Value::Str(_) => ClassRef::STRING,
            Value::Seq(_) => ClassRef::LIST,
            Value::Object(object) => object.class,
            other => other.primitive_type()?.box_class(),
        })
    }

    /// Primitive type of a boxed primitive payload.
    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        Some(match self {
            Value::Bool(_) => PrimitiveType::Bool,
            Value::I8(_) => PrimitiveType::I8,
            Value::I16(_) => PrimitiveType::I16,
            Value::Char(_) => PrimitiveType::Char,
            Value::I32(_) => PrimitiveType::I32,
            Value::I64(_) => PrimitiveType::I64,
            Value::F32(_) => PrimitiveType::F32,
            Value::F64(_) => PrimitiveType::F64,
            _ => return None,
        })
    }

    /// Integral payload widened to `i64`. `char` converts to its code point.
    pub fn as_i64(&self) -> Option<i64> {
        Some(match *self {
            Value::I8(v) => v as i64,
            Value::I16(v) => v as i64,
            Value::Char(v) => v as i64,
            Value::I32(v) => v as i64,
            Value::I64(v) => v,
            _ => return None,
        })
    }

    /// Any numeric payload widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F32(v) => Some(v as f64),
            Value::F64(v) => Some(v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    /// Compare two numeric values after widening; [`None`] if either is not numeric.
    pub fn numeric_cmp(&self, other: &Value) -> Option<std::cmp::Ordering> {
        match (self.as_i64(), other.as_i64()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => self.as_f64()?.partial_cmp(&other.as_f64()?),
        }
    }

    /// Format this value using `registry` to resolve class names of objects.
    pub fn fmt<'a>(&'a self, registry: &'a ClassRegistry) -> impl std::fmt::Display + 'a {
        struct Fmt<'a> {
            value: &'a Value,
            registry: &'a ClassRegistry,
        }

        impl std::fmt::Display for Fmt<'_> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self.value {
                    Value::Null => f.write_str("null"),
                    Value::Bool(v) => write!(f, "{v}"),
                    Value::I8(v) => write!(f, "{v}"),
                    Value::I16(v) => write!(f, "{v}"),
                    Value::Char(v) => write!(f, "{v:?}"),
                    Value::I32(v) => write!(f, "{v}"),
                    Value::I64(v) => write!(f, "{v}"),
                    Value::F32(v) => write!(f, "{v:?}"),
                    Value::F64(v) => write!(f, "{v:?}"),
                    Value::Str(v) => write!(f, "{:?}", &**v),
                    Value::Seq(items) => {
                        f.write_str("[")?;
                        for (i, item) in items.iter().enumerate() {
                            if i > 0 {
                                f.write_str(", ")?;
                            }
                            write!(f, "{}", item.fmt(self.registry))?;
                        }
                        f.write_str("]")
                    }
                    Value::Object(object) => {
                        write!(f, "{}{{", self.registry.fmt(object.class))?;
                        for (i, (name, value)) in object.fields.iter().enumerate() {
                            if i > 0 {
                                f.write_str(", ")?;
                            }
                            write!(f, "{name}={}", value.fmt(self.registry))?;
                        }
                        f.write_str("}")
                    }
                }
            }
        }

        Fmt {
            value: self,
            registry,
        }
    }
}

impl std::fmt::Display for Value {
    /// Formats through the [global registry](ClassRegistry::global).
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Value::fmt(self, ClassRegistry::global()))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            // Bitwise so that equality stays reflexive for NaN and agrees with `Hash`
            (Value::F32(a), Value::F32(b)) => a.to_bits() == b.to_bits(),
            (Value::F64(a), Value::F64(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        ValueKind::from(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(v) => v.hash(state),
            Value::I8(v) => v.hash(state),
            Value::I16(v) => v.hash(state),
            Value::Char(v) => v.hash(state),
            Value::I32(v) => v.hash(state),
            Value::I64(v) => v.hash(state),
            Value::F32(v) => v.to_bits().hash(state),
            Value::F64(v) => v.to_bits().hash(state),
            Value::Str(v) => v.hash(state),
            Value::Seq(v) => v.hash(state),
            Value::Object(v) => v.hash(state),
        }
    }
}

macro_rules! impl_from_payload {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_from_payload! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    char => Char,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(Arc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(Arc::from(value))
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(Arc::new(value))
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Seq(Arc::from(value))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn runtime_classes() {
        assert_eq!(Value::Null.runtime_class(), None);
        assert_eq!(Value::from(3).runtime_class(), Some(ClassRef::INTEGER));
        assert_eq!(Value::from('x').runtime_class(), Some(ClassRef::CHARACTER));
        assert_eq!(Value::from("hi").runtime_class(), Some(ClassRef::STRING));
        assert_eq!(Value::seq([1, 2]).runtime_class(), Some(ClassRef::LIST));
    }

    #[test]
    fn float_equality_is_bitwise() {
        let nan = Value::from(f64::NAN);
        assert_eq!(nan, nan.clone());
        assert_ne!(Value::from(0.0f64), Value::from(-0.0f64));

        let set: HashSet<Value> = [Value::from(1.5f64), Value::from(1.5f64)].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn numeric_comparison_widens() {
        use std::cmp::Ordering;
        assert_eq!(Value::from(3i8).numeric_cmp(&Value::from(3i64)), Some(Ordering::Equal));
        assert_eq!(Value::from(2).numeric_cmp(&Value::from(2.5f64)), Some(Ordering::Less));
        assert_eq!(Value::from("2").numeric_cmp(&Value::from(2)), None);
    }

    #[test]
    fn display() {
        let registry = ClassRegistry::new();
        let point = registry.declare("Point", &[]).unwrap();
        let value = Value::seq([
            Value::from("a"),
            Value::Null,
            Value::from(Object::new(point).with_field("x", 1).with_field("y", 2)),
        ]);
        assert_eq!(
            value.fmt(&registry).to_string(),
            r#"["a", null, Point{x=1, y=2}]"#
        );
    }
}
