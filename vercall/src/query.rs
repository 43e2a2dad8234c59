//! Deferred descriptions of named calls.
use std::sync::Arc;

use smallvec::SmallVec;
use strum::EnumIs;
use vertype::{ClassRef, ClassRegistry, Value};

/// An argument of a [`MethodQuery`]: a concrete value or a placeholder bound later.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIs)]
pub enum Argument {
    Value(Value),
    /// Index into the values given to [`MethodQuery::bind`].
    Placeholder(usize),
}

impl Argument {
    pub fn value(value: impl Into<Value>) -> Self {
        Argument::Value(value.into())
    }
}

impl From<Value> for Argument {
    fn from(value: Value) -> Self {
        Argument::Value(value)
    }
}

/// Shorthand for [`Argument::Placeholder`].
#[inline]
pub fn placeholder(index: usize) -> Argument {
    Argument::Placeholder(index)
}

/// Who receives the call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// An instance method called on a value (possibly a placeholder).
    Instance(Argument),
    /// A class method, called without receiver.
    Class(ClassRef),
}

/// A deferred call: target, operation name and arguments.
///
/// Queries are immutable; [`MethodQuery::bind`] returns a new query.
///
/// ```rust
/// # use vercall::query::{MethodQuery, Argument, placeholder};
/// # use vertype::Value;
/// let query = MethodQuery::instance(placeholder(0), "startsWith", [Argument::value("he")]);
/// assert_eq!(query.to_string(), r#"{0}.startsWith("he")"#);
/// let bound = query.bind(&[Value::from("hello")]);
/// assert!(bound.is_bound());
/// assert!(!query.is_bound());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodQuery {
    target: Target,
    name: Arc<str>,
    arguments: SmallVec<[Argument; 4]>,
}

impl MethodQuery {
    /// Call instance method `name` on `target`.
    pub fn instance(
        target: impl Into<Argument>,
        name: &str,
        arguments: impl IntoIterator<Item = Argument>,
    ) -> Self {
        Self {
            target: Target::Instance(target.into()),
            name: Arc::from(name),
            arguments: arguments.into_iter().collect(),
        }
    }

    /// Call class method `name` of `class`.
    pub fn class_method(
        class: ClassRef,
        name: &str,
        arguments: impl IntoIterator<Item = Argument>,
    ) -> Self {
        Self {
            target: Target::Class(class),
            name: Arc::from(name),
            arguments: arguments.into_iter().collect(),
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// Replace every placeholder `{i}` with `values[i]`. Placeholders without a
    /// corresponding value stay unbound.
    pub fn bind(&self, values: &[Value]) -> MethodQuery {
        let bind_one = |arg: &Argument| match arg {
            Argument::Placeholder(index) if *index < values.len() => {
                Argument::Value(values[*index].clone())
            }
            other => other.clone(),
        };

        MethodQuery {
            target: match &self.target {
                Target::Instance(receiver) => Target::Instance(bind_one(receiver)),
                Target::Class(class) => Target::Class(*class),
            },
            name: self.name.clone(),
            arguments: self.arguments.iter().map(bind_one).collect(),
        }
    }

    /// Returns `true` if no placeholder is left.
    pub fn is_bound(&self) -> bool {
        let receiver_bound = match &self.target {
            Target::Instance(receiver) => receiver.is_value(),
            Target::Class(_) => true,
        };
        receiver_bound && self.arguments.iter().all(Argument::is_value)
    }

    /// Format this query using `registry` to resolve class names.
    pub fn fmt<'a>(&'a self, registry: &'a ClassRegistry) -> impl std::fmt::Display + 'a {
        struct Fmt<'a> {
            query: &'a MethodQuery,
            registry: &'a ClassRegistry,
        }

        impl Fmt<'_> {
            fn argument(&self, f: &mut std::fmt::Formatter<'_>, arg: &Argument) -> std::fmt::Result {
                match arg {
                    Argument::Value(value) => write!(f, "{}", value.fmt(self.registry)),
                    Argument::Placeholder(index) => write!(f, "{{{index}}}"),
                }
            }
        }

        impl std::fmt::Display for Fmt<'_> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match &self.query.target {
                    Target::Instance(receiver) => self.argument(f, receiver)?,
                    Target::Class(class) => write!(f, "{}", self.registry.fmt(*class))?,
                }
                write!(f, ".{}(", self.query.name)?;
                for (i, arg) in self.query.arguments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    self.argument(f, arg)?;
                }
                f.write_str(")")
            }
        }

        Fmt {
            query: self,
            registry,
        }
    }
}

impl std::fmt::Display for MethodQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", MethodQuery::fmt(self, ClassRegistry::global()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_leaves_original_untouched() {
        let query = MethodQuery::instance(
            placeholder(0),
            "substring",
            [placeholder(1), Argument::value(3)],
        );
        let partially = query.bind(&[Value::from("abcdef")]);
        assert!(!partially.is_bound());
        assert_eq!(partially.to_string(), r#""abcdef".substring({1}, 3)"#);

        let fully = partially.bind(&[Value::Null, Value::from(1)]);
        assert!(fully.is_bound());
        assert_eq!(fully.to_string(), r#""abcdef".substring(1, 3)"#);

        assert_eq!(query.to_string(), "{0}.substring({1}, 3)");
    }

    #[test]
    fn class_targets_are_always_bound() {
        let query = MethodQuery::class_method(ClassRef::STRING, "valueOf", [Argument::value(1)]);
        assert!(query.is_bound());
        assert_eq!(query.to_string(), "String.valueOf(1)");
    }
}
