//! Method descriptors and the table they are registered in.
//!
//! A [`MethodCandidate`] describes one overload of a named operation: where it is
//! declared, what it takes and returns, and the native function backing it. The
//! [`MethodTable`] groups candidates by declaring class and name; it is filled once,
//! either explicitly or from the static registrations submitted with
//! [`register_methods!`](crate::register_methods), and then handed to a
//! [`Resolver`](crate::resolver::Resolver).
use std::{
    collections::BTreeMap,
    hash::{Hash, Hasher},
    sync::Arc,
};

use log::debug;
use smallvec::SmallVec;
use vertype::{ClassRef, ClassRegistry, Type, Value};

use crate::error::{BoxError, CallError, CallResult};

/// Native function backing a candidate. Receives the receiver (`None` for static
/// methods) and the already validated arguments.
pub type Invoker = Arc<dyn Fn(Option<&Value>, &[Value]) -> Result<Value, BoxError> + Send + Sync>;

/// One overload of a named operation.
///
/// Equality and hashing cover the descriptor only; the invoker is ignored.
#[derive(Clone)]
pub struct MethodCandidate {
    pub declaring: ClassRef,
    pub name: Arc<str>,
    pub parameters: SmallVec<[Type; 4]>,
    pub return_type: Type,
    pub is_static: bool,
    /// Declaring class of the candidate this one overrides, filled in during resolution.
    pub overrides: Option<ClassRef>,
    invoker: Invoker,
}

impl MethodCandidate {
    /// Describe an instance method of `declaring`.
    pub fn instance<F>(
        declaring: ClassRef,
        name: &str,
        parameters: impl IntoIterator<Item = Type>,
        return_type: Type,
        invoker: F,
    ) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self {
            declaring,
            name: Arc::from(name),
            parameters: parameters.into_iter().collect(),
            return_type,
            is_static: false,
            overrides: None,
            invoker: Arc::new(move |receiver, args| match receiver {
                Some(receiver) => invoker(receiver, args),
                None => Err("instance method invoked without a receiver".into()),
            }),
        }
    }

    /// Describe a static method of `declaring`.
    pub fn class_method<F>(
        declaring: ClassRef,
        name: &str,
        parameters: impl IntoIterator<Item = Type>,
        return_type: Type,
        invoker: F,
    ) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self {
            declaring,
            name: Arc::from(name),
            parameters: parameters.into_iter().collect(),
            return_type,
            is_static: true,
            overrides: None,
            invoker: Arc::new(move |_, args| invoker(args)),
        }
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Call the native function. Failures are wrapped into [`CallError::InvocationFault`].
    pub fn invoke(&self, receiver: Option<&Value>, args: &[Value]) -> CallResult<Value> {
        (self.invoker)(receiver, args).map_err(|source| CallError::InvocationFault {
            operation: self.signature(ClassRegistry::global()).to_string(),
            source,
        })
    }

    /// Human-readable signature, e.g. `String.substring(i32, i32) -> String`.
    pub fn signature<'a>(&'a self, registry: &'a ClassRegistry) -> impl std::fmt::Display + 'a {
        struct Fmt<'a> {
            candidate: &'a MethodCandidate,
            registry: &'a ClassRegistry,
        }

        impl std::fmt::Display for Fmt<'_> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let c = self.candidate;
                if c.is_static {
                    f.write_str("static ")?;
                }
                write!(f, "{}.{}(", self.registry.fmt(c.declaring), c.name)?;
                for (i, param) in c.parameters.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", param.fmt(self.registry))?;
                }
                write!(f, ") -> {}", c.return_type.fmt(self.registry))
            }
        }

        Fmt {
            candidate: self,
            registry,
        }
    }
}

impl std::fmt::Debug for MethodCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodCandidate")
            .field("declaring", &self.declaring)
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("return_type", &self.return_type)
            .field("is_static", &self.is_static)
            .field("overrides", &self.overrides)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for MethodCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.signature(ClassRegistry::global()))
    }
}

impl PartialEq for MethodCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.declaring == other.declaring
            && self.name == other.name
            && self.parameters == other.parameters
            && self.return_type == other.return_type
            && self.is_static == other.is_static
            && self.overrides == other.overrides
    }
}

impl Eq for MethodCandidate {}

impl Hash for MethodCandidate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.declaring.hash(state);
        self.name.hash(state);
        self.parameters.hash(state);
        self.return_type.hash(state);
        self.is_static.hash(state);
        self.overrides.hash(state);
    }
}

/// All registered methods, grouped by declaring class and name.
#[derive(Default, Clone)]
pub struct MethodTable {
    methods: BTreeMap<(ClassRef, Arc<str>), Vec<Arc<MethodCandidate>>>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from every [`MethodRegistration`] linked into the program.
    pub fn from_registrations() -> CallResult<Self> {
        let mut table = Self::new();
        for registration in inventory::iter::<MethodRegistration> {
            (registration.register)(&mut table)?;
        }
        debug!(
            "Method table built from static registrations: {} methods.",
            table.len()
        );
        Ok(table)
    }

    /// Add `candidate` to the table.
    ///
    /// Fails with [`CallError::DuplicateMethod`] if its class already declares a method
    /// with the same name, kind and parameter types.
    pub fn register(&mut self, candidate: MethodCandidate) -> CallResult<&mut Self> {
        let slot = self
            .methods
            .entry((candidate.declaring, candidate.name.clone()))
            .or_default();

        if slot.iter().any(|existing| {
            existing.is_static == candidate.is_static && existing.parameters == candidate.parameters
        }) {
            return Err(CallError::DuplicateMethod {
                signature: candidate.to_string(),
            });
        }

        slot.push(Arc::new(candidate));
        Ok(self)
    }

    /// Methods named `name` declared directly on `class` (inherited ones excluded).
    pub fn declared(&self, class: ClassRef, name: &str) -> &[Arc<MethodCandidate>] {
        self.methods
            .get(&(class, Arc::from(name)))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total number of registered methods.
    pub fn len(&self) -> usize {
        self.methods.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Inventory containing static method registrations.
pub struct MethodRegistration {
    pub register: fn(&mut MethodTable) -> CallResult<()>,
}
inventory::collect!(MethodRegistration);

/// Submit a function that fills a [`MethodTable`] as a static registration, picked up
/// by [`MethodTable::from_registrations`] and the global resolver.
///
/// ```rust,ignore
/// fn register_geometry(table: &mut MethodTable) -> CallResult<()> {
///     table.register(MethodCandidate::instance(/* ... */))?;
///     Ok(())
/// }
/// vercall::register_methods!(register_geometry);
/// ```
#[macro_export]
macro_rules! register_methods {
    (
        $register:path
    ) => {
        $crate::inventory::submit! {
            $crate::candidate::MethodRegistration {
                register: $register,
            }
        }
    };
    () => {};
}
