//! Overload resolution.
//!
//! [`Resolver::resolve`] picks the single best-matching overload of a named operation
//! for a receiver class and a list of argument values:
//!
//! 1. Enumerate every candidate named `name` on the receiver class and its ancestors.
//! 2. Drop candidates overridden by a more-derived declaration with the same parameters.
//! 3. Keep candidates whose arity matches and whose parameters accept every argument
//!    (see [`Type::accepts`]).
//! 4. Keep candidates that no other candidate is strictly more specific than.
//! 5. Among the remaining ties, prefer candidates matching every argument exactly.
//! 6. Exactly one left is the answer; none is [`CallError::MethodNotFound`], several is
//!    [`CallError::MethodAmbiguous`].
//!
//! Compatibility only depends on the runtime class of each argument (or its absence for
//! `null`), so results are memoized per (receiver, kind, name, argument shape). The class
//! hierarchy and the method table never change once built, hence no invalidation.
use std::sync::Arc;

use dashmap::DashMap;
use log::{debug, info};
use once_cell::sync::Lazy;
use smallvec::SmallVec;
use vertype::{ClassRef, ClassRegistry, Conversion, Type, Value};

use crate::{
    candidate::{MethodCandidate, MethodTable},
    conf::{CacheMode, ResolverConfig},
    curry::{MethodOperation, Stage},
    error::{CallError, CallResult},
    query::{Argument, MethodQuery, Target},
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ResolutionKey {
    receiver: ClassRef,
    is_static: bool,
    name: Arc<str>,
    shape: SmallVec<[Option<ClassRef>; 4]>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SignatureKey {
    class: ClassRef,
    name: Arc<str>,
    parameters: SmallVec<[Type; 4]>,
}

/// Resolves named calls against a [`MethodTable`].
///
/// A resolver is `Sync`: share one instance between threads (or use [`Resolver::global`])
/// to share its caches.
///
/// ```rust
/// # use vercall::resolver::Resolver;
/// # use vertype::{ClassRef, Value};
/// let resolver = Resolver::global();
/// let length = resolver.resolve(ClassRef::STRING, false, "length", &[]).unwrap();
/// assert_eq!(length.declaring, ClassRef::CHAR_SEQUENCE);
/// let value = length.invoke(Some(&Value::from("hello")), &[]).unwrap();
/// assert_eq!(value, Value::from(5));
/// ```
pub struct Resolver {
    registry: &'static ClassRegistry,
    table: MethodTable,
    config: ResolverConfig,
    resolved: DashMap<ResolutionKey, Arc<MethodCandidate>>,
    curried: DashMap<SignatureKey, Arc<MethodOperation>>,
}

static GLOBAL: Lazy<Resolver> = Lazy::new(|| match MethodTable::from_registrations() {
    Ok(table) => Resolver::new(table),
    Err(err) => panic!("static method registrations are inconsistent: {err}"),
});

impl Resolver {
    /// Create a resolver over `table`, using the global class registry.
    pub fn new(table: MethodTable) -> Self {
        Self::with_config(table, ResolverConfig::default())
    }

    pub fn with_config(table: MethodTable, config: ResolverConfig) -> Self {
        Self {
            registry: ClassRegistry::global(),
            table,
            config,
            resolved: DashMap::new(),
            curried: DashMap::new(),
        }
    }

    /// The process-wide resolver, built on first use from every static registration
    /// (see [`register_methods!`](crate::register_methods)).
    ///
    /// # Panics
    /// If two registrations declare the same method twice on one class.
    pub fn global() -> &'static Resolver {
        &GLOBAL
    }

    pub fn registry(&self) -> &'static ClassRegistry {
        self.registry
    }

    pub fn table(&self) -> &MethodTable {
        &self.table
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Number of memoized resolutions.
    pub fn cached_resolutions(&self) -> usize {
        self.resolved.len()
    }

    /// Resolve `name` on `receiver` for the given arguments.
    ///
    /// `is_static` selects class methods (called without receiver) instead of instance
    /// methods.
    pub fn resolve(
        &self,
        receiver: ClassRef,
        is_static: bool,
        name: &str,
        args: &[Value],
    ) -> CallResult<Arc<MethodCandidate>> {
        let key = ResolutionKey {
            receiver,
            is_static,
            name: Arc::from(name),
            shape: args.iter().map(Value::runtime_class).collect(),
        };

        if self.config.cache == CacheMode::Shared {
            if let Some(hit) = self.resolved.get(&key) {
                return Ok(hit.value().clone());
            }
        }

        debug!(
            "Resolution cache miss for `{}.{}` with argument shape [{}].",
            self.registry.fmt(receiver),
            name,
            self.shape_names(&key.shape).join(", ")
        );
        let candidate = self.resolve_uncached(receiver, is_static, name, args)?;

        if self.config.cache == CacheMode::Shared {
            // Another thread may have raced us to the same key; keep whichever landed first.
            Ok(self.resolved.entry(key).or_insert(candidate).value().clone())
        } else {
            Ok(candidate)
        }
    }

    /// Resolve an instance method on the runtime class of `receiver`.
    pub fn resolve_on(
        &self,
        receiver: &Value,
        name: &str,
        args: &[Value],
    ) -> CallResult<Arc<MethodCandidate>> {
        let class = receiver.runtime_class().ok_or_else(|| CallError::NullReceiver {
            name: name.to_string(),
        })?;
        self.resolve(class, false, name, args)
    }

    /// Resolve and invoke a fully bound query.
    pub fn invoke(&self, query: &MethodQuery) -> CallResult<Value> {
        let args = query
            .arguments()
            .iter()
            .map(|arg| match arg {
                Argument::Value(value) => Ok(value.clone()),
                Argument::Placeholder(index) => Err(CallError::UnboundPlaceholder {
                    query: query.to_string(),
                    index: *index,
                }),
            })
            .collect::<CallResult<Vec<_>>>()?;

        match query.target() {
            Target::Class(class) => {
                let candidate = self.resolve(*class, true, query.name(), &args)?;
                candidate.invoke(None, &args)
            }
            Target::Instance(Argument::Value(receiver)) => {
                let candidate = self.resolve_on(receiver, query.name(), &args)?;
                candidate.invoke(Some(receiver), &args)
            }
            Target::Instance(Argument::Placeholder(index)) => Err(CallError::UnboundPlaceholder {
                query: query.to_string(),
                index: *index,
            }),
        }
    }

    /// Find the method of `class` (or its nearest ancestor) whose parameter types are
    /// exactly `parameters`. Instance methods are preferred over class methods.
    pub fn lookup(
        &self,
        class: ClassRef,
        name: &str,
        parameters: &[Type],
    ) -> CallResult<Arc<MethodCandidate>> {
        for is_static in [false, true] {
            for ancestor in self.registry.linearize(class) {
                let found = self
                    .table
                    .declared(ancestor, name)
                    .iter()
                    .find(|c| c.is_static == is_static && c.parameters.as_slice() == parameters);
                if let Some(found) = found {
                    return Ok(found.clone());
                }
            }
        }

        Err(CallError::MethodNotFound {
            receiver: self.registry.name(class).to_string(),
            name: name.to_string(),
            arguments: parameters
                .iter()
                .map(|p| p.fmt(self.registry).to_string())
                .collect(),
        })
    }

    /// Stage the method of `class` with exactly `parameters` for curried application.
    ///
    /// For instance methods the receiver becomes the first parameter. The wrapper is
    /// memoized per signature.
    pub fn curry(&self, class: ClassRef, name: &str, parameters: &[Type]) -> CallResult<Stage> {
        let key = SignatureKey {
            class,
            name: Arc::from(name),
            parameters: parameters.iter().copied().collect(),
        };

        let cached = self.curried.get(&key).map(|hit| hit.value().clone());
        let operation = match cached {
            Some(operation) => operation,
            None => {
                let candidate = self.lookup(class, name, parameters)?;
                let operation = Arc::new(MethodOperation::new(candidate));
                self.curried.entry(key).or_insert(operation).value().clone()
            }
        };

        Stage::with_registry(operation, self.registry)
    }

    fn resolve_uncached(
        &self,
        receiver: ClassRef,
        is_static: bool,
        name: &str,
        args: &[Value],
    ) -> CallResult<Arc<MethodCandidate>> {
        let visible = self.visible_candidates(receiver, is_static, name);

        // Arity and per-argument compatibility
        let applicable: Vec<(Arc<MethodCandidate>, SmallVec<[Conversion; 4]>)> = visible
            .into_iter()
            .filter(|c| c.arity() == args.len())
            .filter_map(|c| {
                let conversions = c
                    .parameters
                    .iter()
                    .zip(args)
                    .map(|(param, arg)| param.accepts(arg, self.registry))
                    .collect::<Option<SmallVec<[Conversion; 4]>>>()?;
                Some((c, conversions))
            })
            .collect();

        if applicable.is_empty() {
            return Err(CallError::MethodNotFound {
                receiver: self.registry.name(receiver).to_string(),
                name: name.to_string(),
                arguments: self.argument_names(args),
            });
        }

        // Most specific candidates
        let mut best: Vec<_> = applicable
            .iter()
            .filter(|(c, _)| {
                !applicable
                    .iter()
                    .any(|(other, _)| self.strictly_more_specific(other, c))
            })
            .cloned()
            .collect();

        // Exact matches win over widening and subtyping
        if best.len() > 1 && best.iter().any(|(_, conv)| conv.iter().all(Conversion::is_exact)) {
            best.retain(|(_, conv)| conv.iter().all(Conversion::is_exact));
        }

        if best.len() == 1 {
            let (candidate, _) = best.remove(0);
            return Ok(candidate);
        }

        let candidates: Vec<String> = best
            .iter()
            .map(|(c, _)| c.signature(self.registry).to_string())
            .collect();
        info!(
            "Ambiguous call `{}.{}`: {} candidates remain after resolution.",
            self.registry.fmt(receiver),
            name,
            candidates.len()
        );
        Err(CallError::MethodAmbiguous {
            receiver: self.registry.name(receiver).to_string(),
            name: name.to_string(),
            arguments: self.argument_names(args),
            candidates,
        })
    }

    /// Candidates of `receiver` and its ancestors, most-derived first, with overridden
    /// declarations removed.
    ///
    /// Relies on [`ClassRegistry::linearize`] listing every class before the classes it
    /// extends, so an overriding declaration is always met first.
    fn visible_candidates(
        &self,
        receiver: ClassRef,
        is_static: bool,
        name: &str,
    ) -> Vec<Arc<MethodCandidate>> {
        let mut visible: Vec<Arc<MethodCandidate>> = Vec::new();
        for class in self.registry.linearize(receiver) {
            for candidate in self.table.declared(class, name) {
                if candidate.is_static != is_static {
                    continue;
                }

                // Only a declaration on a subclass hides this one; same-signature
                // declarations on unrelated classes both stay visible.
                match visible.iter_mut().find(|v| {
                    v.parameters == candidate.parameters
                        && self.registry.is_subclass(v.declaring, candidate.declaring)
                }) {
                    Some(overriding) => {
                        if overriding.overrides.is_none() {
                            let mut marked = (**overriding).clone();
                            marked.overrides = Some(candidate.declaring);
                            *overriding = Arc::new(marked);
                        }
                    }
                    None => visible.push(candidate.clone()),
                }
            }
        }
        visible
    }

    /// `a` is strictly more specific than `b` when each of its parameters is narrower
    /// than or equal to `b`'s and the parameter lists differ.
    fn strictly_more_specific(&self, a: &MethodCandidate, b: &MethodCandidate) -> bool {
        a.parameters != b.parameters
            && a.parameters
                .iter()
                .zip(&b.parameters)
                .all(|(pa, pb)| pa.is_narrower_than(pb, self.registry))
    }

    fn argument_names(&self, args: &[Value]) -> Vec<String> {
        self.shape_names(&args.iter().map(Value::runtime_class).collect::<Vec<_>>())
    }

    fn shape_names(&self, shape: &[Option<ClassRef>]) -> Vec<String> {
        shape
            .iter()
            .map(|class| match class {
                Some(class) => self.registry.name(*class).to_string(),
                None => "null".to_string(),
            })
            .collect()
    }
}
