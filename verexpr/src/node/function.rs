//! Native callables wrapped by leaves and transformations.
use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use once_cell::sync::OnceCell;
use smallvec::SmallVec;
use vercall::{BoxError, CallError, MethodQuery, Resolver, Stage};
use vertype::Value;

use crate::error::EvaluationFault;

/// Native function of one argument.
pub type Callable = dyn Fn(&Value) -> Result<Value, BoxError> + Send + Sync;

static NEXT_ANONYMOUS: AtomicU64 = AtomicU64::new(0);

/// What a [`Function`] was built from.
///
/// Equality and hashing of functions (and therefore of nodes) only look at the
/// identity: two functions built by the same factory with the same arguments are equal
/// even though their closures are distinct objects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    /// A named factory applied to constructor arguments, e.g. `is_equal_to(5)`.
    Factory {
        name: Arc<str>,
        arguments: SmallVec<[Value; 2]>,
    },
    /// A named call; placeholder `{0}` stands for the input.
    Call(MethodQuery),
    /// A staged operation and the arguments bound before the input.
    Staged {
        operation: Arc<str>,
        bound: SmallVec<[Value; 2]>,
    },
    /// A closure without factory. Equal only to its own clones.
    Anonymous { id: u64, description: Arc<str> },
}

struct FunctionData {
    identity: Identity,
    label: OnceCell<Arc<str>>,
    callable: Box<Callable>,
}

/// A native callable with a structural identity and a lazily computed label.
///
/// Cloning is cheap and clones share the label.
#[derive(Clone)]
pub struct Function(Arc<FunctionData>);

impl Function {
    fn from_parts(identity: Identity, callable: Box<Callable>) -> Self {
        Self(Arc::new(FunctionData {
            identity,
            label: OnceCell::new(),
            callable,
        }))
    }

    /// A function built by factory `name` from `arguments`.
    pub fn new<F>(name: &str, arguments: impl IntoIterator<Item = Value>, callable: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self::from_parts(
            Identity::Factory {
                name: Arc::from(name),
                arguments: arguments.into_iter().collect(),
            },
            Box::new(callable),
        )
    }

    /// An infallible boolean function built by factory `name` from `arguments`.
    pub fn predicate<F>(name: &str, arguments: impl IntoIterator<Item = Value>, test: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::new(name, arguments, move |input| Ok(Value::Bool(test(input))))
    }

    /// A function without factory, labelled `description`.
    pub fn anonymous<F>(description: &str, callable: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self::from_parts(
            Identity::Anonymous {
                id: NEXT_ANONYMOUS.fetch_add(1, Ordering::Relaxed),
                description: Arc::from(description),
            },
            Box::new(callable),
        )
    }

    /// A function invoking `query` through `resolver`, with placeholder `{0}` bound to
    /// the input.
    ///
    /// Resolution happens at each invocation, against the runtime class of the input;
    /// resolution errors surface as evaluation faults.
    ///
    /// ```rust
    /// # use vercall::{MethodQuery, Resolver, placeholder};
    /// # use verexpr::Function;
    /// # use vertype::Value;
    /// let length = Function::call(
    ///     MethodQuery::instance(placeholder(0), "length", []),
    ///     Resolver::global(),
    /// );
    /// assert_eq!(length.label(), "{0}.length()");
    /// assert_eq!(length.apply(&Value::from("four")).unwrap(), Value::from(4));
    /// ```
    pub fn call(query: MethodQuery, resolver: &'static Resolver) -> Self {
        let bound_query = query.clone();
        Self::from_parts(
            Identity::Call(query),
            Box::new(move |input| {
                let bound = bound_query.bind(std::slice::from_ref(input));
                Ok(resolver.invoke(&bound)?)
            }),
        )
    }

    /// A function feeding its input as the last argument of a staged operation.
    ///
    /// The identity records the operation name and the arguments bound so far. Fails with
    /// [`CallError::NoMoreParameters`] if `stage` is already final.
    pub fn staged(stage: Stage) -> Result<Self, CallError> {
        let Stage::Pending(function) = &stage else {
            return Err(CallError::NoMoreParameters {
                operation: "staged leaf".to_string(),
            });
        };

        let identity = Identity::Staged {
            operation: Arc::from(function.operation().name()),
            bound: function.bound().iter().cloned().collect(),
        };
        Ok(Self::from_parts(
            identity,
            Box::new(move |input| {
                let next = stage.apply(input.clone())?;
                let remaining = next.remaining();
                next.into_value()
                    .ok_or_else(|| format!("{remaining} more arguments expected").into())
            }),
        ))
    }

    pub fn identity(&self) -> &Identity {
        &self.0.identity
    }

    /// Display label, computed on first use.
    pub fn label(&self) -> &str {
        self.shared_label()
    }

    pub(crate) fn shared_label(&self) -> &Arc<str> {
        self.0.label.get_or_init(|| match &self.0.identity {
            Identity::Factory { name, arguments }
            | Identity::Staged {
                operation: name,
                bound: arguments,
            } if arguments.is_empty() => name.clone(),
            Identity::Factory { name, arguments }
            | Identity::Staged {
                operation: name,
                bound: arguments,
            } => {
                let arguments: Vec<String> = arguments.iter().map(Value::to_string).collect();
                Arc::from(format!("{name}({})", arguments.join(", ")))
            }
            Identity::Call(query) => Arc::from(query.to_string()),
            Identity::Anonymous { description, .. } => description.clone(),
        })
    }

    /// Invoke the native callable.
    pub fn apply(&self, input: &Value) -> Result<Value, BoxError> {
        (self.0.callable)(input)
    }

    /// Invoke the native callable, turning its error (and its panic, if `catch_panics`)
    /// into a fault.
    pub(crate) fn invoke(
        &self,
        input: &Value,
        catch_panics: bool,
    ) -> Result<Value, EvaluationFault> {
        let result = if catch_panics {
            catch_unwind(AssertUnwindSafe(|| self.apply(input))).map_err(|payload| {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                EvaluationFault::Panic {
                    label: self.label().to_string(),
                    message,
                }
            })?
        } else {
            self.apply(input)
        };

        result.map_err(|source| EvaluationFault::Callable {
            label: self.label().to_string(),
            source: Arc::from(source),
        })
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.0.identity == other.0.identity
    }
}

impl Eq for Function {}

impl std::hash::Hash for Function {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.identity.hash(state);
    }
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Function").field(&self.0.identity).finish()
    }
}

impl std::fmt::Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
