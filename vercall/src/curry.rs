//! Staged (curried) application of multi-parameter operations.
//!
//! A [`Stage`] wraps an [`Operation`] and the arguments bound so far. Each
//! [`Stage::apply`] validates one argument against the next declared parameter type
//! and binds it; binding the last one invokes the operation and validates its result
//! against the declared return type.
//!
//! ```rust
//! # use std::sync::Arc;
//! # use vercall::curry::{NativeOperation, Stage};
//! # use vertype::{PrimitiveType, Type, Value};
//! let add = NativeOperation::new(
//!     "add",
//!     [PrimitiveType::I64.into(), PrimitiveType::I64.into()],
//!     PrimitiveType::I64.into(),
//!     |args| Ok(Value::from(args[0].as_i64().unwrap_or(0) + args[1].as_i64().unwrap_or(0))),
//! );
//! let stage = Stage::new(Arc::new(add)).unwrap();
//! let add_two = stage.apply(Value::from(2)).unwrap();
//! assert_eq!(add_two.remaining(), 1);
//! let result = add_two.apply(Value::from(40i64)).unwrap();
//! assert_eq!(result.into_value(), Some(Value::from(42i64)));
//! ```
use std::sync::Arc;

use smallvec::SmallVec;
use vertype::{ClassRegistry, Type, Value};

use crate::{
    candidate::MethodCandidate,
    error::{BoxError, CallError, CallResult},
};

/// A named operation with declared parameter and return types.
pub trait Operation: Send + Sync {
    fn name(&self) -> &str;

    fn parameter_types(&self) -> &[Type];

    fn return_type(&self) -> Type;

    /// Invoke with exactly [`Self::parameter_types`]`.len()` validated arguments.
    fn invoke(&self, args: &[Value]) -> Result<Value, BoxError>;
}

type NativeFn = dyn Fn(&[Value]) -> Result<Value, BoxError> + Send + Sync;

/// An [`Operation`] backed by a closure.
pub struct NativeOperation {
    name: String,
    parameters: SmallVec<[Type; 4]>,
    return_type: Type,
    function: Box<NativeFn>,
}

impl NativeOperation {
    pub fn new<F>(
        name: &str,
        parameters: impl IntoIterator<Item = Type>,
        return_type: Type,
        function: F,
    ) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            parameters: parameters.into_iter().collect(),
            return_type,
            function: Box::new(function),
        }
    }
}

impl Operation for NativeOperation {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameter_types(&self) -> &[Type] {
        &self.parameters
    }

    fn return_type(&self) -> Type {
        self.return_type
    }

    fn invoke(&self, args: &[Value]) -> Result<Value, BoxError> {
        (self.function)(args)
    }
}

/// An [`Operation`] backed by a resolved method.
///
/// Instance methods take their receiver as first parameter, typed with the declaring
/// class.
pub struct MethodOperation {
    candidate: Arc<MethodCandidate>,
    name: String,
    parameters: SmallVec<[Type; 4]>,
}

impl MethodOperation {
    pub fn new(candidate: Arc<MethodCandidate>) -> Self {
        let mut parameters = SmallVec::new();
        if !candidate.is_static {
            parameters.push(Type::Class(candidate.declaring));
        }
        parameters.extend(candidate.parameters.iter().copied());

        let name = candidate.signature(ClassRegistry::global()).to_string();
        Self {
            name,
            candidate,
            parameters,
        }
    }

    pub fn candidate(&self) -> &Arc<MethodCandidate> {
        &self.candidate
    }
}

impl Operation for MethodOperation {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameter_types(&self) -> &[Type] {
        &self.parameters
    }

    fn return_type(&self) -> Type {
        self.candidate.return_type
    }

    fn invoke(&self, args: &[Value]) -> Result<Value, BoxError> {
        let result = if self.candidate.is_static {
            self.candidate.invoke(None, args)
        } else {
            let (receiver, rest) = args
                .split_first()
                .ok_or("instance method staged without a receiver")?;
            self.candidate.invoke(Some(receiver), rest)
        };
        // Unwrap our own fault so the stage reports the native error only once.
        result.map_err(|err| match err {
            CallError::InvocationFault { source, .. } => source,
            other => Box::new(other) as BoxError,
        })
    }
}

/// An operation with some of its arguments bound.
#[derive(Clone)]
pub struct CurriedFunction {
    operation: Arc<dyn Operation>,
    bound: SmallVec<[Value; 4]>,
    registry: &'static ClassRegistry,
}

impl CurriedFunction {
    pub fn operation(&self) -> &Arc<dyn Operation> {
        &self.operation
    }

    /// Arguments bound so far, in parameter order.
    pub fn bound(&self) -> &[Value] {
        &self.bound
    }

    /// Number of parameters still unbound; always at least one.
    pub fn remaining(&self) -> usize {
        self.operation.parameter_types().len() - self.bound.len()
    }

    /// Declared type of the next parameter to bind.
    pub fn next_parameter_type(&self) -> Type {
        self.operation.parameter_types()[self.bound.len()]
    }

    /// Bind `argument` to the next parameter. `self` is left untouched so a partial
    /// application can be reused.
    pub fn apply(&self, argument: Value) -> CallResult<Stage> {
        let expected = self.next_parameter_type();
        if expected.accepts(&argument, self.registry).is_none() {
            return Err(CallError::InvalidArgumentType {
                operation: self.operation.name().to_string(),
                position: self.bound.len(),
                expected: expected.fmt(self.registry).to_string(),
                found: type_name(&argument, self.registry),
                value: argument.fmt(self.registry).to_string(),
            });
        }

        let mut bound = self.bound.clone();
        bound.push(argument);
        Stage::advance(self.operation.clone(), bound, self.registry)
    }
}

impl std::fmt::Debug for CurriedFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurriedFunction")
            .field("operation", &self.operation.name())
            .field("bound", &self.bound)
            .finish()
    }
}

/// Either a curried function waiting for arguments, or the final result.
#[derive(Debug, Clone)]
pub enum Stage {
    Pending(CurriedFunction),
    Final(Value),
}

impl Stage {
    /// Stage `operation` with no argument bound, using the global class registry.
    ///
    /// An operation without parameters is invoked right away.
    pub fn new(operation: Arc<dyn Operation>) -> CallResult<Self> {
        Self::with_registry(operation, ClassRegistry::global())
    }

    pub fn with_registry(
        operation: Arc<dyn Operation>,
        registry: &'static ClassRegistry,
    ) -> CallResult<Self> {
        Self::advance(operation, SmallVec::new(), registry)
    }

    fn advance(
        operation: Arc<dyn Operation>,
        bound: SmallVec<[Value; 4]>,
        registry: &'static ClassRegistry,
    ) -> CallResult<Self> {
        if bound.len() < operation.parameter_types().len() {
            return Ok(Stage::Pending(CurriedFunction {
                operation,
                bound,
                registry,
            }));
        }

        let value = operation
            .invoke(&bound)
            .map_err(|source| CallError::InvocationFault {
                operation: operation.name().to_string(),
                source,
            })?;

        let expected = operation.return_type();
        if expected.accepts(&value, registry).is_none() {
            return Err(CallError::InvalidReturnType {
                operation: operation.name().to_string(),
                expected: expected.fmt(registry).to_string(),
                found: type_name(&value, registry),
                value: value.fmt(registry).to_string(),
            });
        }

        Ok(Stage::Final(value))
    }

    /// Bind one more argument.
    ///
    /// Fails with [`CallError::NoMoreParameters`] on a final stage.
    pub fn apply(&self, argument: impl Into<Value>) -> CallResult<Stage> {
        match self {
            Stage::Pending(function) => function.apply(argument.into()),
            Stage::Final(value) => Err(CallError::NoMoreParameters {
                operation: format!("final result {value}"),
            }),
        }
    }

    /// Returns `true` while parameters remain to be bound.
    pub fn has_next(&self) -> bool {
        matches!(self, Stage::Pending(_))
    }

    pub fn remaining(&self) -> usize {
        match self {
            Stage::Pending(function) => function.remaining(),
            Stage::Final(_) => 0,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Stage::Pending(_) => None,
            Stage::Final(value) => Some(value),
        }
    }
}

fn type_name(value: &Value, registry: &ClassRegistry) -> String {
    match value.runtime_class() {
        Some(class) => registry.name(class).to_string(),
        None => "null".to_string(),
    }
}
