use strum::EnumIs;
use thiserror::Error;

/// Error produced by a native operation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures of call resolution, staged application and invocation.
///
/// Except for [`CallError::InvocationFault`], every variant means the call was wired
/// incorrectly. They are meant to surface at first use and are never retried.
#[derive(Debug, EnumIs, Error)]
pub enum CallError {
    /// No overload matches the name and the runtime types of the arguments.
    #[error("No method `{receiver}.{name}` accepts arguments ({}).", .arguments.join(", "))]
    MethodNotFound {
        receiver: String,
        name: String,
        arguments: Vec<String>,
    },

    /// More than one overload survived resolution.
    #[error(
        "Call `{receiver}.{name}` with arguments ({}) is ambiguous. Candidates:\n{}",
        .arguments.join(", "),
        .candidates.iter().map(|c| format!(" - {c}")).collect::<Vec<_>>().join("\n")
    )]
    MethodAmbiguous {
        receiver: String,
        name: String,
        arguments: Vec<String>,
        candidates: Vec<String>,
    },

    /// Two methods with the same signature were registered on the same class.
    #[error("Method `{signature}` is registered more than once on the same class.")]
    DuplicateMethod { signature: String },

    /// A staged argument does not fit the declared type of its parameter.
    #[error(
        "Argument {position} of `{operation}` must be `{expected}`, but a value of type `{found}` was given: {value}"
    )]
    InvalidArgumentType {
        operation: String,
        position: usize,
        expected: String,
        found: String,
        value: String,
    },

    /// The operation returned a value that does not fit its declared return type.
    #[error("`{operation}` must return `{expected}`, but returned a value of type `{found}`: {value}")]
    InvalidReturnType {
        operation: String,
        expected: String,
        found: String,
        value: String,
    },

    /// Every parameter is already bound; the caller mismatched the arity.
    #[error("`{operation}` has no more parameters to bind.")]
    NoMoreParameters { operation: String },

    /// An instance method was requested on `null`.
    #[error("Cannot call instance method `{name}` on null.")]
    NullReceiver { name: String },

    /// A query was invoked before all its placeholders were bound.
    #[error("Placeholder {{{index}}} of `{query}` is not bound.")]
    UnboundPlaceholder { query: String, index: usize },

    /// The native operation failed. The original error is kept as the source.
    #[error("Invocation of `{operation}` failed: {source}")]
    InvocationFault {
        operation: String,
        #[source]
        source: BoxError,
    },

    /// The resolver configuration could not be parsed.
    #[error("Failed to parse resolver configuration: {source}")]
    ConfigParse {
        #[source]
        source: toml::de::Error,
    },
}

pub type CallResult<T> = Result<T, CallError>;
