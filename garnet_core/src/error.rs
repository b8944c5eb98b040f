//! Error taxonomy of the dispatch core.
//!
//! These errors classify failures; translating them into language-level
//! exceptions is the surrounding runtime's job. Loop control signals are not
//! errors and never appear here (see [`crate::control`]).

use thiserror::Error;

/// Result alias for fallible core operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Failures of the numeric coercion chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    /// The argument category never converts implicitly (booleans, nil).
    #[error("no implicit conversion of {from} into {target}")]
    NoImplicitConversion { from: String, target: &'static str },

    /// Strict mode: the value would need the conversion protocol.
    #[error("can't convert {from} to {target}")]
    CantConvert { from: String, target: &'static str },

    /// The object does not implement the conversion protocol method.
    #[error("{from} does not respond to {method}")]
    MissingProtocolMethod { from: String, method: String },
}

/// Failures of collection storage access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Requested range lies outside the logical size.
    #[error("range [{start}, {start}+{length}) out of bounds for size {size}")]
    OutOfRange {
        start: usize,
        length: usize,
        size: usize,
    },

    /// Logical size would exceed the backing store capacity.
    #[error("logical size {size} exceeds storage capacity {capacity}")]
    CapacityExceeded { size: usize, capacity: usize },

    /// Wrong number of arguments.
    #[error("wrong number of arguments (given {given}, expected {expected})")]
    ArityMismatch { given: usize, expected: usize },
}

/// Invalid specialization tables or dispatch settings.
///
/// Always raised while nodes are being registered, never while they run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// Two rules of one table accept the same shape.
    #[error("rules `{first}` and `{second}` both accept shape {shape}")]
    OverlappingGuards {
        shape: String,
        first: &'static str,
        second: &'static str,
    },

    #[error("specialization table has no rules")]
    EmptyTable,

    #[error("rule `{0}` is declared twice")]
    DuplicateRule(&'static str),

    /// A configured limit is outside its allowed range.
    #[error("{name} = {value} is out of range (maximum {max})")]
    InvalidLimit {
        name: &'static str,
        value: usize,
        max: usize,
    },

    /// Every call-site id is taken.
    #[error("call-site arena is full ({count} sites)")]
    TooManySites { count: usize },
}

/// Any failure this core reports to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Coercion(#[from] CoercionError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Raised by user code running inside the core (e.g. a loop body).
    #[error("{0}")]
    User(String),
}

impl RuntimeError {
    /// Create a user-level error.
    pub fn user(message: impl Into<String>) -> Self {
        RuntimeError::User(message.into())
    }
}
