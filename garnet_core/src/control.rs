//! Loop control signals.
//!
//! `next`, `break` and `redo` unwind to the innermost enclosing loop. They are
//! threaded through the `Err` side of node results as [`Interrupt::Control`],
//! a variant distinct from [`Interrupt::Error`], so generic error handling can
//! match on errors alone and let signals pass.
//!
//! A signal is exactly its payload: no backtrace, no message, no allocation
//! beyond the payload value itself.

use crate::error::{CoercionError, ConfigurationError, RuntimeError, StorageError};
use crate::value::Value;

/// A non-local loop control transfer.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlSignal {
    /// End the current iteration; the payload becomes the iteration's value.
    Next(Value),
    /// Leave the loop; the payload becomes the loop's value.
    Break(Value),
    /// Restart the current iteration without re-testing the loop condition.
    Redo,
}

/// Kind of a [`ControlSignal`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Next,
    Break,
    Redo,
}

impl ControlSignal {
    #[inline]
    pub fn kind(&self) -> SignalKind {
        match self {
            ControlSignal::Next(_) => SignalKind::Next,
            ControlSignal::Break(_) => SignalKind::Break,
            ControlSignal::Redo => SignalKind::Redo,
        }
    }

    /// Consume the signal, yielding its payload (`nil` for `redo`).
    #[inline]
    pub fn into_payload(self) -> Value {
        match self {
            ControlSignal::Next(value) | ControlSignal::Break(value) => value,
            ControlSignal::Redo => Value::Nil,
        }
    }
}

/// Anything that stops a node from completing normally.
#[derive(Debug, Clone, PartialEq)]
pub enum Interrupt {
    /// Routine control transfer, caught by a loop executor.
    Control(ControlSignal),
    /// A genuine failure.
    Error(RuntimeError),
}

impl Interrupt {
    #[inline]
    pub fn next(value: impl Into<Value>) -> Self {
        Interrupt::Control(ControlSignal::Next(value.into()))
    }

    #[inline]
    pub fn break_with(value: impl Into<Value>) -> Self {
        Interrupt::Control(ControlSignal::Break(value.into()))
    }

    #[inline]
    pub fn redo() -> Self {
        Interrupt::Control(ControlSignal::Redo)
    }

    /// Check if this is a control signal rather than an error.
    #[inline]
    pub fn is_control(&self) -> bool {
        matches!(self, Interrupt::Control(_))
    }
}

impl From<ControlSignal> for Interrupt {
    #[inline]
    fn from(signal: ControlSignal) -> Self {
        Interrupt::Control(signal)
    }
}

impl From<RuntimeError> for Interrupt {
    #[inline]
    fn from(error: RuntimeError) -> Self {
        Interrupt::Error(error)
    }
}

macro_rules! interrupt_from_error {
    ($($error:ty),* $(,)?) => {
        $(
            impl From<$error> for Interrupt {
                #[inline]
                fn from(error: $error) -> Self {
                    Interrupt::Error(error.into())
                }
            }
        )*
    };
}

interrupt_from_error!(CoercionError, StorageError, ConfigurationError);

/// Result of evaluating a node that may unwind.
pub type Completion<T = Value> = std::result::Result<T, Interrupt>;
