//! The dynamic method call seam.
//!
//! Method lookup belongs to the surrounding runtime. The dispatch core only
//! needs to call a named method on a receiver and tell a missing method apart
//! from a method that returned a value.

use garnet_core::Value;

/// Outcome of a dynamic method call.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    /// The method ran and returned this value.
    Returned(Value),
    /// The receiver has no such method.
    Missing,
}

/// Calls named methods on values.
///
/// Implementations may re-enter dispatch nodes, including the node that
/// called them.
pub trait MethodInvoker {
    fn call_method(&mut self, receiver: &Value, name: &str, arguments: &[Value]) -> Invocation;
}

impl<F> MethodInvoker for F
where
    F: FnMut(&Value, &str, &[Value]) -> Invocation,
{
    #[inline]
    fn call_method(&mut self, receiver: &Value, name: &str, arguments: &[Value]) -> Invocation {
        self(receiver, name, arguments)
    }
}

/// An invoker for which every method is missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMethods;

impl MethodInvoker for NoMethods {
    fn call_method(&mut self, _receiver: &Value, _name: &str, _arguments: &[Value]) -> Invocation {
        Invocation::Missing
    }
}
