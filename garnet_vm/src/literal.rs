//! Literal expression nodes.
//!
//! Every expression can produce a boxed [`Value`]. Consumers that expect a
//! particular primitive ask for it through a typed path instead, which a
//! literal of that kind answers without boxing. A typed path that cannot
//! produce its type returns the boxed value in [`UnexpectedResult`] so the
//! caller can fall back to generic handling.

use garnet_core::{ObjectRef, Value};
use std::fmt;

/// A typed execution path produced a value of a different type.
#[derive(Debug, Clone, PartialEq)]
pub struct UnexpectedResult(pub Value);

impl UnexpectedResult {
    #[inline]
    pub fn into_value(self) -> Value {
        self.0
    }
}

/// An executable expression.
pub trait ExpressionNode: Send + Sync + fmt::Debug {
    /// Evaluate to a boxed value.
    fn execute(&self) -> Value;

    /// Evaluate to a 64-bit fixnum. `Int` results are widened.
    fn execute_long(&self) -> Result<i64, UnexpectedResult> {
        let value = self.execute();
        value.as_fixnum().ok_or(UnexpectedResult(value))
    }

    fn execute_int(&self) -> Result<i32, UnexpectedResult> {
        match self.execute() {
            Value::Int(n) => Ok(n),
            other => Err(UnexpectedResult(other)),
        }
    }

    fn execute_double(&self) -> Result<f64, UnexpectedResult> {
        match self.execute() {
            Value::Float(f) => Ok(f),
            other => Err(UnexpectedResult(other)),
        }
    }

    fn execute_bool(&self) -> Result<bool, UnexpectedResult> {
        match self.execute() {
            Value::Bool(b) => Ok(b),
            other => Err(UnexpectedResult(other)),
        }
    }
}

// =============================================================================
// Literals
// =============================================================================

/// A 64-bit fixnum literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LongLiteralNode {
    value: i64,
}

impl LongLiteralNode {
    #[inline]
    pub const fn new(value: i64) -> Self {
        Self { value }
    }

    #[inline]
    pub const fn value(&self) -> i64 {
        self.value
    }
}

impl ExpressionNode for LongLiteralNode {
    #[inline]
    fn execute(&self) -> Value {
        Value::Long(self.value)
    }

    #[inline]
    fn execute_long(&self) -> Result<i64, UnexpectedResult> {
        Ok(self.value)
    }
}

/// A 32-bit fixnum literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntLiteralNode {
    value: i32,
}

impl IntLiteralNode {
    #[inline]
    pub const fn new(value: i32) -> Self {
        Self { value }
    }

    #[inline]
    pub const fn value(&self) -> i32 {
        self.value
    }
}

impl ExpressionNode for IntLiteralNode {
    #[inline]
    fn execute(&self) -> Value {
        Value::Int(self.value)
    }

    #[inline]
    fn execute_int(&self) -> Result<i32, UnexpectedResult> {
        Ok(self.value)
    }

    #[inline]
    fn execute_long(&self) -> Result<i64, UnexpectedResult> {
        Ok(i64::from(self.value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatLiteralNode {
    value: f64,
}

impl FloatLiteralNode {
    #[inline]
    pub const fn new(value: f64) -> Self {
        Self { value }
    }

    #[inline]
    pub const fn value(&self) -> f64 {
        self.value
    }
}

impl ExpressionNode for FloatLiteralNode {
    #[inline]
    fn execute(&self) -> Value {
        Value::Float(self.value)
    }

    #[inline]
    fn execute_double(&self) -> Result<f64, UnexpectedResult> {
        Ok(self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BooleanLiteralNode {
    value: bool,
}

impl BooleanLiteralNode {
    #[inline]
    pub const fn new(value: bool) -> Self {
        Self { value }
    }
}

impl ExpressionNode for BooleanLiteralNode {
    #[inline]
    fn execute(&self) -> Value {
        Value::Bool(self.value)
    }

    #[inline]
    fn execute_bool(&self) -> Result<bool, UnexpectedResult> {
        Ok(self.value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NilLiteralNode;

impl ExpressionNode for NilLiteralNode {
    #[inline]
    fn execute(&self) -> Value {
        Value::Nil
    }
}

/// A boxed constant: bignums, objects, and anything without an unboxed form.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectLiteralNode {
    value: Value,
}

impl ObjectLiteralNode {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    pub fn object(object: ObjectRef) -> Self {
        Self::new(Value::Object(object))
    }
}

impl ExpressionNode for ObjectLiteralNode {
    fn execute(&self) -> Value {
        self.value.clone()
    }
}

/// Build the literal node best suited to a constant.
pub fn literal(value: Value) -> Box<dyn ExpressionNode> {
    match value {
        Value::Bool(b) => Box::new(BooleanLiteralNode::new(b)),
        Value::Int(n) => Box::new(IntLiteralNode::new(n)),
        Value::Long(n) => Box::new(LongLiteralNode::new(n)),
        Value::Float(f) => Box::new(FloatLiteralNode::new(f)),
        Value::Nil => Box::new(NilLiteralNode),
        other @ (Value::Bignum(_) | Value::Object(_)) => Box::new(ObjectLiteralNode::new(other)),
    }
}
