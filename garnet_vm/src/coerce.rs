//! Implicit integer coercion.
//!
//! Converts an arbitrary value to a fixed-width integer, the way arguments to
//! `pack`, `sprintf` and native calls are converted. Rules, in precedence
//! order:
//!
//! | shape                    | result                                    |
//! |--------------------------|-------------------------------------------|
//! | boolean                  | `NoImplicitConversion`                    |
//! | fixnum at target width   | the value                                 |
//! | fixnum of another width  | widened, or truncated to the target width |
//! | bignum                   | two's-complement truncation               |
//! | nil                      | `NoImplicitConversion`                    |
//! | anything else            | `to_int` protocol, or `CantConvert`       |
//!
//! The protocol result is coerced again in strict mode, so at most one
//! protocol call is made per coercion.

use crate::invoke::{Invocation, MethodInvoker};
use crate::literal::{ExpressionNode, UnexpectedResult};
use crate::specialize::{
    CallSiteId, Classification, Guard, Rule, SiteProfile, SpecializationTable, SpecializingNode,
};
use garnet_core::{CoercionError, ConfigurationError, Value, ValueShape};
use num_bigint::{BigInt, Sign};
use std::sync::{Arc, OnceLock};

const TARGET: &str = "Integer";

// =============================================================================
// Target Width
// =============================================================================

/// Width of the integer a coercion produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    Bits32,
    Bits64,
}

impl IntWidth {
    #[inline]
    pub const fn bits(self) -> u32 {
        match self {
            IntWidth::Bits32 => 32,
            IntWidth::Bits64 => 64,
        }
    }

    /// Fixnum shape already at this width.
    #[inline]
    pub const fn native_shape(self) -> ValueShape {
        match self {
            IntWidth::Bits32 => ValueShape::Int,
            IntWidth::Bits64 => ValueShape::Long,
        }
    }

    /// Truncate to this width and sign-extend back to 64 bits.
    #[inline]
    pub const fn truncate(self, value: i64) -> i64 {
        match self {
            IntWidth::Bits32 => value as i32 as i64,
            IntWidth::Bits64 => value,
        }
    }

    /// Two's-complement truncation of a big integer to this width.
    pub fn truncate_bignum(self, value: &BigInt) -> i64 {
        let (sign, digits) = value.to_u64_digits();
        let magnitude = digits.first().copied().unwrap_or(0);
        let low = match sign {
            Sign::Minus => magnitude.wrapping_neg(),
            Sign::NoSign | Sign::Plus => magnitude,
        };
        self.truncate(low as i64)
    }
}

// =============================================================================
// Rule Table
// =============================================================================

/// Signature shared by every coercion specialization and the fallback.
pub type CoerceFn =
    fn(&CoerceToInteger, &Value, bool, &mut dyn MethodInvoker) -> Result<i64, CoercionError>;

/// Rule table for coercions to `width`.
pub type CoercionTable = SpecializationTable<ValueShape, CoerceFn>;

fn is_bool(shape: ValueShape) -> bool {
    shape == ValueShape::Bool
}

fn is_int(shape: ValueShape) -> bool {
    shape == ValueShape::Int
}

fn is_long(shape: ValueShape) -> bool {
    shape == ValueShape::Long
}

fn is_bignum(shape: ValueShape) -> bool {
    shape == ValueShape::Bignum
}

fn is_nil(shape: ValueShape) -> bool {
    shape == ValueShape::Nil
}

fn needs_protocol(shape: ValueShape) -> bool {
    matches!(shape, ValueShape::Float | ValueShape::Object)
}

/// Build and validate the rule table for coercions to `width`.
pub fn coercion_table(width: IntWidth) -> Result<CoercionTable, ConfigurationError> {
    let (at_width, other_width): (Guard<ValueShape>, Guard<ValueShape>) = match width {
        IntWidth::Bits32 => (is_int as Guard<ValueShape>, is_long as Guard<ValueShape>),
        IntWidth::Bits64 => (is_long as Guard<ValueShape>, is_int as Guard<ValueShape>),
    };

    SpecializationTable::new(
        [
            Rule::new("boolean", is_bool, reject_implicit as CoerceFn),
            Rule::new("fixnum_at_width", at_width, fixnum_identity as CoerceFn),
            Rule::new("fixnum_other_width", other_width, fixnum_to_width as CoerceFn),
            Rule::new("bignum", is_bignum, truncate_bignum as CoerceFn),
            Rule::new("nil", is_nil, reject_implicit as CoerceFn),
            Rule::new("conversion_protocol", needs_protocol, convert_via_protocol as CoerceFn),
        ],
        coerce_generic as CoerceFn,
    )
}

// =============================================================================
// Specializations
// =============================================================================

fn reject_implicit(
    _node: &CoerceToInteger,
    value: &Value,
    _strict: bool,
    _invoker: &mut dyn MethodInvoker,
) -> Result<i64, CoercionError> {
    Err(CoercionError::NoImplicitConversion {
        from: value.inspect_for_conversion(),
        target: TARGET,
    })
}

fn fixnum_identity(
    node: &CoerceToInteger,
    value: &Value,
    strict: bool,
    invoker: &mut dyn MethodInvoker,
) -> Result<i64, CoercionError> {
    match value.as_fixnum() {
        Some(n) => Ok(n),
        None => coerce_generic(node, value, strict, invoker),
    }
}

fn fixnum_to_width(
    node: &CoerceToInteger,
    value: &Value,
    strict: bool,
    invoker: &mut dyn MethodInvoker,
) -> Result<i64, CoercionError> {
    match value.as_fixnum() {
        Some(n) => Ok(node.width.truncate(n)),
        None => coerce_generic(node, value, strict, invoker),
    }
}

fn truncate_bignum(
    node: &CoerceToInteger,
    value: &Value,
    strict: bool,
    invoker: &mut dyn MethodInvoker,
) -> Result<i64, CoercionError> {
    match value {
        Value::Bignum(big) => Ok(node.width.truncate_bignum(big)),
        _ => coerce_generic(node, value, strict, invoker),
    }
}

fn convert_via_protocol(
    node: &CoerceToInteger,
    value: &Value,
    strict: bool,
    invoker: &mut dyn MethodInvoker,
) -> Result<i64, CoercionError> {
    if strict {
        return Err(CoercionError::CantConvert {
            from: value.class_name().to_string(),
            target: TARGET,
        });
    }

    match invoker.call_method(value, &node.method, &[]) {
        Invocation::Missing => Err(CoercionError::MissingProtocolMethod {
            from: value.class_name().to_string(),
            method: node.method.to_string(),
        }),
        Invocation::Returned(converted) => node.redo().execute(&converted, true, invoker),
    }
}

/// Uncached fallback: the whole chain as one match.
fn coerce_generic(
    node: &CoerceToInteger,
    value: &Value,
    strict: bool,
    invoker: &mut dyn MethodInvoker,
) -> Result<i64, CoercionError> {
    match value {
        Value::Bool(_) | Value::Nil => reject_implicit(node, value, strict, invoker),
        Value::Int(n) => Ok(node.width.truncate(i64::from(*n))),
        Value::Long(n) => Ok(node.width.truncate(*n)),
        Value::Bignum(big) => Ok(node.width.truncate_bignum(big)),
        Value::Float(_) | Value::Object(_) => convert_via_protocol(node, value, strict, invoker),
    }
}

// =============================================================================
// Coercion Node
// =============================================================================

/// A call-site node coercing values to a fixed-width integer.
#[derive(Debug)]
pub struct CoerceToInteger {
    width: IntWidth,
    method: Arc<str>,
    node: SpecializingNode<ValueShape, CoerceFn>,
    /// Strict child used for the protocol's result, created on first use.
    ///
    /// It is part of the same call site: it reuses the parent's `CallSiteId`
    /// and is never registered in the arena, so its install logs carry the
    /// parent's site and the parent's profile covers only the parent node.
    redo: OnceLock<Box<CoerceToInteger>>,
}

impl CoerceToInteger {
    /// Create a coercion node. `table` must have been built for `width`.
    pub fn new(
        site: CallSiteId,
        width: IntWidth,
        table: Arc<CoercionTable>,
        limit: usize,
        method: Arc<str>,
    ) -> Self {
        Self {
            width,
            method,
            node: SpecializingNode::new(site, table, limit),
            redo: OnceLock::new(),
        }
    }

    /// Coerce `value`. In strict mode values needing the conversion protocol
    /// fail with `CantConvert` instead.
    #[inline]
    pub fn execute(
        &self,
        value: &Value,
        strict: bool,
        invoker: &mut dyn MethodInvoker,
    ) -> Result<i64, CoercionError> {
        let selection = self.node.select(value.shape());
        (selection.implementation)(self, value, strict, invoker)
    }

    fn redo(&self) -> &CoerceToInteger {
        self.redo.get_or_init(|| {
            Box::new(CoerceToInteger::new(
                self.node.site(),
                self.width,
                Arc::clone(self.node.table()),
                self.node.limit(),
                Arc::clone(&self.method),
            ))
        })
    }

    #[inline]
    pub fn width(&self) -> IntWidth {
        self.width
    }

    /// The underlying dispatch node.
    #[inline]
    pub fn node(&self) -> &SpecializingNode<ValueShape, CoerceFn> {
        &self.node
    }

    /// The strict child node, if a protocol round-trip has happened.
    ///
    /// The child reports the parent's site id.
    pub fn redo_node(&self) -> Option<&CoerceToInteger> {
        self.redo.get().map(Box::as_ref)
    }
}

impl SiteProfile for Arc<CoerceToInteger> {
    fn classification(&self) -> Classification {
        self.node.classification()
    }
}

// =============================================================================
// Typed Child Coercion
// =============================================================================

/// Coerces the result of a child expression.
///
/// Children that statically produce a fixnum are read through their unboxed
/// path; anything else is boxed and sent through the coercion node.
#[derive(Debug)]
pub struct ToIntegerNode {
    child: Box<dyn ExpressionNode>,
    coerce: Arc<CoerceToInteger>,
    strict: bool,
}

impl ToIntegerNode {
    pub fn new(child: Box<dyn ExpressionNode>, coerce: Arc<CoerceToInteger>, strict: bool) -> Self {
        Self {
            child,
            coerce,
            strict,
        }
    }

    pub fn execute(&self, invoker: &mut dyn MethodInvoker) -> Result<i64, CoercionError> {
        match self.child.execute_long() {
            Ok(n) => Ok(self.coerce.width().truncate(n)),
            Err(UnexpectedResult(value)) => self.coerce.execute(&value, self.strict, invoker),
        }
    }
}
