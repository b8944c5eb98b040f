//! Dynamic values.
//!
//! A `Value` is the boxed representation every node can produce. Fixed-width
//! integers (`Int`, `Long`) are kept apart from arbitrary-precision integers
//! (`Bignum`) because coercion truncates only the latter.

use num_bigint::BigInt;
use num_traits::ToPrimitive;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

// =============================================================================
// Value Shape
// =============================================================================

/// Runtime representation tag of a [`Value`].
///
/// Shapes are the dispatch key of value-specialized nodes, so extraction is a
/// single match on the enum discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ValueShape {
    /// `true` / `false`.
    Bool = 0,
    /// 32-bit fixnum.
    Int = 1,
    /// 64-bit fixnum.
    Long = 2,
    /// Arbitrary-precision integer.
    Bignum = 3,
    /// IEEE 754 double.
    Float = 4,
    /// `nil`.
    Nil = 5,
    /// Any heap object.
    Object = 6,
}

impl ValueShape {
    /// Every value shape, in discriminant order.
    pub const ALL: [ValueShape; 7] = [
        ValueShape::Bool,
        ValueShape::Int,
        ValueShape::Long,
        ValueShape::Bignum,
        ValueShape::Float,
        ValueShape::Nil,
        ValueShape::Object,
    ];

    /// Check if this shape is a fixed-width integer.
    #[inline]
    pub const fn is_fixnum(self) -> bool {
        matches!(self, ValueShape::Int | ValueShape::Long)
    }
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueShape::Bool => "bool",
            ValueShape::Int => "int",
            ValueShape::Long => "long",
            ValueShape::Bignum => "bignum",
            ValueShape::Float => "float",
            ValueShape::Nil => "nil",
            ValueShape::Object => "object",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Objects
// =============================================================================

/// An opaque heap object.
///
/// Object layout is owned by the surrounding runtime; this core only needs a
/// class name for messages and method dispatch, and a few fields so tests and
/// collaborators can carry state.
#[derive(Debug)]
pub struct Object {
    class_name: Arc<str>,
    fields: SmallVec<[Value; 2]>,
}

impl Object {
    /// The class this object is an instance of.
    #[inline]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Instance fields in declaration order.
    #[inline]
    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    /// Read a single field.
    #[inline]
    pub fn field(&self, index: usize) -> Option<&Value> {
        self.fields.get(index)
    }
}

/// Shared reference to an [`Object`]. Equality is identity.
#[derive(Debug, Clone)]
pub struct ObjectRef(Arc<Object>);

impl ObjectRef {
    /// Allocate a new object.
    pub fn new(class_name: impl Into<Arc<str>>, fields: impl IntoIterator<Item = Value>) -> Self {
        Self(Arc::new(Object {
            class_name: class_name.into(),
            fields: fields.into_iter().collect(),
        }))
    }

    /// Identity comparison.
    #[inline]
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::ops::Deref for ObjectRef {
    type Target = Object;

    #[inline]
    fn deref(&self) -> &Object {
        &self.0
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

// =============================================================================
// Value
// =============================================================================

/// Tagged runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Long(i64),
    Bignum(Arc<BigInt>),
    Float(f64),
    Nil,
    Object(ObjectRef),
}

impl Value {
    /// Box a big integer without normalising it.
    #[inline]
    pub fn bignum(value: BigInt) -> Self {
        Value::Bignum(Arc::new(value))
    }

    /// Box an integer the way an integer literal would: fixnum when it fits
    /// in 64 bits, bignum otherwise.
    pub fn integer(value: BigInt) -> Self {
        match value.to_i64() {
            Some(n) => Value::Long(n),
            None => Value::bignum(value),
        }
    }

    /// Allocate an object value.
    #[inline]
    pub fn object(class_name: impl Into<Arc<str>>, fields: impl IntoIterator<Item = Value>) -> Self {
        Value::Object(ObjectRef::new(class_name, fields))
    }

    /// Shape tag used for dispatch.
    #[inline(always)]
    pub fn shape(&self) -> ValueShape {
        match self {
            Value::Bool(_) => ValueShape::Bool,
            Value::Int(_) => ValueShape::Int,
            Value::Long(_) => ValueShape::Long,
            Value::Bignum(_) => ValueShape::Bignum,
            Value::Float(_) => ValueShape::Float,
            Value::Nil => ValueShape::Nil,
            Value::Object(_) => ValueShape::Object,
        }
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Get the value as a 64-bit fixnum, widening `Int`.
    #[inline]
    pub fn as_fixnum(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(i64::from(*n)),
            Value::Long(n) => Some(*n),
            _ => None,
        }
    }

    /// Language-level class name, as shown in error messages.
    pub fn class_name(&self) -> &str {
        match self {
            Value::Bool(true) => "TrueClass",
            Value::Bool(false) => "FalseClass",
            Value::Int(_) | Value::Long(_) | Value::Bignum(_) => "Integer",
            Value::Float(_) => "Float",
            Value::Nil => "NilClass",
            Value::Object(object) => object.class_name(),
        }
    }

    /// Short rendering used in `no implicit conversion of ...` messages.
    ///
    /// Singletons are named by value, everything else by class.
    pub fn inspect_for_conversion(&self) -> String {
        match self {
            Value::Bool(b) => b.to_string(),
            Value::Nil => "nil".to_string(),
            other => other.class_name().to_string(),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Nil
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Long(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Long(n) => write!(f, "{n}"),
            Value::Bignum(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Nil => f.write_str("nil"),
            Value::Object(object) => write!(f, "#<{}>", object.class_name()),
        }
    }
}
