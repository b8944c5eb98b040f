//! Dispatch keys.

use garnet_core::ValueShape;
use garnet_runtime::StorageKind;
use std::fmt;
use std::hash::Hash;

/// A finite set of runtime shapes a node can specialize on.
///
/// The whole domain must be enumerable so rule tables can be checked for
/// overlapping guards before any node runs.
pub trait Shape: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Every shape of this kind.
    fn domain() -> &'static [Self];
}

impl Shape for ValueShape {
    #[inline]
    fn domain() -> &'static [Self] {
        &ValueShape::ALL
    }
}

impl Shape for StorageKind {
    #[inline]
    fn domain() -> &'static [Self] {
        &StorageKind::ALL
    }
}
