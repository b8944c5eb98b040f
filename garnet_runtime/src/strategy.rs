//! Storage strategies: one capability implementation per representation.
//!
//! Every representation in [`StorageKind`] has a zero-sized strategy that
//! knows how to read it. Call sites resolve a strategy once per observed kind
//! and then call it directly; [`GenericStrategy`] handles any representation
//! by matching on it every time, for sites that have seen too many kinds.
//!
//! Strategies do not check ranges against the logical size of an array; the
//! caller validates with [`Collection::check_range`](crate::Collection) first.

use crate::array::{Storage, StorageKind};
use garnet_core::Value;
use std::fmt;

/// Operations every storage representation supports.
pub trait StorageStrategy: Send + Sync + fmt::Debug {
    /// Representation this strategy is specialized for.
    fn kind(&self) -> StorageKind;

    /// Number of element slots in `store`.
    fn capacity(&self, store: &Storage) -> usize;

    /// Boxed element at `index`.
    fn read(&self, store: &Storage, index: usize) -> Value;

    /// A freshly allocated boxed copy of `[start, start + length)`.
    fn boxed_copy_of_range(&self, store: &Storage, start: usize, length: usize) -> Vec<Value>;
}

// =============================================================================
// Compact Numeric Strategies
// =============================================================================

macro_rules! compact_strategy {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $boxed:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl StorageStrategy for $name {
            #[inline]
            fn kind(&self) -> StorageKind {
                StorageKind::$variant
            }

            #[inline]
            fn capacity(&self, store: &Storage) -> usize {
                store.capacity()
            }

            #[inline]
            fn read(&self, store: &Storage, index: usize) -> Value {
                match store {
                    Storage::$variant(elements) => Value::$boxed(elements[index]),
                    other => GenericStrategy.read(other, index),
                }
            }

            fn boxed_copy_of_range(&self, store: &Storage, start: usize, length: usize) -> Vec<Value> {
                match store {
                    Storage::$variant(elements) => elements[start..start + length]
                        .iter()
                        .map(|&e| Value::$boxed(e))
                        .collect(),
                    other => GenericStrategy.boxed_copy_of_range(other, start, length),
                }
            }
        }
    };
}

compact_strategy!(
    /// `i32` elements, boxed as `Value::Int`.
    IntStrategy,
    Int,
    Int
);
compact_strategy!(
    /// `i64` elements, boxed as `Value::Long`.
    LongStrategy,
    Long,
    Long
);
compact_strategy!(
    /// `f64` elements, boxed as `Value::Float`.
    DoubleStrategy,
    Double,
    Float
);

// =============================================================================
// Boxed Strategies
// =============================================================================

/// Arrays with no storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyStrategy;

impl StorageStrategy for EmptyStrategy {
    fn kind(&self) -> StorageKind {
        StorageKind::Empty
    }

    fn capacity(&self, _store: &Storage) -> usize {
        0
    }

    fn read(&self, store: &Storage, index: usize) -> Value {
        GenericStrategy.read(store, index)
    }

    fn boxed_copy_of_range(&self, store: &Storage, start: usize, length: usize) -> Vec<Value> {
        match store {
            Storage::Empty => Vec::new(),
            other => GenericStrategy.boxed_copy_of_range(other, start, length),
        }
    }
}

/// Arrays owning a boxed store.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectStrategy;

impl StorageStrategy for ObjectStrategy {
    fn kind(&self) -> StorageKind {
        StorageKind::Object
    }

    fn capacity(&self, store: &Storage) -> usize {
        store.capacity()
    }

    #[inline]
    fn read(&self, store: &Storage, index: usize) -> Value {
        match store {
            Storage::Object(elements) => elements[index].clone(),
            other => GenericStrategy.read(other, index),
        }
    }

    fn boxed_copy_of_range(&self, store: &Storage, start: usize, length: usize) -> Vec<Value> {
        match store {
            Storage::Object(elements) => elements[start..start + length].to_vec(),
            other => GenericStrategy.boxed_copy_of_range(other, start, length),
        }
    }
}

/// Windows into a boxed store shared between arrays.
#[derive(Debug, Clone, Copy, Default)]
pub struct SharedStrategy;

impl StorageStrategy for SharedStrategy {
    fn kind(&self) -> StorageKind {
        StorageKind::Shared
    }

    fn capacity(&self, store: &Storage) -> usize {
        store.capacity()
    }

    #[inline]
    fn read(&self, store: &Storage, index: usize) -> Value {
        match store {
            Storage::Shared(window) => window.as_slice()[index].clone(),
            other => GenericStrategy.read(other, index),
        }
    }

    fn boxed_copy_of_range(&self, store: &Storage, start: usize, length: usize) -> Vec<Value> {
        match store {
            // Copy out of the window: the result must not alias the backing store.
            Storage::Shared(window) => window.as_slice()[start..start + length].to_vec(),
            other => GenericStrategy.boxed_copy_of_range(other, start, length),
        }
    }
}

// =============================================================================
// Generic Strategy
// =============================================================================

/// Handles every representation by matching on it per call. Uncached.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericStrategy;

impl StorageStrategy for GenericStrategy {
    fn kind(&self) -> StorageKind {
        // Not tied to one representation; Object is the most general.
        StorageKind::Object
    }

    fn capacity(&self, store: &Storage) -> usize {
        store.capacity()
    }

    fn read(&self, store: &Storage, index: usize) -> Value {
        match store {
            Storage::Empty => Value::Nil,
            Storage::Int(elements) => Value::Int(elements[index]),
            Storage::Long(elements) => Value::Long(elements[index]),
            Storage::Double(elements) => Value::Float(elements[index]),
            Storage::Object(elements) => elements[index].clone(),
            Storage::Shared(window) => window.as_slice()[index].clone(),
        }
    }

    fn boxed_copy_of_range(&self, store: &Storage, start: usize, length: usize) -> Vec<Value> {
        (start..start + length).map(|i| self.read(store, i)).collect()
    }
}

/// The specialized strategy for a representation.
pub fn strategy_for(kind: StorageKind) -> &'static dyn StorageStrategy {
    match kind {
        StorageKind::Empty => &EmptyStrategy,
        StorageKind::Int => &IntStrategy,
        StorageKind::Long => &LongStrategy,
        StorageKind::Double => &DoubleStrategy,
        StorageKind::Object => &ObjectStrategy,
        StorageKind::Shared => &SharedStrategy,
    }
}
