//! Arrays backed by interchangeable storage representations.
//!
//! An array is a logical size plus a backing [`Storage`]. Homogeneous arrays
//! of small numbers are stored unboxed; everything else falls back to boxed
//! values. The representation can change over the lifetime of an array (for
//! example when a shared window is taken), which is why the code operating on
//! an array resolves a strategy from the storage kind at each call site.
//!
//! # Invariant
//!
//! `size <= storage.capacity()` holds for every `Collection`, enforced by all
//! constructors. Slots past `size` are spare capacity and never observed.

use garnet_core::{StorageError, Value};
use std::fmt;
use std::sync::Arc;

// =============================================================================
// Storage Kind
// =============================================================================

/// Identity of a storage representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum StorageKind {
    /// No backing store at all (capacity 0).
    Empty = 0,
    /// Unboxed `i32` elements.
    Int = 1,
    /// Unboxed `i64` elements.
    Long = 2,
    /// Unboxed `f64` elements.
    Double = 3,
    /// Boxed values owned by this array.
    Object = 4,
    /// A window into a boxed store shared with other arrays.
    Shared = 5,
}

impl StorageKind {
    /// Every representation, in discriminant order.
    pub const ALL: [StorageKind; 6] = [
        StorageKind::Empty,
        StorageKind::Int,
        StorageKind::Long,
        StorageKind::Double,
        StorageKind::Object,
        StorageKind::Shared,
    ];
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageKind::Empty => "empty",
            StorageKind::Int => "int[]",
            StorageKind::Long => "long[]",
            StorageKind::Double => "double[]",
            StorageKind::Object => "Object[]",
            StorageKind::Shared => "shared",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Storage
// =============================================================================

/// A window `[offset, offset + len)` into a shared boxed store.
#[derive(Debug, Clone)]
pub struct SharedStore {
    backing: Arc<[Value]>,
    offset: usize,
    len: usize,
}

impl SharedStore {
    /// Create a window, checking it lies within `backing`.
    pub fn new(backing: Arc<[Value]>, offset: usize, len: usize) -> Result<Self, StorageError> {
        match offset.checked_add(len) {
            Some(end) if end <= backing.len() => Ok(Self {
                backing,
                offset,
                len,
            }),
            _ => Err(StorageError::OutOfRange {
                start: offset,
                length: len,
                size: backing.len(),
            }),
        }
    }

    /// The visible elements.
    #[inline]
    pub fn as_slice(&self) -> &[Value] {
        &self.backing[self.offset..self.offset + self.len]
    }

    /// Check if two windows share the same backing store.
    #[inline]
    pub fn shares_backing_with(&self, other: &SharedStore) -> bool {
        Arc::ptr_eq(&self.backing, &other.backing)
    }
}

/// Backing store of an array.
#[derive(Debug, Clone)]
pub enum Storage {
    Empty,
    Int(Box<[i32]>),
    Long(Box<[i64]>),
    Double(Box<[f64]>),
    Object(Box<[Value]>),
    Shared(SharedStore),
}

impl Storage {
    /// Representation identity, used as the strategy cache key.
    #[inline(always)]
    pub fn kind(&self) -> StorageKind {
        match self {
            Storage::Empty => StorageKind::Empty,
            Storage::Int(_) => StorageKind::Int,
            Storage::Long(_) => StorageKind::Long,
            Storage::Double(_) => StorageKind::Double,
            Storage::Object(_) => StorageKind::Object,
            Storage::Shared(_) => StorageKind::Shared,
        }
    }

    /// Number of element slots available.
    #[inline]
    pub fn capacity(&self) -> usize {
        match self {
            Storage::Empty => 0,
            Storage::Int(store) => store.len(),
            Storage::Long(store) => store.len(),
            Storage::Double(store) => store.len(),
            Storage::Object(store) => store.len(),
            Storage::Shared(store) => store.len,
        }
    }
}

// =============================================================================
// Collection
// =============================================================================

/// An array: backing storage plus logical size.
#[derive(Debug, Clone)]
pub struct Collection {
    storage: Storage,
    size: usize,
}

impl Collection {
    /// An empty array with no storage.
    pub fn empty() -> Self {
        Self {
            storage: Storage::Empty,
            size: 0,
        }
    }

    /// Wrap an existing store, checking the capacity invariant.
    pub fn with_storage(storage: Storage, size: usize) -> Result<Self, StorageError> {
        let capacity = storage.capacity();
        if size > capacity {
            return Err(StorageError::CapacityExceeded { size, capacity });
        }
        Ok(Self { storage, size })
    }

    /// Build an array choosing the most compact representation for `values`.
    pub fn from_values(values: Vec<Value>) -> Self {
        let size = values.len();
        let storage = if values.is_empty() {
            Storage::Empty
        } else if values.iter().all(|v| matches!(v, Value::Int(_))) {
            Storage::Int(
                values
                    .iter()
                    .filter_map(|v| match v {
                        Value::Int(n) => Some(*n),
                        _ => None,
                    })
                    .collect(),
            )
        } else if values.iter().all(|v| v.as_fixnum().is_some()) {
            Storage::Long(values.iter().filter_map(Value::as_fixnum).collect())
        } else if values.iter().all(|v| matches!(v, Value::Float(_))) {
            Storage::Double(
                values
                    .iter()
                    .filter_map(|v| match v {
                        Value::Float(x) => Some(*x),
                        _ => None,
                    })
                    .collect(),
            )
        } else {
            Storage::Object(values.into_boxed_slice())
        };
        Self { storage, size }
    }

    #[inline]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Logical number of elements.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Check `[start, start + length)` lies within the logical size.
    pub fn check_range(&self, start: usize, length: usize) -> Result<(), StorageError> {
        match start.checked_add(length) {
            Some(end) if end <= self.size => Ok(()),
            _ => Err(StorageError::OutOfRange {
                start,
                length,
                size: self.size,
            }),
        }
    }

    /// Take a shared window `[start, start + length)` of this array.
    ///
    /// The first share converts this array's storage into a shared boxed
    /// store; later shares reuse it. Neither array copies elements again.
    pub fn share(&mut self, start: usize, length: usize) -> Result<Collection, StorageError> {
        self.check_range(start, length)?;

        let store = match &self.storage {
            Storage::Shared(store) => store.clone(),
            _ => {
                let boxed: Arc<[Value]> = (0..self.size).map(|i| self.boxed_at(i)).collect();
                let store = SharedStore::new(boxed, 0, self.size)?;
                self.storage = Storage::Shared(store.clone());
                store
            }
        };
        let window = SharedStore::new(Arc::clone(&store.backing), store.offset + start, length)?;
        Ok(Collection {
            storage: Storage::Shared(window),
            size: length,
        })
    }

    /// Element at `index` without range checks against the logical size.
    fn boxed_at(&self, index: usize) -> Value {
        match &self.storage {
            Storage::Empty => Value::Nil,
            Storage::Int(store) => Value::Int(store[index]),
            Storage::Long(store) => Value::Long(store[index]),
            Storage::Double(store) => Value::Float(store[index]),
            Storage::Object(store) => store[index].clone(),
            Storage::Shared(store) => store.as_slice()[index].clone(),
        }
    }
}

impl Default for Collection {
    fn default() -> Self {
        Self::empty()
    }
}
