//! Storage-strategy resolution at array call sites.
//!
//! A site that reads arrays specializes on the storage kinds it observes and
//! caches the matching strategy for each. Once it has seen more kinds than
//! its limit it falls back to [`GenericStrategy`], which matches on the
//! representation on every call.

use crate::specialize::{
    CallSiteId, Classification, Rule, SiteProfile, SpecializationTable, SpecializingNode,
};
use garnet_core::{ConfigurationError, StorageError, Value};
use garnet_runtime::{
    Collection, DoubleStrategy, EmptyStrategy, GenericStrategy, IntStrategy, LongStrategy,
    ObjectStrategy, SharedStrategy, StorageKind, StorageStrategy,
};
use std::sync::Arc;

/// A resolved strategy. Strategies are stateless, so one static instance of
/// each serves every site.
pub type StrategyRef = &'static dyn StorageStrategy;

pub type StorageTable = SpecializationTable<StorageKind, StrategyRef>;

fn is_empty(kind: StorageKind) -> bool {
    kind == StorageKind::Empty
}

fn is_int(kind: StorageKind) -> bool {
    kind == StorageKind::Int
}

fn is_long(kind: StorageKind) -> bool {
    kind == StorageKind::Long
}

fn is_double(kind: StorageKind) -> bool {
    kind == StorageKind::Double
}

fn is_object(kind: StorageKind) -> bool {
    kind == StorageKind::Object
}

fn is_shared(kind: StorageKind) -> bool {
    kind == StorageKind::Shared
}

/// Build the strategy table: one rule per storage kind.
pub fn storage_table() -> Result<StorageTable, ConfigurationError> {
    SpecializationTable::new(
        [
            Rule::new("empty", is_empty, &EmptyStrategy as StrategyRef),
            Rule::new("int", is_int, &IntStrategy as StrategyRef),
            Rule::new("long", is_long, &LongStrategy as StrategyRef),
            Rule::new("double", is_double, &DoubleStrategy as StrategyRef),
            Rule::new("object", is_object, &ObjectStrategy as StrategyRef),
            Rule::new("shared", is_shared, &SharedStrategy as StrategyRef),
        ],
        &GenericStrategy as StrategyRef,
    )
}

/// Resolves and applies storage strategies for one array call site.
#[derive(Debug)]
pub struct StorageResolver {
    node: SpecializingNode<StorageKind, StrategyRef>,
}

impl StorageResolver {
    pub fn new(site: CallSiteId, table: Arc<StorageTable>, limit: usize) -> Self {
        Self {
            node: SpecializingNode::new(site, table, limit),
        }
    }

    /// The strategy for `array`'s current representation.
    #[inline]
    pub fn resolve(&self, array: &Collection) -> StrategyRef {
        self.node.select(array.storage().kind()).implementation
    }

    /// Boxed copy of `[start, start + length)` of `array`.
    ///
    /// The result is freshly allocated and never aliases the array's store.
    pub fn boxed_copy_of_range(
        &self,
        array: &Collection,
        start: usize,
        length: usize,
    ) -> Result<Vec<Value>, StorageError> {
        array.check_range(start, length)?;
        Ok(self
            .resolve(array)
            .boxed_copy_of_range(array.storage(), start, length))
    }

    /// Boxed copy of every element of `array`.
    pub fn to_object_array(&self, array: &Collection) -> Vec<Value> {
        self.resolve(array)
            .boxed_copy_of_range(array.storage(), 0, array.size())
    }

    /// Elements of the single array argument of a splatted call.
    pub fn unsplat(&self, arguments: &[&Collection]) -> Result<Vec<Value>, StorageError> {
        match arguments {
            [array] => Ok(self.to_object_array(array)),
            _ => Err(StorageError::ArityMismatch {
                given: arguments.len(),
                expected: 1,
            }),
        }
    }

    /// Boxed element at `index`.
    pub fn read(&self, array: &Collection, index: usize) -> Result<Value, StorageError> {
        array.check_range(index, 1)?;
        Ok(self.resolve(array).read(array.storage(), index))
    }

    #[inline]
    pub fn node(&self) -> &SpecializingNode<StorageKind, StrategyRef> {
        &self.node
    }
}

impl SiteProfile for Arc<StorageResolver> {
    fn classification(&self) -> Classification {
        self.node.classification()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garnet_runtime::Storage;

    fn resolver(limit: usize) -> StorageResolver {
        StorageResolver::new(CallSiteId::new(0), Arc::new(storage_table().unwrap()), limit)
    }

    fn longs(values: &[i64]) -> Collection {
        Collection::from_values(values.iter().map(|&n| Value::Long(n)).collect())
    }

    #[test]
    fn test_table_covers_every_kind() {
        let table = storage_table().unwrap();
        assert_eq!(table.covered_shapes(), StorageKind::ALL.len());
        for &kind in &StorageKind::ALL {
            let (_, rule) = table.rule_for(kind).unwrap();
            assert_eq!(rule.implementation.kind(), kind);
        }
    }

    #[test]
    fn test_resolve_matches_representation() {
        let resolver = resolver(4);
        let array = longs(&[1, 2]);
        assert_eq!(resolver.resolve(&array).kind(), StorageKind::Long);
        assert_eq!(resolver.resolve(&Collection::empty()).kind(), StorageKind::Empty);
        assert_eq!(resolver.node().len(), 2);
    }

    #[test]
    fn test_read_checks_logical_size() {
        let resolver = resolver(4);
        // Capacity 4, logical size 2.
        let array = Collection::with_storage(Storage::Long(Box::new([5, 6, 7, 8])), 2).unwrap();

        assert_eq!(resolver.read(&array, 1), Ok(Value::Long(6)));
        assert_eq!(
            resolver.read(&array, 2),
            Err(StorageError::OutOfRange {
                start: 2,
                length: 1,
                size: 2
            })
        );
        assert_eq!(resolver.to_object_array(&array), vec![Value::Long(5), Value::Long(6)]);
    }

    #[test]
    fn test_unsplat_requires_one_argument() {
        let resolver = resolver(4);
        let array = longs(&[1, 2, 3]);

        assert_eq!(resolver.unsplat(&[&array]).unwrap().len(), 3);
        assert_eq!(
            resolver.unsplat(&[&array, &array]),
            Err(StorageError::ArityMismatch {
                given: 2,
                expected: 1
            })
        );
        assert!(resolver.unsplat(&[]).is_err());
    }
}
