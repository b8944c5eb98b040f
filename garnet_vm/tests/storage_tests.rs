//! Tests for storage-strategy resolution at array call sites.
//!
//! Coverage:
//! - Range copies across every representation
//! - Out-of-range and overflowing ranges
//! - Copies never alias shared stores
//! - Megamorphic fallback past the strategy limit

use garnet_core::{StorageError, Value};
use garnet_runtime::{Collection, Storage, StorageKind};
use garnet_vm::specialize::{Classification, Dispatch};
use garnet_vm::{DispatchConfig, NodeFactory, SiteNode, SiteProfile};

fn longs(values: &[i64]) -> Collection {
    Collection::from_values(values.iter().map(|&n| Value::Long(n)).collect())
}

fn factory() -> NodeFactory {
    NodeFactory::new(DispatchConfig::default()).unwrap()
}

// =============================================================================
// Range Copies
// =============================================================================

#[test]
fn test_copy_of_range() {
    let resolver = factory().storage_resolver().unwrap();
    let array = longs(&[1, 2, 3, 4, 5]);

    assert_eq!(
        resolver.boxed_copy_of_range(&array, 1, 3),
        Ok(vec![Value::Long(2), Value::Long(3), Value::Long(4)])
    );
    assert_eq!(resolver.boxed_copy_of_range(&array, 5, 0), Ok(Vec::new()));
}

#[test]
fn test_copy_out_of_range() {
    let resolver = factory().storage_resolver().unwrap();
    let array = longs(&[1, 2, 3, 4, 5]);

    assert_eq!(
        resolver.boxed_copy_of_range(&array, 4, 5),
        Err(StorageError::OutOfRange {
            start: 4,
            length: 5,
            size: 5
        })
    );
    assert!(resolver.boxed_copy_of_range(&array, 1, usize::MAX).is_err());
}

#[test]
fn test_copy_respects_logical_size_not_capacity() {
    let resolver = factory().storage_resolver().unwrap();
    let array = Collection::with_storage(Storage::Int(Box::new([1, 2, 3, 4])), 2).unwrap();

    assert_eq!(
        resolver.to_object_array(&array),
        vec![Value::Int(1), Value::Int(2)]
    );
    assert!(resolver.boxed_copy_of_range(&array, 0, 3).is_err());
}

#[test]
fn test_every_representation_copies_alike() {
    let resolver = factory().storage_resolver().unwrap();
    let cases = [
        (Collection::from_values(vec![Value::Int(1), Value::Int(2)]), StorageKind::Int),
        (longs(&[1, 2]), StorageKind::Long),
        (
            Collection::from_values(vec![Value::Float(1.0), Value::Float(2.0)]),
            StorageKind::Double,
        ),
        (
            Collection::from_values(vec![Value::Nil, Value::Bool(true)]),
            StorageKind::Object,
        ),
        (Collection::empty(), StorageKind::Empty),
    ];

    for (array, kind) in &cases {
        assert_eq!(array.storage().kind(), *kind);
        let copy = resolver.to_object_array(array);
        assert_eq!(copy.len(), array.size());
        for (index, value) in copy.iter().enumerate() {
            assert_eq!(resolver.read(array, index).as_ref(), Ok(value));
        }
    }
}

// =============================================================================
// Shared Stores
// =============================================================================

#[test]
fn test_shared_window_copy_does_not_alias() {
    let resolver = factory().storage_resolver().unwrap();
    let mut array = longs(&[10, 20, 30, 40]);
    let window = array.share(1, 2).unwrap();

    assert_eq!(window.storage().kind(), StorageKind::Shared);
    assert_eq!(array.storage().kind(), StorageKind::Shared);

    let mut copy = resolver.to_object_array(&window);
    assert_eq!(copy, vec![Value::Long(20), Value::Long(30)]);

    copy[0] = Value::Nil;
    assert_eq!(resolver.read(&window, 0), Ok(Value::Long(20)));
    assert_eq!(resolver.read(&array, 1), Ok(Value::Long(20)));
}

// =============================================================================
// Strategy Caching
// =============================================================================

#[test]
fn test_strategy_limit_goes_megamorphic() {
    let config = DispatchConfig {
        storage_strategy_limit: 2,
        ..Default::default()
    };
    let factory = NodeFactory::new(config).unwrap();
    let resolver = factory.storage_resolver().unwrap();

    let int = Collection::from_values(vec![Value::Int(1)]);
    let long = longs(&[1]);
    let double = Collection::from_values(vec![Value::Float(1.0)]);

    resolver.resolve(&int);
    resolver.resolve(&long);
    assert_eq!(resolver.node().classification(), Classification::Polymorphic);

    // Past the limit the generic strategy still reads correctly.
    assert_eq!(resolver.read(&double, 0), Ok(Value::Float(1.0)));
    assert_eq!(resolver.node().len(), 2);
    assert_eq!(resolver.node().classification(), Classification::Megamorphic);
    assert_eq!(
        resolver.node().select(StorageKind::Double).dispatch,
        Dispatch::Generic
    );
    assert_eq!(
        resolver.node().select(StorageKind::Int).dispatch,
        Dispatch::Cached(0)
    );
}

#[test]
fn test_sites_are_registered() {
    let factory = factory();
    let first = factory.storage_resolver().unwrap();
    let second = factory.storage_resolver().unwrap();
    assert_ne!(first.node().site(), second.node().site());

    first.resolve(&longs(&[1]));
    match factory.site(first.node().site()) {
        Some(site @ SiteNode::Storage(_)) => {
            assert_eq!(site.classification(), Classification::Monomorphic)
        }
        other => panic!("unexpected site {other:?}"),
    }

    let counts = factory.sites().classification_counts();
    assert_eq!(counts.get(&Classification::Monomorphic), Some(&1));
    assert_eq!(counts.get(&Classification::Uninitialized), Some(&1));
}

#[test]
fn test_unsplat() {
    let resolver = factory().storage_resolver().unwrap();
    let array = longs(&[7, 8]);
    assert_eq!(
        resolver.unsplat(&[&array]),
        Ok(vec![Value::Long(7), Value::Long(8)])
    );
    assert_eq!(
        resolver.unsplat(&[]),
        Err(StorageError::ArityMismatch {
            given: 0,
            expected: 1
        })
    );
}
