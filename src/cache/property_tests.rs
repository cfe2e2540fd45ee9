//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the store's invariants over random operation
//! sequences.

use proptest::prelude::*;
use std::collections::HashSet;

use crate::cache::{estimate_size, CacheOptions, CacheStore, CacheValue};

// == Strategies ==
/// Generates valid cache keys (non-empty)
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,16}".prop_map(|s| s)
}

/// Generates storable values of assorted shapes
fn value_strategy() -> impl Strategy<Value = CacheValue> {
    let leaf = prop_oneof![
        any::<bool>().prop_map(CacheValue::Boolean),
        (-1_000_000i64..1_000_000).prop_map(CacheValue::from),
        "[a-z ]{0,24}".prop_map(CacheValue::Text),
        prop::collection::vec(any::<u8>(), 0..32).prop_map(CacheValue::Bytes),
    ];
    leaf.prop_recursive(2, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(CacheValue::Sequence),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4).prop_map(CacheValue::Mapping),
        ]
    })
}

#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: String, value: CacheValue },
    Set { key: String, value: CacheValue },
    Delete { key: String },
    Clean,
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        4 => (valid_key_strategy(), value_strategy())
            .prop_map(|(key, value)| CacheOp::Put { key, value }),
        2 => (valid_key_strategy(), value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        2 => valid_key_strategy().prop_map(|key| CacheOp::Delete { key }),
        1 => Just(CacheOp::Clean),
    ]
}

fn apply(store: &mut CacheStore, op: CacheOp) {
    match op {
        CacheOp::Put { key, value } => store.put(&key, value, None).unwrap(),
        CacheOp::Set { key, value } => store.set(&key, value, None).unwrap(),
        CacheOp::Delete { key } => store.delete(&key).unwrap(),
        CacheOp::Clean => store.clean(),
    }
}

fn summed_size(store: &mut CacheStore) -> usize {
    store
        .keys()
        .iter()
        .map(|key| estimate_size(&store.get(key).unwrap().unwrap()))
        .sum()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Round trip: a stored value reads back unchanged.
    #[test]
    fn prop_roundtrip_storage(key in valid_key_strategy(), value in value_strategy()) {
        let mut store = CacheStore::new(CacheOptions::default());

        store.put(&key, value.clone(), None).unwrap();

        prop_assert_eq!(store.get(&key).unwrap(), Some(value));
    }

    // Delete removes the entry and restores the previous size.
    #[test]
    fn prop_delete_restores_size(
        ops in prop::collection::vec(cache_op_strategy(), 0..20),
        key in "new_[a-z]{1,8}",
        value in value_strategy()
    ) {
        let mut store = CacheStore::new(CacheOptions::default());
        for op in ops {
            apply(&mut store, op);
        }
        let before = store.size();

        store.put(&key, value, None).unwrap();
        store.delete(&key).unwrap();

        prop_assert!(!store.has(&key).unwrap());
        prop_assert_eq!(store.size(), before);
    }

    // Overwrite: put replaces, set keeps the first value.
    #[test]
    fn prop_overwrite_semantics(
        key in valid_key_strategy(),
        value1 in value_strategy(),
        value2 in value_strategy()
    ) {
        let mut put_store = CacheStore::new(CacheOptions::default());
        put_store.put(&key, value1.clone(), None).unwrap();
        put_store.put(&key, value2.clone(), None).unwrap();
        prop_assert_eq!(put_store.get(&key).unwrap(), Some(value2));
        prop_assert_eq!(put_store.count(), 1);

        let mut set_store = CacheStore::new(CacheOptions::default());
        set_store.set(&key, value1.clone(), None).unwrap();
        set_store.set(&key, CacheValue::from("other"), None).unwrap();
        prop_assert_eq!(set_store.get(&key).unwrap(), Some(value1));
    }

    // Size accounting always equals the sum of live value estimates.
    #[test]
    fn prop_size_matches_sum(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let mut store = CacheStore::new(CacheOptions::default());

        for op in ops {
            apply(&mut store, op);
            let expected = summed_size(&mut store);
            prop_assert_eq!(store.size(), expected);
            prop_assert_eq!(store.count(), store.keys().len());
        }
    }

    // Size budget: never exceeded after an insert that fits on its own.
    #[test]
    fn prop_limit_enforcement(
        limit in 0u64..200,
        ops in prop::collection::vec(cache_op_strategy(), 1..80)
    ) {
        let mut store = CacheStore::new(CacheOptions::new().with_limit(limit));

        for op in ops {
            apply(&mut store, op);
            prop_assert!(
                store.size() as u64 <= limit,
                "size {} exceeds limit {}",
                store.size(),
                limit
            );
        }
    }

    // Eviction removes the oldest inserted keys first.
    #[test]
    fn prop_eviction_order(
        keys in prop::collection::vec(valid_key_strategy(), 2..10),
        new_key in valid_key_strategy()
    ) {
        let mut unique: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for key in keys {
            if seen.insert(key.clone()) {
                unique.push(key);
            }
        }
        prop_assume!(unique.len() >= 2);
        prop_assume!(!seen.contains(&new_key));

        // Every value is a number: 8 bytes each, room for exactly `n`
        let capacity = unique.len() as u64 * 8;
        let mut store = CacheStore::new(CacheOptions::new().with_limit(capacity));
        for key in &unique {
            store.put(key, CacheValue::from(1), None).unwrap();
        }
        prop_assert_eq!(store.keys(), unique.clone());

        store.put(&new_key, CacheValue::from(2), None).unwrap();

        prop_assert!(!store.has(&unique[0]).unwrap(), "oldest key should be evicted");
        let mut expected: Vec<String> = unique[1..].to_vec();
        expected.push(new_key);
        prop_assert_eq!(store.keys(), expected);
    }

    // Clean leaves nothing behind.
    #[test]
    fn prop_clean_removes_all(ops in prop::collection::vec(cache_op_strategy(), 1..40)) {
        let mut store = CacheStore::new(CacheOptions::default());
        for op in ops {
            apply(&mut store, op);
        }
        let keys = store.keys();

        store.clean();

        for key in keys {
            prop_assert!(!store.has(&key).unwrap());
        }
        prop_assert_eq!(store.size(), 0);
        prop_assert_eq!(store.count(), 0);
    }
}
