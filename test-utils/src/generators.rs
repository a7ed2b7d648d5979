//! Shared proptest generators.

use proptest::prelude::*;
use serde_json::Value;
use std::collections::BTreeSet;
use vault_env::SecretBundle;

/// Generate environment-style keys.
pub fn env_key_strategy() -> impl Strategy<Value = String> {
    "[A-Z][A-Z0-9_]{1,15}"
}

/// Generate secret values, mostly strings with some structured ones.
pub fn secret_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        4 => "[A-Za-z0-9!@#%^&*]{1,32}".prop_map(Value::String),
        1 => any::<i64>().prop_map(Value::from),
        1 => any::<bool>().prop_map(Value::Bool),
    ]
}

/// Generate secret paths.
pub fn secret_path_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z][a-z0-9-]{2,10}", 1..4).prop_map(|segments| segments.join("/"))
}

/// Generate between one and five bundles with pairwise-disjoint key sets.
pub fn disjoint_bundles_strategy() -> impl Strategy<Value = Vec<SecretBundle>> {
    prop::collection::btree_set(env_key_strategy(), 1..24)
        .prop_flat_map(|keys| {
            let n = keys.len();
            (
                Just(keys),
                prop::collection::vec(secret_value_strategy(), n),
                prop::collection::vec(0..5usize, n),
            )
        })
        .prop_map(|(keys, values, owners)| {
            let bucket_count = owners.iter().max().map_or(1, |m| m + 1);
            let mut bundles = vec![SecretBundle::new(); bucket_count];
            for ((key, value), owner) in keys.into_iter().zip(values).zip(owners) {
                bundles[owner].insert(key, value);
            }
            bundles
        })
}

/// Generate two bundles that share at least one key, with the shared keys.
pub fn overlapping_pair_strategy()
-> impl Strategy<Value = (SecretBundle, SecretBundle, BTreeSet<String>)> {
    (
        prop::collection::btree_set(env_key_strategy(), 1..6),
        prop::collection::btree_map(env_key_strategy(), secret_value_strategy(), 0..6),
        prop::collection::btree_map(env_key_strategy(), secret_value_strategy(), 0..6),
        secret_value_strategy(),
    )
        .prop_map(|(shared, mut first, mut second, value)| {
            for key in &shared {
                first.insert(key.clone(), value.clone());
                second.insert(key.clone(), value.clone());
            }
            let overlap = first
                .keys()
                .filter(|key| second.contains_key(*key))
                .cloned()
                .collect();
            (first, second, overlap)
        })
}
