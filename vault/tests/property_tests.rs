//! Property-based tests for merging, materialization and secret redaction.
//!
//! Tests validate:
//! - Disjoint bundles merge into their union, in any order
//! - Overlapping bundles report exactly the shared keys
//! - Materialization never overwrites an existing key
//! - Secrets never appear in Debug output

use proptest::prelude::*;
use secrecy::SecretString;
use serde_json::Value;
use vault_env::{
    CredentialSource, EnvironmentStore, MaterializeError, MemoryEnvironment, MergeError,
    PathMerger, SecretBundle, Session, TlsVerify, fetch_merged, materialize, merge,
    stringify_value,
};
use vault_env_test_utils::MockVault;
use vault_env_test_utils::generators::{
    disjoint_bundles_strategy, env_key_strategy, overlapping_pair_strategy, secret_path_strategy,
    secret_value_strategy,
};
use vault_env_test_utils::mocks::MOCK_TOKEN;

fn secret_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9]{8,32}".prop_map(|s| format!("SECRET-{s}"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_disjoint_merge_is_union(bundles in disjoint_bundles_strategy()) {
        let mut expected = SecretBundle::new();
        for bundle in &bundles {
            expected.extend(bundle.clone());
        }

        let merged = merge(bundles.clone()).unwrap();
        prop_assert_eq!(&merged, &expected);

        let reversed = merge(bundles.into_iter().rev()).unwrap();
        prop_assert_eq!(reversed, expected);
    }

    #[test]
    fn prop_overlap_reports_shared_keys((first, second, overlap) in overlapping_pair_strategy()) {
        let mut merger = PathMerger::new();
        merger.push(first.clone()).unwrap();

        let err = merger.push(second).unwrap_err();
        let MergeError::DuplicateKeys { keys } = err;
        prop_assert_eq!(keys, overlap);

        prop_assert_eq!(merger.finish(), first);
    }

    #[test]
    fn prop_materialize_never_overwrites(
        mapping in prop::collection::btree_map(env_key_strategy(), secret_value_strategy(), 1..8),
        existing in "[a-z]{1,12}",
        pick in any::<prop::sample::Index>(),
    ) {
        let keys: Vec<&String> = mapping.keys().collect();
        let taken = pick.get(&keys).to_string();
        let mut env: MemoryEnvironment = [(taken.clone(), existing.clone())].into_iter().collect();

        let err = materialize(&mut env, &mapping).unwrap_err();

        match err {
            MaterializeError::DuplicateEnvKey { key, .. } => prop_assert_eq!(&key, &taken),
            other => prop_assert!(false, "unexpected error: {other:?}"),
        }
        prop_assert_eq!(env.get(&taken), Some(existing));
        for key in keys.iter().filter(|k| ***k > taken) {
            prop_assert!(!env.contains(key));
        }
    }

    #[test]
    fn prop_materialize_writes_stringified_values(
        mapping in prop::collection::btree_map(env_key_strategy(), secret_value_strategy(), 0..8),
    ) {
        let mut env = MemoryEnvironment::new();
        materialize(&mut env, &mapping).unwrap();

        prop_assert_eq!(env.len(), mapping.len());
        for (key, value) in &mapping {
            prop_assert_eq!(env.get(key), Some(stringify_value(value)));
        }
    }

    #[test]
    fn prop_string_values_are_verbatim(text in ".{0,40}") {
        prop_assert_eq!(stringify_value(&Value::String(text.clone())), text);
    }

    #[test]
    fn prop_fetch_merged_matches_merge(
        (paths, bundles) in disjoint_bundles_strategy().prop_flat_map(|bundles| {
            let n = bundles.len();
            (prop::collection::btree_set(secret_path_strategy(), n..=n), Just(bundles))
        })
    ) {
        let mut vault = MockVault::new();
        for (path, bundle) in paths.iter().zip(&bundles) {
            vault = vault.with_secret(path, bundle.clone());
        }
        let session = Session::new(
            vault.clone(),
            SecretString::from(MOCK_TOKEN),
            TlsVerify::Enabled,
        );
        let ordered: Vec<String> = paths.iter().cloned().collect();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let merged = runtime
            .block_on(fetch_merged(&session, &ordered.clone().into()))
            .unwrap();

        prop_assert_eq!(merged, merge(bundles).unwrap());
        prop_assert_eq!(vault.reads(), ordered);
    }

    #[test]
    fn prop_credentials_debug_redacts_secret(secret_id in secret_strategy()) {
        let source = CredentialSource::default()
            .with_role_id("role")
            .with_secret_id(secret_id.as_str())
            .with_endpoint("https://vault.test:8200");

        let debug_source = format!("{source:?}");
        prop_assert!(!debug_source.contains(&secret_id));
        prop_assert!(debug_source.contains("[REDACTED]"));

        let credentials = source.resolve().unwrap();
        let debug_credentials = format!("{credentials:?}");
        prop_assert!(!debug_credentials.contains(&secret_id));
        prop_assert!(debug_credentials.contains("[REDACTED]"));
    }

    #[test]
    fn prop_session_debug_redacts_token(token in secret_strategy()) {
        let session = Session::new(
            MockVault::new(),
            SecretString::from(token.as_str()),
            TlsVerify::Enabled,
        );
        let debug = format!("{session:?}");

        prop_assert!(!debug.contains(&token));
        prop_assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn prop_duplicate_env_key_debug_redacts_values(
        key in env_key_strategy(),
        existing in secret_strategy(),
        attempted in secret_strategy(),
    ) {
        let mut env: MemoryEnvironment = [(key.clone(), existing.clone())].into_iter().collect();
        let mapping = SecretBundle::from([(key, Value::String(attempted.clone()))]);

        let err = materialize(&mut env, &mapping).unwrap_err();
        let rendered = format!("{err:?} {err}");

        prop_assert!(!rendered.contains(&existing));
        prop_assert!(!rendered.contains(&attempted));
    }
}

#[test]
fn test_empty_merge_is_empty() {
    let merged = merge(Vec::<SecretBundle>::new()).unwrap();
    assert!(merged.is_empty());
}
