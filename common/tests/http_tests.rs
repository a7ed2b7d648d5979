//! Property-based tests for the TLS verification policy.

use proptest::prelude::*;
use std::path::PathBuf;
use vault_env_common::{HttpConfig, PlatformError, TlsVerify, build_http_client};

fn keyword_strategy() -> impl Strategy<Value = (String, bool)> {
    prop_oneof![
        Just(("true".to_string(), true)),
        Just(("1".to_string(), true)),
        Just(("yes".to_string(), true)),
        Just(("false".to_string(), false)),
        Just(("0".to_string(), false)),
        Just(("no".to_string(), false)),
    ]
}

fn flip_case(s: &str, mask: &[bool]) -> String {
    s.chars()
        .zip(mask.iter().cycle())
        .map(|(c, upper)| if *upper { c.to_ascii_uppercase() } else { c })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_keywords_parse_case_insensitively(
        (keyword, enabled) in keyword_strategy(),
        mask in prop::collection::vec(any::<bool>(), 1..4),
        padding in " {0,3}",
    ) {
        let input = format!("{padding}{}{padding}", flip_case(&keyword, &mask));
        let verify: TlsVerify = input.parse().unwrap();
        prop_assert_eq!(verify, TlsVerify::from(enabled));
    }

    #[test]
    fn prop_paths_parse_as_ca_bundle(path in "/[a-z0-9_./-]{1,40}\\.pem") {
        let verify: TlsVerify = path.parse().unwrap();
        prop_assert!(verify.verifies());
        prop_assert_eq!(&verify, &TlsVerify::CaBundle(PathBuf::from(&path)));
        prop_assert_eq!(verify.to_string(), path);
    }

    #[test]
    fn prop_blank_policy_rejected(blank in "[ \t]{0,4}") {
        let result = blank.parse::<TlsVerify>();
        prop_assert!(matches!(result, Err(PlatformError::InvalidInput(_))));
    }
}

#[test]
fn test_client_builds_for_every_builtin_policy() {
    for verify in [TlsVerify::Enabled, TlsVerify::Disabled] {
        let config = HttpConfig::default().with_verify(verify);
        assert!(build_http_client(&config).is_ok());
    }
}

#[test]
fn test_client_rejects_empty_ca_bundle_path() {
    let config = HttpConfig::default().with_verify(TlsVerify::ca_bundle(""));
    assert!(matches!(
        build_http_client(&config),
        Err(PlatformError::InvalidInput(_))
    ));
}
