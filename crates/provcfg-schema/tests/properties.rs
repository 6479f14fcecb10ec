//! Property tests for the version gate, identification and round trip.

use proptest::prelude::*;
use provcfg_core::FailureKind;
use provcfg_schema::{SchemaStore, Validator};
use serde_json::{json, Value};

fn validator() -> Validator {
    Validator::from_store(SchemaStore::global()).unwrap()
}

/// A provider entry that fails identification whenever it is inspected.
fn broken_provider() -> Value {
    json!({"identification": {"uuid": "invalid!@#", "name": "x"}, "traits": {"BAD": 1}})
}

fn custom_name() -> impl Strategy<Value = String> {
    "CUSTOM_[A-Z0-9_]{1,12}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any version the pattern rejects stops validation before providers.
    #[test]
    fn bad_version_never_reaches_providers(version in "[^\\n]{0,8}") {
        prop_assume!(!regex_accepts(&version));
        let document = json!({
            "meta": {"schema_version": version},
            "providers": [broken_provider()]
        });
        let failure = validator().validate(&document).unwrap_err();
        prop_assert_eq!(failure.kind, FailureKind::VersionInvalid);
    }

    /// Any `1.<minor>` version passes the gate and reaches the providers,
    /// including minors too large for `u32`.
    #[test]
    fn good_version_reaches_providers(minor in "0|[1-9][0-9]{0,30}") {
        let document = json!({
            "meta": {"schema_version": format!("1.{minor}")},
            "providers": [broken_provider()]
        });
        let failure = validator().validate(&document).unwrap_err();
        prop_assert_eq!(failure.kind, FailureKind::IdentificationInvalid);
    }

    /// Exactly one of uuid or name is accepted; both are rejected.
    #[test]
    fn identification_exclusive_or(bytes in any::<[u8; 16]>(), name in "[a-z][a-z0-9-]{0,20}") {
        let uuid = uuid::Uuid::from_bytes(bytes).to_string();
        let v = validator();
        let doc = |identification: Value| json!({
            "meta": {"schema_version": "1.0"},
            "providers": [{"identification": identification}]
        });

        let by_uuid = v.validate(&doc(json!({"uuid": uuid})));
        prop_assert!(by_uuid.is_ok());
        let by_name = v.validate(&doc(json!({"name": name})));
        prop_assert!(by_name.is_ok());
        let both = v.validate(&doc(json!({"uuid": uuid, "name": name}))).unwrap_err();
        prop_assert_eq!(both.kind, FailureKind::IdentificationInvalid);
    }

    /// Accepted documents come back unchanged, and validating them again
    /// gives the same result.
    #[test]
    fn accepted_documents_round_trip(
        classes in prop::collection::btree_map(custom_name(), 0u64..1_000_000, 0..6),
        traits in prop::collection::btree_map(custom_name(), any::<bool>(), 0..6),
    ) {
        let inventories: serde_json::Map<String, Value> = classes
            .into_iter()
            .map(|(class, total)| (class, json!({"total": total})))
            .collect();
        let document = json!({
            "meta": {"schema_version": "1.0"},
            "providers": [{
                "identification": {"name": "generated"},
                "inventories": inventories,
                "traits": traits
            }]
        });

        let v = validator();
        let first = v.validate(&document).unwrap();
        prop_assert_eq!(first.as_value(), &document);
        let second = v.validate(first.as_value()).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Keys outside the known set and the custom naming rule are rejected.
    #[test]
    fn unknown_trait_rejected(key in "[a-z][a-z_]{0,10}") {
        let document = json!({
            "meta": {"schema_version": "1.0"},
            "providers": [{"identification": {"name": "foo"}, "traits": {key: true}}]
        });
        let failure = validator().validate(&document).unwrap_err();
        prop_assert_eq!(failure.kind, FailureKind::UnknownProperty);
    }
}

fn regex_accepts(version: &str) -> bool {
    let Some(minor) = version.strip_prefix("1.") else {
        return false;
    };
    !minor.is_empty()
        && minor.chars().all(|c| c.is_ascii_digit())
        && (minor == "0" || !minor.starts_with('0'))
}
