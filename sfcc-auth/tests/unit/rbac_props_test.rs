//! ロール集合と監査詳細のプロパティテスト

use proptest::prelude::*;
use serde_json::{json, Value};
use sfcc_auth::audit::types::AuditDetails;
use sfcc_auth::common::auth::{normalize_handle, Permission, Role, RoleSet};

fn role_strategy() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::ALL.to_vec())
}

fn has_forbidden_key(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.iter().any(|(key, value)| {
            let lowered = key.to_ascii_lowercase();
            ["password", "hash", "secret", "token"]
                .iter()
                .any(|fragment| lowered.contains(fragment))
                || has_forbidden_key(value)
        }),
        Value::Array(items) => items.iter().any(has_forbidden_key),
        _ => false,
    }
}

fn json_strategy() -> impl Strategy<Value = Value> {
    let key = prop_oneof![
        "[a-z_]{1,10}",
        Just("password".to_string()),
        Just("Password_Hash".to_string()),
        Just("client_secret".to_string()),
        Just("refreshToken".to_string()),
    ];
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 32, 6, move |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map(key.clone(), inner, 0..5)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn role_set_membership_is_exact(
        members in prop::collection::btree_set(role_strategy(), 1..5),
        probe in role_strategy(),
    ) {
        let set = RoleSet::new(members.iter().copied()).unwrap();
        prop_assert_eq!(set.contains(probe), members.contains(&probe));
        prop_assert_eq!(set.names().len(), members.len());
    }

    #[test]
    fn granting_set_matches_permission_table(
        permission in prop::sample::select(Permission::ALL.to_vec()),
        probe in role_strategy(),
    ) {
        let set = RoleSet::granting(permission);
        prop_assert!(set.contains(Role::Admin));
        prop_assert_eq!(set.contains(probe), probe.has_permission(permission));
    }

    #[test]
    fn audit_details_never_keep_sensitive_keys(value in json_strategy()) {
        let details = AuditDetails::from_value(value);
        let stored: Value = serde_json::from_str(&details.to_json()).unwrap();
        prop_assert!(!has_forbidden_key(&stored));
    }

    #[test]
    fn builder_drops_sensitive_keys(key in "[a-z]{0,4}(password|hash|secret|token)[a-z]{0,4}") {
        let details = AuditDetails::new().with(&key, "value").with("username", json!("jones"));
        prop_assert!(details.get(&key).is_none());
        prop_assert!(details.get("username").is_some());
    }

    #[test]
    fn normalize_handle_is_idempotent(handle in "\\PC{0,24}") {
        let once = normalize_handle(&handle);
        prop_assert_eq!(normalize_handle(&once), once);
    }
}
