//! Property-based tests for key validation
//!
//! Malformed cardinality must always normalize to absence.

use super::{CrossSigningKey, KeyUsage};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn any_usage() -> impl Strategy<Value = KeyUsage> {
    prop_oneof![
        Just(KeyUsage::Master),
        Just(KeyUsage::SelfSigning),
        Just(KeyUsage::UserSigning),
    ]
}

proptest! {
    /// Property: usage extraction succeeds iff exactly one usage is listed
    #[test]
    fn usage_extraction_requires_single_usage(
        usages in prop::collection::vec(any_usage(), 0..6),
    ) {
        let mut key = CrossSigningKey::new("@user:example.org", KeyUsage::Master, "pk");
        key.usage = usages.clone();

        if usages.len() == 1 {
            prop_assert_eq!(key.key_usage(), Some(usages[0]));
        } else {
            prop_assert_eq!(key.key_usage(), None);
            prop_assert!(key.validate(KeyUsage::Master).is_none());
        }
    }

    /// Property: ed25519 extraction succeeds iff exactly one ed25519 id exists,
    /// regardless of how many keys of other algorithms sit beside it
    #[test]
    fn ed25519_extraction_requires_single_key(
        ed_ids in prop::collection::btree_set("[A-Za-z0-9]{1,12}", 0..5),
        other_ids in prop::collection::btree_set("[A-Za-z0-9]{1,12}", 0..3),
    ) {
        let mut keys = BTreeMap::new();
        for id in &ed_ids {
            keys.insert(format!("ed25519:{id}"), id.clone());
        }
        for id in &other_ids {
            keys.insert(format!("curve25519:{id}"), id.clone());
        }

        let mut key = CrossSigningKey::new("@user:example.org", KeyUsage::Master, "pk");
        key.keys = keys;

        if ed_ids.len() == 1 {
            let only = ed_ids.iter().next().unwrap();
            prop_assert_eq!(key.ed25519_key(), Some(only.as_str()));
        } else {
            prop_assert_eq!(key.ed25519_key(), None);
            prop_assert!(key.validate(KeyUsage::Master).is_none());
        }
    }
}
