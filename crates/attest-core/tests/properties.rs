//! properties.rs
//!
//! Property tests for the invariants the engines promise regardless of input
//! shape: salt round-trips, digest order independence, redaction grouping
//! and Merkle membership.

use proptest::prelude::*;
use serde_json::json;

use attest_core::config::LimitsConfig;
use attest_core::digest::{combine_sorted, leaf_hashes};
use attest_core::prelude::*;
use attest_core::salt;

fn primitive() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        (-1.0e12f64..1.0e12f64).prop_map(Value::from),
        ".*".prop_map(Value::from),
    ]
}

fn key() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,6}"
}

fn document() -> impl Strategy<Value = Value> {
    let leaf = primitive();
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..4).prop_map(Value::Array),
            prop::collection::btree_map(key(), inner, 1..4).prop_map(Value::Map),
        ]
    })
    .prop_map(|v| match v {
        Value::Map(_) => v,
        other => Value::Map([("root".to_string(), other)].into_iter().collect()),
    })
}

fn digest_set(n: usize) -> impl Strategy<Value = Vec<HashDigest>> {
    prop::collection::btree_set(any::<[u8; 8]>(), n..=n)
        .prop_map(|set| set.into_iter().map(|b| keccak256(&b)).collect())
}

proptest! {
    #[test]
    fn salt_roundtrip(v in primitive()) {
        let token = salt::encode(&v).unwrap();
        prop_assert!(salt::is_salted(&token));
        prop_assert_eq!(salt::decode(&token).unwrap(), v);
    }

    #[test]
    fn digest_ignores_leaf_order(doc in document()) {
        let limits = LimitsConfig::default();
        let data = salt_document(&doc, false, &limits).unwrap();
        let mut hashes = leaf_hashes(&data, &limits).unwrap();
        let forward = combine_sorted(hashes.clone()).unwrap();
        hashes.reverse();
        prop_assert_eq!(combine_sorted(hashes).unwrap(), forward);
        prop_assert_eq!(digest_document(&data, &[], &limits).unwrap(), forward);
    }

    #[test]
    fn unsalt_recovers_claims(doc in document()) {
        let limits = LimitsConfig::default();
        let data = salt_document(&doc, false, &limits).unwrap();
        prop_assert_eq!(unsalt_document(&data, &limits).unwrap(), doc);
    }

    #[test]
    fn redaction_grouping_does_not_matter(doc in document(), split in 0usize..8) {
        let a = Attestor::default();
        let wrapped = a.wrap_one(&doc, &WrapOptions::default()).unwrap();

        let top: Vec<String> = wrapped
            .data
            .as_map()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        let cut = split.min(top.len());
        let (p1, p2) = top.split_at(cut);

        let together = a.obfuscate(&wrapped, &top).unwrap();
        let stepwise = a.obfuscate(&a.obfuscate(&wrapped, p1).unwrap(), p2).unwrap();

        prop_assert_eq!(&together, &stepwise);
        prop_assert!(a.verify(&together));
    }

    #[test]
    fn every_member_verifies(batch in (1usize..40).prop_flat_map(digest_set)) {
        let tree = MerkleTree::build(batch.clone()).unwrap();
        let root = tree.root();
        let bound = usize::BITS - (batch.len() - 1).leading_zeros();

        for (i, leaf) in batch.iter().enumerate() {
            let proof = tree.proof_at(i).unwrap();
            prop_assert!(proof.len() as u32 <= bound);
            prop_assert!(verify_proof(&proof, &root, leaf));
        }

        let outsider = keccak256(b"not a member");
        prop_assume!(!batch.contains(&outsider));
        prop_assert!(!verify_proof(&tree.proof_at(0).unwrap(), &root, &outsider));
    }
}

#[test]
fn single_element_batch() {
    let d = keccak256(b"only");
    let tree = MerkleTree::build(vec![d]).unwrap();
    assert_eq!(tree.root(), d);
    assert!(tree.proof(&d).unwrap().is_empty());
}

#[test]
fn redaction_keeps_digest_for_nested_documents() {
    let a = Attestor::default();
    let doc = Value::from(json!({
        "name": {"first": "Ada", "last": "Lovelace"},
        "tags": ["math", null, 1.5],
        "active": true
    }));
    let wrapped = a.wrap_one(&doc, &WrapOptions::default()).unwrap();
    let redacted = a.obfuscate(&wrapped, &["name.first", "tags[1]"]).unwrap();

    assert_eq!(redacted.obfuscated_count(), 2);
    assert!(a.verify(&redacted));

    let plain = redacted.plain_data(&a.config().limits).unwrap();
    assert_eq!(
        plain.to_json(),
        json!({"name": {"last": "Lovelace"}, "tags": ["math", 1.5], "active": true})
    );
}
