//! Document digest (`targetHash`) computation.
//!
//! ```text
//! leaves      = { hash_leaf(path, token) | visible, non-undefined leaf }
//! all         = sort(leaves ++ obfuscated)
//! targetHash  = keccak256(json(["<hex>", "<hex>", ...]))
//! ```
//!
//! Sorting before the final hash removes every dependency on traversal order.
//! Obfuscated hashes are taken as recorded: their plaintext is gone, so they
//! can never be recomputed.

use itertools::Itertools;

use crate::config::LimitsConfig;
use crate::errors::{AttestError, AttestResult};
use crate::hash::{hash_leaf, keccak256, HashDigest};
use crate::path;
use crate::value::Value;

/// Hashes of every visible leaf of `data`, in enumeration order.
pub fn leaf_hashes(data: &Value, limits: &LimitsConfig) -> AttestResult<Vec<HashDigest>> {
    path::enumerate_with_limits(data, limits)?
        .into_iter()
        .filter(|leaf| !leaf.value.is_undefined())
        .map(|leaf| hash_leaf(&leaf.path_string(), leaf.value))
        .collect()
}

/// Fold an unordered set of leaf hashes into one digest.
pub fn combine_sorted(hashes: impl IntoIterator<Item = HashDigest>) -> AttestResult<HashDigest> {
    let hex_list: Vec<String> = hashes.into_iter().sorted().map(|h| h.to_hex()).collect();
    let text = serde_json::to_string(&hex_list)
        .map_err(|e| AttestError::serialization(format!("failed to encode hash list: {e}")))?;
    Ok(keccak256(text.as_bytes()))
}

/// Digest of salted data plus previously obfuscated leaf hashes.
pub fn digest_document(
    data: &Value,
    obfuscated: &[HashDigest],
    limits: &LimitsConfig,
) -> AttestResult<HashDigest> {
    let visible = leaf_hashes(data, limits)?;
    tracing::trace!(
        visible = visible.len(),
        obfuscated = obfuscated.len(),
        "computing document digest"
    );
    combine_sorted(visible.into_iter().chain(obfuscated.iter().copied()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn limits() -> LimitsConfig {
        LimitsConfig::default()
    }

    #[test]
    fn matches_manual_construction() {
        let data = Value::from(json!({"b": "y", "a": "x"}));
        let ha = hash_leaf("a", &Value::from("x")).unwrap();
        let hb = hash_leaf("b", &Value::from("y")).unwrap();
        let mut sorted = vec![ha, hb];
        sorted.sort();
        let text = format!("[\"{}\",\"{}\"]", sorted[0], sorted[1]);

        assert_eq!(
            digest_document(&data, &[], &limits()).unwrap(),
            keccak256(text.as_bytes())
        );
    }

    #[test]
    fn input_order_is_irrelevant() {
        let hs: Vec<HashDigest> = (0u8..5).map(|i| keccak256(&[i])).collect();
        let mut rev = hs.clone();
        rev.reverse();
        assert_eq!(combine_sorted(hs).unwrap(), combine_sorted(rev).unwrap());
    }

    #[test]
    fn undefined_leaves_are_skipped() {
        let with_hole = Value::Array(vec![Value::from("a"), Value::Undefined]);
        let hashes = leaf_hashes(&with_hole, &limits()).unwrap();
        assert_eq!(hashes.len(), 1);
    }

    #[test]
    fn moving_a_leaf_into_obfuscated_keeps_digest() {
        let full = Value::from(json!({"a": "x", "b": "y"}));
        let partial = Value::from(json!({"b": "y"}));
        let ha = hash_leaf("a", &Value::from("x")).unwrap();

        assert_eq!(
            digest_document(&full, &[], &limits()).unwrap(),
            digest_document(&partial, &[ha], &limits()).unwrap()
        );
    }

    #[test]
    fn empty_document_has_a_digest() {
        let d = digest_document(&Value::from(json!({})), &[], &limits()).unwrap();
        assert_eq!(d, keccak256(b"[]"));
    }
}
