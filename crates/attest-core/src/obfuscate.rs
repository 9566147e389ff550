//! Selective redaction of wrapped documents.
//!
//! Redacting a field moves the hash of each of its leaves into
//! `obfuscatedHashes` and deletes the visible value. The set of hashes that
//! feeds the digest is unchanged, so the stored `targetHash` and Merkle proof
//! stay valid.
//!
//! A requested path may name a single leaf (`a.b[0]`) or a container (`a`),
//! in which case every leaf underneath it is redacted.
//!
//! Re-redacting a field that is already gone is a no-op. A field is treated
//! as already gone when the document has redactions on record and either the
//! path resolves to an empty slot (an array hole or an emptied container) or
//! it names a key whose parent map still exists. A removed map entry leaves
//! no trace, so a mistyped key in a redacted map is indistinguishable from a
//! re-redaction; that case is skipped with a warning. Anything else,
//! including an array index past the end, is `PathNotFound`.

use std::collections::BTreeMap;

use crate::config::LimitsConfig;
use crate::document::WrappedDocument;
use crate::errors::{AttestError, AttestResult};
use crate::hash::{hash_leaf, HashDigest};
use crate::path::{self, Path};
use crate::value::Value;

/// Redact `paths` from `doc`, returning a new document.
///
/// The outcome does not depend on how the paths are grouped across calls or
/// in which order they are listed: `obfuscatedHashes` is kept sorted.
pub fn obfuscate<S: AsRef<str>>(
    doc: &WrappedDocument,
    paths: &[S],
    limits: &LimitsConfig,
) -> AttestResult<WrappedDocument> {
    let leaves: Vec<(String, path::Leaf<'_>)> = path::enumerate_with_limits(&doc.data, limits)?
        .into_iter()
        .map(|leaf| (leaf.path_string(), leaf))
        .collect();

    // Keyed by rendered path so overlapping requests hash each leaf once.
    let mut selected: BTreeMap<&str, (Path, HashDigest)> = BTreeMap::new();

    for requested in paths {
        let requested = requested.as_ref();
        let mut matched = false;

        for (rendered, leaf) in &leaves {
            if leaf.value.is_undefined() || !path::covers(requested, rendered) {
                continue;
            }
            matched = true;
            if !selected.contains_key(rendered.as_str()) {
                let h = hash_leaf(rendered, leaf.value)?;
                selected.insert(rendered.as_str(), (leaf.path.clone(), h));
            }
        }

        if !matched {
            if already_redacted(doc, requested) {
                tracing::warn!(path = requested, "path not present, assuming already redacted");
                continue;
            }
            return Err(AttestError::PathNotFound(requested.to_string()));
        }
    }

    let mut data = doc.data.clone();
    let mut obfuscated_hashes = doc.obfuscated_hashes.clone();
    for (rendered, (leaf_path, h)) in &selected {
        if !path::remove(&mut data, leaf_path) {
            return Err(AttestError::structure(format!(
                "leaf {rendered} vanished during redaction"
            )));
        }
        obfuscated_hashes.push(*h);
    }
    obfuscated_hashes.sort();

    tracing::debug!(
        requested = paths.len(),
        redacted = selected.len(),
        total_obfuscated = obfuscated_hashes.len(),
        "obfuscated document fields"
    );

    Ok(WrappedDocument {
        data,
        obfuscated_hashes,
        signature_envelope: doc.signature_envelope.clone(),
        proofs: doc.proofs.clone(),
    })
}

fn already_redacted(doc: &WrappedDocument, requested: &str) -> bool {
    if doc.obfuscated_hashes.is_empty() {
        return false;
    }

    match path::lookup_rendered(&doc.data, requested) {
        Some(Value::Undefined) => return true,
        Some(Value::Map(m)) if m.values().all(Value::is_undefined) => return true,
        Some(Value::Array(a)) if a.iter().all(Value::is_undefined) => return true,
        Some(_) => return false,
        None => {}
    }

    // Array redaction leaves a hole, so a missing index was never there.
    if requested.ends_with(']') {
        return false;
    }
    path::parent_of(requested)
        .and_then(|parent| path::lookup_rendered(&doc.data, parent))
        .map(|parent| parent.as_map().is_some())
        .unwrap_or(false)
}

/// True when no visible leaf lives at or under `requested`.
pub fn is_obfuscated(doc: &WrappedDocument, requested: &str, limits: &LimitsConfig) -> AttestResult<bool> {
    Ok(!path::enumerate_with_limits(&doc.data, limits)?
        .iter()
        .any(|leaf| !leaf.value.is_undefined() && path::covers(requested, &leaf.path_string())))
}
