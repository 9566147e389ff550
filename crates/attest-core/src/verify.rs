//! Document verification.
//!
//! Verification is a total predicate: a tampered, truncated or malformed
//! document yields `false` (or a report with error findings), never an
//! `Err`.
//!
//! Checks, in order:
//! - envelope type is the Merkle proof scheme this crate produces
//! - every hole in the data is backed by an obfuscated hash
//! - digest recomputed from visible data + obfuscated hashes equals `targetHash`
//! - `proof` folded onto `targetHash` equals `merkleRoot`

use std::collections::BTreeMap;

use crate::config::CoreConfig;
use crate::digest::digest_document;
use crate::document::WrappedDocument;
use crate::merkle::verify_proof;
use crate::path;

/// A structured verification finding.
#[derive(Debug, Clone)]
pub struct VerifyFinding {
    pub level: VerifyLevel,
    pub code: String,
    pub message: String,
    pub data: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyLevel {
    Info,
    Warning,
    Error,
}

/// Verification report.
#[derive(Debug, Clone)]
pub struct VerifyReport {
    pub ok: bool,
    pub findings: Vec<VerifyFinding>,
    /// Digest recomputed from the document, if it could be computed.
    pub computed_target_hash: Option<String>,
}

impl VerifyReport {
    pub fn has_errors(&self) -> bool {
        self.findings
            .iter()
            .any(|f| matches!(f.level, VerifyLevel::Error))
    }

    pub fn codes(&self) -> Vec<&str> {
        self.findings.iter().map(|f| f.code.as_str()).collect()
    }
}

fn push(
    findings: &mut Vec<VerifyFinding>,
    level: VerifyLevel,
    code: impl Into<String>,
    message: impl Into<String>,
) -> &mut VerifyFinding {
    findings.push(VerifyFinding {
        level,
        code: code.into(),
        message: message.into(),
        data: BTreeMap::new(),
    });
    let last = findings.len() - 1;
    &mut findings[last]
}

/// Verify a document and explain the outcome.
pub fn verify_report(doc: &WrappedDocument, cfg: &CoreConfig) -> VerifyReport {
    let mut findings = Vec::new();
    let envelope = &doc.signature_envelope;

    if envelope.proof_type != cfg.hashing.proof_type {
        push(
            &mut findings,
            VerifyLevel::Error,
            "envelope.type",
            format!("unsupported proof type: {}", envelope.proof_type),
        );
    }

    // Holes hash to nothing, so each one must be accounted for by a redaction.
    // Only array redaction leaves a hole; removed map entries leave none.
    if let Ok(leaves) = path::enumerate_with_limits(&doc.data, &cfg.limits) {
        let holes = leaves.iter().filter(|l| l.value.is_undefined()).count();
        if holes > doc.obfuscated_hashes.len() {
            let f = push(
                &mut findings,
                VerifyLevel::Error,
                "data.holes",
                "data holds more empty slots than obfuscated hashes",
            );
            f.data.insert("holes".to_string(), holes.to_string());
            f.data
                .insert("obfuscated".to_string(), doc.obfuscated_hashes.len().to_string());
        }
    }

    let computed = match digest_document(&doc.data, &doc.obfuscated_hashes, &cfg.limits) {
        Ok(d) => Some(d),
        Err(e) => {
            push(
                &mut findings,
                VerifyLevel::Error,
                "digest.error",
                format!("failed to recompute digest: {e}"),
            )
            .data
            .insert("kind".to_string(), e.code().to_string());
            None
        }
    };

    if let Some(d) = &computed {
        if d == &envelope.target_hash {
            push(&mut findings, VerifyLevel::Info, "digest.ok", "target hash matches");

            if verify_proof(&envelope.proof, &envelope.merkle_root, &envelope.target_hash) {
                push(&mut findings, VerifyLevel::Info, "merkle.root.ok", "merkle root matches");
            } else {
                push(
                    &mut findings,
                    VerifyLevel::Error,
                    "merkle.root.mismatch",
                    "proof does not lead from target hash to merkle root",
                );
            }
        } else {
            let f = push(
                &mut findings,
                VerifyLevel::Error,
                "digest.mismatch",
                "recomputed digest does not match target hash",
            );
            f.data.insert("computed".to_string(), d.to_hex());
            f.data.insert("stored".to_string(), envelope.target_hash.to_hex());
        }
    }

    let ok = !findings.iter().any(|f| matches!(f.level, VerifyLevel::Error));
    if !ok {
        tracing::warn!(
            target_hash = %envelope.target_hash,
            "document failed verification"
        );
    }

    VerifyReport {
        ok,
        findings,
        computed_target_hash: computed.map(|d| d.to_hex()),
    }
}

/// Verify a document.
pub fn verify_document(doc: &WrappedDocument, cfg: &CoreConfig) -> bool {
    verify_report(doc, cfg).ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SignatureEnvelope;
    use crate::hash::keccak256;
    use crate::salt::salt_document;
    use crate::value::Value;
    use serde_json::json;

    fn single(cfg: &CoreConfig) -> WrappedDocument {
        let data = salt_document(&Value::from(json!({"a": "x"})), false, &cfg.limits).unwrap();
        let target = digest_document(&data, &[], &cfg.limits).unwrap();
        WrappedDocument {
            data,
            obfuscated_hashes: vec![],
            signature_envelope: SignatureEnvelope {
                proof_type: cfg.hashing.proof_type.clone(),
                target_hash: target,
                merkle_root: target,
                proof: vec![],
            },
            proofs: vec![],
        }
    }

    #[test]
    fn intact_document_verifies() {
        let cfg = CoreConfig::default();
        let rep = verify_report(&single(&cfg), &cfg);
        assert!(rep.ok);
        assert_eq!(rep.codes(), vec!["digest.ok", "merkle.root.ok"]);
    }

    #[test]
    fn tampered_data_is_reported() {
        let cfg = CoreConfig::default();
        let mut doc = single(&cfg);
        doc.data = Value::from(json!({"a": "forged"}));

        let rep = verify_report(&doc, &cfg);
        assert!(!rep.ok);
        assert_eq!(rep.codes(), vec!["digest.mismatch"]);
        assert!(!verify_document(&doc, &cfg));
    }

    #[test]
    fn unaccounted_holes_are_reported() {
        let cfg = CoreConfig::default();
        let mut doc = single(&cfg);
        // a bare null in stored data reads back as a hole
        doc.data = Value::from_salted_json(json!({"a": doc.data.get("a").unwrap().to_json(), "extra": [null, null]}));

        let rep = verify_report(&doc, &cfg);
        assert!(!rep.ok);
        assert_eq!(rep.codes(), vec!["data.holes", "digest.ok", "merkle.root.ok"]);
        let f = &rep.findings[0];
        assert_eq!(f.data.get("holes").map(String::as_str), Some("2"));
        assert_eq!(f.data.get("obfuscated").map(String::as_str), Some("0"));
    }

    #[test]
    fn wrong_root_is_reported() {
        let cfg = CoreConfig::default();
        let mut doc = single(&cfg);
        doc.signature_envelope.merkle_root = keccak256(b"other root");
        assert_eq!(verify_report(&doc, &cfg).codes(), vec!["digest.ok", "merkle.root.mismatch"]);
    }

    #[test]
    fn malformed_data_is_false_not_error() {
        let cfg = CoreConfig::default();
        let mut doc = single(&cfg);
        doc.data = Value::from(json!({"a.b": "x"}));
        let rep = verify_report(&doc, &cfg);
        assert!(!rep.ok);
        assert_eq!(rep.findings[0].data.get("kind").map(String::as_str), Some("invalid_key"));
    }

    #[test]
    fn unknown_envelope_type() {
        let cfg = CoreConfig::default();
        let mut doc = single(&cfg);
        doc.signature_envelope.proof_type = "Other".to_string();
        assert!(verify_report(&doc, &cfg).codes().contains(&"envelope.type"));
    }
}
