//! Persisted document layouts and version dispatch.
//!
//! The engines only know the version-agnostic `WrappedDocument`. This module
//! projects a version-specific JSON layout onto it and embeds it back:
//!
//! - V2: `{ version, data, signature, privacy: { obfuscatedData }, proof }`
//! - V3: claim fields at the top level next to `version` and
//!   `proof: { type, targetHash, merkleRoot, proof, privacy: { obfuscated }, signatures }`
//!
//! Parsing is deterministic given the same bytes; callers pass explicit size
//! limits.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::document::{ProofEntry, SignatureEnvelope, WrappedDocument};
use crate::errors::{AttestError, AttestResult};
use crate::hash::HashDigest;
use crate::value::Value;

/// Default maximum JSON bytes accepted by helpers (8 MiB).
pub const DEFAULT_MAX_JSON_BYTES: usize = 8 * 1024 * 1024;

pub const SCHEMA_V2: &str = "urn:attest:schema:v2";
pub const SCHEMA_V3: &str = "urn:attest:schema:v3";

/// Top-level keys a V3 claim document cannot use.
pub const V3_RESERVED_KEYS: &[&str] = &["version", "proof"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DocumentFormat {
    #[default]
    V2,
    V3,
}

impl DocumentFormat {
    /// Parse a version identifier. Accepts the schema URN or the short form.
    pub fn parse(s: &str) -> AttestResult<Self> {
        match s.trim() {
            SCHEMA_V2 | "v2" | "2" => Ok(Self::V2),
            SCHEMA_V3 | "v3" | "3" => Ok(Self::V3),
            other => Err(AttestError::invalid_argument(format!(
                "unsupported document version: {other}"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V2 => SCHEMA_V2,
            Self::V3 => SCHEMA_V3,
        }
    }

    /// Detect the layout from the `version` field of a wrapped document.
    pub fn detect(v: &Json) -> AttestResult<Self> {
        Self::parse(&read_version(v)?)
    }

    /// Check that raw claims fit this layout before wrapping.
    pub fn check_claims(&self, claims: &Value) -> AttestResult<()> {
        match self {
            Self::V2 => Ok(()),
            Self::V3 => {
                let map = claims.as_map().ok_or_else(|| {
                    AttestError::invalid_argument("v3 documents must be JSON objects")
                })?;
                match V3_RESERVED_KEYS.iter().find(|k| map.contains_key(**k)) {
                    Some(k) => Err(AttestError::invalid_argument(format!(
                        "v3 documents cannot use the reserved top-level key {k:?}"
                    ))),
                    None => Ok(()),
                }
            }
        }
    }

    /// Lay a wrapped document out in this version's JSON shape.
    pub fn embed(&self, doc: &WrappedDocument) -> AttestResult<Json> {
        match self {
            Self::V2 => {
                let layout = V2Layout {
                    version: SCHEMA_V2.to_string(),
                    data: doc.data.clone(),
                    signature: doc.signature_envelope.clone(),
                    privacy: V2Privacy {
                        obfuscated_data: doc.obfuscated_hashes.clone(),
                    },
                    proof: doc.proofs.clone(),
                };
                Ok(serde_json::to_value(layout)?)
            }
            Self::V3 => {
                self.check_claims(&doc.data)?;
                let mut obj = match doc.data.to_json() {
                    Json::Object(m) => m,
                    _ => return Err(AttestError::invalid_argument("v3 documents must be JSON objects")),
                };
                let envelope = &doc.signature_envelope;
                let proof = V3Proof {
                    proof_type: envelope.proof_type.clone(),
                    target_hash: envelope.target_hash,
                    merkle_root: envelope.merkle_root,
                    proof: envelope.proof.clone(),
                    privacy: V3Privacy {
                        obfuscated: doc.obfuscated_hashes.clone(),
                    },
                    signatures: doc.proofs.clone(),
                };
                obj.insert("version".to_string(), Json::String(SCHEMA_V3.to_string()));
                obj.insert("proof".to_string(), serde_json::to_value(proof)?);
                Ok(Json::Object(obj))
            }
        }
    }

    /// Read a JSON layout of this version back into the core triple.
    pub fn project(&self, v: &Json) -> AttestResult<WrappedDocument> {
        let found = Self::detect(v)?;
        if found != *self {
            return Err(AttestError::invalid_argument(format!(
                "expected {} document, found {}",
                self.as_str(),
                found.as_str()
            )));
        }

        match self {
            Self::V2 => {
                let layout: V2Layout = serde_json::from_value(v.clone())
                    .map_err(|e| AttestError::serialization(format!("failed to decode v2 document: {e}")))?;
                Ok(WrappedDocument {
                    data: layout.data,
                    obfuscated_hashes: layout.privacy.obfuscated_data,
                    signature_envelope: layout.signature,
                    proofs: layout.proof,
                })
            }
            Self::V3 => {
                let mut obj = v
                    .as_object()
                    .cloned()
                    .ok_or_else(|| AttestError::invalid_argument("expected JSON object"))?;
                obj.remove("version");
                let proof = obj
                    .remove("proof")
                    .ok_or_else(|| AttestError::invalid_argument("v3 document has no proof block"))?;
                let proof: V3Proof = serde_json::from_value(proof)
                    .map_err(|e| AttestError::serialization(format!("failed to decode v3 proof: {e}")))?;

                let mut obfuscated_hashes = proof.privacy.obfuscated;
                obfuscated_hashes.sort();
                Ok(WrappedDocument {
                    data: Value::from_salted_json(Json::Object(obj)),
                    obfuscated_hashes,
                    signature_envelope: SignatureEnvelope {
                        proof_type: proof.proof_type,
                        target_hash: proof.target_hash,
                        merkle_root: proof.merkle_root,
                        proof: proof.proof,
                    },
                    proofs: proof.signatures,
                })
            }
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentFormat {
    type Err = AttestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V2Layout {
    version: String,
    #[serde(with = "crate::document::salted_data")]
    data: Value,
    signature: SignatureEnvelope,
    #[serde(default)]
    privacy: V2Privacy,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    proof: Vec<ProofEntry>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V2Privacy {
    #[serde(default)]
    obfuscated_data: Vec<HashDigest>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V3Proof {
    #[serde(rename = "type")]
    proof_type: String,
    target_hash: HashDigest,
    merkle_root: HashDigest,
    proof: Vec<HashDigest>,
    #[serde(default)]
    privacy: V3Privacy,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    signatures: Vec<ProofEntry>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct V3Privacy {
    #[serde(default)]
    obfuscated: Vec<HashDigest>,
}

/// Parse JSON bytes into `serde_json::Value` with a hard size limit.
pub fn parse_json_bytes(bytes: &[u8], max_bytes: usize) -> AttestResult<Json> {
    if bytes.len() > max_bytes {
        return Err(AttestError::invalid_argument(format!(
            "JSON payload too large ({} bytes > limit {})",
            bytes.len(),
            max_bytes
        )));
    }

    serde_json::from_slice(bytes)
        .map_err(|e| AttestError::serialization(format!("failed to parse JSON: {e}")))
}

/// Read the `version` field from a JSON object.
pub fn read_version(v: &Json) -> AttestResult<String> {
    let obj = v
        .as_object()
        .ok_or_else(|| AttestError::invalid_argument("expected JSON object"))?;
    let ver = obj
        .get("version")
        .and_then(|x| x.as_str())
        .ok_or_else(|| AttestError::invalid_argument("missing version string"))?;
    Ok(ver.to_string())
}

/// Detect the version of a wrapped document and project it.
pub fn read(v: &Json) -> AttestResult<(DocumentFormat, WrappedDocument)> {
    let format = DocumentFormat::detect(v)?;
    Ok((format, format.project(v)?))
}

/// `read` over raw bytes.
pub fn read_bytes(bytes: &[u8], max_bytes: usize) -> AttestResult<(DocumentFormat, WrappedDocument)> {
    read(&parse_json_bytes(bytes, max_bytes)?)
}

/// Pretty JSON text for a wrapped document in the given layout.
pub fn to_json_string(format: DocumentFormat, doc: &WrappedDocument) -> AttestResult<String> {
    Ok(serde_json::to_string_pretty(&format.embed(doc)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::keccak256;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn sample() -> WrappedDocument {
        WrappedDocument {
            data: Value::from_salted_json(json!({"name": "tok", "list": ["x", null]})),
            obfuscated_hashes: vec![keccak256(b"b"), keccak256(b"a")],
            signature_envelope: SignatureEnvelope {
                proof_type: crate::PROOF_TYPE_MERKLE.to_string(),
                target_hash: keccak256(b"t"),
                merkle_root: keccak256(b"r"),
                proof: vec![keccak256(b"s")],
            },
            proofs: vec![],
        }
    }

    #[test]
    fn parse_accepts_short_forms() {
        assert_eq!(DocumentFormat::parse("v3").unwrap(), DocumentFormat::V3);
        assert_eq!(DocumentFormat::parse(SCHEMA_V2).unwrap(), DocumentFormat::V2);
        assert_matches!(DocumentFormat::parse("v9"), Err(AttestError::InvalidArgument(_)));
    }

    #[test]
    fn v2_layout() {
        let j = DocumentFormat::V2.embed(&sample()).unwrap();
        assert_eq!(j["version"], json!(SCHEMA_V2));
        assert_eq!(j["data"]["list"], json!(["x", null]));
        assert_eq!(j["signature"]["merkleRoot"], json!(keccak256(b"r").to_hex()));
        assert_eq!(j["privacy"]["obfuscatedData"].as_array().unwrap().len(), 2);
        assert!(j.get("proof").is_none());

        let (format, back) = read(&j).unwrap();
        assert_eq!(format, DocumentFormat::V2);
        assert_eq!(back, sample());
    }

    #[test]
    fn v3_layout() {
        let mut doc = sample();
        doc.obfuscated_hashes.sort();

        let j = DocumentFormat::V3.embed(&doc).unwrap();
        assert_eq!(j["version"], json!(SCHEMA_V3));
        assert_eq!(j["name"], json!("tok"));
        assert_eq!(j["proof"]["type"], json!("SHA3MerkleProof"));
        assert_eq!(j["proof"]["privacy"]["obfuscated"].as_array().unwrap().len(), 2);

        let (format, back) = read(&j).unwrap();
        assert_eq!(format, DocumentFormat::V3);
        assert_eq!(back, doc);
    }

    #[test]
    fn v3_rejects_reserved_keys() {
        let claims = Value::from(json!({"proof": 1}));
        assert_matches!(
            DocumentFormat::V3.check_claims(&claims),
            Err(AttestError::InvalidArgument(_))
        );
        assert!(DocumentFormat::V2.check_claims(&claims).is_ok());
    }

    #[test]
    fn project_refuses_other_version() {
        let j = DocumentFormat::V2.embed(&sample()).unwrap();
        assert!(DocumentFormat::V3.project(&j).is_err());
    }

    #[test]
    fn size_limit_is_enforced() {
        assert_matches!(parse_json_bytes(b"{}", 1), Err(AttestError::InvalidArgument(_)));
        assert_matches!(parse_json_bytes(b"{", 10), Err(AttestError::Serialization(_)));
        assert_matches!(read(&json!({"data": {}})), Err(AttestError::InvalidArgument(_)));
    }
}
