//! Wrapped document model.
//!
//! A `WrappedDocument` is the version-agnostic triple every engine works on:
//! salted `data`, the list of `obfuscatedHashes`, and the `signatureEnvelope`
//! tying the document to its batch. Where a particular schema version puts
//! these fields is the business of `crate::format`.
//!
//! Documents are values: obfuscation and signing return new documents and
//! never touch their input.

use serde::{Deserialize, Serialize};

use crate::config::LimitsConfig;
use crate::errors::AttestResult;
use crate::hash::HashDigest;
use crate::salt;
use crate::value::Value;

/// Batch membership proof attached at wrap time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureEnvelope {
    #[serde(rename = "type")]
    pub proof_type: String,
    pub target_hash: HashDigest,
    pub merkle_root: HashDigest,
    pub proof: Vec<HashDigest>,
}

/// One issuer signature over the Merkle root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofEntry {
    #[serde(rename = "type")]
    pub proof_type: String,
    pub algorithm: String,
    /// RFC 3339 timestamp.
    pub created: String,
    pub verification_method: String,
    /// Hex-encoded signature bytes.
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrappedDocument {
    #[serde(with = "salted_data")]
    pub data: Value,
    #[serde(default)]
    pub obfuscated_hashes: Vec<HashDigest>,
    pub signature_envelope: SignatureEnvelope,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub proofs: Vec<ProofEntry>,
}

impl WrappedDocument {
    pub fn target_hash(&self) -> &HashDigest {
        &self.signature_envelope.target_hash
    }

    pub fn merkle_root(&self) -> &HashDigest {
        &self.signature_envelope.merkle_root
    }

    pub fn obfuscated_count(&self) -> usize {
        self.obfuscated_hashes.len()
    }

    /// The claim data with all salts stripped.
    pub fn plain_data(&self, limits: &LimitsConfig) -> AttestResult<Value> {
        salt::unsalt_document(&self.data, limits)
    }
}

/// Serde adapter for salted data: holes are written as `null` and read back
/// as `Undefined`.
pub(crate) mod salted_data {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::value::Value;

    pub fn serialize<S: Serializer>(v: &Value, s: S) -> Result<S::Ok, S::Error> {
        v.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Value, D::Error> {
        serde_json::Value::deserialize(d).map(Value::from_salted_json)
    }
}
