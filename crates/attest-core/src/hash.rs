//! Hashing primitives.
//!
//! All hashes in attest are Keccak-256. Digests must be bit-reproducible
//! across implementations, so the algorithm is fixed for the whole crate and
//! only named through `HashAlgorithm` for configuration and reporting.
//!
//! Leaf hashes are taken over the canonical JSON text of a one-key object
//! `{"<path>": <value>}`. With a single key there is no ordering to agree on;
//! the text is exactly what `serde_json` emits.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};

use crate::config::HashAlgorithm;
use crate::errors::{AttestError, AttestResult};
use crate::value::Value;

/// Byte length of every hash in this crate.
pub const HASH_LEN: usize = 32;

/// A 256-bit hash.
///
/// Ordering is plain byte order, which is also the order of the lowercase hex
/// rendering.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HashDigest([u8; HASH_LEN]);

impl HashDigest {
    pub fn from_bytes(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> AttestResult<Self> {
        let arr: [u8; HASH_LEN] = bytes.try_into().map_err(|_| {
            AttestError::invalid_argument(format!(
                "hash must be {HASH_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// Parse 64 hex characters, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> AttestResult<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)
            .map_err(|e| AttestError::invalid_argument(format!("invalid hash hex {s:?}: {e}")))?;
        Self::from_slice(&bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }
}

impl fmt::Display for HashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for HashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashDigest({})", self.to_hex())
    }
}

impl FromStr for HashDigest {
    type Err = AttestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl AsRef<[u8]> for HashDigest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for HashDigest {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for HashDigest {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Hash raw bytes using the selected algorithm.
pub fn hash_bytes(alg: HashAlgorithm, bytes: &[u8]) -> HashDigest {
    match alg {
        HashAlgorithm::Keccak256 => keccak256(bytes),
    }
}

pub fn keccak256(bytes: &[u8]) -> HashDigest {
    let out = Keccak256::digest(bytes);
    let mut arr = [0u8; HASH_LEN];
    arr.copy_from_slice(&out);
    HashDigest(arr)
}

/// Canonical JSON text of a leaf: `{"<path>":<value>}`.
pub fn leaf_json(path: &str, value: &Value) -> AttestResult<String> {
    let mut obj = serde_json::Map::new();
    obj.insert(path.to_string(), value.to_json());
    serde_json::to_string(&serde_json::Value::Object(obj))
        .map_err(|e| AttestError::serialization(format!("failed to encode leaf {path}: {e}")))
}

/// Hash one `(path, value)` leaf.
///
/// `value` is the stored form of the leaf, normally a salted token. Callers
/// skip `Undefined` leaves; they have no hash.
pub fn hash_leaf(path: &str, value: &Value) -> AttestResult<HashDigest> {
    Ok(keccak256(leaf_json(path, value)?.as_bytes()))
}
