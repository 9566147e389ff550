//! attest-core
//!
//! Core primitives for tamper-evident, selectively redactable attestations:
//! - canonical path mapping of nested claim documents
//! - per-leaf salting (`<uuid-v4>:<type>:<value>` tokens)
//! - Keccak-256 leaf hashes and order-independent document digests
//! - Merkle batching with compact inclusion proofs
//! - field redaction that keeps the digest reproducible
//! - version adapters for the persisted JSON layouts

pub mod config;
pub mod digest;
pub mod document;
pub mod errors;
pub mod format;
pub mod hash;
pub mod merkle;
pub mod obfuscate;
pub mod path;
pub mod salt;
pub mod signer;
pub mod value;
pub mod verify;
pub mod wrap;

pub use crate::errors::{AttestError, AttestResult};

/// Identifier written to `signatureEnvelope.type`.
/// Must remain stable across versions.
pub const PROOF_TYPE_MERKLE: &str = "SHA3MerkleProof";

/// Identifier written to each issuance signature entry.
pub const SIGNATURE_PROOF_TYPE: &str = "MerkleRootSignature";

/// Convenience re-exports.
pub mod prelude {
    pub use crate::config::{CoreConfig, HashAlgorithm, HashingConfig, LimitsConfig};
    pub use crate::digest::digest_document;
    pub use crate::document::{ProofEntry, SignatureEnvelope, WrappedDocument};
    pub use crate::format::DocumentFormat;
    pub use crate::hash::{hash_leaf, keccak256, HashDigest};
    pub use crate::merkle::{verify_proof, MerkleTree};
    pub use crate::obfuscate::obfuscate;
    pub use crate::salt::{salt_document, unsalt_document};
    pub use crate::signer::{Signer, SignerTable};
    pub use crate::value::Value;
    pub use crate::verify::{verify_document, VerifyReport};
    pub use crate::wrap::{Attestor, SchemaValidator, SignRequest, WrapOptions};
    pub use crate::{AttestError, AttestResult};
}
