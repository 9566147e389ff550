//! Configuration structures for attest-core.
//!
//! These objects control hashing identifiers and structural limits. The core
//! crate itself does not read environment variables or files; all
//! configuration must be provided explicitly by the caller.

use crate::errors::{AttestError, AttestResult};

/// Global configuration container.
#[derive(Debug, Clone, Default)]
pub struct CoreConfig {
    pub hashing: HashingConfig,
    pub limits: LimitsConfig,
}

/// Hashing-related configuration.
#[derive(Debug, Clone)]
pub struct HashingConfig {
    pub algorithm: HashAlgorithm,
    /// Identifier written to `signatureEnvelope.type`.
    pub proof_type: String,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::Keccak256,
            proof_type: crate::PROOF_TYPE_MERKLE.to_string(),
        }
    }
}

/// Structural limits applied while walking claim trees and batches.
#[derive(Debug, Clone)]
pub struct LimitsConfig {
    /// Maximum container nesting depth of a single document.
    pub max_depth: usize,
    /// Maximum number of leaves in a single document.
    pub max_leaves: usize,
    /// Maximum number of documents in one batch.
    pub max_batch: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_depth: 128,
            max_leaves: 100_000,
            max_batch: 1_000_000,
        }
    }
}

/// Supported hash algorithms.
///
/// Digests must be bit-reproducible across implementations, so there is only
/// one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Keccak256,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keccak256 => "keccak256",
        }
    }

    pub fn parse(s: &str) -> AttestResult<Self> {
        match s {
            "keccak256" | "keccak-256" => Ok(Self::Keccak256),
            _ => Err(AttestError::invalid_argument(format!(
                "unsupported hash algorithm: {s}"
            ))),
        }
    }
}

/// Validate a full configuration object.
pub fn validate_config(cfg: &CoreConfig) -> AttestResult<()> {
    if cfg.limits.max_depth == 0 {
        return Err(AttestError::invalid_argument(
            "max_depth must be greater than zero",
        ));
    }

    if cfg.limits.max_leaves == 0 {
        return Err(AttestError::invalid_argument(
            "max_leaves must be greater than zero",
        ));
    }

    if cfg.limits.max_batch == 0 {
        return Err(AttestError::invalid_argument(
            "max_batch must be greater than zero",
        ));
    }

    if cfg.hashing.proof_type.trim().is_empty() {
        return Err(AttestError::invalid_argument("proof_type must not be empty"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = CoreConfig::default();
        validate_config(&cfg).unwrap();
        assert_eq!(cfg.hashing.algorithm.as_str(), "keccak256");
    }

    #[test]
    fn invalid_limits_detected() {
        let mut cfg = CoreConfig::default();
        cfg.limits.max_depth = 0;
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn empty_proof_type_detected() {
        let mut cfg = CoreConfig::default();
        cfg.hashing.proof_type = " ".to_string();
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn parse_algorithm() {
        assert_eq!(HashAlgorithm::parse("keccak-256").unwrap(), HashAlgorithm::Keccak256);
        assert!(HashAlgorithm::parse("sha256").is_err());
    }
}
