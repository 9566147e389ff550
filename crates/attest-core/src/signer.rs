//! Signer capability table.
//!
//! Signing algorithms are supplied by the caller: the core only knows how to
//! look one up by identifier and feed it the Merkle root. The table is built
//! explicitly and handed to the `Attestor`; there is no global registry.
//!
//! Requirements:
//! - stable ordering for listing
//! - clear errors for missing or duplicate identifiers

use std::collections::BTreeMap;
use std::fmt;

use crate::errors::{AttestError, AttestResult};

/// A signing capability.
pub trait Signer: Send + Sync {
    /// Sign `message` with `key`. Key encoding is up to the implementation.
    fn sign(&self, message: &[u8], key: &[u8]) -> AttestResult<Vec<u8>>;
}

impl<F> Signer for F
where
    F: Fn(&[u8], &[u8]) -> AttestResult<Vec<u8>> + Send + Sync,
{
    fn sign(&self, message: &[u8], key: &[u8]) -> AttestResult<Vec<u8>> {
        self(message, key)
    }
}

/// Signers keyed by algorithm identifier.
#[derive(Default)]
pub struct SignerTable {
    signers: BTreeMap<String, Box<dyn Signer>>,
}

impl SignerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of `register`. Later entries replace earlier ones.
    pub fn with(mut self, algorithm: impl Into<String>, signer: impl Signer + 'static) -> Self {
        self.signers.insert(algorithm.into(), Box::new(signer));
        self
    }

    /// Register a signer, refusing to shadow an existing identifier.
    pub fn register(
        &mut self,
        algorithm: impl Into<String>,
        signer: impl Signer + 'static,
    ) -> AttestResult<()> {
        let algorithm = algorithm.into();
        if algorithm.trim().is_empty() {
            return Err(AttestError::invalid_argument("algorithm id must not be empty"));
        }
        if self.signers.contains_key(&algorithm) {
            return Err(AttestError::invalid_argument(format!(
                "signer already registered: {algorithm}"
            )));
        }
        self.signers.insert(algorithm, Box::new(signer));
        Ok(())
    }

    pub fn get(&self, algorithm: &str) -> AttestResult<&dyn Signer> {
        self.signers
            .get(algorithm)
            .map(|s| s.as_ref())
            .ok_or_else(|| AttestError::UnsupportedAlgorithm(algorithm.to_string()))
    }

    pub fn sign(&self, algorithm: &str, message: &[u8], key: &[u8]) -> AttestResult<Vec<u8>> {
        self.get(algorithm)?.sign(message, key)
    }

    /// Algorithm identifiers in sorted order.
    pub fn algorithms(&self) -> Vec<&str> {
        self.signers.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.signers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }
}

impl fmt::Debug for SignerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerTable")
            .field("algorithms", &self.algorithms())
            .finish()
    }
}
