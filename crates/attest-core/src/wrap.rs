//! Batch wrapping, verification and signing.
//!
//! The `Attestor` is the orchestrator over the engines: it salts and digests
//! each claim document, builds one Merkle tree over the batch and attaches
//! a per-document envelope. It holds no mutable state, so a single instance
//! can be shared across threads.

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::{validate_config, CoreConfig};
use crate::digest::digest_document;
use crate::document::{ProofEntry, SignatureEnvelope, WrappedDocument};
use crate::errors::{AttestError, AttestResult};
use crate::format::DocumentFormat;
use crate::hash::HashDigest;
use crate::merkle::MerkleTree;
use crate::obfuscate;
use crate::salt::{salt_document, unsalt_document};
use crate::signer::SignerTable;
use crate::value::Value;
use crate::verify::{verify_report, VerifyReport};

/// External schema check run on every claim document before salting.
///
/// An empty list means the document is acceptable.
pub trait SchemaValidator: Send + Sync {
    fn validate(&self, doc: &Value, format: DocumentFormat) -> Vec<String>;
}

impl<F> SchemaValidator for F
where
    F: Fn(&Value, DocumentFormat) -> Vec<String> + Send + Sync,
{
    fn validate(&self, doc: &Value, format: DocumentFormat) -> Vec<String> {
        self(doc, format)
    }
}

#[derive(Debug, Clone, Default)]
pub struct WrapOptions {
    /// Build the tree over this batch instead of the wrapped documents'
    /// own digests. Every wrapped digest must be a member.
    pub existing_batch: Option<Vec<HashDigest>>,
    /// Keep leaves that already carry a salt.
    pub preserve_salted: bool,
    /// Target layout; also handed to the schema validator.
    pub format: DocumentFormat,
}

#[derive(Debug, Clone)]
pub struct SignRequest {
    pub algorithm: String,
    pub key: Vec<u8>,
    pub verification_method: String,
    pub created: OffsetDateTime,
}

pub struct Attestor {
    config: CoreConfig,
    signers: SignerTable,
    validator: Option<Box<dyn SchemaValidator>>,
}

impl Default for Attestor {
    fn default() -> Self {
        Self {
            config: CoreConfig::default(),
            signers: SignerTable::default(),
            validator: None,
        }
    }
}

impl std::fmt::Debug for Attestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attestor")
            .field("config", &self.config)
            .field("signers", &self.signers)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

impl Attestor {
    pub fn new(config: CoreConfig, signers: SignerTable) -> AttestResult<Self> {
        validate_config(&config)?;
        Ok(Self {
            config,
            signers,
            validator: None,
        })
    }

    pub fn with_validator(mut self, validator: impl SchemaValidator + 'static) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn signers(&self) -> &SignerTable {
        &self.signers
    }

    /// Wrap a batch of claim documents under one Merkle root.
    ///
    /// Output order follows input order.
    pub fn wrap(&self, docs: &[Value], opts: &WrapOptions) -> AttestResult<Vec<WrappedDocument>> {
        if docs.is_empty() {
            return Err(AttestError::EmptyBatch);
        }
        let batch_len = opts.existing_batch.as_ref().map_or(docs.len(), Vec::len);
        if batch_len > self.config.limits.max_batch {
            return Err(AttestError::structure(format!(
                "batch of {batch_len} exceeds limit {}",
                self.config.limits.max_batch
            )));
        }

        #[cfg(feature = "parallel")]
        let prepared: Vec<(Value, HashDigest)> = docs
            .par_iter()
            .map(|doc| self.prepare(doc, opts))
            .collect::<AttestResult<_>>()?;

        #[cfg(not(feature = "parallel"))]
        let prepared: Vec<(Value, HashDigest)> = docs
            .iter()
            .map(|doc| self.prepare(doc, opts))
            .collect::<AttestResult<_>>()?;

        let tree = match &opts.existing_batch {
            Some(batch) => MerkleTree::build(batch.clone())?,
            None => MerkleTree::build(prepared.iter().map(|(_, d)| *d).collect())?,
        };
        let root = tree.root();

        let wrapped = prepared
            .into_iter()
            .enumerate()
            .map(|(i, (data, target_hash))| {
                let proof = match opts.existing_batch {
                    Some(_) => tree.proof(&target_hash).map_err(|_| {
                        AttestError::DocumentNotInBatch(target_hash.to_hex())
                    })?,
                    None => tree.proof_at(i)?,
                };
                Ok(WrappedDocument {
                    data,
                    obfuscated_hashes: Vec::new(),
                    signature_envelope: SignatureEnvelope {
                        proof_type: self.config.hashing.proof_type.clone(),
                        target_hash,
                        merkle_root: root,
                        proof,
                    },
                    proofs: Vec::new(),
                })
            })
            .collect::<AttestResult<Vec<_>>>()?;

        tracing::info!(
            documents = wrapped.len(),
            batch = tree.len(),
            height = tree.height(),
            merkle_root = %root,
            "wrapped batch"
        );
        Ok(wrapped)
    }

    /// Wrap a single document as a batch of one.
    pub fn wrap_one(&self, doc: &Value, opts: &WrapOptions) -> AttestResult<WrappedDocument> {
        self.wrap(std::slice::from_ref(doc), opts)?
            .pop()
            .ok_or(AttestError::EmptyBatch)
    }

    fn prepare(&self, raw: &Value, opts: &WrapOptions) -> AttestResult<(Value, HashDigest)> {
        let limits = &self.config.limits;

        if let Some(validator) = &self.validator {
            let errors = if opts.preserve_salted {
                validator.validate(&unsalt_document(raw, limits)?, opts.format)
            } else {
                validator.validate(raw, opts.format)
            };
            if !errors.is_empty() {
                return Err(AttestError::Validation(errors));
            }
        }
        opts.format.check_claims(raw)?;

        let data = salt_document(raw, opts.preserve_salted, limits)?;
        let digest = digest_document(&data, &[], limits)?;
        tracing::debug!(target_hash = %digest, "salted document");
        Ok((data, digest))
    }

    pub fn obfuscate<S: AsRef<str>>(
        &self,
        doc: &WrappedDocument,
        paths: &[S],
    ) -> AttestResult<WrappedDocument> {
        obfuscate::obfuscate(doc, paths, &self.config.limits)
    }

    pub fn verify(&self, doc: &WrappedDocument) -> bool {
        self.verify_report(doc).ok
    }

    pub fn verify_report(&self, doc: &WrappedDocument) -> VerifyReport {
        verify_report(doc, &self.config)
    }

    /// Sign the document's Merkle root and append the signature to `proofs`.
    pub fn sign(&self, doc: &WrappedDocument, req: &SignRequest) -> AttestResult<WrappedDocument> {
        let root = doc.merkle_root();
        let signature = self
            .signers
            .sign(&req.algorithm, root.as_bytes(), &req.key)?;
        let created = req
            .created
            .format(&Rfc3339)
            .map_err(|e| AttestError::serialization(format!("failed to format timestamp: {e}")))?;

        let mut out = doc.clone();
        out.proofs.push(ProofEntry {
            proof_type: crate::SIGNATURE_PROOF_TYPE.to_string(),
            algorithm: req.algorithm.clone(),
            created,
            verification_method: req.verification_method.clone(),
            signature: hex::encode(signature),
        });

        tracing::debug!(
            algorithm = %req.algorithm,
            merkle_root = %root,
            signatures = out.proofs.len(),
            "signed document"
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LimitsConfig;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn docs(n: usize) -> Vec<Value> {
        (0..n).map(|i| Value::from(json!({"id": i}))).collect()
    }

    #[test]
    fn empty_batch() {
        let a = Attestor::default();
        assert_matches!(a.wrap(&[], &WrapOptions::default()), Err(AttestError::EmptyBatch));
    }

    #[test]
    fn batch_shares_root() {
        let a = Attestor::default();
        let out = a.wrap(&docs(3), &WrapOptions::default()).unwrap();
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|d| d.merkle_root() == out[0].merkle_root()));
        assert!(out.iter().all(|d| a.verify(d)));
    }

    #[test]
    fn validator_rejects() {
        let a = Attestor::default().with_validator(|doc: &Value, _: DocumentFormat| {
            if doc.get("id").is_some() {
                vec!["id is not allowed".to_string()]
            } else {
                vec![]
            }
        });
        assert_matches!(
            a.wrap(&docs(1), &WrapOptions::default()),
            Err(AttestError::Validation(errs)) if errs == vec!["id is not allowed".to_string()]
        );
    }

    #[test]
    fn batch_limit() {
        let cfg = CoreConfig {
            limits: LimitsConfig {
                max_batch: 2,
                ..LimitsConfig::default()
            },
            ..CoreConfig::default()
        };
        let a = Attestor::new(cfg, SignerTable::new()).unwrap();
        assert_matches!(a.wrap(&docs(3), &WrapOptions::default()), Err(AttestError::Structure(_)));
    }

    #[test]
    fn sign_appends() {
        let signers = SignerTable::new().with("echo", |m: &[u8], _k: &[u8]| Ok::<_, AttestError>(m.to_vec()));
        let a = Attestor::new(CoreConfig::default(), signers).unwrap();
        let doc = a.wrap_one(&docs(1)[0], &WrapOptions::default()).unwrap();

        let req = SignRequest {
            algorithm: "echo".to_string(),
            key: vec![],
            verification_method: "did:example:issuer#key-1".to_string(),
            created: OffsetDateTime::UNIX_EPOCH,
        };
        let once = a.sign(&doc, &req).unwrap();
        let twice = a.sign(&once, &req).unwrap();

        assert_eq!(twice.proofs.len(), 2);
        assert_eq!(twice.proofs[0], once.proofs[0]);
        assert_eq!(once.proofs[0].signature, doc.merkle_root().to_hex());
        assert_eq!(once.proofs[0].created, "1970-01-01T00:00:00Z");
        assert!(a.verify(&twice));
    }
}
