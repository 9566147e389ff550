//! Error types for attest-core.
//!
//! Every failure in this crate is local and recoverable. Verification never
//! returns an error for a mismatch; see `crate::verify`.

use thiserror::Error;

/// Result alias used across the crate.
pub type AttestResult<T> = Result<T, AttestError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttestError {
    /// A map key contains the path separator or an index bracket.
    #[error("invalid key {key:?}: keys must not contain '.', '[' or ']'")]
    InvalidKey { key: String },

    /// A salted token carries a type tag this codec does not know.
    #[error("unknown type tag {tag:?} in salted token")]
    UnknownTypeTag { tag: String },

    /// A salted token has a known tag but an unparsable value.
    #[error("malformed salted token: {0}")]
    MalformedToken(String),

    /// A proof was requested for a hash that is not a leaf of the tree.
    #[error("element not found in merkle tree: {0}")]
    ElementNotFound(String),

    /// A freshly computed digest is absent from the batch the caller supplied.
    #[error("document digest {0} is not part of the supplied batch")]
    DocumentNotInBatch(String),

    /// Redaction was asked for a field that is not visible in the document.
    #[error("path not found in document: {0}")]
    PathNotFound(String),

    /// No signer is registered under the requested algorithm identifier.
    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// A batch must hold at least one document.
    #[error("batch is empty")]
    EmptyBatch,

    /// Input tree is structurally unusable (too deep, too many leaves).
    #[error("structural error: {0}")]
    Structure(String),

    /// The schema validator rejected a document.
    #[error("document failed validation: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// A registered signer failed.
    #[error("signing failed: {0}")]
    Signing(String),
}

impl AttestError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    pub fn structure(msg: impl Into<String>) -> Self {
        Self::Structure(msg.into())
    }

    pub fn malformed_token(msg: impl Into<String>) -> Self {
        Self::MalformedToken(msg.into())
    }

    /// Stable machine-readable code, used in reports and CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidKey { .. } => "invalid_key",
            Self::UnknownTypeTag { .. } => "unknown_type_tag",
            Self::MalformedToken(_) => "malformed_token",
            Self::ElementNotFound(_) => "element_not_found",
            Self::DocumentNotInBatch(_) => "document_not_in_batch",
            Self::PathNotFound(_) => "path_not_found",
            Self::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            Self::EmptyBatch => "empty_batch",
            Self::Structure(_) => "structure",
            Self::Validation(_) => "validation",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Serialization(_) => "serialization",
            Self::Signing(_) => "signing",
        }
    }
}

impl From<serde_json::Error> for AttestError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
