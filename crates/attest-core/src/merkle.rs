//! Merkle batching of document digests.
//!
//! Tree rules:
//! - leaves are the batch digests, in caller order
//! - each layer pairs nodes left to right; an odd trailing node is promoted
//!   unchanged (no duplication, no padding)
//! - `combine(a, b) = keccak256(min(a, b) || max(a, b))`
//!
//! Because siblings are sorted before hashing, a proof is just the list of
//! sibling hashes; no left/right flags are needed to verify it.

use crate::errors::{AttestError, AttestResult};
use crate::hash::{keccak256, HashDigest, HASH_LEN};

/// Hash two siblings. An absent side passes the other through.
pub fn combine(a: Option<&HashDigest>, b: Option<&HashDigest>) -> Option<HashDigest> {
    match (a, b) {
        (Some(a), Some(b)) => {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let mut buf = [0u8; 2 * HASH_LEN];
            buf[..HASH_LEN].copy_from_slice(lo.as_bytes());
            buf[HASH_LEN..].copy_from_slice(hi.as_bytes());
            Some(keccak256(&buf))
        }
        (Some(x), None) | (None, Some(x)) => Some(*x),
        (None, None) => None,
    }
}

/// A fully materialized Merkle tree.
///
/// `layers[0]` holds the leaves, the last layer holds the single root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    layers: Vec<Vec<HashDigest>>,
}

impl MerkleTree {
    /// Build a tree over a non-empty batch.
    pub fn build(leaves: Vec<HashDigest>) -> AttestResult<Self> {
        if leaves.is_empty() {
            return Err(AttestError::EmptyBatch);
        }

        let mut layers = vec![leaves];
        while let Some(top) = layers.last() {
            if top.len() <= 1 {
                break;
            }
            let next = next_layer(top);
            layers.push(next);
        }

        tracing::debug!(
            leaves = layers[0].len(),
            height = layers.len() - 1,
            "built merkle tree"
        );
        Ok(Self { layers })
    }

    pub fn root(&self) -> HashDigest {
        // build() guarantees a non-empty top layer
        self.layers[self.layers.len() - 1][0]
    }

    pub fn leaves(&self) -> &[HashDigest] {
        &self.layers[0]
    }

    pub fn layers(&self) -> &[Vec<HashDigest>] {
        &self.layers
    }

    /// Number of layers above the leaves.
    pub fn height(&self) -> usize {
        self.layers.len() - 1
    }

    pub fn len(&self) -> usize {
        self.layers[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers[0].is_empty()
    }

    pub fn contains(&self, leaf: &HashDigest) -> bool {
        self.layers[0].contains(leaf)
    }

    /// Inclusion proof for the first leaf equal to `leaf`.
    pub fn proof(&self, leaf: &HashDigest) -> AttestResult<Vec<HashDigest>> {
        let index = self.layers[0]
            .iter()
            .position(|l| l == leaf)
            .ok_or_else(|| AttestError::ElementNotFound(leaf.to_hex()))?;
        self.proof_at(index)
    }

    /// Inclusion proof for the leaf at `index`.
    pub fn proof_at(&self, mut index: usize) -> AttestResult<Vec<HashDigest>> {
        if index >= self.len() {
            return Err(AttestError::ElementNotFound(format!("leaf index {index}")));
        }

        let mut proof = Vec::with_capacity(self.height());
        for layer in &self.layers[..self.height()] {
            let pair = if index % 2 == 1 { index - 1 } else { index + 1 };
            if let Some(sibling) = layer.get(pair) {
                proof.push(*sibling);
            }
            index /= 2;
        }
        Ok(proof)
    }
}

fn next_layer(layer: &[HashDigest]) -> Vec<HashDigest> {
    layer
        .chunks(2)
        .filter_map(|pair| combine(pair.first(), pair.get(1)))
        .collect()
}

/// Check that `proof` folds `leaf` up to `root`.
pub fn verify_proof(proof: &[HashDigest], root: &HashDigest, leaf: &HashDigest) -> bool {
    let computed = proof
        .iter()
        .fold(*leaf, |acc, sibling| combine(Some(&acc), Some(sibling)).unwrap_or(acc));
    computed == *root
}
