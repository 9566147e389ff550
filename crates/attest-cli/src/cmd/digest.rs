use anyhow::{anyhow, Result};
use serde::Serialize;

use attest_core::config::CoreConfig;
use attest_core::digest::digest_document;

use crate::io::input;
use crate::output;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestOut {
    pub target_hash: String,
    pub stored_target_hash: String,
    pub matches: bool,
}

pub fn run(file: &str, max_bytes: usize) -> Result<()> {
    let cfg = CoreConfig::default();
    let (_, doc) = input::read_wrapped(file, max_bytes)?;
    let computed = digest_document(&doc.data, &doc.obfuscated_hashes, &cfg.limits)
        .map_err(|e| anyhow!("{file}: {e}"))?;

    output::print(&DigestOut {
        target_hash: computed.to_hex(),
        stored_target_hash: doc.target_hash().to_hex(),
        matches: computed == *doc.target_hash(),
    })
}
