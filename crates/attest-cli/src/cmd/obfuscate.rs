use anyhow::{anyhow, Result};
use serde::Serialize;

use attest_core::format;
use attest_core::wrap::Attestor;

use crate::io::{export, input};
use crate::output;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObfuscateOut {
    pub out: String,
    pub redacted_paths: Vec<String>,
    pub obfuscated_hashes: usize,
}

pub fn run(file: &str, paths: &[String], out: Option<&str>, max_bytes: usize) -> Result<()> {
    let attestor = Attestor::default();
    let (fmt, doc) = input::read_wrapped(file, max_bytes)?;

    if !attestor.verify(&doc) {
        tracing::warn!(file, "redacting a document that does not verify");
    }

    let redacted = attestor
        .obfuscate(&doc, paths)
        .map_err(|e| anyhow!("{file}: {e}"))?;

    match out {
        Some(path) => {
            export::write_wrapped(path, fmt, &redacted)?;
            output::print(&ObfuscateOut {
                out: path.to_string(),
                redacted_paths: paths.to_vec(),
                obfuscated_hashes: redacted.obfuscated_count(),
            })
        }
        None => {
            println!("{}", format::to_json_string(fmt, &redacted)?);
            Ok(())
        }
    }
}
