use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

use attest_core::document::WrappedDocument;
use attest_core::format::{self, DocumentFormat};

/// Write a wrapped document in the given layout, creating parent directories.
pub fn write_wrapped<P: AsRef<Path>>(path: P, format: DocumentFormat, doc: &WrappedDocument) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, format::to_json_string(format, doc)?)?;
    Ok(())
}

/// Output path for a wrapped input. Names are taken from the input file;
/// a repeated name gets a numeric suffix.
pub fn output_path(out_dir: &Path, input: &Path, taken: &mut Vec<PathBuf>) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("invalid input file name: {}", input.display()))?;

    let mut candidate = out_dir.join(format!("{stem}.json"));
    let mut n = 1;
    while taken.contains(&candidate) {
        candidate = out_dir.join(format!("{stem}-{n}.json"));
        n += 1;
    }
    taken.push(candidate.clone());
    Ok(candidate)
}
