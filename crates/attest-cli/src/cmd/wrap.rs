use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use time::format_description::well_known::Rfc3339;

use attest_core::format::DocumentFormat;
use attest_core::value::Value;
use attest_core::wrap::{Attestor, WrapOptions};

use crate::io::{export, input};
use crate::output;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WrapOut {
    pub documents: usize,
    pub merkle_root: String,
    pub version: String,
    pub out_dir: String,
    pub files: Vec<String>,
    pub wrapped_at: String,
}

pub fn run(
    inputs: &[String],
    out_dir: &str,
    format: &str,
    preserve_salted: bool,
    max_bytes: usize,
) -> Result<()> {
    let format = DocumentFormat::parse(format)?;
    let files = input::collect_json_files(inputs)?;

    let pb = progress(files.len() as u64)?;

    pb.set_message("reading");
    let mut docs = Vec::with_capacity(files.len());
    for f in &files {
        docs.push(Value::from(input::read_json_file(f, max_bytes)?));
        pb.inc(1);
    }

    pb.set_message("wrapping");
    let opts = WrapOptions {
        preserve_salted,
        format,
        ..WrapOptions::default()
    };
    let wrapped = Attestor::default().wrap(&docs, &opts).map_err(|e| anyhow!("wrap failed: {e}"))?;

    pb.set_position(0);
    pb.set_message("writing");
    let out_root = Path::new(out_dir);
    let mut taken: Vec<PathBuf> = Vec::with_capacity(files.len());
    for (src, doc) in files.iter().zip(&wrapped) {
        let dest = export::output_path(out_root, src, &mut taken)?;
        export::write_wrapped(&dest, format, doc)?;
        pb.inc(1);
    }
    pb.finish_and_clear();

    let merkle_root = wrapped
        .first()
        .map(|d| d.merkle_root().to_hex())
        .ok_or_else(|| anyhow!("nothing was wrapped"))?;

    output::print(&WrapOut {
        documents: wrapped.len(),
        merkle_root,
        version: format.as_str().to_string(),
        out_dir: out_dir.to_string(),
        files: taken.iter().map(|p| p.display().to_string()).collect(),
        wrapped_at: time::OffsetDateTime::now_utc().format(&Rfc3339)?,
    })
}

fn progress(len: u64) -> Result<ProgressBar> {
    let pb = if output::is_json() {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(len)
    };
    pb.set_style(ProgressStyle::with_template("{msg:>8} [{bar:32}] {pos}/{len}")?.progress_chars("=> "));
    Ok(pb)
}
