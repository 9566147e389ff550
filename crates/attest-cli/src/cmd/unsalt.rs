use anyhow::{anyhow, Result};

use attest_core::config::CoreConfig;

use crate::io::input;
use crate::output;

pub fn run(file: &str, max_bytes: usize) -> Result<()> {
    let cfg = CoreConfig::default();
    let (_, doc) = input::read_wrapped(file, max_bytes)?;
    let plain = doc
        .plain_data(&cfg.limits)
        .map_err(|e| anyhow!("{file}: {e}"))?;
    output::print(&plain.to_json())
}
