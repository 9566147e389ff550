use anyhow::{anyhow, Result};
use serde::Serialize;

use attest_core::verify::VerifyLevel;
use attest_core::wrap::Attestor;

use crate::io::input;
use crate::output;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOut {
    pub file: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub findings: Vec<FindingOut>,
}

#[derive(Debug, Serialize)]
pub struct FindingOut {
    pub level: &'static str,
    pub code: String,
    pub message: String,
}

pub fn run(files: &[String], max_bytes: usize) -> Result<()> {
    let attestor = Attestor::default();
    let results: Vec<VerifyOut> = files.iter().map(|f| check(&attestor, f, max_bytes)).collect();

    if output::is_json() {
        output::print(&results)?;
    } else {
        for r in &results {
            output::verdict(r.ok, if r.ok { "VALID" } else { "INVALID" }, &r.file)?;
            for f in r.findings.iter().filter(|f| f.level == "error") {
                output::eprintln_line(&format!("  {}: {}", f.code, f.message));
            }
        }
    }

    let failed = results.iter().filter(|r| !r.ok).count();
    if failed > 0 {
        return Err(anyhow!("{failed} of {} document(s) failed verification", results.len()));
    }
    Ok(())
}

fn check(attestor: &Attestor, file: &str, max_bytes: usize) -> VerifyOut {
    let (format, doc) = match input::read_wrapped(file, max_bytes) {
        Ok(x) => x,
        Err(e) => {
            tracing::warn!(file, error = %e, "unreadable document");
            return VerifyOut {
                file: file.to_string(),
                ok: false,
                version: None,
                findings: vec![FindingOut {
                    level: "error",
                    code: "read.error".to_string(),
                    message: e.to_string(),
                }],
            };
        }
    };

    let report = attestor.verify_report(&doc);
    VerifyOut {
        file: file.to_string(),
        ok: report.ok,
        version: Some(format.as_str().to_string()),
        findings: report
            .findings
            .into_iter()
            .map(|f| FindingOut {
                level: level_str(f.level),
                code: f.code,
                message: f.message,
            })
            .collect(),
    }
}

fn level_str(level: VerifyLevel) -> &'static str {
    match level {
        VerifyLevel::Info => "info",
        VerifyLevel::Warning => "warning",
        VerifyLevel::Error => "error",
    }
}
