use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use walkdir::WalkDir;

use attest_core::document::WrappedDocument;
use attest_core::format::{self, DocumentFormat};

/// Expand files and directories into a sorted list of JSON files.
///
/// Directories are walked recursively; only `*.json` entries are taken.
pub fn collect_json_files(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        let p = Path::new(input);
        if p.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(p)
                .follow_links(false)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| p.extension().map(|x| x == "json").unwrap_or(false))
                .collect();
            found.sort();
            files.extend(found);
        } else if p.is_file() {
            files.push(p.to_path_buf());
        } else {
            return Err(anyhow!("input not found: {input}"));
        }
    }
    if files.is_empty() {
        return Err(anyhow!("no JSON inputs found"));
    }
    Ok(files)
}

pub fn read_json_file<P: AsRef<Path>>(path: P, max_bytes: usize) -> Result<serde_json::Value> {
    let path = path.as_ref();
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    format::parse_json_bytes(&raw, max_bytes).map_err(|e| anyhow!("{}: {e}", path.display()))
}

pub fn read_wrapped<P: AsRef<Path>>(path: P, max_bytes: usize) -> Result<(DocumentFormat, WrappedDocument)> {
    let path = path.as_ref();
    let v = read_json_file(path, max_bytes)?;
    format::read(&v).map_err(|e| anyhow!("{}: not a wrapped document: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directories_expand_to_sorted_json_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::write(dir.path().join("nested").join("c.json"), "{}").unwrap();

        let files = collect_json_files(&[dir.path().display().to_string()]).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().display().to_string())
            .collect();
        assert_eq!(names, vec!["a.json", "b.json", "nested/c.json"]);
    }

    #[test]
    fn missing_input_is_an_error() {
        assert!(collect_json_files(&["/definitely/not/here.json".to_string()]).is_err());
    }

    #[test]
    fn oversized_file_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("big.json");
        fs::write(&p, r#"{"a": "0123456789"}"#).unwrap();
        assert!(read_json_file(&p, 4).is_err());
        assert!(read_json_file(&p, 1024).is_ok());
    }
}
