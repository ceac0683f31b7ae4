//! Ingestion of the scan collaborator's saved results.
//!
//! A scan run leaves a directory `<base>/<app>/<run>/` containing
//! `summary.txt` (key: value lines, must include `root:`) and up to three
//! path-list files. Paths in the lists are absolute; everything downstream
//! works on [`RelPath`] values computed against the root.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ScanError;
use crate::types::RelPath;

/// Ordered scan inputs for one application run.
#[derive(Debug, Clone)]
pub struct ScanResults {
    pub scan_dir: PathBuf,
    pub root: PathBuf,
    pub code_files: Vec<PathBuf>,
    pub doc_files: Vec<PathBuf>,
    pub folders: Vec<PathBuf>,
}

impl ScanResults {
    /// Read a saved scan-results directory. Missing list files read as empty;
    /// a missing `summary.txt` or `root:` key is an error.
    pub fn read(scan_dir: &Path) -> Result<Self, ScanError> {
        let summary = scan_dir.join("summary.txt");
        if !summary.exists() {
            return Err(ScanError::MissingSummary(scan_dir.display().to_string()));
        }

        let meta = read_key_value(&summary)?;
        let root = meta
            .get("root")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ScanError::MissingRoot(summary.display().to_string()))?;
        let root = PathBuf::from(root);

        let code_files = read_path_list(&scan_dir.join("code_files.txt"))?;
        let doc_files = read_path_list(&scan_dir.join("document_files.txt"))?;
        let folders = read_path_list(&scan_dir.join("folders.txt"))?;

        debug!(
            code = code_files.len(),
            docs = doc_files.len(),
            folders = folders.len(),
            root = %root.display(),
            "Loaded scan results"
        );

        Ok(Self {
            scan_dir: scan_dir.to_path_buf(),
            root,
            code_files,
            doc_files,
            folders,
        })
    }

    /// Root-relative path for an absolute scan entry.
    pub fn rel(&self, abs: &Path) -> RelPath {
        RelPath::from_absolute(&self.root, abs)
    }
}

/// Identifies the application and run a scan directory belongs to, and where
/// its summary database lives under the output base directory.
#[derive(Debug, Clone)]
pub struct RunLocator {
    pub application: String,
    pub run: String,
    pub db_path: PathBuf,
}

impl RunLocator {
    /// Derive app/run names from the last two segments of the scan directory.
    pub fn from_scan_dir(scan_dir: &Path, base_dir: &Path) -> Result<Self, ScanError> {
        let run = scan_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ScanError::Layout(scan_dir.display().to_string()))?;
        let application = scan_dir
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ScanError::Layout(scan_dir.display().to_string()))?;

        let db_path = base_dir.join(&application).join(&run).join("strata.db");
        Ok(Self {
            application,
            run,
            db_path,
        })
    }
}

fn read_path_list(file: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !file.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(file)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect())
}

fn read_key_value(file: &Path) -> Result<HashMap<String, String>, ScanError> {
    let content = std::fs::read_to_string(file)?;
    let mut map = HashMap::new();
    for line in content.lines() {
        let t = line.trim();
        if t.is_empty() {
            continue;
        }
        let Some((k, v)) = t.split_once(':') else {
            continue;
        };
        let k = k.trim();
        if !k.is_empty() {
            map.insert(k.to_string(), v.trim().to_string());
        }
    }
    Ok(map)
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn write_scan_dir(dir: &Path, root: &Path, code: &[&str]) {
        std::fs::write(
            dir.join("summary.txt"),
            format!("app: demo\nroot: {}\n", root.display()),
        )
        .unwrap();
        let list: String = code
            .iter()
            .map(|c| format!("{}\n", root.join(c).display()))
            .collect();
        std::fs::write(dir.join("code_files.txt"), list).unwrap();
    }

    #[test]
    fn reads_summary_and_lists() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("project");
        let scan = tmp.path().join("results").join("demo").join("run-1");
        std::fs::create_dir_all(&scan).unwrap();
        write_scan_dir(&scan, &root, &["src/main.rs", "src/lib.rs"]);

        let results = ScanResults::read(&scan).unwrap();
        assert_eq!(results.root, root);
        assert_eq!(results.code_files.len(), 2);
        // Missing list files read as empty.
        assert!(results.doc_files.is_empty());
        assert!(results.folders.is_empty());

        let rel = results.rel(&results.code_files[0]);
        assert_eq!(rel.to_string(), "src/main.rs");
    }

    #[test]
    fn missing_summary_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = ScanResults::read(tmp.path()).unwrap_err();
        assert!(matches!(err, ScanError::MissingSummary(_)));
    }

    #[test]
    fn missing_root_key_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("summary.txt"), "app: demo\n").unwrap();
        let err = ScanResults::read(tmp.path()).unwrap_err();
        assert!(matches!(err, ScanError::MissingRoot(_)));
    }

    #[test]
    fn blank_lines_in_lists_are_dropped() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("summary.txt"), "root: /repo\n").unwrap();
        std::fs::write(
            tmp.path().join("code_files.txt"),
            "/repo/a.java\n\n   \n/repo/b.java\n",
        )
        .unwrap();
        let results = ScanResults::read(tmp.path()).unwrap();
        assert_eq!(results.code_files.len(), 2);
    }

    #[test]
    fn run_locator_uses_last_two_segments() {
        let loc =
            RunLocator::from_scan_dir(Path::new("/out/results/demo/run-3"), Path::new("sums"))
                .unwrap();
        assert_eq!(loc.application, "demo");
        assert_eq!(loc.run, "run-3");
        assert_eq!(loc.db_path, Path::new("sums/demo/run-3/strata.db"));
    }
}
