//! Batch Processing Module
//!
//! File discovery for a conversion run and the per-run counters.

use crate::common_utils::{path_matches_suffix, ExtensionMatch};
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Recursively collects regular files under `dir` whose name ends with `suffix`.
///
/// Unreadable entries are logged and skipped. The result is sorted so runs are
/// reproducible; nothing downstream depends on the order.
pub fn collect_files_with_suffix(dir: &Path, suffix: &str, mode: ExtensionMatch) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                warn!(error = %err, "⚠️ Skipping unreadable entry during discovery");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| path_matches_suffix(e.path(), suffix, mode))
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}

/// Counters for one conversion run. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub found: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub errored: usize,
    /// Jobs never started because the run was cancelled or aborted
    pub cancelled: usize,
    pub errors: Vec<(PathBuf, String)>,
}

impl RunSummary {
    pub fn new(found: usize) -> Self {
        Self {
            found,
            ..Self::default()
        }
    }

    pub fn success(&mut self) {
        self.succeeded += 1;
    }

    pub fn skip(&mut self) {
        self.skipped += 1;
    }

    pub fn fail(&mut self, path: PathBuf, error: String) {
        self.errored += 1;
        self.errors.push((path, error));
    }

    pub fn cancel(&mut self) {
        self.cancelled += 1;
    }

    /// Jobs that reached a final state (converted, skipped or failed).
    pub fn processed(&self) -> usize {
        self.succeeded + self.skipped + self.errored
    }

    pub fn has_errors(&self) -> bool {
        self.errored > 0
    }

    pub fn success_rate(&self) -> f64 {
        let attempted = self.succeeded + self.errored;
        if attempted == 0 {
            100.0
        } else {
            (self.succeeded as f64 / attempted as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_run_summary_new() {
        let summary = RunSummary::new(7);
        assert_eq!(summary.found, 7);
        assert_eq!(summary.processed(), 0);
        assert!(summary.errors.is_empty());
    }

    #[test]
    fn test_run_summary_mixed() {
        let mut summary = RunSummary::new(5);
        summary.success();
        summary.success();
        summary.skip();
        summary.fail(PathBuf::from("a.snu"), "exit code 1".to_string());
        summary.cancel();

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.errored, 1);
        assert_eq!(summary.cancelled, 1);
        assert_eq!(summary.processed() + summary.cancelled, summary.found);
        assert!(summary.has_errors());
        assert_eq!(summary.errors[0].1, "exit code 1");
    }

    #[test]
    fn test_success_rate_ignores_skips() {
        let mut summary = RunSummary::new(4);
        summary.success();
        summary.skip();
        summary.skip();
        summary.fail(PathBuf::from("x.snu"), "E".to_string());
        assert!((summary.success_rate() - 50.0).abs() < 0.001);

        let empty = RunSummary::new(0);
        assert!((empty.success_rate() - 100.0).abs() < 0.001);
    }

    #[test]
    fn test_collect_files_with_suffix_recursive() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("EN/amb_fore")).unwrap();
        fs::write(root.join("a.snu"), b"x").unwrap();
        fs::write(root.join("EN/amb_fore/b.SNU"), b"x").unwrap();
        fs::write(root.join("EN/c.wav"), b"x").unwrap();
        fs::create_dir_all(root.join("dir.snu")).unwrap();

        let insensitive = collect_files_with_suffix(root, ".snu", ExtensionMatch::CaseInsensitive);
        assert_eq!(
            insensitive,
            vec![root.join("EN/amb_fore/b.SNU"), root.join("a.snu")]
        );

        let sensitive = collect_files_with_suffix(root, ".snu", ExtensionMatch::CaseSensitive);
        assert_eq!(sensitive, vec![root.join("a.snu")]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_collect_files_keeps_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = TempDir::new().unwrap();
        let odd = tmp.path().join(OsStr::from_bytes(b"voice_\xff.snu"));
        fs::write(&odd, b"x").unwrap();
        fs::write(tmp.path().join("ok.snu"), b"x").unwrap();

        let found = collect_files_with_suffix(tmp.path(), ".snu", ExtensionMatch::default());
        assert_eq!(found.len(), 2);
        assert!(found.contains(&odd));
    }

    #[test]
    fn test_collect_files_empty_dir() {
        let tmp = TempDir::new().unwrap();
        assert!(collect_files_with_suffix(tmp.path(), ".snu", ExtensionMatch::default()).is_empty());
    }
}
