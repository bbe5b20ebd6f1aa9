//! Directory classifier
//!
//! Sorts the immediate subdirectories of the audio source root into two
//! buckets: `Global` for streams shared by every locale and `EN` for the
//! rest. Locale folders on the blacklist stay where they are.
//!
//! Moves are plain renames; nothing is overwritten or merged, so a second
//! pass over an organized tree is a no-op.

use shared_utils::error_handler::{handle_error, ErrorCategory};
use shared_utils::{check_dangerous_directory, ConvertError};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const EN_BUCKET: &str = "EN";
pub const GLOBAL_BUCKET: &str = "Global";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// One of the bucket directories themselves
    Bucket,
    Blacklisted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Skip(SkipReason),
    Global,
    En,
}

impl Classification {
    /// Destination bucket, `None` for skipped names.
    pub fn bucket(&self) -> Option<&'static str> {
        match self {
            Classification::Skip(_) => None,
            Classification::Global => Some(GLOBAL_BUCKET),
            Classification::En => Some(EN_BUCKET),
        }
    }
}

/// Name-based partition of source subdirectories.
///
/// Blacklist and global-set lookups ignore ASCII case. Bucket names must
/// match exactly: on a case-sensitive filesystem `en` is an ordinary folder.
#[derive(Debug, Clone, Default)]
pub struct ClassificationRule {
    blacklist: HashSet<String>,
    global: HashSet<String>,
}

impl ClassificationRule {
    pub fn new<B, G>(blacklist: B, global: G) -> Self
    where
        B: IntoIterator,
        B::Item: AsRef<str>,
        G: IntoIterator,
        G::Item: AsRef<str>,
    {
        Self {
            blacklist: blacklist
                .into_iter()
                .map(|n| n.as_ref().to_ascii_lowercase())
                .collect(),
            global: global
                .into_iter()
                .map(|n| n.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn classify(&self, name: &str) -> Classification {
        if name == EN_BUCKET || name == GLOBAL_BUCKET {
            return Classification::Skip(SkipReason::Bucket);
        }
        let lower = name.to_ascii_lowercase();
        if self.blacklist.contains(&lower) {
            Classification::Skip(SkipReason::Blacklisted)
        } else if self.global.contains(&lower) {
            Classification::Global
        } else {
            Classification::En
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizeSummary {
    pub moved: usize,
    pub skipped: usize,
    pub errored: usize,
    pub errors: Vec<(PathBuf, String)>,
}

/// Moves every immediate subdirectory of `source_root` into its bucket.
///
/// Files directly under `source_root` are left alone. A directory whose
/// destination already exists is skipped with a warning; failed renames are
/// counted and the pass continues.
pub fn organize(source_root: &Path, rule: &ClassificationRule) -> Result<OrganizeSummary, ConvertError> {
    if !source_root.is_dir() {
        return Err(ConvertError::SourceMissing(source_root.to_path_buf()));
    }
    check_dangerous_directory(source_root, "organize directories").map_err(ConvertError::UnsafeDirectory)?;

    for bucket in [EN_BUCKET, GLOBAL_BUCKET] {
        let dir = source_root.join(bucket);
        fs::create_dir_all(&dir).map_err(|source| ConvertError::CreateDir { path: dir, source })?;
    }

    let read_dir = fs::read_dir(source_root).map_err(|source| ConvertError::ReadDir {
        path: source_root.to_path_buf(),
        source,
    })?;
    let mut names: Vec<_> = read_dir
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                warn!(error = %err, "⚠️ Skipping unreadable entry in {}", source_root.display());
                None
            }
        })
        .filter(|e| e.path().is_dir())
        .map(|e| e.file_name())
        .collect();
    names.sort();

    info!("📂 Organizing {} directories in {}", names.len(), source_root.display());

    let mut summary = OrganizeSummary::default();
    for name in names {
        let display_name = name.to_string_lossy();
        let classification = rule.classify(&display_name);
        let Some(bucket) = classification.bucket() else {
            debug!(directory = %display_name, ?classification, "Left in place");
            summary.skipped += 1;
            continue;
        };

        let from = source_root.join(&name);
        let to = source_root.join(bucket).join(&name);
        if to.exists() {
            handle_error(
                ErrorCategory::Optional,
                &from.display().to_string(),
                &format!("{} already exists, not moving", to.display()),
            );
            summary.skipped += 1;
            continue;
        }

        match fs::rename(&from, &to) {
            Ok(()) => {
                info!("📦 {} → {}/", display_name, bucket);
                summary.moved += 1;
            }
            Err(err) => {
                handle_error(ErrorCategory::Recoverable, &from.display().to_string(), &err);
                summary.errored += 1;
                summary.errors.push((from, err.to_string()));
            }
        }
    }

    info!(
        "✅ Organize complete: {} moved, {} skipped, {} errors",
        summary.moved, summary.skipped, summary.errored
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn rule() -> ClassificationRule {
        ClassificationRule::new(["IT", "ES", "FR"], ["amb_airc", "gts_full"])
    }

    fn mkdirs(root: &Path, names: &[&str]) {
        for name in names {
            fs::create_dir_all(root.join(name)).unwrap();
        }
    }

    #[test]
    fn test_classify() {
        let rule = rule();
        assert_eq!(rule.classify("EN"), Classification::Skip(SkipReason::Bucket));
        assert_eq!(rule.classify("Global"), Classification::Skip(SkipReason::Bucket));
        assert_eq!(rule.classify("IT"), Classification::Skip(SkipReason::Blacklisted));
        assert_eq!(rule.classify("amb_airc"), Classification::Global);
        assert_eq!(rule.classify("vo_intro"), Classification::En);
    }

    #[test]
    fn test_classify_ignores_ascii_case() {
        let rule = rule();
        assert_eq!(rule.classify("it"), Classification::Skip(SkipReason::Blacklisted));
        assert_eq!(rule.classify("AMB_AIRC"), Classification::Global);
    }

    #[test]
    fn test_bucket_names_match_exactly() {
        let rule = rule();
        assert_eq!(rule.classify("en"), Classification::En);
        assert_eq!(rule.classify("GLOBAL"), Classification::En);
        assert_eq!(
            ClassificationRule::new(["IT"], ["global"]).classify("global"),
            Classification::Global
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_organize_routes_lowercase_bucket_lookalikes() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        mkdirs(root, &["en", "global"]);

        let summary = organize(root, &rule()).unwrap();
        assert_eq!(summary.moved, 2);
        assert_eq!(summary.skipped, 2);
        assert!(!root.join("en").exists());
        assert!(!root.join("global").exists());
        assert!(root.join("EN/en").is_dir());
        assert!(root.join("EN/global").is_dir());

        let again = organize(root, &rule()).unwrap();
        assert_eq!(again.moved, 0);
    }

    #[test]
    fn test_blacklist_wins_over_global() {
        let rule = ClassificationRule::new(["shared"], ["shared"]);
        assert_eq!(rule.classify("shared"), Classification::Skip(SkipReason::Blacklisted));
    }

    #[test]
    fn test_organize_moves_into_buckets() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        mkdirs(root, &["amb_airc/sub", "vo_intro", "IT", "FR"]);
        fs::write(root.join("amb_airc/sub/a.snu"), b"x").unwrap();
        fs::write(root.join("readme.txt"), b"x").unwrap();

        let summary = organize(root, &rule()).unwrap();
        assert_eq!(summary.moved, 2);
        assert_eq!(summary.errored, 0);

        assert!(root.join("Global/amb_airc/sub/a.snu").is_file());
        assert!(root.join("EN/vo_intro").is_dir());
        assert!(root.join("IT").is_dir());
        assert!(root.join("FR").is_dir());
        assert!(root.join("readme.txt").is_file());
        assert!(!root.join("amb_airc").exists());
    }

    #[test]
    fn test_organize_creates_buckets_on_empty_root() {
        let tmp = TempDir::new().unwrap();
        let summary = organize(tmp.path(), &rule()).unwrap();
        assert_eq!(summary, OrganizeSummary::default());
        assert!(tmp.path().join(EN_BUCKET).is_dir());
        assert!(tmp.path().join(GLOBAL_BUCKET).is_dir());
    }

    #[test]
    fn test_organize_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        mkdirs(root, &["amb_airc", "vo_intro", "ES"]);

        organize(root, &rule()).unwrap();
        let second = organize(root, &rule()).unwrap();

        assert_eq!(second.moved, 0);
        assert_eq!(second.errored, 0);
        // EN, Global and ES
        assert_eq!(second.skipped, 3);
        assert!(root.join("Global/amb_airc").is_dir());
        assert!(root.join("EN/vo_intro").is_dir());
    }

    #[test]
    fn test_organize_never_overwrites() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        mkdirs(root, &["EN/vo_intro", "vo_intro"]);
        fs::write(root.join("EN/vo_intro/old.snu"), b"old").unwrap();
        fs::write(root.join("vo_intro/new.snu"), b"new").unwrap();

        let summary = organize(root, &rule()).unwrap();
        assert_eq!(summary.moved, 0);
        assert_eq!(summary.errored, 0);

        assert_eq!(fs::read(root.join("EN/vo_intro/old.snu")).unwrap(), b"old");
        assert!(!root.join("EN/vo_intro/new.snu").exists());
        assert_eq!(fs::read(root.join("vo_intro/new.snu")).unwrap(), b"new");
    }

    #[test]
    fn test_organize_missing_source() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        assert!(matches!(
            organize(&missing, &rule()),
            Err(ConvertError::SourceMissing(p)) if p == missing
        ));
        assert!(!missing.exists());
    }

    #[test]
    fn test_organize_refuses_system_directory() {
        assert!(matches!(
            organize(Path::new("/usr"), &rule()),
            Err(ConvertError::UnsafeDirectory(_))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_organize_partitions_disjointly(
            names in prop::collection::btree_set("[a-z_]{1,8}", 0..8),
            global in prop::collection::btree_set("[a-z_]{1,8}", 0..4),
        ) {
            let tmp = TempDir::new().unwrap();
            let root = tmp.path();
            for name in &names {
                fs::create_dir_all(root.join(name)).unwrap();
            }
            let rule = ClassificationRule::new(["it", "es"], &global);

            let summary = organize(root, &rule).unwrap();
            prop_assert_eq!(summary.errored, 0);

            let mut moved = BTreeSet::new();
            for name in &names {
                let at_root = root.join(name).is_dir();
                let in_en = root.join(EN_BUCKET).join(name).is_dir();
                let in_global = root.join(GLOBAL_BUCKET).join(name).is_dir();
                prop_assert_eq!(at_root as u8 + in_en as u8 + in_global as u8, 1);

                match rule.classify(name) {
                    Classification::Skip(_) => prop_assert!(at_root),
                    Classification::Global => { prop_assert!(in_global); moved.insert(name); }
                    Classification::En => { prop_assert!(in_en); moved.insert(name); }
                }
            }
            prop_assert_eq!(summary.moved, moved.len());
        }

        #[test]
        fn prop_only_exact_bucket_names_skipped(global in prop::collection::vec("[A-Za-z]{1,6}", 0..6)) {
            let rule = ClassificationRule::new(Vec::<String>::new(), &global);
            for bucket in [EN_BUCKET, GLOBAL_BUCKET] {
                prop_assert_eq!(rule.classify(bucket), Classification::Skip(SkipReason::Bucket));
            }
            for lookalike in ["en", "gLoBaL"] {
                prop_assert!(rule.classify(lookalike).bucket().is_some());
            }
        }
    }
}
