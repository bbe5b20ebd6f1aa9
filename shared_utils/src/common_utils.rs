//! Common Utilities Module
//!
//! Small path and file-name helpers shared by discovery and job planning:
//! - extension normalization (`"snu"` → `".snu"`)
//! - suffix matching with an explicit case policy
//! - suffix replacement for target file names

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// How file-name suffixes are compared during discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtensionMatch {
    /// `b.SNU` matches `.snu`
    #[default]
    CaseInsensitive,
    /// Only the exact byte sequence matches
    CaseSensitive,
}

impl ExtensionMatch {
    pub fn from_case_sensitive(case_sensitive: bool) -> Self {
        if case_sensitive {
            ExtensionMatch::CaseSensitive
        } else {
            ExtensionMatch::CaseInsensitive
        }
    }
}

/// Ensures an extension carries exactly one leading dot.
///
/// # Examples
/// ```
/// use shared_utils::common_utils::normalize_extension;
///
/// assert_eq!(normalize_extension("wav"), ".wav");
/// assert_eq!(normalize_extension(".snu"), ".snu");
/// assert_eq!(normalize_extension("  .wav "), ".wav");
/// ```
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim();
    if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{}", ext)
    }
}

/// Returns true when `file_name` ends with `suffix` and has a non-empty stem.
pub fn matches_suffix(file_name: &str, suffix: &str, mode: ExtensionMatch) -> bool {
    bytes_match_suffix(file_name.as_bytes(), suffix.as_bytes(), mode)
}

// Byte-level so names that are not valid UTF-8 still match.
fn bytes_match_suffix(name: &[u8], suffix: &[u8], mode: ExtensionMatch) -> bool {
    if suffix.is_empty() || name.len() <= suffix.len() {
        return false;
    }
    let tail = &name[name.len() - suffix.len()..];
    match mode {
        ExtensionMatch::CaseSensitive => tail == suffix,
        ExtensionMatch::CaseInsensitive => tail.eq_ignore_ascii_case(suffix),
    }
}

/// Checks the file-name component of `path` with [`matches_suffix`].
pub fn path_matches_suffix(path: &Path, suffix: &str, mode: ExtensionMatch) -> bool {
    path.file_name()
        .map(|n| bytes_match_suffix(n.as_encoded_bytes(), suffix.as_bytes(), mode))
        .unwrap_or(false)
}

/// Rewrites the trailing `old_suffix` of `path`'s file name to `new_suffix`.
///
/// The caller must already know the suffix matches; when it does not, the new
/// suffix is appended to the full name. The stem is kept byte-for-byte.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use shared_utils::common_utils::replace_suffix;
///
/// let out = replace_suffix(Path::new("music/intro.SNU"), ".snu", ".wav");
/// assert_eq!(out, Path::new("music/intro.wav"));
/// ```
pub fn replace_suffix(path: &Path, old_suffix: &str, new_suffix: &str) -> PathBuf {
    let name = path.file_name().map(OsStr::as_encoded_bytes).unwrap_or_default();
    let stem = if bytes_match_suffix(name, old_suffix.as_bytes(), ExtensionMatch::CaseInsensitive) {
        &name[..name.len() - old_suffix.len()]
    } else {
        name
    };
    let mut new_name = os_string_from_bytes(stem);
    new_name.push(new_suffix);
    path.with_file_name(new_name)
}

#[cfg(unix)]
fn os_string_from_bytes(bytes: &[u8]) -> OsString {
    use std::os::unix::ffi::OsStrExt;
    OsStr::from_bytes(bytes).to_os_string()
}

#[cfg(not(unix))]
fn os_string_from_bytes(bytes: &[u8]) -> OsString {
    OsString::from(String::from_utf8_lossy(bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension("snu"), ".snu");
        assert_eq!(normalize_extension(".wav"), ".wav");
        assert_eq!(normalize_extension(" ogg"), ".ogg");
    }

    #[test]
    fn test_matches_suffix_case_policies() {
        assert!(matches_suffix("a.snu", ".snu", ExtensionMatch::CaseSensitive));
        assert!(!matches_suffix("b.SNU", ".snu", ExtensionMatch::CaseSensitive));
        assert!(matches_suffix("b.SNU", ".snu", ExtensionMatch::CaseInsensitive));
        assert!(!matches_suffix("c.wav", ".snu", ExtensionMatch::CaseInsensitive));
    }

    #[test]
    fn test_matches_suffix_requires_stem() {
        assert!(!matches_suffix(".snu", ".snu", ExtensionMatch::CaseInsensitive));
        assert!(!matches_suffix("snu", ".snu", ExtensionMatch::CaseInsensitive));
        assert!(!matches_suffix("a.snu", "", ExtensionMatch::CaseInsensitive));
    }

    #[test]
    fn test_matches_suffix_multibyte_names() {
        assert!(matches_suffix("音楽.snu", ".snu", ExtensionMatch::CaseInsensitive));
        assert!(!matches_suffix("é", ".s", ExtensionMatch::CaseInsensitive));
    }

    #[test]
    fn test_replace_suffix() {
        assert_eq!(
            replace_suffix(Path::new("/t/a/x.snu"), ".snu", ".wav"),
            Path::new("/t/a/x.wav")
        );
        assert_eq!(
            replace_suffix(Path::new("x.tar.snu"), ".snu", ".wav"),
            Path::new("x.tar.wav")
        );
        assert_eq!(
            replace_suffix(Path::new("noext"), ".snu", ".wav"),
            Path::new("noext.wav")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_names() {
        use std::os::unix::ffi::OsStrExt;

        let name = Path::new(OsStr::from_bytes(b"voice_\xff.SNU"));
        assert!(path_matches_suffix(name, ".snu", ExtensionMatch::CaseInsensitive));
        assert!(!path_matches_suffix(name, ".snu", ExtensionMatch::CaseSensitive));

        let out = replace_suffix(&Path::new("/t").join(name), ".snu", ".wav");
        assert_eq!(out.file_name().unwrap().as_bytes(), b"voice_\xff.wav");
    }
}
