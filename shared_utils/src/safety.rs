//! Safety Module
//!
//! Guards operations that move or create directories in bulk against being
//! pointed at a system location by a bad configuration value.

use std::path::{Component, Path};

const PROTECTED_DIRS: &[&str] = &[
    "/",
    "/System",
    "/Library",
    "/Applications",
    "/Users",
    "/usr",
    "/bin",
    "/sbin",
    "/etc",
    "/var",
    "/private",
    "/home",
    "/root",
    "/boot",
    "/dev",
    "/proc",
    "/sys",
    "/tmp",
    "/opt",
];

/// Rejects protected system directories, filesystem roots and home roots.
///
/// `operation` names what was about to happen, for the error text.
pub fn check_dangerous_directory(path: &Path, operation: &str) -> Result<(), String> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

    let blocked = |reason: &str| {
        Err(format!(
            "🚨 DANGEROUS OPERATION BLOCKED!\n\
             ❌ Refusing to {} in '{}': {}.\n\
             💡 Point the configuration at the game's audio asset directory instead.",
            operation,
            path.display(),
            reason
        ))
    };

    for protected in PROTECTED_DIRS {
        if path == Path::new(protected) || canonical == Path::new(protected) {
            return blocked("protected system directory");
        }
    }

    let normal_parts = canonical
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .count();
    if normal_parts == 0 {
        return blocked("filesystem root");
    }

    let s = canonical.to_string_lossy();
    if (s.starts_with("/Users/") || s.starts_with("/home/")) && normal_parts <= 2 {
        return blocked("home directory root");
    }

    Ok(())
}
