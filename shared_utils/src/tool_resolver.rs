//! Tool Resolver Module
//!
//! Turns a user-supplied tool reference (bare command name or path) into an
//! absolute path to an executable file.
//!
//! Resolution is an ordered list of strategies, each a pure function of the
//! reference and a [`ResolveContext`]. The first strategy that yields a
//! candidate wins; no later strategy is consulted after a match.
//!
//! 1. Bare command name on the executable search path (`which`)
//! 2. Literal path (absolute, or relative to the working directory)
//! 3. Relative path under each search root, in order
//!
//! ```no_run
//! use shared_utils::tool_resolver::{resolve, ResolveContext};
//!
//! let ctx = ResolveContext::from_env(vec!["/opt/project".into()])?;
//! let tool = resolve("vgmstream-cli", &ctx)?;
//! println!("decoder: {}", tool.path().display());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Everything a strategy may look at. Captured once so strategies stay pure.
#[derive(Debug, Clone)]
pub struct ResolveContext {
    /// Value of `PATH` at capture time
    pub search_path: Option<OsString>,
    /// Working directory used for relative literal paths
    pub cwd: PathBuf,
    /// Extra roots tried for relative references, in priority order
    pub search_roots: Vec<PathBuf>,
}

impl ResolveContext {
    pub fn new(search_path: Option<OsString>, cwd: PathBuf, search_roots: Vec<PathBuf>) -> Self {
        Self {
            search_path,
            cwd,
            search_roots,
        }
    }

    /// Captures `PATH` and the current working directory of this process.
    pub fn from_env(search_roots: Vec<PathBuf>) -> std::io::Result<Self> {
        Ok(Self {
            search_path: std::env::var_os("PATH"),
            cwd: std::env::current_dir()?,
            search_roots,
        })
    }
}

/// A single resolution step.
pub type Strategy = fn(&str, &ResolveContext) -> Option<PathBuf>;

/// Strategies in the order they are tried.
pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("search path", on_search_path),
    ("literal path", literal_path),
    ("search roots", under_search_roots),
];

/// Absolute path to a validated executable. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTool {
    path: PathBuf,
    strategy: &'static str,
}

impl ResolvedTool {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the strategy that produced this path.
    pub fn strategy(&self) -> &'static str {
        self.strategy
    }
}

impl fmt::Display for ResolvedTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("❌ Tool not found: '{reference}'\n   Checked:\n{}", format_checked(.checked))]
pub struct ToolNotFound {
    pub reference: String,
    pub checked: Vec<String>,
}

fn format_checked(checked: &[String]) -> String {
    checked
        .iter()
        .map(|c| format!("     - {}", c))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Resolves `reference` using [`STRATEGIES`] in order.
pub fn resolve(reference: &str, ctx: &ResolveContext) -> Result<ResolvedTool, ToolNotFound> {
    let reference = reference.trim();

    if !reference.is_empty() {
        for (name, strategy) in STRATEGIES {
            if let Some(path) = strategy(reference, ctx) {
                info!(
                    reference = reference,
                    strategy = *name,
                    path = %path.display(),
                    "Resolved tool"
                );
                return Ok(ResolvedTool {
                    path,
                    strategy: *name,
                });
            }
            debug!(reference = reference, strategy = *name, "Strategy found nothing");
        }
    }

    Err(ToolNotFound {
        reference: reference.to_string(),
        checked: checked_locations(reference, ctx),
    })
}

/// Human-readable list of every location [`resolve`] inspects.
pub fn checked_locations(reference: &str, ctx: &ResolveContext) -> Vec<String> {
    let mut checked = Vec::new();
    if reference.is_empty() {
        checked.push("(empty reference)".to_string());
        return checked;
    }

    let path = Path::new(reference);
    if is_bare_name(path) {
        checked.push(format!("'{}' on PATH", reference));
    }
    checked.push(literal_candidate(path, ctx).display().to_string());
    if path.is_relative() {
        for root in &ctx.search_roots {
            checked.push(root.join(path).display().to_string());
        }
    }
    checked
}

/// Strategy 1: bare command name looked up on the search path.
pub fn on_search_path(reference: &str, ctx: &ResolveContext) -> Option<PathBuf> {
    if !is_bare_name(Path::new(reference)) {
        return None;
    }
    let found = which::which_in(reference, ctx.search_path.as_ref(), &ctx.cwd).ok()?;
    Some(absolutize(&found, ctx))
}

/// Strategy 2: the reference itself, relative to the working directory if needed.
pub fn literal_path(reference: &str, ctx: &ResolveContext) -> Option<PathBuf> {
    let candidate = literal_candidate(Path::new(reference), ctx);
    is_executable_file(&candidate).then(|| absolutize(&candidate, ctx))
}

/// Strategy 3: a relative reference joined onto each search root.
pub fn under_search_roots(reference: &str, ctx: &ResolveContext) -> Option<PathBuf> {
    let path = Path::new(reference);
    if path.is_absolute() {
        return None;
    }
    ctx.search_roots
        .iter()
        .map(|root| root.join(path))
        .find(|candidate| is_executable_file(candidate))
        .map(|candidate| absolutize(&candidate, ctx))
}

/// Regular file with at least one execute bit (any regular file on non-Unix).
pub fn is_executable_file(path: &Path) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

fn is_bare_name(path: &Path) -> bool {
    path.components().count() == 1 && path.file_name().is_some()
}

fn literal_candidate(path: &Path, ctx: &ResolveContext) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        ctx.cwd.join(path)
    }
}

// Symlinks are kept as-is: multi-call binaries dispatch on the invoked name.
fn absolutize(path: &Path, ctx: &ResolveContext) -> PathBuf {
    literal_candidate(path, ctx)
}
