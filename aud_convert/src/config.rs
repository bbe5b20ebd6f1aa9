//! Project configuration
//!
//! Settings live in the `"Audio"` section of a `project.json` file shared
//! with other modules of the same project. This module finds that file,
//! writes the default section on `init`, and turns the raw section into an
//! immutable [`Settings`] value that the rest of the pipeline borrows.

use crate::organizer::ClassificationRule;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shared_utils::common_utils::{normalize_extension, ExtensionMatch};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub const MODULE_NAME: &str = "Audio";
pub const PROJECT_FILE: &str = "project.json";
/// project.json is searched in the start directory and this many parents.
pub const MAX_SEARCH_LEVELS: usize = 2;

pub const KEY_SOURCE_DIR: &str = "AUDIO_SOURCE_DIR";
pub const KEY_TARGET_DIR: &str = "AUDIO_TARGET_DIR";
pub const KEY_DECODER: &str = "vgmstream-cli";
pub const KEY_SOURCE_EXT: &str = "SOURCE_EXT";
pub const KEY_TARGET_EXT: &str = "TARGET_EXT";

const DEFAULT_SOURCE_DIR: &str = "Source/USRDIR/Assets_1_Audio_Streams";
const DEFAULT_TARGET_DIR: &str = "Modules/Audio/GameFiles/Assets_1_Audio_Streams";
const DEFAULT_SOURCE_EXT: &str = ".snu";
const DEFAULT_TARGET_EXT: &str = ".wav";

#[cfg(windows)]
const DEFAULT_DECODER: &str = "vgmstream-cli.exe";
#[cfg(not(windows))]
const DEFAULT_DECODER: &str = "vgmstream-cli";

const DEFAULT_LANGUAGE_BLACKLIST: &[&str] = &["IT", "ES", "FR"];

const DEFAULT_GLOBAL_DIRS: &[&str] = &[
    "80b_crow", "amb_airc", "amb_chao", "amb_cour", "amb_dung", "amb_ext_", "amb_fore",
    "amb_fren", "amb_gara", "amb_int_", "amb_mans", "amb_nort", "amb_riot", "amb_shir",
    "amb_vent", "bin_rev0", "brt_dino", "brt_dior", "brt_myst", "brt_plan", "brt_temp",
    "bsh_air_", "bsh_beac", "bsh_figh", "bsh_fire", "bsh_ice_", "bsh_vill", "bsh__air",
    "che_cart", "che_cent", "che_mark", "che_mo_b", "che_q_an", "dod_aqua", "dod_dock",
    "gamehub_", "gts_full", "gts_seas", "gts_stat", "gts_subu", "gts_vent", "gts_viol",
    "mtp_heav", "mus_simp", "sss_cont", "sss_lab_", "sss_mall",
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("❌ Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("❌ Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("❌ Invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("❌ {} must contain a JSON object at the top level", .path.display())]
    NotAnObject { path: PathBuf },

    #[error("❌ No '{module}' section in {}\n💡 Run `aud-convert init` first", .path.display())]
    ModuleMissing { path: PathBuf, module: String },

    #[error("❌ Missing required configuration: {}", .keys.join(", "))]
    MissingConfig { keys: Vec<String> },
}

/// A set of directory names.
///
/// Stored as an object with empty values (`{"IT": "", "ES": ""}`), which is
/// the layout existing project files use; a plain array is accepted too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NameSet {
    Keys(BTreeMap<String, Value>),
    List(Vec<String>),
}

impl Default for NameSet {
    fn default() -> Self {
        NameSet::Keys(BTreeMap::new())
    }
}

impl NameSet {
    pub fn from_names(names: &[&str]) -> Self {
        NameSet::Keys(
            names
                .iter()
                .map(|n| (n.to_string(), Value::String(String::new())))
                .collect(),
        )
    }

    pub fn names(&self) -> BTreeSet<String> {
        match self {
            NameSet::Keys(map) => map.keys().cloned().collect(),
            NameSet::List(list) => list.iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Exit non-zero when any single file fails to convert
    pub fail_on_error: bool,
    /// Match the source extension byte-for-byte instead of ignoring ASCII case
    pub case_sensitive_extensions: bool,
    /// Parallel decoder processes; 0 means one per CPU
    pub jobs: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            fail_on_error: false,
            case_sensitive_extensions: false,
            jobs: 1,
        }
    }
}

/// The raw `"Audio"` section of project.json.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleConfig {
    #[serde(rename = "Config", default)]
    pub config: BTreeMap<String, String>,
    #[serde(rename = "Directories", default)]
    pub directories: BTreeMap<String, String>,
    #[serde(rename = "Tools", default)]
    pub tools: BTreeMap<String, String>,
    /// Extra decoder flags placed before `-o <output> <input>`
    #[serde(rename = "DecoderArgs", default)]
    pub decoder_args: Vec<String>,
    #[serde(rename = "Extensions", default)]
    pub extensions: BTreeMap<String, String>,
    #[serde(rename = "LanguageBlacklist", default)]
    pub language_blacklist: NameSet,
    #[serde(rename = "GlobalDirs", default)]
    pub global_dirs: NameSet,
    #[serde(rename = "Options", default)]
    pub options: Options,
}

impl ModuleConfig {
    /// The section written by `init`.
    pub fn defaults(module_dir: &Path, project_dir: &Path) -> Self {
        let module_path = module_dir
            .strip_prefix(project_dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| module_dir.to_path_buf());

        let config = BTreeMap::from([
            ("module_name".to_string(), MODULE_NAME.to_string()),
            ("module_path".to_string(), module_path.display().to_string()),
            ("project_path".to_string(), project_dir.display().to_string()),
        ]);
        let directories = BTreeMap::from([
            (KEY_SOURCE_DIR.to_string(), DEFAULT_SOURCE_DIR.to_string()),
            (KEY_TARGET_DIR.to_string(), DEFAULT_TARGET_DIR.to_string()),
        ]);
        let tools = BTreeMap::from([(KEY_DECODER.to_string(), DEFAULT_DECODER.to_string())]);
        let extensions = BTreeMap::from([
            (KEY_SOURCE_EXT.to_string(), DEFAULT_SOURCE_EXT.to_string()),
            (KEY_TARGET_EXT.to_string(), DEFAULT_TARGET_EXT.to_string()),
        ]);

        Self {
            config,
            directories,
            tools,
            decoder_args: Vec::new(),
            extensions,
            language_blacklist: NameSet::from_names(DEFAULT_LANGUAGE_BLACKLIST),
            global_dirs: NameSet::from_names(DEFAULT_GLOBAL_DIRS),
            options: Options::default(),
        }
    }
}

/// Command-line values that take precedence over project.json.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub source_dir: Option<PathBuf>,
    pub target_dir: Option<PathBuf>,
    pub decoder: Option<String>,
    pub jobs: Option<usize>,
    pub fail_on_error: Option<bool>,
    pub case_sensitive_extensions: Option<bool>,
}

/// Fully resolved, read-only settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub project_dir: PathBuf,
    pub source_dir: PathBuf,
    pub target_dir: PathBuf,
    pub decoder: String,
    pub decoder_args: Vec<String>,
    pub source_ext: String,
    pub target_ext: String,
    pub language_blacklist: BTreeSet<String>,
    pub global_dirs: BTreeSet<String>,
    pub case_sensitive_extensions: bool,
    pub jobs: usize,
    pub fail_on_error: bool,
}

impl Settings {
    /// Validates `module` and applies `overrides`.
    ///
    /// Every missing required key is reported at once. Relative directories
    /// are taken relative to `project_dir`.
    pub fn resolve(
        module: &ModuleConfig,
        project_dir: &Path,
        overrides: &Overrides,
    ) -> Result<Self, ConfigError> {
        let source_dir = overrides
            .source_dir
            .clone()
            .or_else(|| non_blank(module.directories.get(KEY_SOURCE_DIR)).map(PathBuf::from));
        let target_dir = overrides
            .target_dir
            .clone()
            .or_else(|| non_blank(module.directories.get(KEY_TARGET_DIR)).map(PathBuf::from));
        let decoder = overrides
            .decoder
            .clone()
            .or_else(|| non_blank(module.tools.get(KEY_DECODER)).map(str::to_string));

        let (source_dir, target_dir, decoder) = match (source_dir, target_dir, decoder) {
            (Some(s), Some(t), Some(d)) => (s, t, d),
            (s, t, d) => {
                let mut keys = Vec::new();
                if s.is_none() {
                    keys.push(format!("Directories.{}", KEY_SOURCE_DIR));
                }
                if t.is_none() {
                    keys.push(format!("Directories.{}", KEY_TARGET_DIR));
                }
                if d.is_none() {
                    keys.push(format!("Tools.{}", KEY_DECODER));
                }
                return Err(ConfigError::MissingConfig { keys });
            }
        };

        let source_ext = non_blank(module.extensions.get(KEY_SOURCE_EXT)).unwrap_or(DEFAULT_SOURCE_EXT);
        let target_ext = non_blank(module.extensions.get(KEY_TARGET_EXT)).unwrap_or(DEFAULT_TARGET_EXT);

        Ok(Self {
            project_dir: project_dir.to_path_buf(),
            source_dir: resolve_project_path(project_dir, &source_dir),
            target_dir: resolve_project_path(project_dir, &target_dir),
            decoder,
            decoder_args: module.decoder_args.clone(),
            source_ext: normalize_extension(source_ext),
            target_ext: normalize_extension(target_ext),
            language_blacklist: module.language_blacklist.names(),
            global_dirs: module.global_dirs.names(),
            case_sensitive_extensions: overrides
                .case_sensitive_extensions
                .unwrap_or(module.options.case_sensitive_extensions),
            jobs: overrides.jobs.unwrap_or(module.options.jobs),
            fail_on_error: overrides.fail_on_error.unwrap_or(module.options.fail_on_error),
        })
    }

    pub fn classification_rule(&self) -> ClassificationRule {
        ClassificationRule::new(&self.language_blacklist, &self.global_dirs)
    }

    pub fn extension_match(&self) -> ExtensionMatch {
        ExtensionMatch::from_case_sensitive(self.case_sensitive_extensions)
    }

    /// Number of decoder processes to run at once (at least 1).
    pub fn worker_count(&self) -> usize {
        if self.jobs == 0 {
            num_cpus::get().max(1)
        } else {
            self.jobs
        }
    }

    /// Roots for relative decoder references: the project, then the directory
    /// holding this executable.
    pub fn tool_search_roots(&self) -> Vec<PathBuf> {
        let mut roots = vec![self.project_dir.clone()];
        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            if exe_dir != self.project_dir {
                roots.push(exe_dir);
            }
        }
        roots
    }
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Joins a configured path onto the project directory unless it is absolute.
///
/// Project files written on Windows use `\` separators; they are converted
/// on other platforms.
pub fn resolve_project_path(project_dir: &Path, raw: &Path) -> PathBuf {
    let path = if cfg!(windows) {
        raw.to_path_buf()
    } else {
        PathBuf::from(raw.to_string_lossy().replace('\\', "/"))
    };
    if path.is_absolute() {
        path
    } else {
        project_dir.join(path)
    }
}

/// Directory containing project.json: `start` or one of its first
/// [`MAX_SEARCH_LEVELS`] parents.
pub fn find_project_dir(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .take(MAX_SEARCH_LEVELS + 1)
        .find(|dir| dir.join(PROJECT_FILE).is_file())
        .map(Path::to_path_buf)
}

/// Like [`find_project_dir`], falling back to `start` itself.
pub fn project_dir_or_default(start: &Path) -> PathBuf {
    match find_project_dir(start) {
        Some(dir) => {
            info!("📁 Found {} in {}", PROJECT_FILE, dir.display());
            dir
        }
        None => {
            warn!(
                "⚠️ {} not found within {} levels of {}; using it as the project directory",
                PROJECT_FILE,
                MAX_SEARCH_LEVELS,
                start.display()
            );
            start.to_path_buf()
        }
    }
}

fn read_project_file(path: &Path) -> Result<Map<String, Value>, ConfigError> {
    if !path.exists() {
        return Ok(Map::new());
    }
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if text.trim().is_empty() {
        return Ok(Map::new());
    }
    let value: Value = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ConfigError::NotAnObject {
            path: path.to_path_buf(),
        }),
    }
}

fn write_project_file(path: &Path, contents: &Map<String, Value>) -> Result<(), ConfigError> {
    let text = serde_json::to_string_pretty(contents).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, text + "\n").map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Created,
    AlreadyPresent,
}

/// Adds the default `"Audio"` section to `project_dir/project.json`.
///
/// An existing section is never modified, and other modules' sections are
/// preserved.
pub fn init_module_config(project_dir: &Path, module_dir: &Path) -> Result<InitOutcome, ConfigError> {
    fs::create_dir_all(project_dir).map_err(|source| ConfigError::Write {
        path: project_dir.to_path_buf(),
        source,
    })?;

    let path = project_dir.join(PROJECT_FILE);
    let mut contents = read_project_file(&path)?;

    if contents.contains_key(MODULE_NAME) {
        info!("✅ Configuration for module '{}' already exists in {}", MODULE_NAME, path.display());
        return Ok(InitOutcome::AlreadyPresent);
    }

    let section = serde_json::to_value(ModuleConfig::defaults(module_dir, project_dir))
        .map_err(|source| ConfigError::Json {
            path: path.clone(),
            source,
        })?;
    contents.insert(MODULE_NAME.to_string(), section);
    write_project_file(&path, &contents)?;

    info!("✅ Added default '{}' configuration to {}", MODULE_NAME, path.display());
    Ok(InitOutcome::Created)
}

/// Reads the `"Audio"` section of `project_dir/project.json`.
pub fn load_module_config(project_dir: &Path) -> Result<ModuleConfig, ConfigError> {
    let path = project_dir.join(PROJECT_FILE);
    let mut contents = read_project_file(&path)?;
    let section = contents
        .remove(MODULE_NAME)
        .ok_or_else(|| ConfigError::ModuleMissing {
            path: path.clone(),
            module: MODULE_NAME.to_string(),
        })?;
    serde_json::from_value(section).map_err(|source| ConfigError::Json { path, source })
}
