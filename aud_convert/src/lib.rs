//! aud-convert - batch conversion of game audio streams
//!
//! Three steps, each usable on its own:
//! - [`config`]: find `project.json` and resolve the `"Audio"` section into [`Settings`]
//! - [`organizer`]: sort source folders into the `EN` and `Global` buckets
//! - [`conversion_api`]: mirror the source tree, decoding every stream that has no output yet
//!
//! ```rust,ignore
//! use aud_convert::{config, run_conversion, CancelFlag, Overrides, Settings};
//! use shared_utils::ResolveContext;
//!
//! let project = config::project_dir_or_default(&std::env::current_dir()?);
//! let module = config::load_module_config(&project)?;
//! let settings = Settings::resolve(&module, &project, &Overrides::default())?;
//! let ctx = ResolveContext::from_env(settings.tool_search_roots())?;
//! let summary = run_conversion(&settings, &ctx, CancelFlag::new(), true)?;
//! ```

pub mod config;
pub mod conversion_api;
pub mod organizer;

pub use config::{ConfigError, InitOutcome, ModuleConfig, Overrides, Settings};
pub use conversion_api::{
    convert, run_conversion, CancelFlag, ConversionEngine, ConversionJob, JobOutcome,
};
pub use organizer::{organize, Classification, ClassificationRule, OrganizeSummary};

pub use shared_utils::errors::{ConvertError, Result};
pub use shared_utils::RunSummary;
