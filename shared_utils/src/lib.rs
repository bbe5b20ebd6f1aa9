//! Shared Utilities for the audio stream conversion tools
//!
//! Domain-neutral building blocks used by `aud_convert`:
//! - Executable resolution (PATH, literal path, search roots)
//! - External process execution with captured diagnostics
//! - Batch discovery and run counters
//! - Summary reporting
//! - Error categories and reporting
//! - Logging (stderr + rolling file)
//! - Path, extension and safety helpers

pub mod batch;
pub mod common_utils;
pub mod error_handler;
pub mod errors;
pub mod external_process;
pub mod logging;
pub mod path_safety;
pub mod report;
pub mod safety;
pub mod tool_resolver;

pub use batch::{collect_files_with_suffix, RunSummary};
pub use common_utils::{normalize_extension, ExtensionMatch};
pub use error_handler::{handle_error, report_error, ErrorAction, ErrorCategory};
pub use errors::{ConvertError, Result};
pub use external_process::{ExternalCommand, ExternalCommandResult};
pub use report::print_summary_report;
pub use safety::check_dangerous_directory;
pub use tool_resolver::{resolve, ResolveContext, ResolvedTool, ToolNotFound};
