//! Conversion API
//!
//! Mirrors the source tree into the target tree, running the decoder once for
//! every source file whose output does not exist yet. An existing output file
//! is the only completion marker, so an interrupted run picks up where it
//! stopped.
//!
//! Jobs run one at a time by default; `with_jobs(n)` spreads them over a
//! bounded rayon pool. Either way no new decoder process is started once the
//! [`CancelFlag`] is raised or the decoder binary disappears.

use crate::config::Settings;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use shared_utils::common_utils::{replace_suffix, ExtensionMatch};
use shared_utils::error_handler::{handle_error, ErrorCategory};
use shared_utils::path_safety::safe_path_arg;
use shared_utils::{
    collect_files_with_suffix, resolve, ConvertError, ExternalCommand, ResolveContext, ResolvedTool,
    RunSummary,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One source file mapped to its output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub source: PathBuf,
    /// `source` relative to the source root
    pub relative: PathBuf,
    pub target: PathBuf,
}

impl ConversionJob {
    /// Returns `None` when `source` is not under `source_root`.
    pub fn plan(
        source: &Path,
        source_root: &Path,
        target_root: &Path,
        source_ext: &str,
        target_ext: &str,
    ) -> Option<Self> {
        let relative = source.strip_prefix(source_root).ok()?.to_path_buf();
        let target = target_root.join(replace_suffix(&relative, source_ext, target_ext));
        Some(Self {
            source: source.to_path_buf(),
            relative,
            target,
        })
    }
}

/// Shared stop signal. Raised from the Ctrl-C handler.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub enum JobOutcome {
    Converted,
    /// Output already present
    Skipped,
    Failed(String),
    /// Cancelled or aborted before the decoder was launched
    NotStarted,
    /// The decoder executable could not be spawned any more
    DecoderUnavailable(io::Error),
}

#[derive(Debug, Clone)]
pub struct ConversionEngine {
    decoder: PathBuf,
    decoder_args: Vec<String>,
    source_ext: String,
    target_ext: String,
    extension_match: ExtensionMatch,
    jobs: usize,
    cancel: CancelFlag,
    show_progress: bool,
}

impl ConversionEngine {
    pub fn new(decoder: &ResolvedTool, source_ext: &str, target_ext: &str) -> Self {
        Self {
            decoder: decoder.path().to_path_buf(),
            decoder_args: Vec::new(),
            source_ext: source_ext.to_string(),
            target_ext: target_ext.to_string(),
            extension_match: ExtensionMatch::default(),
            jobs: 1,
            cancel: CancelFlag::new(),
            show_progress: false,
        }
    }

    pub fn from_settings(settings: &Settings, decoder: &ResolvedTool) -> Self {
        Self::new(decoder, &settings.source_ext, &settings.target_ext)
            .with_decoder_args(settings.decoder_args.clone())
            .with_extension_match(settings.extension_match())
            .with_jobs(settings.worker_count())
    }

    /// Flags placed before `-o <output> <input>`.
    pub fn with_decoder_args(mut self, args: Vec<String>) -> Self {
        self.decoder_args = args;
        self
    }

    pub fn with_extension_match(mut self, mode: ExtensionMatch) -> Self {
        self.extension_match = mode;
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// `decoder [args…] -o <target> <source>`
    pub fn decoder_command(&self, job: &ConversionJob) -> ExternalCommand {
        ExternalCommand::new(&self.decoder)
            .args(&self.decoder_args)
            .arg("-o")
            .arg(safe_path_arg(&job.target))
            .arg(safe_path_arg(&job.source))
    }

    /// Converts every matching file under `source_root` into `target_root`.
    ///
    /// Per-file failures are counted in the returned summary. The only
    /// mid-run error is [`ConvertError::DecoderUnavailable`].
    pub fn convert(&self, source_root: &Path, target_root: &Path) -> Result<RunSummary, ConvertError> {
        if !source_root.is_dir() {
            return Err(ConvertError::SourceMissing(source_root.to_path_buf()));
        }
        fs::create_dir_all(target_root).map_err(|source| ConvertError::CreateDir {
            path: target_root.to_path_buf(),
            source,
        })?;
        let source_root = absolute_dir(source_root);
        let target_root = absolute_dir(target_root);

        let jobs: Vec<ConversionJob> =
            collect_files_with_suffix(&source_root, &self.source_ext, self.extension_match)
                .iter()
                .filter_map(|file| {
                    ConversionJob::plan(file, &source_root, &target_root, &self.source_ext, &self.target_ext)
                })
                .collect();

        let mut summary = RunSummary::new(jobs.len());
        if jobs.is_empty() {
            info!(
                "📭 No {} files found in {}",
                self.source_ext,
                source_root.display()
            );
            return Ok(summary);
        }
        info!(
            "📂 Found {} {} files in {}",
            jobs.len(),
            self.source_ext,
            source_root.display()
        );

        let progress = self.progress_bar(jobs.len());
        let abort = AtomicBool::new(false);
        let outcomes = self.run_all(&jobs, &abort, &progress);
        progress.finish_and_clear();

        let mut unavailable = None;
        for (job, outcome) in jobs.iter().zip(outcomes) {
            match outcome {
                JobOutcome::Converted => summary.success(),
                JobOutcome::Skipped => summary.skip(),
                JobOutcome::Failed(message) => summary.fail(job.source.clone(), message),
                JobOutcome::NotStarted => summary.cancel(),
                JobOutcome::DecoderUnavailable(err) => {
                    summary.cancel();
                    if unavailable.is_none() {
                        unavailable = Some(err);
                    }
                }
            }
        }

        if let Some(source) = unavailable {
            warn!(
                succeeded = summary.succeeded,
                skipped = summary.skipped,
                errored = summary.errored,
                not_started = summary.cancelled,
                "🚨 Conversion aborted"
            );
            return Err(ConvertError::DecoderUnavailable {
                path: self.decoder.clone(),
                source,
            });
        }
        if summary.cancelled > 0 {
            warn!("🛑 Cancelled: {} job(s) were not started", summary.cancelled);
        }
        Ok(summary)
    }

    fn run_all(&self, jobs: &[ConversionJob], abort: &AtomicBool, progress: &ProgressBar) -> Vec<JobOutcome> {
        let sequential = || -> Vec<JobOutcome> {
            jobs.iter().map(|job| self.process(job, abort, progress)).collect()
        };
        if self.jobs <= 1 {
            return sequential();
        }

        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .thread_name(|i| format!("aud-convert-{}", i))
            .build()
        {
            Ok(pool) => {
                debug!(workers = self.jobs, "Running conversions in parallel");
                pool.install(|| {
                    jobs.par_iter()
                        .map(|job| self.process(job, abort, progress))
                        .collect::<Vec<_>>()
                })
            }
            Err(err) => {
                warn!("⚠️ Failed to create thread pool ({}), converting sequentially", err);
                sequential()
            }
        }
    }

    fn process(&self, job: &ConversionJob, abort: &AtomicBool, progress: &ProgressBar) -> JobOutcome {
        if self.cancel.is_cancelled() || abort.load(Ordering::SeqCst) {
            return JobOutcome::NotStarted;
        }
        progress.set_message(job.relative.display().to_string());

        let outcome = self.run_job(job);
        if matches!(outcome, JobOutcome::DecoderUnavailable(_)) {
            abort.store(true, Ordering::SeqCst);
        }
        progress.inc(1);
        outcome
    }

    /// Runs a single job without consulting the cancel flag.
    pub fn run_job(&self, job: &ConversionJob) -> JobOutcome {
        if let Some(parent) = job.target.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                let message = format!("cannot create {}: {}", parent.display(), err);
                handle_error(ErrorCategory::Recoverable, &job.source.display().to_string(), &message);
                return JobOutcome::Failed(message);
            }
        }

        if job.target.exists() {
            debug!(target = %job.target.display(), "⏭️ Output exists, skipping");
            return JobOutcome::Skipped;
        }

        let command = self.decoder_command(job);
        match command.run() {
            Ok(result) if result.success() => {
                debug!("✅ {}", job.relative.display());
                JobOutcome::Converted
            }
            Ok(result) => {
                let status = result
                    .exit_code
                    .map_or_else(|| "a signal".to_string(), |code| format!("exit code {}", code));
                let message = format!("decoder failed with {}: {}", status, result.diagnostics());
                handle_error(ErrorCategory::Recoverable, &job.source.display().to_string(), &message);
                remove_partial_output(&job.target);
                JobOutcome::Failed(message)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                handle_error(ErrorCategory::Fatal, &command.command_line(), &err);
                JobOutcome::DecoderUnavailable(err)
            }
            Err(err) => {
                let message = format!("failed to run decoder: {}", err);
                handle_error(ErrorCategory::Recoverable, &job.source.display().to_string(), &message);
                remove_partial_output(&job.target);
                JobOutcome::Failed(message)
            }
        }
    }

    fn progress_bar(&self, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        bar
    }
}

fn absolute_dir(dir: &Path) -> PathBuf {
    fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf())
}

fn remove_partial_output(target: &Path) {
    if !target.exists() {
        return;
    }
    match fs::remove_file(target) {
        Ok(()) => debug!(target = %target.display(), "Removed partial output"),
        Err(err) => {
            handle_error(
                ErrorCategory::Optional,
                &format!("removing partial output {}", target.display()),
                &err,
            );
        }
    }
}

/// Sequential conversion with default options.
pub fn convert(
    source_root: &Path,
    target_root: &Path,
    decoder: &ResolvedTool,
    source_ext: &str,
    target_ext: &str,
) -> Result<RunSummary, ConvertError> {
    ConversionEngine::new(decoder, source_ext, target_ext).convert(source_root, target_root)
}

/// Resolves the configured decoder, then converts the configured tree.
///
/// Resolution happens before any directory is created, so a missing decoder
/// leaves the filesystem untouched.
pub fn run_conversion(
    settings: &Settings,
    ctx: &ResolveContext,
    cancel: CancelFlag,
    show_progress: bool,
) -> Result<RunSummary, ConvertError> {
    let decoder = resolve(&settings.decoder, ctx)?;
    info!("🔧 Using decoder {} (via {})", decoder, decoder.strategy());

    ConversionEngine::from_settings(settings, &decoder)
        .with_cancel_flag(cancel)
        .with_progress(show_progress)
        .convert(&settings.source_dir, &settings.target_dir)
}
