use anyhow::{Context, Result};
use aud_convert::config::{self, InitOutcome};
use aud_convert::{organize, run_conversion, CancelFlag, ConvertError, Overrides, Settings};
use clap::{Args, Parser, Subcommand};
use shared_utils::error_handler::{install_panic_handler, report_error};
use shared_utils::logging::{init_logging, LogConfig};
use shared_utils::{print_summary_report, ResolveContext};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{info, warn, Level};

#[derive(Parser, Debug)]
#[command(name = "aud-convert")]
#[command(version, about = "Batch converter for game audio streams", long_about = None)]
struct Cli {
    /// Where to start looking for project.json (searched here and two levels up)
    #[arg(long, global = true, value_name = "DIR")]
    project: Option<PathBuf>,

    /// Debug logging; hides the progress bar
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add the default "Audio" section to project.json
    Init,
    /// Sort source folders into the EN and Global buckets
    Organize(SourceArgs),
    /// Decode every source stream that has no output yet
    Convert(ConvertArgs),
    /// init, organize, then convert
    Run(ConvertArgs),
}

#[derive(Args, Debug, Clone, Default)]
struct SourceArgs {
    /// Source directory (overrides AUDIO_SOURCE_DIR)
    #[arg(long, value_name = "DIR")]
    source: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
struct ConvertArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Target directory (overrides AUDIO_TARGET_DIR)
    #[arg(long, value_name = "DIR")]
    target: Option<PathBuf>,

    /// Decoder name or path
    #[arg(long, value_name = "TOOL")]
    decoder: Option<String>,

    /// Parallel decoder processes (0 = one per CPU)
    #[arg(long, short = 'j', value_name = "N")]
    jobs: Option<usize>,

    /// Exit non-zero when any file fails to convert
    #[arg(long)]
    strict: bool,

    /// Match the source extension case-sensitively
    #[arg(long)]
    case_sensitive: bool,
}

impl SourceArgs {
    fn overrides(&self, cwd: &Path) -> Overrides {
        Overrides {
            source_dir: self.source.as_ref().map(|p| cwd.join(p)),
            ..Overrides::default()
        }
    }
}

impl ConvertArgs {
    fn overrides(&self, cwd: &Path) -> Overrides {
        Overrides {
            target_dir: self.target.as_ref().map(|p| cwd.join(p)),
            decoder: self.decoder.clone(),
            jobs: self.jobs,
            fail_on_error: self.strict.then_some(true),
            case_sensitive_extensions: self.case_sensitive.then_some(true),
            ..self.source.overrides(cwd)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    if let Err(e) = init_logging("aud_convert", LogConfig::default().with_level(level)) {
        eprintln!("⚠️ Logging disabled: {:#}", e);
    }
    install_panic_handler();

    let cancel = CancelFlag::new();
    let handler_flag = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        handler_flag.cancel();
        eprintln!("\n🛑 Cancelling: waiting for running decoder processes to finish...");
    }) {
        warn!("⚠️ Ctrl-C handler not installed: {}", e);
    }

    match run(cli, cancel) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&*err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, cancel: CancelFlag) -> Result<()> {
    let cwd = std::env::current_dir().context("Cannot determine the current directory")?;
    let start_dir = cli.project.as_ref().map_or_else(|| cwd.clone(), |p| cwd.join(p));
    let project_dir = config::project_dir_or_default(&start_dir);
    let show_progress = !cli.verbose;

    match cli.command {
        Commands::Init => {
            init(&project_dir, &start_dir)?;
        }
        Commands::Organize(args) => {
            let settings = load_settings(&project_dir, &args.overrides(&cwd))?;
            organize_step(&settings)?;
        }
        Commands::Convert(args) => {
            let settings = load_settings(&project_dir, &args.overrides(&cwd))?;
            convert_step(&settings, cancel, show_progress)?;
        }
        Commands::Run(args) => {
            init(&project_dir, &start_dir)?;
            let settings = load_settings(&project_dir, &args.overrides(&cwd))?;
            organize_step(&settings)?;
            if cancel.is_cancelled() {
                return Err(ConvertError::Cancelled { remaining: 0 }.into());
            }
            convert_step(&settings, cancel, show_progress)?;
        }
    }
    Ok(())
}

fn init(project_dir: &Path, module_dir: &Path) -> Result<InitOutcome> {
    let outcome = config::init_module_config(project_dir, module_dir)
        .with_context(|| format!("Failed to initialize {}", project_dir.join(config::PROJECT_FILE).display()))?;
    Ok(outcome)
}

fn load_settings(project_dir: &Path, overrides: &Overrides) -> Result<Settings> {
    let module = config::load_module_config(project_dir)?;
    let settings = Settings::resolve(&module, project_dir, overrides)?;
    info!(
        source = %settings.source_dir.display(),
        target = %settings.target_dir.display(),
        decoder = %settings.decoder,
        jobs = settings.worker_count(),
        "⚙️ Settings loaded"
    );
    Ok(settings)
}

fn organize_step(settings: &Settings) -> Result<()> {
    let summary = organize(&settings.source_dir, &settings.classification_rule())?;
    println!(
        "📦 Organize: {} moved, {} skipped, {} errors",
        summary.moved, summary.skipped, summary.errored
    );
    for (path, error) in &summary.errors {
        println!("   {} → {}", path.display(), error);
    }
    Ok(())
}

fn convert_step(settings: &Settings, cancel: CancelFlag, show_progress: bool) -> Result<()> {
    let ctx = ResolveContext::from_env(settings.tool_search_roots())
        .context("Cannot determine the current directory")?;

    let started = Instant::now();
    let summary = run_conversion(settings, &ctx, cancel, show_progress)?;
    print_summary_report(&summary, started.elapsed(), "Audio Conversion");

    if summary.cancelled > 0 {
        return Err(ConvertError::Cancelled {
            remaining: summary.cancelled,
        }
        .into());
    }
    if settings.fail_on_error && summary.has_errors() {
        return Err(ConvertError::FailedJobs {
            count: summary.errored,
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_convert_flags_become_overrides() {
        let cli = Cli::parse_from([
            "aud-convert",
            "--project",
            "game",
            "convert",
            "--jobs",
            "0",
            "--strict",
            "--source",
            "in",
            "--decoder",
            "tools/vgmstream-cli",
        ]);
        assert_eq!(cli.project, Some(PathBuf::from("game")));
        let Commands::Convert(args) = cli.command else {
            panic!("expected convert");
        };
        let overrides = args.overrides(Path::new("/work"));
        assert_eq!(overrides.source_dir, Some(PathBuf::from("/work/in")));
        assert_eq!(overrides.target_dir, None);
        assert_eq!(overrides.decoder.as_deref(), Some("tools/vgmstream-cli"));
        assert_eq!(overrides.jobs, Some(0));
        assert_eq!(overrides.fail_on_error, Some(true));
        assert_eq!(overrides.case_sensitive_extensions, None);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["aud-convert", "organize", "--verbose", "--project", "/g"]);
        assert!(cli.verbose);
        assert_eq!(cli.project, Some(PathBuf::from("/g")));
        assert!(matches!(cli.command, Commands::Organize(_)));
    }
}
