//! YCD - Subscription plan and usage dashboard
//!
//! Renders subscription usage, the plan catalog, and batch job results from
//! the JSON snapshots written by the YCD services.
//!
//! ## Usage
//!
//! ```bash
//! # Live dashboard over the files named in ~/.ycd/config.yaml
//! ycd
//!
//! # Dashboard over explicit files
//! ycd dashboard --status subscription.json --batch batch.json
//!
//! # One-shot text renderings
//! ycd status subscription.json
//! ycd plans --current pro
//! ycd batch batch.json
//!
//! # With verbose logging
//! ycd -v
//! ```

use std::io::Write;
use std::panic;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::{debug, error, info, warn};
use ycd_core::config::expand_tilde;
use ycd_core::{AppConfig, LogGuard, YcdError, init_logging};
use ycd_plans::{
    CellLimits, PlanCatalog, PlanError, PlanTier, SubscriptionStatus, UsageEvaluator, load_batch,
};
use ycd_tui::App;
use ycd_tui::text::{format_batch_report, format_plan_comparison, format_subscription_summary};

/// YCD subscription plan and usage dashboard
///
/// Shows how much of each transcript and download quota is used, compares
/// plans, and follows batch jobs as they finish.
#[derive(Parser, Debug)]
#[command(name = "ycd")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Configuration file (defaults to ~/.ycd/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// YAML plan catalog overriding the built-in plans
    #[arg(long, global = true)]
    plans: Option<PathBuf>,

    /// Enable verbose logging (increases log level)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory for log files (defaults to ~/.ycd/logs/)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Live dashboard (default)
    Dashboard {
        /// Subscription snapshot file
        #[arg(long)]
        status: Option<PathBuf>,

        /// Batch snapshot file
        #[arg(long)]
        batch: Option<PathBuf>,

        /// Do not watch the snapshot files for changes
        #[arg(long)]
        no_watch: bool,
    },

    /// Print usage for a subscription snapshot
    Status {
        /// Subscription snapshot file
        file: PathBuf,

        /// Print the evaluated report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the plan catalog
    Plans {
        /// Mark this tier as the current plan
        #[arg(long)]
        current: Option<String>,
    },

    /// Print results for a batch snapshot
    Batch {
        /// Batch snapshot file
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let _guard = match setup_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::from(1);
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "ycd failed");
            eprintln!("Error: {}", e);
            if let Some(guidance) = e.guidance() {
                eprintln!("  {}", guidance);
            }
            ExitCode::from(1)
        }
    }
}

/// Dispatch the selected subcommand.
fn run(cli: Cli) -> ycd_core::Result<()> {
    let config = load_config(cli.config.as_deref())?;

    let plans_file = cli.plans.clone().map(expand_tilde).or(config.plans_file.clone());
    let catalog = load_catalog(plans_file.as_deref())?;
    let limits = CellLimits {
        title_max_len: config.title_max_len,
        message_max_len: config.message_max_len,
    };

    match cli.command {
        None => run_dashboard(&config, catalog, limits, None, None, false),
        Some(Command::Dashboard {
            status,
            batch,
            no_watch,
        }) => run_dashboard(&config, catalog, limits, status, batch, no_watch),
        Some(Command::Status { file, json }) => print_status(&file, catalog, json),
        Some(Command::Plans { current }) => {
            print_plans(&catalog, current.as_deref());
            Ok(())
        }
        Some(Command::Batch { file }) => print_batch(&file, limits),
    }
}

/// Load the explicit config file, or the default one if present.
fn load_config(path: Option<&Path>) -> ycd_core::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path),
        None => AppConfig::load_default(),
    }
}

/// Load the plan catalog, falling back to the built-in plans.
fn load_catalog(path: Option<&Path>) -> ycd_core::Result<PlanCatalog> {
    PlanCatalog::load_or_builtin(path).map_err(|e| match path {
        Some(path) => plan_error(path, e),
        None => YcdError::internal(e.to_string()),
    })
}

/// Map a plan-model error on a file into a CLI error.
fn plan_error(path: &Path, err: PlanError) -> YcdError {
    match err {
        PlanError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => YcdError::FileNotFound {
            path: path.to_path_buf(),
        },
        PlanError::Io(e) => YcdError::io("reading", path, e),
        PlanError::Yaml(_) | PlanError::InvalidCatalog(_) => YcdError::ConfigInvalid {
            path: path.to_path_buf(),
            message: err.to_string(),
        },
        other => YcdError::snapshot_parse(path, other.friendly_message()),
    }
}

/// Print a usage summary for a subscription snapshot.
fn print_status(file: &Path, catalog: PlanCatalog, json: bool) -> ycd_core::Result<()> {
    let status = SubscriptionStatus::load(file).map_err(|e| plan_error(file, e))?;
    let evaluator = UsageEvaluator::new(catalog);
    let report = evaluator.evaluate(&status, Local::now().date_naive());

    if json {
        let out = serde_json::to_string_pretty(&report)
            .map_err(|e| YcdError::serialization("usage report", e))?;
        println!("{}", out);
    } else {
        print!("{}", format_subscription_summary(&report, evaluator.catalog()));
    }
    Ok(())
}

/// Print the plan catalog.
fn print_plans(catalog: &PlanCatalog, current: Option<&str>) {
    let current_tier = current.and_then(|raw| {
        let tier = PlanTier::parse(raw);
        if tier.is_none() {
            warn!(tier = raw, "unknown tier passed to --current");
            eprintln!("Warning: unknown tier '{}', no plan marked as current", raw);
        }
        tier
    });
    print!("{}", format_plan_comparison(catalog, current_tier));
}

/// Print results for a batch snapshot.
fn print_batch(file: &Path, limits: CellLimits) -> ycd_core::Result<()> {
    let items = load_batch(file).map_err(|e| plan_error(file, e))?;
    print!("{}", format_batch_report(&items, limits));
    Ok(())
}

/// Run the live dashboard.
fn run_dashboard(
    config: &AppConfig,
    catalog: PlanCatalog,
    limits: CellLimits,
    status: Option<PathBuf>,
    batch: Option<PathBuf>,
    no_watch: bool,
) -> ycd_core::Result<()> {
    let status_file = status.map(expand_tilde).or(config.status_file.clone());
    let batch_file = batch.map(expand_tilde).or(config.batch_file.clone());

    let mut app = App::new(UsageEvaluator::new(catalog))
        .with_cell_limits(limits)
        .on_upgrade(|| info!("Upgrade requested from dashboard"));
    if let Some(path) = &status_file {
        app = app.with_status_file(path);
    }
    if let Some(path) = &batch_file {
        app = app.with_batch_file(path);
    }
    if status_file.is_none() && batch_file.is_none() {
        warn!("No snapshot files configured; set status_file/batch_file or pass --status/--batch");
    }

    app.reload();
    if !no_watch {
        app.start_watching(config.debounce_ms)
            .map_err(|e| YcdError::WatcherInit {
                message: e.to_string(),
            })?;
    }

    // Install panic hook to ensure terminal cleanup
    install_panic_hook();

    info!("Starting YCD dashboard");
    app.run().inspect_err(|_| {
        let _ = restore_terminal();
    })?;
    debug!("YCD dashboard exited normally");
    Ok(())
}

/// Install a panic hook that restores the terminal before printing the panic message.
fn install_panic_hook() {
    let original_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}

/// Restore terminal to its normal state.
fn restore_terminal() -> std::io::Result<()> {
    let mut stdout = std::io::stdout();

    let _ = crossterm::terminal::disable_raw_mode();
    crossterm::execute!(
        stdout,
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::cursor::Show
    )?;
    stdout.flush()?;

    Ok(())
}

/// Set up logging based on CLI arguments.
///
/// The dashboard draws on the alternate screen, so it logs to file only.
fn setup_logging(cli: &Cli) -> ycd_core::Result<LogGuard> {
    let debug = cli.verbose > 0;
    let console = !matches!(cli.command, None | Some(Command::Dashboard { .. }));
    init_logging(cli.log_dir.clone(), debug, console)
}
