use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use cloudlist::config;
use cloudlist::output::{self, Format};
use cloudlist::{Inventory, InventoryOptions, Registry};
use std::io::Write;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::Level;

/// Version injected at compile time via CLOUDLIST_VERSION env var (set by CI/CD),
/// or the crate version for local builds.
pub const VERSION: &str = match option_env!("CLOUDLIST_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

/// List hosts and IP addresses across cloud and DNS providers
#[derive(Parser, Debug)]
#[command(name = "cloudlist", version = VERSION, about, long_about = None)]
struct Args {
    /// Show json output
    #[arg(long)]
    json: bool,

    /// Show only results in output
    #[arg(long)]
    silent: bool,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Show only hosts in output
    #[arg(long)]
    host: bool,

    /// Show only IP addresses in output
    #[arg(long)]
    ip: bool,

    /// Configuration file to use for enumeration
    #[arg(long)]
    config: Option<PathBuf>,

    /// File to write output to (optional)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Providers to fetch assets from, comma separated (optional)
    #[arg(long)]
    provider: Option<String>,

    /// Maximum number of providers enumerated at once (default: all)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Log level, overrides --verbose and --silent
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }

    fn from_args(args: &Args) -> Self {
        match (args.log_level, args.silent, args.verbose) {
            (Some(level), _, _) => level,
            (None, true, _) => LogLevel::Off,
            (None, false, true) => LogLevel::Debug,
            (None, false, false) => LogLevel::Info,
        }
    }
}

fn setup_logging(
    level: LogLevel,
    log_file: Option<&PathBuf>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let Some(log_path) = log_file else {
        tracing_subscriber::fmt()
            .with_max_level(tracing_level)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
        return Ok(None);
    };

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

/// Resolve the config path, scaffolding the default file on first run
fn config_path(args: &Args) -> Result<PathBuf> {
    if let Some(path) = &args.config {
        return Ok(path.clone());
    }

    let path = config::default_config_path().context("Could not get user home directory")?;
    match config::create_default_config(&path) {
        Ok(true) => tracing::info!("Wrote default configuration to {}", path.display()),
        Ok(false) => {}
        Err(e) => tracing::warn!("Could not write default config to {}: {:#}", path.display(), e),
    }
    Ok(path)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(LogLevel::from_args(&args), args.log_file.as_ref())?;

    let path = config_path(&args)?;
    let options = config::read_config(&path)?;
    let options = config::filter_providers(options, args.provider.as_deref());

    let inventory = Inventory::new(&options, &Registry::default());
    if inventory.providers().is_empty() {
        tracing::warn!("No providers configured in {}", path.display());
    }

    let ctx = CancellationToken::new();
    {
        let ctx = ctx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling enumeration");
                ctx.cancel();
            }
        });
    }

    let run_options = InventoryOptions {
        concurrency: args.concurrency,
        verbose: args.verbose,
    };
    let report = inventory.enumerate(&ctx, &run_options).await;

    let format = Format::from_flags(args.json, args.host, args.ip);
    let stdout = std::io::stdout();
    let mut stdout = stdout.lock();

    let written = match &args.output {
        Some(output_path) => {
            let mut file = std::fs::File::create(output_path)
                .with_context(|| format!("Could not create output file {}", output_path.display()))?;
            output::write_resources(&report.resources, format, &mut [&mut stdout, &mut file])?
        }
        None => output::write_resources(&report.resources, format, &mut [&mut stdout])?,
    };
    stdout.flush().ok();

    tracing::info!("Found {} results across {} resources", written, report.resources.len());
    for failure in &report.failures {
        tracing::warn!("Provider failed: {}", failure);
    }

    Ok(())
}
