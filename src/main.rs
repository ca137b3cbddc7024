use anyhow::{Context, Result};
use clap::Parser;
use listing_order_check::config::Config;
use listing_order_check::error::LifecycleFatalError;
use listing_order_check::feed::hn::HnExtractor;
use listing_order_check::feed::session::HttpSession;
use listing_order_check::frontend::{Frontend, HeadlessFrontend};
use listing_order_check::lifecycle::{LifecycleOutcome, RunLifecycle};
use listing_order_check::tui::TerminalFrontend;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "order-check.toml";
const EXIT_FATAL: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "listing-order-check",
    version,
    about = "Check that a paginated listing is ordered newest to oldest"
)]
struct Cli {
    #[arg(long, help = "Config file (defaults to ./order-check.toml when present)")]
    config: Option<PathBuf>,
    #[arg(long, help = "Run once with the resolved config, no interactive views")]
    headless: bool,
    #[arg(long, default_value = "listing-order-check.log", help = "Log file path")]
    log_file: PathBuf,
    #[arg(long)]
    target_count: Option<u32>,
    #[arg(long)]
    source_url: Option<String>,
    #[arg(long)]
    max_retries: Option<u32>,
    #[arg(long)]
    retry_delay_ms: Option<u64>,
    #[arg(long)]
    navigation_timeout_ms: Option<u64>,
    #[arg(long)]
    report_path: Option<String>,
}

impl Cli {
    fn resolve_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Config::load(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Config::default(),
        };

        if let Some(v) = self.target_count {
            config.target_count = v;
        }
        if let Some(v) = &self.source_url {
            config.source_url = v.clone();
        }
        if let Some(v) = self.max_retries {
            config.max_retries = v;
        }
        if let Some(v) = self.retry_delay_ms {
            config.retry_delay_ms = v;
        }
        if let Some(v) = self.navigation_timeout_ms {
            config.navigation_timeout_ms = v;
        }
        if let Some(v) = &self.report_path {
            config.report_path = v.clone();
        }

        config
            .validate()
            .context("Invalid settings from command line")?;
        Ok(config)
    }
}

fn init_logging(path: &Path) -> Result<()> {
    let log_file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create log file: {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("listing_order_check=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(log_file))
        .init();
    Ok(())
}

async fn run(cli: Cli) -> Result<LifecycleOutcome> {
    let config = cli.resolve_config()?;

    println!();
    println!("  Listing Order Check v{}", env!("CARGO_PKG_VERSION"));
    println!("  ==========================");
    println!();
    println!("  Source : {}", config.source_url);
    println!("  Target : {} items", config.target_count);
    println!("  Log    : {}", cli.log_file.display());
    println!();

    let session =
        HttpSession::new(Box::new(HnExtractor)).map_err(LifecycleFatalError::Session)?;

    let outcome = if cli.headless {
        drive(session, HeadlessFrontend::default(), config).await?
    } else {
        drive(session, TerminalFrontend, config).await?
    };
    Ok(outcome)
}

async fn drive<F: Frontend>(
    session: HttpSession,
    frontend: F,
    config: Config,
) -> Result<LifecycleOutcome> {
    let outcome = RunLifecycle::new(session, frontend, config).run().await?;
    tracing::info!(
        runs = outcome.runs,
        termination = ?outcome.termination,
        exit_code = outcome.exit_code(),
        "shutting down"
    );
    Ok(outcome)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(&cli.log_file) {
        eprintln!("  Error: {:#}", e);
        return ExitCode::from(EXIT_FATAL);
    }

    match run(cli).await {
        Ok(outcome) => {
            if outcome.last_run.is_none() {
                println!("  Cancelled before any run completed.");
            }
            ExitCode::from(outcome.exit_code())
        }
        Err(e) => {
            tracing::error!("fatal: {:#}", e);
            eprintln!("  Error: {:#}", e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}
