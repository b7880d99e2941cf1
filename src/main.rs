use std::path::{Path, PathBuf};

use anyhow::Context;
use casebook::config::Config;
use casebook::input::load_jsonl;
use casebook::{
    CaseRecord, CaseStore, Fetcher, FixtureFetcher, HttpFetcher, InputError, Pipeline,
    PipelineOptions, RunReport, Schema, StoreError,
};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "casebook", about = "Fetch, normalize and persist case detail records")]
struct Cli {
    /// Config file (default: ~/.config/casebook/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Write logs to this file instead of stderr.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one pass over an input file.
    Run(RunArgs),
    /// Print stored row counts by status.
    Stats {
        /// Database file (overrides `store.path`).
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// JSON Lines file of case records keyed by field label.
    #[arg(long)]
    input: PathBuf,
    /// Serve detail records from a fixture file instead of HTTP.
    #[arg(long, conflicts_with = "base_url")]
    fixtures: Option<PathBuf>,
    /// Detail endpoint (overrides `fetch.base_url`).
    #[arg(long)]
    base_url: Option<String>,
    /// Database file (overrides `store.path`).
    #[arg(long)]
    db: Option<PathBuf>,
    /// Fetches in flight at once (overrides `pipeline.concurrency`).
    #[arg(long)]
    concurrency: Option<usize>,
    /// Skip identifiers already stored with status OK.
    #[arg(long)]
    resume: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    let config = match cli.config.as_deref() {
        Some(path) => Config::load(Some(path))?,
        None => Config::load(None).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not load user config, using defaults");
            Config::defaults()
        }),
    };

    match cli.command {
        Command::Run(args) => run(args, &config).await,
        Command::Stats { db } => stats(db.as_deref().unwrap_or(&config.store.path), &config),
    }
}

fn init_logging(log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .with_env_filter(filter)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(filter)
                .init();
        }
    }
    Ok(())
}

async fn run(args: RunArgs, config: &Config) -> anyhow::Result<()> {
    let schema = Schema::new()?;

    let mut options = config.pipeline.options(&schema)?;
    if let Some(n) = args.concurrency {
        options.concurrency = n.max(1);
    }
    options.resume |= args.resume;

    let input = load_jsonl(&args.input, &schema)
        .with_context(|| format!("reading input {}", args.input.display()))?;

    let db = args.db.as_deref().unwrap_or(&config.store.path);
    let store = CaseStore::open_with_timeout(db, schema, config.store.busy_timeout())
        .with_context(|| format!("opening store {}", db.display()))?;
    store.initialize()?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, finishing in-flight records");
            on_signal.cancel();
        }
    });

    let result = match args.fixtures {
        Some(path) => {
            let fetcher = FixtureFetcher::from_path(&path)
                .with_context(|| format!("reading fixtures {}", path.display()))?;
            drive(&store, fetcher, options, cancel, input).await
        }
        None => {
            let mut fetch = config.fetch.clone();
            if let Some(url) = args.base_url {
                fetch.base_url = url;
            }
            drive(&store, HttpFetcher::from_config(&fetch), options, cancel, input).await
        }
    };
    let closed = store.close();

    let report = result?;
    closed?;
    print_report(&report);
    Ok(())
}

async fn drive<F: Fetcher>(
    store: &CaseStore,
    fetcher: F,
    options: PipelineOptions,
    cancel: CancellationToken,
    input: Vec<Result<CaseRecord, InputError>>,
) -> Result<RunReport, StoreError> {
    Pipeline::new(store, fetcher)
        .with_options(options)
        .with_cancellation(cancel)
        .run_input(input)
        .await
}

fn print_report(report: &RunReport) {
    println!("ok       {}", report.ok);
    println!("error    {}", report.error);
    println!("resumed  {}", report.resumed);
    println!("skipped  {}", report.skipped.len());
    for e in &report.skipped {
        println!("  {e}");
    }
    if report.cancelled {
        println!("(cancelled before all records were processed; re-run with --resume)");
    }
}

fn stats(db: &Path, config: &Config) -> anyhow::Result<()> {
    let store = CaseStore::open_with_timeout(db, Schema::new()?, config.store.busy_timeout())
        .with_context(|| format!("opening store {}", db.display()))?;
    store.initialize()?;
    for (status, n) in store.status_counts()? {
        let status = if status.is_empty() { "(none)" } else { status.as_str() };
        println!("{status:<8} {n}");
    }
    store.close()?;
    Ok(())
}
