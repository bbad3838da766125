use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use vitals::config::{Config, load_config, load_config_from_path};
use vitals::system::StatusAggregator;

#[derive(Parser)]
#[command(
    name = "vitals",
    about = "Print CPU load, CPU temperature, RAM and disk usage as one status line"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Report disk usage for the volume containing this path
    #[arg(long)]
    path: Option<PathBuf>,

    /// Markup style: plain, legacy
    #[arg(long)]
    markup: Option<String>,

    /// Print the snapshot as JSON instead of a status line
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Take a fresh snapshot every N seconds
    #[arg(long)]
    watch: Option<u64>,

    /// Stop after this many reports in watch mode
    #[arg(long)]
    count: Option<u64>,

    /// Log probe details to stderr
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, default_value_t = false)]
    log_json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(&cli)?;
    let config = load_config_for_cli(&cli);
    let aggregator = Arc::new(StatusAggregator::from_config(&config));

    match cli.watch {
        None => {
            println!("{}", report(&aggregator, cli.json)?);
            Ok(())
        }
        Some(0) => Err(eyre!("--watch must be greater than 0")),
        Some(secs) => watch(aggregator, Duration::from_secs(secs), cli.count, cli.json).await,
    }
}

fn init_tracing(cli: &Cli) -> Result<()> {
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level);

    let result = if cli.log_json {
        tracing::subscriber::set_global_default(builder.with_ansi(false).json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.map_err(|e| eyre!("failed to set tracing subscriber: {e}"))
}

fn load_config_for_cli(cli: &Cli) -> Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    if let Some(ref path) = cli.path {
        config.disk.path = Some(path.clone());
    }
    if let Some(ref markup) = cli.markup {
        config.output.markup = markup.clone();
    }

    config
}

fn report(aggregator: &StatusAggregator, json: bool) -> Result<String> {
    if json {
        Ok(aggregator.json_report()?)
    } else {
        Ok(aggregator.status_line())
    }
}

/// Each tick is an independent snapshot; nothing carries over between them.
async fn watch(
    aggregator: Arc<StatusAggregator>,
    period: Duration,
    count: Option<u64>,
    json: bool,
) -> Result<()> {
    let mut interval = tokio::time::interval(period);
    let mut printed = 0u64;

    while count.is_none_or(|limit| printed < limit) {
        interval.tick().await;
        let aggregator = Arc::clone(&aggregator);
        let line = tokio::task::spawn_blocking(move || report(&aggregator, json)).await??;
        println!("{line}");
        printed += 1;
    }

    Ok(())
}
