//! CLI entry point for the session archiver.

use anyhow::{Context, Result};
use clap::Parser;
use mparchiver::{
    CapturedRequest, CheckpointStore, Config, HttpClient, Pipeline, PipelineOptions,
    base_params, load_articles,
};
use tracing::{debug, info, warn};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");
    info!("Archiver starting");

    let mut config = Config::load(&args.config)
        .with_context(|| format!("loading config from {}", args.config.display()))?;
    if let Some(input_dir) = args.input_dir {
        config.input_dir = input_dir;
    }
    if let Some(output_dir) = args.output_dir {
        config.output_dir = output_dir;
    }
    if let Some(max_delay) = args.max_delay {
        config.max_delay_ms = max_delay;
    }
    if args.keep_promoted {
        config.skip_promoted = false;
    }

    let raw_path = config.raw_request_path();
    let raw = std::fs::read_to_string(&raw_path)
        .with_context(|| format!("reading captured request from {}", raw_path.display()))?;
    let captured = CapturedRequest::parse(&raw)
        .with_context(|| format!("parsing captured request in {}", raw_path.display()))?;
    let credentials = base_params(&captured);
    debug!(params = credentials.len(), "session credentials extracted");

    let articles = load_articles(&config.input_dir)
        .with_context(|| format!("loading capture exports from {}", config.input_dir.display()))?;
    if articles.is_empty() {
        warn!(input_dir = %config.input_dir.display(), "no articles found in capture exports");
        return Ok(());
    }
    info!(articles = articles.len(), "capture exports loaded");

    let client = HttpClient::from_captured_request(
        &captured,
        &config.cookie_origin,
        config.connect_timeout_secs,
        config.read_timeout_secs,
    )
    .context("building HTTP session from captured request")?;

    let mut store =
        CheckpointStore::load(&config.checkpoint_path()).context("loading checkpoint log")?;
    info!(recorded = store.len(), "checkpoint log loaded");

    let pipeline = Pipeline::new(
        client,
        credentials,
        PipelineOptions {
            output_dir: config.output_dir.clone(),
            comment_endpoint: config.comment_endpoint.clone(),
            skip_promoted: config.skip_promoted,
            max_delay_ms: config.max_delay_ms,
        },
    );

    let stats = pipeline.run(&articles, &mut store).await?;

    info!(
        archived = stats.archived,
        skipped = stats.skipped,
        failed = stats.failed,
        total = stats.total(),
        "Run complete"
    );

    Ok(())
}
