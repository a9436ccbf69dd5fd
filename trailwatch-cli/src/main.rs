//! TrailWatch CLI — replay and stream candles through the indicator engine.
//!
//! Commands:
//! - `replay`: run CSV or synthetic candles through one engine, print JSON lines
//! - `stream`: push the same input through the signal service and print what a
//!   subscriber receives
//! - `check-config`: parse and validate a service config file
//!
//! Logs go to stderr (`RUST_LOG`, default `trailwatch=info`); JSON output goes to stdout.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use trailwatch_core::{Candle, EngineConfig, IndicatorEngine, Interval, StreamKey};
use trailwatch_runner::{
    aggregate, dataset_hash, load_csv, synthetic_candles, CandleAggregator, CandleValidator,
    ReplayDigest, ServiceConfig, SignalService, SubscriptionFilter,
};

#[derive(Parser)]
#[command(
    name = "trailwatch",
    about = "TrailWatch CLI: incremental indicators and trailing-stop signals"
)]
struct Cli {
    /// Emit logs as JSON.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay candles through a single engine and print every snapshot.
    Replay {
        #[command(flatten)]
        input: InputArgs,

        /// Print fired signals only.
        #[arg(long, default_value_t = false)]
        signals_only: bool,
    },
    /// Feed candles through the signal service and print published snapshots.
    Stream {
        #[command(flatten)]
        input: InputArgs,

        /// Replay this many leading candles as backfill before streaming the rest.
        #[arg(long, default_value_t = 0)]
        backfill: usize,

        /// Snapshot fields to print (e.g. rsi adx smoothed_stop). Default: all.
        #[arg(long, num_args = 1..)]
        indicators: Vec<String>,

        /// Print fired signals only.
        #[arg(long, default_value_t = false)]
        signals_only: bool,
    },
    /// Parse and validate a service config file.
    CheckConfig {
        /// Path to the TOML config.
        path: PathBuf,
    },
}

#[derive(Args)]
struct InputArgs {
    /// CSV file with time,open,high,low,close,volume.
    #[arg(long, conflicts_with = "synthetic")]
    csv: Option<PathBuf>,

    /// Generate this many synthetic candles instead of reading a file.
    #[arg(long)]
    synthetic: Option<usize>,

    /// Symbol of the input candles.
    #[arg(long, default_value = "BTCUSDT")]
    symbol: String,

    /// Interval of the input candles: 1m, 5m, 15m, 1h, 4h, 1d.
    #[arg(long, default_value = "1m")]
    interval: Interval,

    /// Bucket the input into this coarser interval before processing.
    #[arg(long)]
    aggregate: Option<Interval>,

    /// Service config (TOML) supplying engine parameters.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl InputArgs {
    fn source_key(&self) -> StreamKey {
        StreamKey::new(self.symbol.clone(), self.interval)
    }

    /// Key the engine runs under: the aggregate interval when given.
    fn engine_key(&self) -> Result<StreamKey> {
        match self.aggregate {
            Some(target) if target.seconds() < self.interval.seconds() => {
                bail!("--aggregate {target} is finer than the input interval {}", self.interval)
            }
            Some(target) => Ok(StreamKey::new(self.symbol.clone(), target)),
            None => Ok(self.source_key()),
        }
    }

    fn load_candles(&self) -> Result<Vec<Candle>> {
        match (&self.csv, self.synthetic) {
            (Some(path), _) => {
                load_csv(path).with_context(|| format!("loading {}", path.display()))
            }
            (None, Some(count)) => Ok(synthetic_candles(&self.source_key(), 0, count)),
            (None, None) => bail!("one of --csv or --synthetic is required"),
        }
    }

    fn service_config(&self) -> Result<ServiceConfig> {
        match &self.config {
            Some(path) => load_service_config(path),
            None => Ok(ServiceConfig::default()),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Commands::Replay {
            input,
            signals_only,
        } => run_replay(&input, signals_only),
        Commands::Stream {
            input,
            backfill,
            indicators,
            signals_only,
        } => {
            let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
            runtime.block_on(run_stream(&input, backfill, indicators, signals_only))
        }
        Commands::CheckConfig { path } => run_check_config(&path),
    }
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trailwatch=info,warn"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_service_config(path: &Path) -> Result<ServiceConfig> {
    ServiceConfig::load(path).with_context(|| format!("config {}", path.display()))
}

fn write_json_line<T: serde::Serialize>(out: &mut impl Write, value: &T) -> Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

// ─── replay ──────────────────────────────────────────────────────────

fn run_replay(input: &InputArgs, signals_only: bool) -> Result<()> {
    let key = input.engine_key()?;
    let config = input.service_config()?;
    let engine_config: EngineConfig = config.engine_for(&key);

    let raw = input.load_candles()?;
    let candles = match input.aggregate {
        Some(target) => aggregate(&raw, target),
        None => raw,
    };
    info!(%key, candles = candles.len(), dataset = %dataset_hash(&candles), "replay starting");

    let mut engine = IndicatorEngine::new(engine_config)?;
    let mut validator = CandleValidator::new();
    let mut digest = ReplayDigest::new();
    let mut rejected = 0usize;
    let mut signals = 0usize;

    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    for candle in &candles {
        if let Err(rejection) = validator.check(candle) {
            rejected += 1;
            warn!(%key, %rejection, "candle rejected");
            continue;
        }
        let snapshot = engine.process(*candle);
        digest.update(&snapshot)?;
        signals += snapshot.signals().len();

        if signals_only {
            for signal in snapshot.signals() {
                write_json_line(&mut out, signal)?;
            }
        } else {
            write_json_line(&mut out, &snapshot)?;
        }
    }
    out.flush()?;

    info!(
        %key,
        processed = digest.count(),
        rejected,
        signals,
        digest = %digest.hex(),
        "replay complete"
    );
    Ok(())
}

// ─── stream ──────────────────────────────────────────────────────────

async fn run_stream(
    input: &InputArgs,
    backfill: usize,
    indicators: Vec<String>,
    signals_only: bool,
) -> Result<()> {
    let key = input.engine_key()?;
    let service = SignalService::new(input.service_config()?)?;
    let raw = input.load_candles()?;

    let split = backfill.min(raw.len());
    let (history, live) = raw.split_at(split);
    if !history.is_empty() {
        let history = match input.aggregate {
            Some(target) => aggregate(history, target),
            None => history.to_vec(),
        };
        let report = service.backfill(&key, &history)?;
        info!(%key, processed = report.processed, "backfilled");
    }

    let mut subscription = service.subscribe(
        "cli",
        SubscriptionFilter::all()
            .symbols([key.symbol.clone()])
            .intervals([key.interval])
            .indicators(indicators),
    );

    let printer = tokio::spawn(async move {
        let mut printed = 0u64;
        let mut out = std::io::stdout();
        while let Some(item) = subscription.recv().await {
            if signals_only {
                for signal in item.snapshot.signals() {
                    write_json_line(&mut out, signal)?;
                    printed += 1;
                }
            } else {
                write_json_line(&mut out, &subscription.render(&item)?)?;
                printed += 1;
            }
        }
        anyhow::Ok(printed)
    });

    // Aggregated input goes out as provisional buckets; the engine replaces
    // the last candle until each bucket closes.
    let mut aggregator = input.aggregate.map(CandleAggregator::new);
    // Prime with history so a bucket straddling the backfill boundary is
    // re-sent whole and replaces the partial one.
    if let Some(agg) = aggregator.as_mut() {
        for candle in history {
            agg.push(candle);
        }
    }
    for candle in live {
        let candle = match aggregator.as_mut() {
            Some(agg) => agg.push(candle).provisional,
            None => *candle,
        };
        service.send(&key, candle).await?;
    }

    for stats in service.shutdown().await {
        info!(
            key = ?stats.key,
            processed = stats.processed,
            replaced = stats.replaced,
            rejected = stats.rejected,
            signals = stats.signals,
            "feed finished"
        );
    }

    let printed = printer.await??;
    info!(printed, "stream complete");
    Ok(())
}

// ─── check-config ────────────────────────────────────────────────────

fn run_check_config(path: &Path) -> Result<()> {
    let config = load_service_config(path)?;
    println!("Config OK: {}", path.display());
    println!("  channel_capacity:   {}", config.channel_capacity);
    println!("  broadcast_capacity: {}", config.broadcast_capacity);
    match config.idle_eviction_secs {
        Some(secs) => println!("  idle eviction:      {secs}s"),
        None => println!("  idle eviction:      disabled"),
    }
    println!("  streams:            {}", config.streams.len());
    for stream in &config.streams {
        let marker = if stream.engine.is_some() { " (override)" } else { "" };
        println!("    {}{marker}", stream.key());
    }
    Ok(())
}
