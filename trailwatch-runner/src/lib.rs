//! TrailWatch Runner — driving indicator engines for many streams.
//!
//! This crate builds on `trailwatch-core` to provide:
//! - Service configuration (TOML) with per-stream engine overrides
//! - A keyed engine registry with idle eviction
//! - Candle validation at the ingestion boundary
//! - One tokio feed task per stream and broadcast fan-out of snapshots
//! - Parallel historical backfill
//! - Interval aggregation, CSV ingestion, synthetic candles
//! - BLAKE3 replay digests

pub mod aggregate;
pub mod backfill;
pub mod config;
pub mod csv_source;
pub mod digest;
pub mod feed;
pub mod hub;
pub mod registry;
pub mod service;
pub mod synthetic;
pub mod validate;

pub use aggregate::{aggregate, AggregatorStep, CandleAggregator};
pub use backfill::{backfill, backfill_all, BackfillReport};
pub use config::{ServiceConfig, ServiceConfigError, StreamConfig};
pub use csv_source::{load_csv, read_candles, LoadError};
pub use digest::{dataset_hash, ReplayDigest};
pub use feed::{run_feed, FeedStats};
pub use hub::{AccessPolicy, AllowAll, Published, SnapshotHub, Subscription, SubscriptionFilter};
pub use registry::{EngineHandle, EngineRegistry};
pub use service::{ServiceError, SignalService};
pub use synthetic::synthetic_candles;
pub use validate::{validate_candle, CandleRejection, CandleValidator};
