//! Historical replay into registry engines.
//!
//! Backfill pushes stored candles through `process` in order so an engine is
//! warm before live candles arrive. Nothing is published. Several keys can be
//! backfilled at once; each key's candles stay sequential, keys run in
//! parallel on the rayon pool.

use crate::registry::EngineRegistry;
use crate::validate::validate_candle;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};
use trailwatch_core::{Candle, ConfigError, Snapshot, StreamKey};

/// Outcome of replaying one key's history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackfillReport {
    pub key: StreamKey,
    pub processed: usize,
    pub rejected: usize,
    pub signals: usize,
    /// Snapshot after the last accepted candle.
    pub last: Option<Snapshot>,
}

/// Replay `candles` into the engine for `key`, holding its lock throughout.
pub fn backfill(
    registry: &EngineRegistry,
    key: &StreamKey,
    candles: &[Candle],
) -> Result<BackfillReport, ConfigError> {
    let mut report = BackfillReport {
        key: key.clone(),
        processed: 0,
        rejected: 0,
        signals: 0,
        last: None,
    };

    registry.with_engine(key, |slot| {
        for candle in candles {
            let last_time = slot.engine.last_candle().map(|c| c.time);
            if let Err(rejection) = validate_candle(candle, last_time) {
                report.rejected += 1;
                warn!(%key, %rejection, "backfill candle rejected");
                continue;
            }
            let snapshot = slot.engine.process(*candle);
            report.processed += 1;
            report.signals += snapshot.signals().len();
            report.last = Some(snapshot);
        }
    })?;

    info!(
        %key,
        processed = report.processed,
        rejected = report.rejected,
        signals = report.signals,
        "backfill complete"
    );
    Ok(report)
}

/// Backfill several keys in parallel. Reports come back in input order.
pub fn backfill_all(
    registry: &EngineRegistry,
    batches: &[(StreamKey, Vec<Candle>)],
) -> Vec<Result<BackfillReport, ConfigError>> {
    batches
        .par_iter()
        .map(|(key, candles)| backfill(registry, key, candles))
        .collect()
}
