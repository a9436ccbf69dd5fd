//! Per-key feed loop.
//!
//! One task per stream reads candles from its channel, validates each one
//! against the engine's last candle, runs `process` under the key's lock and
//! publishes the snapshot. The engine is looked up in the registry on every
//! candle, so an evicted key restarts cold on its next candle: warm-up starts
//! over and the second candle after the restart fires a simple signal.
//!
//! The loop ends when every sender is gone, or when `stop` fires; in the
//! latter case the channel is closed and already-queued candles are drained
//! first.

use crate::hub::SnapshotHub;
use crate::registry::EngineRegistry;
use crate::validate::validate_candle;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};
use trailwatch_core::{Candle, StreamKey};

/// Counters reported when a feed loop ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedStats {
    pub key: Option<StreamKey>,
    /// Candles processed, replacements included.
    pub processed: u64,
    /// Of `processed`, candles that replaced the previous one.
    pub replaced: u64,
    pub rejected: u64,
    pub signals: u64,
}

/// Drive one key until its channel closes.
pub async fn run_feed(
    key: StreamKey,
    registry: Arc<EngineRegistry>,
    hub: SnapshotHub,
    mut candles: mpsc::Receiver<Candle>,
    mut stop: oneshot::Receiver<()>,
) -> FeedStats {
    info!(%key, "feed started");
    let mut stats = FeedStats {
        key: Some(key.clone()),
        ..FeedStats::default()
    };

    let mut stopping = false;
    loop {
        let next = if stopping {
            candles.recv().await
        } else {
            tokio::select! {
                candle = candles.recv() => candle,
                _ = &mut stop => {
                    candles.close();
                    stopping = true;
                    continue;
                }
            }
        };
        let Some(candle) = next else { break };

        let outcome = registry.with_engine(&key, |slot| {
            let last_time = slot.engine.last_candle().map(|c| c.time);
            validate_candle(&candle, last_time)
                .map(|()| (last_time == Some(candle.time), slot.engine.process(candle)))
        });
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(%key, error = %e, "cannot create engine, stopping feed");
                break;
            }
        };

        match outcome {
            Ok((replaced, snapshot)) => {
                stats.processed += 1;
                stats.replaced += u64::from(replaced);
                stats.signals += snapshot.signals().len() as u64;
                hub.publish(key.clone(), snapshot);
            }
            Err(rejection) => {
                stats.rejected += 1;
                warn!(%key, %rejection, "candle rejected");
            }
        }
    }

    info!(
        %key,
        processed = stats.processed,
        rejected = stats.rejected,
        signals = stats.signals,
        "feed stopped"
    );
    stats
}
