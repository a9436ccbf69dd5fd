//! BLAKE3 digests for replay determinism checks.
//!
//! Two replays of the same candles with the same config must produce the
//! same snapshot digest; a changed digest means changed output.

use serde::Serialize;
use trailwatch_core::Candle;

/// Running hash over a snapshot (or any serializable) sequence.
#[derive(Debug, Clone, Default)]
pub struct ReplayDigest {
    hasher: blake3::Hasher,
    count: u64,
}

impl ReplayDigest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash the JSON form of `item` followed by a newline.
    pub fn update<T: Serialize>(&mut self, item: &T) -> Result<(), serde_json::Error> {
        serde_json::to_writer(&mut self.hasher, item)?;
        self.hasher.update(b"\n");
        self.count += 1;
        Ok(())
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn hex(&self) -> String {
        self.hasher.finalize().to_hex().to_string()
    }
}

/// Hash of the raw OHLCV values, in order.
pub fn dataset_hash(candles: &[Candle]) -> String {
    let mut hasher = blake3::Hasher::new();
    for c in candles {
        hasher.update(&c.time.to_le_bytes());
        hasher.update(&c.open.to_le_bytes());
        hasher.update(&c.high.to_le_bytes());
        hasher.update(&c.low.to_le_bytes());
        hasher.update(&c.close.to_le_bytes());
        hasher.update(&c.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
