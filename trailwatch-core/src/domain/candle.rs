//! Candle: the unit of market data consumed by the engine.

use serde::{Deserialize, Serialize};

/// OHLCV candle for one symbol on one interval.
///
/// `time` is the bucket open time in epoch seconds. Within one engine instance
/// times are strictly increasing, except that a candle carrying the same `time`
/// as the previous one replaces it (a provisional bar being finalized).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(time: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Returns true if any OHLCV field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite())
    }

    /// Basic OHLC sanity check: high bounds everything from above, low from below.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.volume >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_candle() -> Candle {
        Candle::new(1_700_000_000, 100.0, 105.0, 98.0, 103.0, 50_000.0)
    }

    #[test]
    fn candle_is_sane() {
        assert!(sample_candle().is_sane());
    }

    #[test]
    fn candle_detects_void() {
        let mut candle = sample_candle();
        candle.close = f64::NAN;
        assert!(candle.is_void());
        assert!(!candle.is_sane());

        let mut candle = sample_candle();
        candle.high = f64::INFINITY;
        assert!(candle.is_void());
    }

    #[test]
    fn candle_detects_insane_high_low() {
        let mut candle = sample_candle();
        candle.high = 97.0; // below low
        assert!(!candle.is_sane());
    }

    #[test]
    fn candle_serialization_roundtrip() {
        let candle = sample_candle();
        let json = serde_json::to_string(&candle).unwrap();
        let deser: Candle = serde_json::from_str(&json).unwrap();
        assert_eq!(candle, deser);
    }
}
