//! Candle validation at the ingestion boundary.
//!
//! The engine assumes well-formed, time-ordered candles. Anything else is
//! rejected here, before it reaches `process`.

use thiserror::Error;
use trailwatch_core::Candle;

/// Why a candle was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CandleRejection {
    #[error("candle at {time} has a non-finite field")]
    NonFinite { time: i64 },

    #[error("candle at {time} violates OHLC ordering (o={open} h={high} l={low} c={close})")]
    BrokenOhlc {
        time: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },

    #[error("candle at {time} has negative volume {volume}")]
    NegativeVolume { time: i64, volume: f64 },

    #[error("candle at {time} is older than the last accepted candle at {last}")]
    OutOfOrder { time: i64, last: i64 },
}

/// Check field sanity and that `candle` is not older than `last_time`.
pub fn validate_candle(candle: &Candle, last_time: Option<i64>) -> Result<(), CandleRejection> {
    if candle.is_void() {
        return Err(CandleRejection::NonFinite { time: candle.time });
    }
    if candle.volume < 0.0 {
        return Err(CandleRejection::NegativeVolume {
            time: candle.time,
            volume: candle.volume,
        });
    }
    if !candle.is_sane() {
        return Err(CandleRejection::BrokenOhlc {
            time: candle.time,
            open: candle.open,
            high: candle.high,
            low: candle.low,
            close: candle.close,
        });
    }
    match last_time {
        Some(last) if candle.time < last => Err(CandleRejection::OutOfOrder {
            time: candle.time,
            last,
        }),
        _ => Ok(()),
    }
}

/// Per-stream validator remembering the last accepted time.
#[derive(Debug, Clone, Default)]
pub struct CandleValidator {
    last_time: Option<i64>,
}

impl CandleValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start after an already-processed candle (e.g. once backfill is done).
    pub fn resume_after(last_time: Option<i64>) -> Self {
        Self { last_time }
    }

    /// Accept or reject `candle`. Equal time is accepted: it replaces the
    /// last candle downstream.
    pub fn check(&mut self, candle: &Candle) -> Result<(), CandleRejection> {
        validate_candle(candle, self.last_time)?;
        self.last_time = Some(candle.time);
        Ok(())
    }

    pub fn last_time(&self) -> Option<i64> {
        self.last_time
    }
}
