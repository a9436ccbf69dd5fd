//! Adaptive ATR trailing stop
//!
//! **Core Rule:** while price and the previous close both stay on the same
//! side of the stop, the stop may only move toward price (ratchet). A close on
//! the other side flips the stop to `sensitivity * ATR` away on the new side.
//!
//! The raw stop is smoothed by a 5-period EMA; the smoothed series is what
//! price is compared against for crossovers.

use crate::indicators::Ema;
use serde::{Deserialize, Serialize};

/// Period of the EMA applied to the raw stop.
pub const STOP_SMOOTHING_PERIOD: usize = 5;

/// One trailing-stop step.
///
/// # Rules
/// - Uptrend intact (`src` and `prev_close` above `prev_stop`): `max(prev_stop, src - n_loss)`
/// - Downtrend intact (both below): `min(prev_stop, src + n_loss)`
/// - Flip up (`src` above): `src - n_loss`
/// - Otherwise: `src + n_loss`
///
/// # Example
/// ```
/// use trailwatch_core::stop::next_stop;
///
/// // Ratchet up: 95 → 100
/// assert_eq!(next_stop(110.0, 105.0, 95.0, 10.0), 100.0);
/// // Loosening blocked: stays at 100
/// assert_eq!(next_stop(108.0, 110.0, 100.0, 10.0), 100.0);
/// ```
pub fn next_stop(src: f64, prev_close: f64, prev_stop: f64, n_loss: f64) -> f64 {
    if src > prev_stop && prev_close > prev_stop {
        prev_stop.max(src - n_loss)
    } else if src < prev_stop && prev_close < prev_stop {
        prev_stop.min(src + n_loss)
    } else if src > prev_stop {
        src - n_loss
    } else {
        src + n_loss
    }
}

/// Output of one `AtrStop::update` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopReading {
    /// Stop the step started from (the prior close on the seeding step).
    pub previous_stop: f64,
    pub stop: f64,
    pub smoothed: f64,
    /// True when `previous_stop` came from the prior close rather than a stored stop.
    pub seeded: bool,
}

/// Trailing-stop state: previous stop plus the EMA of the stop series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AtrStop {
    sensitivity: f64,
    previous_stop: Option<f64>,
    smoothed: Ema,
}

impl AtrStop {
    pub fn new(sensitivity: f64) -> Self {
        Self {
            sensitivity,
            previous_stop: None,
            smoothed: Ema::new(STOP_SMOOTHING_PERIOD),
        }
    }

    /// Advance the stop with the current close, the previous close and ATR.
    pub fn update(&mut self, close: f64, prev_close: f64, atr: f64) -> StopReading {
        let seeded = self.previous_stop.is_none();
        let previous_stop = self.previous_stop.unwrap_or(prev_close);
        let stop = next_stop(close, prev_close, previous_stop, self.sensitivity * atr);
        self.previous_stop = Some(stop);
        let smoothed = self.smoothed.update(stop);
        StopReading {
            previous_stop,
            stop,
            smoothed,
            seeded,
        }
    }

    pub fn stop(&self) -> Option<f64> {
        self.previous_stop
    }

    pub fn smoothed(&self) -> Option<f64> {
        self.smoothed.value()
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }
}
