//! Incremental indicator states.
//!
//! Every state consumes one candle (or candle pair) at a time and keeps only
//! the running values it needs. `batch` holds whole-slice versions of the same
//! recurrences for equivalence checks.

pub mod adx;
pub mod atr;
pub mod batch;
pub mod rsi;
pub mod smoothing;

pub use adx::{Adx, AdxReading};
pub use atr::{true_range, Atr};
pub use rsi::Rsi;
pub use smoothing::{Ema, Rma};

/// Create synthetic candles from close prices for testing.
///
/// open = prev_close (or close for the first candle),
/// high = max(open, close) + 1, low = min(open, close) - 1, volume = 1000,
/// one minute apart.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<crate::domain::Candle> {
    use crate::domain::Candle;
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle::new(
                60 * i as i64,
                open,
                open.max(close) + 1.0,
                open.min(close) - 1.0,
                close,
                1000.0,
            )
        })
        .collect()
}

/// Create candles from (open, high, low, close) tuples, one minute apart.
#[cfg(test)]
pub fn make_ohlc_candles(data: &[(f64, f64, f64, f64)]) -> Vec<crate::domain::Candle> {
    use crate::domain::Candle;
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| {
            Candle::new(60 * i as i64, open, high, low, close, 1000.0)
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
