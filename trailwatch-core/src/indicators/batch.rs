//! Whole-series reference computations.
//!
//! Each function walks a full slice with the same recurrences as the
//! incremental states, so a streaming replay must match these bit-for-bit.
//! Not-yet-defined positions are `f64::NAN`.

use crate::crossover::{crossed_over, Cross};
use crate::domain::Candle;
use crate::indicators::adx::{directional_index, directional_movement};
use crate::indicators::atr::true_range;
use crate::indicators::rsi::rsi_from_averages;
use crate::indicators::smoothing::{ema_step, wilder_step};
use crate::stop::{next_stop, STOP_SMOOTHING_PERIOD};

/// EMA seeded with the first value.
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    let mut result = Vec::with_capacity(values.len());
    let mut state: Option<f64> = None;
    for &v in values {
        let next = match state {
            None => v,
            Some(s) => ema_step(s, v, period),
        };
        state = Some(next);
        result.push(next);
    }
    result
}

/// Wilder RMA seeded with the first value.
pub fn rma_series(values: &[f64], period: usize) -> Vec<f64> {
    let mut result = Vec::with_capacity(values.len());
    let mut state: Option<f64> = None;
    for &v in values {
        let next = match state {
            None => v,
            Some(s) => wilder_step(s, v, period),
        };
        state = Some(next);
        result.push(next);
    }
    result
}

/// True range series. TR[0] is NaN (no previous close).
pub fn true_range_series(candles: &[Candle]) -> Vec<f64> {
    let mut tr = vec![f64::NAN; candles.len()];
    for i in 1..candles.len() {
        tr[i] = true_range(&candles[i - 1], &candles[i]);
    }
    tr
}

/// ATR = RMA of true range, defined from index 1.
pub fn atr_series(candles: &[Candle], period: usize) -> Vec<f64> {
    if candles.len() < 2 {
        return vec![f64::NAN; candles.len()];
    }
    let tr = true_range_series(candles);
    let mut result = vec![f64::NAN];
    result.extend(rma_series(&tr[1..], period));
    result
}

/// Wilder RSI with an SMA seed over the first `period` changes.
/// Defined from index `period`.
pub fn rsi_series(closes: &[f64], period: usize) -> Vec<f64> {
    let n = closes.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period + 1 {
        return result;
    }

    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;
    for i in 1..=period {
        let change = closes[i] - closes[i - 1];
        gain_sum += change.max(0.0);
        loss_sum += (-change).max(0.0);
    }
    let p = period as f64;
    let mut avg_gain = gain_sum / p;
    let mut avg_loss = loss_sum / p;
    result[period] = rsi_from_averages(avg_gain, avg_loss);

    for i in (period + 1)..n {
        let change = closes[i] - closes[i - 1];
        avg_gain = wilder_step(avg_gain, change.max(0.0), period);
        avg_loss = wilder_step(avg_loss, (-change).max(0.0), period);
        result[i] = rsi_from_averages(avg_gain, avg_loss);
    }

    result
}

/// ADX (triple Wilder smoothing), defined from index 1.
pub fn adx_series(candles: &[Candle], period: usize) -> Vec<f64> {
    let n = candles.len();
    if n < 2 {
        return vec![f64::NAN; n];
    }

    let mut plus_dm = Vec::with_capacity(n - 1);
    let mut minus_dm = Vec::with_capacity(n - 1);
    let mut tr = Vec::with_capacity(n - 1);
    for w in candles.windows(2) {
        let (p, m) = directional_movement(&w[0], &w[1]);
        plus_dm.push(p);
        minus_dm.push(m);
        tr.push(true_range(&w[0], &w[1]));
    }

    let smooth_plus = rma_series(&plus_dm, period);
    let smooth_minus = rma_series(&minus_dm, period);
    let smooth_tr = rma_series(&tr, period);

    let dx: Vec<f64> = (0..n - 1)
        .map(|i| directional_index(smooth_plus[i], smooth_minus[i], smooth_tr[i]).2)
        .collect();

    let mut result = vec![f64::NAN];
    result.extend(rma_series(&dx, period));
    result
}

/// Adaptive trailing stop series, defined from index 1.
///
/// The stop at index 1 starts from the close at index 0.
pub fn atr_stop_series(candles: &[Candle], atr_period: usize, sensitivity: f64) -> Vec<f64> {
    let atr = atr_series(candles, atr_period);
    let mut result = vec![f64::NAN; candles.len()];
    let mut prev_stop: Option<f64> = None;
    for i in 1..candles.len() {
        let prev_close = candles[i - 1].close;
        let seed = prev_stop.unwrap_or(prev_close);
        let stop = next_stop(candles[i].close, prev_close, seed, sensitivity * atr[i]);
        prev_stop = Some(stop);
        result[i] = stop;
    }
    result
}

/// EMA(5) of a stop series, defined from index 1.
pub fn smoothed_stop_series(stops: &[f64]) -> Vec<f64> {
    if stops.len() < 2 {
        return vec![f64::NAN; stops.len()];
    }
    let mut result = vec![f64::NAN];
    result.extend(ema_series(&stops[1..], STOP_SMOOTHING_PERIOD));
    result
}

/// Close-versus-smoothed-stop crossovers, from index 1.
///
/// Index 1 compares against `(close[0], close[0])`, the pair the stop
/// starts from.
pub fn stop_cross_series(candles: &[Candle], smoothed: &[f64]) -> Vec<Cross> {
    let mut result = vec![Cross::default(); candles.len()];
    for i in 1..candles.len() {
        let a_prev = candles[i - 1].close;
        let b_prev = if i == 1 { a_prev } else { smoothed[i - 1] };
        let (a, b) = (candles[i].close, smoothed[i]);
        result[i] = Cross {
            up: crossed_over(a_prev, b_prev, a, b),
            down: crossed_over(b_prev, a_prev, b, a),
        };
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, DEFAULT_EPSILON};

    #[test]
    fn ema_series_seeds_with_first_value() {
        let out = ema_series(&[10.0, 12.0, 14.0], 3);
        assert_eq!(out, vec![10.0, 11.0, 12.5]);
    }

    #[test]
    fn rma_series_known_values() {
        let out = rma_series(&[6.0, 9.0, 3.0], 3);
        assert_approx(out[1], 7.0, DEFAULT_EPSILON);
        assert_approx(out[2], 17.0 / 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rsi_series_warmup_is_nan() {
        let out = rsi_series(&[1.0, 2.0, 3.0, 4.0], 3);
        assert!(out[..3].iter().all(|v| v.is_nan()));
        assert_eq!(out[3], 100.0);
    }

    #[test]
    fn rsi_series_too_short() {
        assert!(rsi_series(&[1.0, 2.0], 3).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn atr_series_first_is_nan() {
        let candles = make_candles(&[100.0, 101.0, 103.0]);
        let out = atr_series(&candles, 14);
        assert!(out[0].is_nan());
        assert!(!out[1].is_nan());
    }

    #[test]
    fn adx_series_single_candle() {
        let candles = make_candles(&[100.0]);
        assert!(adx_series(&candles, 14)[0].is_nan());
    }

    #[test]
    fn smoothed_stop_series_seeds_at_index_1() {
        let out = smoothed_stop_series(&[f64::NAN, 85.0, 86.0]);
        assert!(out[0].is_nan());
        assert_eq!(out[1], 85.0);
        // alpha = 1/3
        assert_approx(out[2], 85.0 + 1.0 / 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn stop_cross_series_fires_on_first_stop() {
        let candles = make_candles(&[100.0, 101.0, 102.0, 103.0]);
        let stops = atr_stop_series(&candles, 3, 1.0);
        let crosses = stop_cross_series(&candles, &smoothed_stop_series(&stops));
        assert_eq!(crosses[0], Cross::default());
        assert!(crosses[1].up);
        assert!(crosses[2..].iter().all(|c| !c.up && !c.down));
    }

    #[test]
    fn atr_stop_series_starts_below_rising_price() {
        let candles = make_candles(&[100.0, 101.0, 102.0, 103.0]);
        let out = atr_stop_series(&candles, 3, 1.0);
        assert!(out[0].is_nan());
        for i in 1..4 {
            assert!(out[i] < candles[i].close);
        }
    }
}
