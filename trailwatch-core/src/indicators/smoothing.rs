//! Smoothing primitives: EMA and Wilder's RMA.
//!
//! Both hold a single running value plus the period and seed from the first
//! input they see (no SMA backfill).
//!
//! EMA[t] = EMA[t-1] + (x[t] - EMA[t-1]) * 2 / (period + 1)
//! RMA[t] = (RMA[t-1] * (period - 1) + x[t]) / period

use serde::{Deserialize, Serialize};

/// Exponential moving average with alpha = 2 / (period + 1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ema {
    period: usize,
    value: Option<f64>,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            value: None,
        }
    }

    pub fn alpha(&self) -> f64 {
        2.0 / (self.period as f64 + 1.0)
    }

    /// Feed one value and return the new state.
    pub fn update(&mut self, value: f64) -> f64 {
        let next = match self.value {
            None => value,
            Some(state) => ema_step(state, value, self.period),
        };
        self.value = Some(next);
        next
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

/// Wilder's moving average (alpha = 1 / period), computed with the
/// `(state * (period - 1) + value) / period` recurrence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rma {
    period: usize,
    value: Option<f64>,
}

impl Rma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RMA period must be >= 1");
        Self {
            period,
            value: None,
        }
    }

    /// Start from an explicit value instead of the first input.
    pub fn seeded(period: usize, seed: f64) -> Self {
        let mut rma = Self::new(period);
        rma.value = Some(seed);
        rma
    }

    /// Feed one value and return the new state.
    pub fn update(&mut self, value: f64) -> f64 {
        let next = match self.value {
            None => value,
            Some(state) => wilder_step(state, value, self.period),
        };
        self.value = Some(next);
        next
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

/// One EMA recurrence step.
#[inline]
pub(crate) fn ema_step(state: f64, value: f64, period: usize) -> f64 {
    state + (value - state) * (2.0 / (period as f64 + 1.0))
}

/// One Wilder recurrence step. Shared with the batch series so both paths
/// evaluate the identical floating-point expression.
#[inline]
pub(crate) fn wilder_step(state: f64, value: f64, period: usize) -> f64 {
    let p = period as f64;
    (state * (p - 1.0) + value) / p
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn ema_first_update_returns_input() {
        let mut ema = Ema::new(10);
        assert_eq!(ema.value(), None);
        assert_eq!(ema.update(42.5), 42.5);
        assert_eq!(ema.value(), Some(42.5));
    }

    #[test]
    fn ema_3_known_values() {
        // alpha = 2/(3+1) = 0.5
        // 10 -> 10, 12 -> 11, 14 -> 12.5
        let mut ema = Ema::new(3);
        assert_approx(ema.update(10.0), 10.0, DEFAULT_EPSILON);
        assert_approx(ema.update(12.0), 11.0, DEFAULT_EPSILON);
        assert_approx(ema.update(14.0), 12.5, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_period_1_tracks_input() {
        let mut ema = Ema::new(1);
        ema.update(100.0);
        assert_eq!(ema.update(200.0), 200.0);
        assert_eq!(ema.update(150.0), 150.0);
    }

    #[test]
    fn rma_first_update_returns_input() {
        let mut rma = Rma::new(14);
        assert_eq!(rma.update(3.0), 3.0);
    }

    #[test]
    fn rma_3_known_values() {
        // 6 -> 6, 9 -> (6*2 + 9)/3 = 7, 3 -> (7*2 + 3)/3 = 17/3
        let mut rma = Rma::new(3);
        rma.update(6.0);
        assert_approx(rma.update(9.0), 7.0, DEFAULT_EPSILON);
        assert_approx(rma.update(3.0), 17.0 / 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rma_converges_on_constant_input() {
        let mut rma = Rma::new(5);
        rma.update(100.0);
        let mut last = 0.0;
        for _ in 0..500 {
            last = rma.update(7.0);
        }
        assert_approx(last, 7.0, 1e-9);
    }

    #[test]
    fn rma_seeded_skips_first_value_seeding() {
        let mut rma = Rma::seeded(4, 2.0);
        // (2*3 + 6)/4 = 3
        assert_approx(rma.update(6.0), 3.0, DEFAULT_EPSILON);
    }

    #[test]
    #[should_panic(expected = "EMA period must be >= 1")]
    fn ema_zero_period_panics() {
        Ema::new(0);
    }
}
