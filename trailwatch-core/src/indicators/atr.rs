//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! ATR is the Wilder RMA of the true range, seeded with the first TR.
//! Needs two candles; the first candle alone has no previous close.

use crate::domain::Candle;
use crate::indicators::smoothing::Rma;
use serde::{Deserialize, Serialize};

/// True range of `curr` relative to the previous candle's close.
pub fn true_range(prev: &Candle, curr: &Candle) -> f64 {
    let pc = prev.close;
    (curr.high - curr.low)
        .max((curr.high - pc).abs())
        .max((curr.low - pc).abs())
}

/// Incremental ATR over consecutive candle pairs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Atr {
    rma: Rma,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            rma: Rma::new(period),
        }
    }

    /// Feed the latest candle pair and return the smoothed ATR.
    pub fn update(&mut self, prev: &Candle, curr: &Candle) -> f64 {
        self.rma.update(true_range(prev, curr))
    }

    pub fn value(&self) -> Option<f64> {
        self.rma.value()
    }

    pub fn period(&self) -> usize {
        self.rma.period()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlc_candles, DEFAULT_EPSILON};

    #[test]
    fn true_range_basic() {
        let c = make_ohlc_candles(&[
            (100.0, 105.0, 95.0, 102.0),
            (102.0, 108.0, 100.0, 106.0), // max(8, |108-102|, |100-102|) = 8
            (106.0, 107.0, 98.0, 99.0),   // max(9, |107-106|, |98-106|) = 9
        ]);
        assert_approx(true_range(&c[0], &c[1]), 8.0, DEFAULT_EPSILON);
        assert_approx(true_range(&c[1], &c[2]), 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        // Gap up: prev close 100, current bar 108..115
        let c = make_ohlc_candles(&[(98.0, 102.0, 97.0, 100.0), (110.0, 115.0, 108.0, 112.0)]);
        assert_approx(true_range(&c[0], &c[1]), 15.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_period_3() {
        let c = make_ohlc_candles(&[
            (100.0, 105.0, 95.0, 102.0),
            (102.0, 108.0, 100.0, 106.0), // TR = 8
            (106.0, 107.0, 98.0, 99.0),   // TR = 9
            (99.0, 103.0, 97.0, 101.0),   // TR = 6
        ]);
        let mut atr = Atr::new(3);
        assert_eq!(atr.value(), None);
        // Seed = 8, then (8*2 + 9)/3 = 25/3, then (25/3*2 + 6)/3 = 68/9
        assert_approx(atr.update(&c[0], &c[1]), 8.0, DEFAULT_EPSILON);
        assert_approx(atr.update(&c[1], &c[2]), 25.0 / 3.0, DEFAULT_EPSILON);
        assert_approx(atr.update(&c[2], &c[3]), 68.0 / 9.0, DEFAULT_EPSILON);
    }
}
