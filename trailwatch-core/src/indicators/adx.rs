//! ADX: Average Directional Index (Wilder).
//!
//! Steps per candle pair:
//! 1. +DM / -DM from consecutive highs and lows
//! 2. Wilder-smooth +DM, -DM and TR (three independent RMAs)
//! 3. +DI = 100 * RMA(+DM) / RMA(TR), -DI likewise (0 when RMA(TR) is 0)
//! 4. DX = 100 * |+DI - -DI| / max(+DI + -DI, eps)
//! 5. ADX = RMA(DX) over the same period

use crate::domain::Candle;
use crate::indicators::atr::true_range;
use crate::indicators::smoothing::Rma;
use serde::{Deserialize, Serialize};

/// Floor for the DI sum in the DX denominator.
pub const DX_EPSILON: f64 = 1e-10;

/// One ADX step's outputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdxReading {
    pub plus_di: f64,
    pub minus_di: f64,
    pub dx: f64,
    pub adx: f64,
}

/// +DM and -DM for a candle pair.
pub fn directional_movement(prev: &Candle, curr: &Candle) -> (f64, f64) {
    let up = curr.high - prev.high;
    let down = prev.low - curr.low;
    let plus_dm = if up > down && up > 0.0 { up } else { 0.0 };
    let minus_dm = if down > up && down > 0.0 { down } else { 0.0 };
    (plus_dm, minus_dm)
}

/// DI pair and DX from smoothed +DM, -DM and TR.
pub fn directional_index(smooth_plus: f64, smooth_minus: f64, smooth_tr: f64) -> (f64, f64, f64) {
    let (plus_di, minus_di) = if smooth_tr > 0.0 {
        (
            100.0 * smooth_plus / smooth_tr,
            100.0 * smooth_minus / smooth_tr,
        )
    } else {
        (0.0, 0.0)
    };
    let dx = 100.0 * (plus_di - minus_di).abs() / (plus_di + minus_di).max(DX_EPSILON);
    (plus_di, minus_di, dx)
}

/// Incremental ADX accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adx {
    plus_dm: Rma,
    minus_dm: Rma,
    tr: Rma,
    adx: Rma,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ADX period must be >= 1");
        Self {
            plus_dm: Rma::new(period),
            minus_dm: Rma::new(period),
            tr: Rma::new(period),
            adx: Rma::new(period),
        }
    }

    pub fn update(&mut self, prev: &Candle, curr: &Candle) -> AdxReading {
        let (plus_dm, minus_dm) = directional_movement(prev, curr);
        let smooth_plus = self.plus_dm.update(plus_dm);
        let smooth_minus = self.minus_dm.update(minus_dm);
        let smooth_tr = self.tr.update(true_range(prev, curr));

        let (plus_di, minus_di, dx) = directional_index(smooth_plus, smooth_minus, smooth_tr);
        let adx = self.adx.update(dx);

        AdxReading {
            plus_di,
            minus_di,
            dx,
            adx,
        }
    }

    /// Current ADX, 0 until the first candle pair has been seen.
    pub fn value(&self) -> f64 {
        self.adx.value().unwrap_or(0.0)
    }

    pub fn period(&self) -> usize {
        self.adx.period()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlc_candles, DEFAULT_EPSILON};

    #[test]
    fn directional_movement_picks_dominant_side() {
        let c = make_ohlc_candles(&[
            (100.0, 105.0, 95.0, 102.0),
            (102.0, 108.0, 96.0, 106.0), // up 3, down -1 → +DM 3
            (106.0, 107.0, 90.0, 92.0),  // up -1, down 6 → -DM 6
            (92.0, 110.0, 80.0, 100.0),  // up 3, down 10 → -DM 10
        ]);
        assert_eq!(directional_movement(&c[0], &c[1]), (3.0, 0.0));
        assert_eq!(directional_movement(&c[1], &c[2]), (0.0, 6.0));
        assert_eq!(directional_movement(&c[2], &c[3]), (0.0, 10.0));
    }

    #[test]
    fn inside_bar_has_no_directional_movement() {
        let c = make_ohlc_candles(&[(100.0, 110.0, 90.0, 100.0), (100.0, 105.0, 95.0, 100.0)]);
        assert_eq!(directional_movement(&c[0], &c[1]), (0.0, 0.0));
    }

    #[test]
    fn zero_true_range_yields_zero() {
        let c = make_ohlc_candles(&[(100.0, 100.0, 100.0, 100.0), (100.0, 100.0, 100.0, 100.0)]);
        let mut adx = Adx::new(3);
        let reading = adx.update(&c[0], &c[1]);
        assert_eq!(reading.plus_di, 0.0);
        assert_eq!(reading.minus_di, 0.0);
        assert_eq!(reading.dx, 0.0);
        assert_eq!(reading.adx, 0.0);
    }

    #[test]
    fn steady_uptrend_saturates() {
        // Each bar: high +1, low +1, TR = 2 → +DI = 50, -DI = 0, DX = 100
        let data: Vec<_> = (0..10)
            .map(|i| {
                let c = 100.0 + i as f64;
                (c - 1.0, c + 1.0, c - 1.0, c)
            })
            .collect();
        let c = make_ohlc_candles(&data);
        let mut adx = Adx::new(5);
        let mut last = None;
        for w in c.windows(2) {
            last = Some(adx.update(&w[0], &w[1]));
        }
        let last = last.unwrap();
        assert_approx(last.plus_di, 50.0, DEFAULT_EPSILON);
        assert_approx(last.minus_di, 0.0, DEFAULT_EPSILON);
        assert_approx(last.adx, 100.0, DEFAULT_EPSILON);
    }

    #[test]
    fn adx_bounds() {
        let c = make_ohlc_candles(&[
            (100.0, 105.0, 95.0, 102.0),
            (102.0, 108.0, 100.0, 106.0),
            (106.0, 107.0, 98.0, 99.0),
            (99.0, 103.0, 97.0, 101.0),
            (101.0, 106.0, 100.0, 105.0),
            (105.0, 110.0, 103.0, 108.0),
            (108.0, 112.0, 106.0, 110.0),
            (110.0, 111.0, 104.0, 105.0),
        ]);
        let mut adx = Adx::new(3);
        for (i, w) in c.windows(2).enumerate() {
            let r = adx.update(&w[0], &w[1]);
            assert!((0.0..=100.0).contains(&r.adx), "ADX out of bounds at {i}: {}", r.adx);
        }
    }

    #[test]
    fn value_defaults_to_zero() {
        assert_eq!(Adx::new(14).value(), 0.0);
    }
}
