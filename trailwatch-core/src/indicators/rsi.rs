//! Relative Strength Index (RSI), Wilder's formulation.
//!
//! Seed: simple mean of gains and losses over the first `period` changes
//! (so the first value needs `period + 1` candles). After that both averages
//! follow the Wilder recurrence.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss); only gains → 100, no
//! movement at all → 50.

use crate::indicators::smoothing::Rma;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
enum RsiState {
    Warming {
        changes: usize,
        gain_sum: f64,
        loss_sum: f64,
    },
    Ready {
        avg_gain: Rma,
        avg_loss: Rma,
    },
}

/// Incremental RSI over successive closes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rsi {
    period: usize,
    state: RsiState,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            state: RsiState::Warming {
                changes: 0,
                gain_sum: 0.0,
                loss_sum: 0.0,
            },
        }
    }

    /// Feed one close-to-close change. Returns `None` until `period` changes
    /// have been seen.
    pub fn update(&mut self, prev_close: f64, close: f64) -> Option<f64> {
        let change = close - prev_close;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        match &mut self.state {
            RsiState::Warming {
                changes,
                gain_sum,
                loss_sum,
            } => {
                *changes += 1;
                *gain_sum += gain;
                *loss_sum += loss;
                if *changes == self.period {
                    let p = self.period as f64;
                    let (seed_gain, seed_loss) = (*gain_sum / p, *loss_sum / p);
                    self.state = RsiState::Ready {
                        avg_gain: Rma::seeded(self.period, seed_gain),
                        avg_loss: Rma::seeded(self.period, seed_loss),
                    };
                }
            }
            RsiState::Ready { avg_gain, avg_loss } => {
                avg_gain.update(gain);
                avg_loss.update(loss);
            }
        }

        self.value()
    }

    pub fn value(&self) -> Option<f64> {
        match &self.state {
            RsiState::Warming { .. } => None,
            RsiState::Ready { avg_gain, avg_loss } => Some(rsi_from_averages(
                avg_gain.value().unwrap_or(0.0),
                avg_loss.value().unwrap_or(0.0),
            )),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, RsiState::Ready { .. })
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

/// RSI value when neither average has moved.
pub const RSI_NO_MOVEMENT: f64 = 50.0;

/// RSI from smoothed gain/loss averages.
pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        RSI_NO_MOVEMENT
    } else if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
