//! Per-candle engine output.

use crate::signal::{BarColor, Signal, TrendDirection};
use serde::{Deserialize, Serialize};

/// Indicator and signal state after one processed candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub time: i64,
    pub close: f64,
    pub atr: f64,
    /// Raw trailing stop.
    pub stop: f64,
    /// EMA(5) of the raw stop; crossovers are measured against this.
    pub smoothed_stop: f64,
    pub trend_ema: f64,
    pub trend_direction: TrendDirection,
    pub price_ema: f64,
    /// `None` until `rsi_period + 1` candles have been seen.
    pub rsi: Option<f64>,
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
    pub primary_buy: bool,
    pub primary_sell: bool,
    pub simple_buy: bool,
    pub simple_sell: bool,
    pub last_stop_loss: Option<f64>,
    pub last_take_profit: Option<f64>,
    pub signals: Vec<Signal>,
    pub bar_color: Option<BarColor>,
}

/// Result of `IndicatorEngine::process`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Snapshot {
    /// Fewer than two candles: nothing pairwise can be computed yet.
    NotReady {
        time: i64,
        close: f64,
        candles_seen: usize,
    },
    Ready(IndicatorSnapshot),
}

impl Snapshot {
    pub fn is_ready(&self) -> bool {
        matches!(self, Snapshot::Ready(_))
    }

    pub fn time(&self) -> i64 {
        match self {
            Snapshot::NotReady { time, .. } => *time,
            Snapshot::Ready(s) => s.time,
        }
    }

    pub fn close(&self) -> f64 {
        match self {
            Snapshot::NotReady { close, .. } => *close,
            Snapshot::Ready(s) => s.close,
        }
    }

    pub fn as_ready(&self) -> Option<&IndicatorSnapshot> {
        match self {
            Snapshot::Ready(s) => Some(s),
            Snapshot::NotReady { .. } => None,
        }
    }

    /// Signals fired on this candle (empty when not ready).
    pub fn signals(&self) -> &[Signal] {
        match self {
            Snapshot::Ready(s) => &s.signals,
            Snapshot::NotReady { .. } => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_ready_serializes_with_tag() {
        let snap = Snapshot::NotReady {
            time: 60,
            close: 100.0,
            candles_seen: 1,
        };
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["status"], "notReady");
        assert_eq!(json["candles_seen"], 1);
        assert!(!snap.is_ready());
        assert!(snap.signals().is_empty());
        assert_eq!(snap.time(), 60);
    }
}
