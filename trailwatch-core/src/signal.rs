//! Signal evaluation: turns one tick's indicator values into buy/sell conditions.
//!
//! Primary signals require the trailing-stop crossover plus trend, RSI and ADX
//! agreement. Simple signals are the bare crossover. Both kinds can fire on the
//! same candle.

use crate::crossover::Cross;
use serde::{Deserialize, Serialize};

/// Kind of a fired signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SignalKind {
    PrimaryBuy,
    PrimarySell,
    SimpleBuy,
    SimpleSell,
}

impl SignalKind {
    pub fn direction(self) -> Direction {
        match self {
            SignalKind::PrimaryBuy | SignalKind::SimpleBuy => Direction::Buy,
            SignalKind::PrimarySell | SignalKind::SimpleSell => Direction::Sell,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SignalKind::PrimaryBuy => "BUY",
            SignalKind::PrimarySell => "SELL",
            SignalKind::SimpleBuy => "Buy",
            SignalKind::SimpleSell => "Sell",
        }
    }
}

/// Trade direction of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
}

/// Price position relative to the trend EMA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Down,
    Flat,
    Up,
}

impl TrendDirection {
    pub fn from_price(price: f64, trend_ema: f64) -> Self {
        if price > trend_ema {
            TrendDirection::Up
        } else if price < trend_ema {
            TrendDirection::Down
        } else {
            TrendDirection::Flat
        }
    }

    /// +1, 0 or -1.
    pub fn sign(self) -> i8 {
        match self {
            TrendDirection::Down => -1,
            TrendDirection::Flat => 0,
            TrendDirection::Up => 1,
        }
    }

    pub fn allows(self, direction: Direction) -> bool {
        match direction {
            Direction::Buy => self != TrendDirection::Down,
            Direction::Sell => self != TrendDirection::Up,
        }
    }
}

/// Bar coloring: price above or below the smoothed stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarColor {
    Buy,
    Sell,
}

/// A fired signal with its protective levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub kind: SignalKind,
    pub time: i64,
    pub price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub render_text: String,
}

/// Thresholds and multipliers applied by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalRules {
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub adx_threshold: f64,
    pub sl_multiplier: f64,
    pub tp_multiplier: f64,
}

/// Per-tick values the evaluator reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalInputs {
    pub time: i64,
    pub price: f64,
    pub smoothed_stop: f64,
    pub trend_ema: f64,
    pub rsi: Option<f64>,
    pub adx: f64,
    pub atr: f64,
    /// `up`: price crossed over the smoothed stop; `down`: the reverse.
    pub cross: Cross,
}

/// Everything decided on one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub trend: TrendDirection,
    pub primary_buy: bool,
    pub primary_sell: bool,
    pub simple_buy: bool,
    pub simple_sell: bool,
    pub bar_color: Option<BarColor>,
    /// Fired signals in kind order: primary buy, primary sell, simple buy, simple sell.
    pub signals: Vec<Signal>,
}

impl Evaluation {
    /// Levels of the last signal in `signals`, if any fired.
    pub fn latest_levels(&self) -> Option<(f64, f64)> {
        self.signals.last().map(|s| (s.stop_loss, s.take_profit))
    }
}

/// Stop-loss and take-profit for an entry at `price`.
pub fn protective_levels(direction: Direction, price: f64, atr: f64, rules: &SignalRules) -> (f64, f64) {
    let sl_distance = atr * rules.sl_multiplier;
    let tp_distance = atr * rules.tp_multiplier;
    match direction {
        Direction::Buy => (price - sl_distance, price + tp_distance),
        Direction::Sell => (price + sl_distance, price - tp_distance),
    }
}

/// Evaluate all four conditions for one tick.
pub fn evaluate(inputs: &SignalInputs, rules: &SignalRules) -> Evaluation {
    let price = inputs.price;
    let trend = TrendDirection::from_price(price, inputs.trend_ema);
    let adx_filter = inputs.adx > rules.adx_threshold;

    let primary_buy = price > inputs.smoothed_stop
        && inputs.cross.up
        && trend.allows(Direction::Buy)
        && inputs.rsi.is_some_and(|rsi| rsi < rules.rsi_oversold)
        && adx_filter;
    let primary_sell = price < inputs.smoothed_stop
        && inputs.cross.down
        && trend.allows(Direction::Sell)
        && inputs.rsi.is_some_and(|rsi| rsi > rules.rsi_overbought)
        && adx_filter;
    let simple_buy = inputs.cross.up;
    let simple_sell = inputs.cross.down;

    let bar_color = if price > inputs.smoothed_stop {
        Some(BarColor::Buy)
    } else if price < inputs.smoothed_stop {
        Some(BarColor::Sell)
    } else {
        None
    };

    let signals = [
        (primary_buy, SignalKind::PrimaryBuy),
        (primary_sell, SignalKind::PrimarySell),
        (simple_buy, SignalKind::SimpleBuy),
        (simple_sell, SignalKind::SimpleSell),
    ]
    .into_iter()
    .filter(|(fired, _)| *fired)
    .map(|(_, kind)| {
        let (stop_loss, take_profit) = protective_levels(kind.direction(), price, inputs.atr, rules);
        Signal {
            kind,
            time: inputs.time,
            price,
            stop_loss,
            take_profit,
            render_text: format!("{} @ {price}", kind.label()),
        }
    })
    .collect();

    Evaluation {
        trend,
        primary_buy,
        primary_sell,
        simple_buy,
        simple_sell,
        bar_color,
        signals,
    }
}
