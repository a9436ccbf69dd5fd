//! Indicator engine: one per (symbol, interval).
//!
//! Each `process` call appends a candle to the window, advances every
//! incremental indicator by one step and evaluates signals. History is never
//! rescanned: only the last two candles are read.
//!
//! A candle with the same `time` as the last one replaces it. The engine
//! keeps a checkpoint of its indicator state from before the last append and
//! re-applies the replacement from there, so a provisional candle followed by
//! its final version ends in the same state as the final version alone.

pub mod config;
pub mod snapshot;
pub mod window;

pub use config::{ConfigError, EngineConfig};
pub use snapshot::{IndicatorSnapshot, Snapshot};
pub use window::{CandleWindow, Push};

use crate::crossover::CrossTracker;
use crate::domain::Candle;
use crate::indicators::{Adx, Atr, Ema, Rsi};
use crate::signal::{evaluate, SignalInputs, SignalRules};
use crate::stop::AtrStop;
use tracing::{debug, trace};

/// Period of the EMA over close exposed as `price_ema`.
pub const PRICE_EMA_PERIOD: usize = 5;

/// Everything that advances per candle. `Clone` so it can be checkpointed.
#[derive(Debug, Clone)]
struct IndicatorState {
    candles_seen: usize,
    trend_ema: Ema,
    price_ema: Ema,
    atr: Atr,
    rsi: Rsi,
    adx: Adx,
    stop: AtrStop,
    cross: CrossTracker,
    last_levels: Option<(f64, f64)>,
}

impl IndicatorState {
    fn new(config: &EngineConfig) -> Self {
        Self {
            candles_seen: 0,
            trend_ema: Ema::new(config.trend_ema_period),
            price_ema: Ema::new(PRICE_EMA_PERIOD),
            atr: Atr::new(config.atr_period),
            rsi: Rsi::new(config.rsi_period),
            adx: Adx::new(config.adx_period),
            stop: AtrStop::new(config.sensitivity),
            cross: CrossTracker::new(),
            last_levels: None,
        }
    }
}

/// Incremental indicator engine for a single stream.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    config: EngineConfig,
    rules: SignalRules,
    window: CandleWindow,
    state: IndicatorState,
    /// State before the last append; restored when the last candle is replaced.
    checkpoint: IndicatorState,
}

impl IndicatorEngine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = IndicatorState::new(&config);
        Ok(Self {
            rules: SignalRules {
                rsi_oversold: config.rsi_oversold,
                rsi_overbought: config.rsi_overbought,
                adx_threshold: config.adx_threshold,
                sl_multiplier: config.sl_multiplier,
                tp_multiplier: config.tp_multiplier,
            },
            window: CandleWindow::new(config.window_capacity()),
            checkpoint: state.clone(),
            state,
            config,
        })
    }

    /// Consume one candle and return the resulting snapshot.
    ///
    /// Never fails: degenerate input shows up as NaN or `None` in the snapshot.
    /// Malformed candles are expected to be filtered before they get here.
    pub fn process(&mut self, candle: Candle) -> Snapshot {
        match self.window.push(candle) {
            Push::Appended => self.checkpoint = self.state.clone(),
            Push::Replaced(previous) => {
                trace!(
                    time = candle.time,
                    old_close = previous.close,
                    new_close = candle.close,
                    "replacing last candle"
                );
                self.state = self.checkpoint.clone();
            }
        }
        let prev = self.window.previous().copied();
        self.apply(prev, candle)
    }

    fn apply(&mut self, prev: Option<Candle>, curr: Candle) -> Snapshot {
        let state = &mut self.state;
        state.candles_seen += 1;
        let trend_ema = state.trend_ema.update(curr.close);
        let price_ema = state.price_ema.update(curr.close);

        let Some(prev) = prev else {
            return Snapshot::NotReady {
                time: curr.time,
                close: curr.close,
                candles_seen: state.candles_seen,
            };
        };

        let atr = state.atr.update(&prev, &curr);
        let rsi = state.rsi.update(prev.close, curr.close);
        let adx = state.adx.update(&prev, &curr);

        let stop = state.stop.update(curr.close, prev.close, atr);
        if stop.seeded {
            state.cross.seed(prev.close, stop.previous_stop);
        }
        let cross = state.cross.update(curr.close, stop.smoothed);

        let eval = evaluate(
            &SignalInputs {
                time: curr.time,
                price: curr.close,
                smoothed_stop: stop.smoothed,
                trend_ema,
                rsi,
                adx: adx.adx,
                atr,
                cross,
            },
            &self.rules,
        );

        if let Some(levels) = eval.latest_levels() {
            state.last_levels = Some(levels);
        }
        for signal in &eval.signals {
            debug!(
                kind = ?signal.kind,
                time = signal.time,
                price = signal.price,
                stop_loss = signal.stop_loss,
                take_profit = signal.take_profit,
                "signal fired"
            );
        }

        Snapshot::Ready(IndicatorSnapshot {
            time: curr.time,
            close: curr.close,
            atr,
            stop: stop.stop,
            smoothed_stop: stop.smoothed,
            trend_ema,
            trend_direction: eval.trend,
            price_ema,
            rsi,
            adx: adx.adx,
            plus_di: adx.plus_di,
            minus_di: adx.minus_di,
            primary_buy: eval.primary_buy,
            primary_sell: eval.primary_sell,
            simple_buy: eval.simple_buy,
            simple_sell: eval.simple_sell,
            last_stop_loss: state.last_levels.map(|(sl, _)| sl),
            last_take_profit: state.last_levels.map(|(_, tp)| tp),
            signals: eval.signals,
            bar_color: eval.bar_color,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn window(&self) -> &CandleWindow {
        &self.window
    }

    /// Candles processed, replacements not counted twice.
    pub fn candles_seen(&self) -> usize {
        self.state.candles_seen
    }

    /// Most recently fired `(stop_loss, take_profit)`.
    pub fn last_levels(&self) -> Option<(f64, f64)> {
        self.state.last_levels
    }

    pub fn last_candle(&self) -> Option<&Candle> {
        self.window.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_candles;

    fn engine() -> IndicatorEngine {
        IndicatorEngine::new(EngineConfig::default()).unwrap()
    }

    #[test]
    fn first_candle_not_ready() {
        let mut e = engine();
        let candles = make_candles(&[100.0, 101.0]);
        let snap = e.process(candles[0]);
        assert_eq!(
            snap,
            Snapshot::NotReady {
                time: 0,
                close: 100.0,
                candles_seen: 1
            }
        );
        assert!(e.process(candles[1]).is_ready());
        assert_eq!(e.candles_seen(), 2);
    }

    #[test]
    fn invalid_config_rejected() {
        let config = EngineConfig {
            atr_period: 0,
            ..EngineConfig::default()
        };
        assert!(IndicatorEngine::new(config).is_err());
    }

    #[test]
    fn replacing_first_candle_stays_not_ready() {
        let mut e = engine();
        let c = make_candles(&[100.0])[0];
        e.process(c);
        let snap = e.process(Candle { close: 99.0, ..c });
        assert_eq!(
            snap,
            Snapshot::NotReady {
                time: 0,
                close: 99.0,
                candles_seen: 1
            }
        );
        assert_eq!(e.window().len(), 1);
    }

    #[test]
    fn replacement_matches_final_only() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let candles = make_candles(&closes);

        let mut direct = engine();
        let mut provisional = engine();
        let mut last_direct = None;
        let mut last_prov = None;
        for c in &candles {
            let early = Candle {
                close: c.close + 3.0,
                high: c.high + 3.0,
                ..*c
            };
            provisional.process(early);
            last_prov = Some(provisional.process(*c));
            last_direct = Some(direct.process(*c));
        }
        assert_eq!(last_prov, last_direct);
        assert_eq!(provisional.candles_seen(), direct.candles_seen());
    }
}
