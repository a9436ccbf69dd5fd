//! TrailWatch Core — incremental indicator engine.
//!
//! This crate turns a stream of OHLCV candles into indicator snapshots and
//! trading signals, one candle at a time:
//! - Domain types (candles, intervals, stream keys)
//! - Smoothing primitives (EMA, Wilder RMA) and derived indicators (ATR, RSI, ADX)
//! - Adaptive ATR trailing stop with EMA smoothing
//! - Crossover detection and signal evaluation
//! - `IndicatorEngine`, the per-stream façade exposing `process(candle) -> Snapshot`
//!
//! No I/O, no threads. Driving engines concurrently is the runner's job.

pub mod crossover;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod signal;
pub mod stop;

pub use domain::{Candle, Interval, StreamKey};
pub use engine::{ConfigError, EngineConfig, IndicatorEngine, IndicatorSnapshot, Snapshot};
pub use signal::{BarColor, Direction, Signal, SignalKind, TrendDirection};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: engine and snapshot types are Send + Sync so the
    /// runner can move them across tasks and share snapshots behind `Arc`.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<Candle>();
        require_sync::<Candle>();
        require_send::<StreamKey>();
        require_sync::<StreamKey>();
        require_send::<EngineConfig>();
        require_sync::<EngineConfig>();
        require_send::<IndicatorEngine>();
        require_sync::<IndicatorEngine>();
        require_send::<Snapshot>();
        require_sync::<Snapshot>();
        require_send::<Signal>();
        require_sync::<Signal>();
    }
}
