//! Domain types for TrailWatch

pub mod candle;
pub mod key;

pub use candle::Candle;
pub use key::{Interval, ParseIntervalError, StreamKey};
