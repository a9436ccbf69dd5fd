//! Synthetic candles for demos and benchmarks.
//!
//! A random walk from 100.0, seeded from the stream key so the same key
//! always yields the same series. Clearly fake; never mix with real data.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use trailwatch_core::{Candle, StreamKey};

/// `count` candles for `key` starting at `start_time` (floored to the
/// interval), one interval apart.
pub fn synthetic_candles(key: &StreamKey, start_time: i64, count: usize) -> Vec<Candle> {
    // Deterministic seed from the key
    let seed: [u8; 32] = *blake3::hash(key.to_string().as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let step = key.interval.seconds();
    let mut time = key.interval.bucket_start(start_time);
    let mut price = 100.0_f64;
    let mut candles = Vec::with_capacity(count);

    for _ in 0..count {
        let ret: f64 = rng.gen_range(-0.01..0.01);
        let open = price;
        let close = price * (1.0 + ret);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.004));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.004));
        let volume = rng.gen_range(10.0..1_000.0);
        candles.push(Candle::new(time, open, high, low, close, volume));
        price = close;
        time += step;
    }

    candles
}

#[cfg(test)]
mod tests {
    use super::*;
    use trailwatch_core::Interval;

    #[test]
    fn synthetic_is_deterministic_and_sane() {
        let key = StreamKey::new("BTCUSDT", Interval::M1);
        let a = synthetic_candles(&key, 0, 200);
        let b = synthetic_candles(&key, 0, 200);
        assert_eq!(a, b);
        assert!(a.iter().all(Candle::is_sane));
        assert!(a.windows(2).all(|w| w[1].time - w[0].time == 60));
    }

    #[test]
    fn different_keys_differ() {
        let btc = synthetic_candles(&StreamKey::new("BTCUSDT", Interval::M1), 0, 10);
        let eth = synthetic_candles(&StreamKey::new("ETHUSDT", Interval::M1), 0, 10);
        assert_ne!(btc[0].close, eth[0].close);
    }

    #[test]
    fn start_is_aligned() {
        let key = StreamKey::new("X", Interval::H1);
        let candles = synthetic_candles(&key, 5_000, 3);
        assert_eq!(candles[0].time, 3_600);
        assert_eq!(candles[2].time, 10_800);
    }
}
