//! Building higher-interval candles from finer ones.
//!
//! `aggregate` buckets a finished series in one pass. `CandleAggregator`
//! does the same incrementally and hands out the in-progress bucket after
//! every input; because the bucket keeps its open time until it rolls over,
//! feeding those candles to an engine replaces the last candle until the
//! bucket closes.

use trailwatch_core::{Candle, Interval};

/// Merge `next` into `bucket`.
fn merge(bucket: &mut Candle, next: &Candle) {
    bucket.high = bucket.high.max(next.high);
    bucket.low = bucket.low.min(next.low);
    bucket.close = next.close;
    bucket.volume += next.volume;
}

fn open_bucket(candle: &Candle, interval: Interval) -> Candle {
    Candle {
        time: interval.bucket_start(candle.time),
        ..*candle
    }
}

/// Bucket time-ordered `candles` into `interval` candles stamped with the
/// bucket open time. The last bucket may be partial.
pub fn aggregate(candles: &[Candle], interval: Interval) -> Vec<Candle> {
    let mut out: Vec<Candle> = Vec::new();
    for candle in candles {
        let start = interval.bucket_start(candle.time);
        match out.last_mut() {
            Some(bucket) if bucket.time == start => merge(bucket, candle),
            _ => out.push(open_bucket(candle, interval)),
        }
    }
    out
}

/// Result of pushing one finer candle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregatorStep {
    /// Current state of the open bucket, including the pushed candle.
    pub provisional: Candle,
    /// The previous bucket, when this push started a new one.
    pub completed: Option<Candle>,
}

/// Incremental bucketer for one stream.
#[derive(Debug, Clone)]
pub struct CandleAggregator {
    interval: Interval,
    current: Option<Candle>,
}

impl CandleAggregator {
    pub fn new(interval: Interval) -> Self {
        Self {
            interval,
            current: None,
        }
    }

    pub fn push(&mut self, candle: &Candle) -> AggregatorStep {
        let start = self.interval.bucket_start(candle.time);
        let completed = match self.current {
            Some(ref mut bucket) if bucket.time == start => {
                merge(bucket, candle);
                None
            }
            _ => self.current.replace(open_bucket(candle, self.interval)),
        };
        let provisional = *self
            .current
            .get_or_insert_with(|| open_bucket(candle, self.interval));
        AggregatorStep {
            provisional,
            completed,
        }
    }

    /// Take the open bucket, leaving the aggregator empty.
    pub fn flush(&mut self) -> Option<Candle> {
        self.current.take()
    }

    pub fn current(&self) -> Option<&Candle> {
        self.current.as_ref()
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }
}
