//! Bounded candle window, oldest first.

use crate::domain::Candle;
use std::collections::VecDeque;

/// What `CandleWindow::push` did with the candle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Push {
    /// Appended as a new entry.
    Appended,
    /// Same `time` as the last entry; the previous candle is returned.
    Replaced(Candle),
}

/// Candle history capped at `capacity`; the oldest entry is dropped on overflow.
#[derive(Debug, Clone)]
pub struct CandleWindow {
    candles: VecDeque<Candle>,
    capacity: usize,
}

impl CandleWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            candles: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Append `candle`, or replace the last entry when the times match.
    pub fn push(&mut self, candle: Candle) -> Push {
        if let Some(last) = self.candles.back_mut() {
            if last.time == candle.time {
                let previous = *last;
                *last = candle;
                return Push::Replaced(previous);
            }
        }
        self.candles.push_back(candle);
        while self.candles.len() > self.capacity {
            self.candles.pop_front();
        }
        Push::Appended
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.back()
    }

    /// The entry before the last one.
    pub fn previous(&self) -> Option<&Candle> {
        let len = self.candles.len();
        if len < 2 {
            None
        } else {
            self.candles.get(len - 2)
        }
    }

    pub fn oldest(&self) -> Option<&Candle> {
        self.candles.front()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candle> {
        self.candles.iter()
    }
}
