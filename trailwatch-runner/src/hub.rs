//! Snapshot fan-out to subscribers.
//!
//! Every processed snapshot is published once as an `Arc<Published>` on a
//! tokio broadcast channel; each subscription filters by symbol, interval and
//! access policy on its own side. A subscriber that falls more than the
//! channel capacity behind skips the missed items and keeps going.

use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};
use trailwatch_core::{Interval, Snapshot, StreamKey};

/// Fields always kept by `Published::project`.
const ALWAYS_PROJECTED: [&str; 3] = ["status", "time", "close"];

/// One published engine output.
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub key: StreamKey,
    pub snapshot: Snapshot,
}

impl Published {
    /// JSON of the snapshot restricted to `names` (plus status, time and
    /// close). An empty `names` keeps every field.
    pub fn project(&self, names: &[String]) -> Result<Value, serde_json::Error> {
        let mut full = serde_json::to_value(&self.snapshot)?;
        if !names.is_empty() {
            if let Value::Object(fields) = &mut full {
                let kept: Map<String, Value> = std::mem::take(fields)
                    .into_iter()
                    .filter(|(name, _)| {
                        ALWAYS_PROJECTED.contains(&name.as_str()) || names.iter().any(|n| n == name)
                    })
                    .collect();
                *fields = kept;
            }
        }
        let mut out = Map::new();
        out.insert("symbol".into(), Value::String(self.key.symbol.clone()));
        out.insert("interval".into(), Value::String(self.key.interval.to_string()));
        out.insert("snapshot".into(), full);
        Ok(Value::Object(out))
    }
}

/// Entitlement check applied per subscriber and key.
pub trait AccessPolicy: Send + Sync {
    fn allows(&self, subscriber: &str, key: &StreamKey) -> bool;
}

/// Grants everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AccessPolicy for AllowAll {
    fn allows(&self, _subscriber: &str, _key: &StreamKey) -> bool {
        true
    }
}

/// Which keys and fields a subscriber wants. `None` means no restriction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubscriptionFilter {
    pub symbols: Option<HashSet<String>>,
    pub intervals: Option<HashSet<Interval>>,
    /// Snapshot fields to keep when rendering. Empty keeps all.
    pub indicators: Vec<String>,
}

impl SubscriptionFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.symbols = Some(symbols.into_iter().map(Into::into).collect());
        self
    }

    pub fn intervals(mut self, intervals: impl IntoIterator<Item = Interval>) -> Self {
        self.intervals = Some(intervals.into_iter().collect());
        self
    }

    pub fn indicators<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indicators = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn matches(&self, key: &StreamKey) -> bool {
        self.symbols.as_ref().map_or(true, |s| s.contains(&key.symbol))
            && self.intervals.as_ref().map_or(true, |i| i.contains(&key.interval))
    }
}

/// Broadcast hub for published snapshots.
#[derive(Clone)]
pub struct SnapshotHub {
    sender: broadcast::Sender<Arc<Published>>,
    policy: Arc<dyn AccessPolicy>,
}

impl std::fmt::Debug for SnapshotHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotHub")
            .field("receivers", &self.sender.receiver_count())
            .finish()
    }
}

impl SnapshotHub {
    pub fn new(capacity: usize) -> Self {
        Self::with_policy(capacity, Arc::new(AllowAll))
    }

    pub fn with_policy(capacity: usize, policy: Arc<dyn AccessPolicy>) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender, policy }
    }

    /// Publish one snapshot. Returns how many subscriptions it reached; zero
    /// when nobody is listening.
    pub fn publish(&self, key: StreamKey, snapshot: Snapshot) -> usize {
        self.sender
            .send(Arc::new(Published { key, snapshot }))
            .unwrap_or(0)
    }

    pub fn subscribe(&self, subscriber: impl Into<String>, filter: SubscriptionFilter) -> Subscription {
        let subscriber = subscriber.into();
        debug!(%subscriber, "subscription opened");
        Subscription {
            subscriber,
            filter,
            policy: Arc::clone(&self.policy),
            receiver: self.sender.subscribe(),
            skipped: 0,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Receiving end of one subscriber.
pub struct Subscription {
    subscriber: String,
    filter: SubscriptionFilter,
    policy: Arc<dyn AccessPolicy>,
    receiver: broadcast::Receiver<Arc<Published>>,
    skipped: u64,
}

impl Subscription {
    /// Next snapshot this subscriber may see, or `None` once the hub is gone.
    pub async fn recv(&mut self) -> Option<Arc<Published>> {
        loop {
            match self.receiver.recv().await {
                Ok(item) => {
                    if self.accepts(&item.key) {
                        return Some(item);
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    self.skipped += missed;
                    warn!(
                        subscriber = %self.subscriber,
                        missed,
                        "subscriber lagging, skipped snapshots"
                    );
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Render `item` with this subscription's indicator projection.
    pub fn render(&self, item: &Published) -> Result<Value, serde_json::Error> {
        item.project(&self.filter.indicators)
    }

    fn accepts(&self, key: &StreamKey) -> bool {
        self.filter.matches(key) && self.policy.allows(&self.subscriber, key)
    }

    pub fn subscriber(&self) -> &str {
        &self.subscriber
    }

    pub fn filter(&self) -> &SubscriptionFilter {
        &self.filter
    }

    /// Snapshots dropped because this subscriber lagged.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}
