//! Signal service: registry, hub and running feeds behind one handle.

use crate::backfill::{backfill, backfill_all, BackfillReport};
use crate::config::{ServiceConfig, ServiceConfigError};
use crate::feed::{run_feed, FeedStats};
use crate::hub::{AccessPolicy, AllowAll, SnapshotHub, Subscription, SubscriptionFilter};
use crate::registry::EngineRegistry;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use trailwatch_core::{Candle, ConfigError, StreamKey};

/// Errors from service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid engine config: {0}")]
    Config(#[from] ConfigError),

    #[error("feed for {0} is closed")]
    FeedClosed(StreamKey),

    #[error("no tokio runtime available to start the feed for {0}")]
    NoRuntime(StreamKey),
}

struct Feed {
    sender: mpsc::Sender<Candle>,
    stop: oneshot::Sender<()>,
    task: JoinHandle<FeedStats>,
}

/// Owns the engine registry, the snapshot hub and one feed task per key.
pub struct SignalService {
    config: ServiceConfig,
    registry: Arc<EngineRegistry>,
    hub: SnapshotHub,
    feeds: Mutex<HashMap<StreamKey, Feed>>,
}

impl SignalService {
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceConfigError> {
        Self::with_policy(config, Arc::new(AllowAll))
    }

    /// Build the service with a custom subscriber entitlement check.
    pub fn with_policy(
        config: ServiceConfig,
        policy: Arc<dyn AccessPolicy>,
    ) -> Result<Self, ServiceConfigError> {
        config.validate()?;
        let registry =
            EngineRegistry::new(config.engine).map_err(|source| ServiceConfigError::Engine {
                scope: "[engine]".into(),
                source,
            })?;
        for (key, engine) in config.overrides() {
            let scope = key.to_string();
            registry
                .set_override(key, engine)
                .map_err(|source| ServiceConfigError::Engine { scope, source })?;
        }
        let hub = SnapshotHub::with_policy(config.broadcast_capacity, policy);
        Ok(Self {
            config,
            registry: Arc::new(registry),
            hub,
            feeds: Mutex::new(HashMap::new()),
        })
    }

    /// Candle sender for `key`, starting its feed task on first use.
    /// Must be called from within a tokio runtime.
    pub fn sender(&self, key: &StreamKey) -> Result<mpsc::Sender<Candle>, ServiceError> {
        let mut feeds = self.feeds.lock();
        if let Some(feed) = feeds.get(key) {
            if !feed.sender.is_closed() {
                return Ok(feed.sender.clone());
            }
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| ServiceError::NoRuntime(key.clone()))?;
        // Build the engine now so a bad override surfaces here, not in the task.
        self.registry.get_or_create(key)?;

        let (sender, receiver) = mpsc::channel(self.config.channel_capacity);
        let (stop, stop_rx) = oneshot::channel();
        let task = runtime.spawn(run_feed(
            key.clone(),
            Arc::clone(&self.registry),
            self.hub.clone(),
            receiver,
            stop_rx,
        ));
        feeds.insert(
            key.clone(),
            Feed {
                sender: sender.clone(),
                stop,
                task,
            },
        );
        Ok(sender)
    }

    /// Send one candle to `key`'s feed, waiting for queue space.
    pub async fn send(&self, key: &StreamKey, candle: Candle) -> Result<(), ServiceError> {
        let sender = self.sender(key)?;
        sender
            .send(candle)
            .await
            .map_err(|_| ServiceError::FeedClosed(key.clone()))
    }

    /// Start feeds for every stream listed in the config.
    pub fn start_configured(&self) -> Result<Vec<StreamKey>, ServiceError> {
        self.config
            .streams
            .iter()
            .map(|stream| {
                let key = stream.key();
                self.sender(&key)?;
                Ok(key)
            })
            .collect()
    }

    /// Replay history into `key`'s engine without publishing.
    pub fn backfill(&self, key: &StreamKey, candles: &[Candle]) -> Result<BackfillReport, ServiceError> {
        Ok(backfill(&self.registry, key, candles)?)
    }

    /// Backfill several keys in parallel.
    pub fn backfill_all(
        &self,
        batches: &[(StreamKey, Vec<Candle>)],
    ) -> Vec<Result<BackfillReport, ServiceError>> {
        backfill_all(&self.registry, batches)
            .into_iter()
            .map(|r| r.map_err(ServiceError::from))
            .collect()
    }

    pub fn subscribe(&self, subscriber: impl Into<String>, filter: SubscriptionFilter) -> Subscription {
        self.hub.subscribe(subscriber, filter)
    }

    /// Drop engines idle longer than `idle_eviction_secs`. Their feeds stay
    /// up and restart the engine cold on the next candle; the restarted
    /// engine re-warms and fires a simple signal on its second candle.
    pub fn evict_idle(&self) -> Vec<StreamKey> {
        match self.config.idle_eviction() {
            Some(max_idle) => self.registry.evict_idle(max_idle),
            None => Vec::new(),
        }
    }

    /// Close `key`'s feed and wait for its final stats.
    pub async fn stop_feed(&self, key: &StreamKey) -> Option<FeedStats> {
        let feed = self.feeds.lock().remove(key)?;
        join_feed(key, feed).await
    }

    /// Close every feed and collect their stats, sorted by key.
    pub async fn shutdown(self) -> Vec<FeedStats> {
        let feeds: Vec<(StreamKey, Feed)> = self.feeds.lock().drain().collect();
        info!(feeds = feeds.len(), "shutting down");
        let mut stats = Vec::with_capacity(feeds.len());
        for (key, feed) in feeds {
            if let Some(s) = join_feed(&key, feed).await {
                stats.push(s);
            }
        }
        stats.sort_by(|a, b| a.key.cmp(&b.key));
        stats
    }

    pub fn registry(&self) -> &Arc<EngineRegistry> {
        &self.registry
    }

    pub fn hub(&self) -> &SnapshotHub {
        &self.hub
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Keys with a running feed, sorted.
    pub fn feed_keys(&self) -> Vec<StreamKey> {
        let mut keys: Vec<_> = self.feeds.lock().keys().cloned().collect();
        keys.sort();
        keys
    }
}

/// Signal the feed to stop; queued candles are still processed.
async fn join_feed(key: &StreamKey, feed: Feed) -> Option<FeedStats> {
    let _ = feed.stop.send(());
    drop(feed.sender);
    match feed.task.await {
        Ok(stats) => Some(stats),
        Err(e) => {
            warn!(%key, error = %e, "feed task failed");
            None
        }
    }
}
