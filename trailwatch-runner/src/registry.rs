//! Keyed registry of indicator engines.
//!
//! One engine per `StreamKey`, created lazily from the default config or a
//! per-key override. Each engine sits behind its own mutex so different keys
//! never contend, and the same key is never driven concurrently.

use parking_lot::{Mutex, MutexGuard, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use trailwatch_core::{Candle, ConfigError, EngineConfig, IndicatorEngine, Snapshot, StreamKey};

/// Engine plus the last time anything touched it.
#[derive(Debug)]
pub struct EngineSlot {
    pub engine: IndicatorEngine,
    last_used: Instant,
}

impl EngineSlot {
    pub fn last_used(&self) -> Instant {
        self.last_used
    }
}

/// Shared handle to one key's engine.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    key: StreamKey,
    slot: Arc<Mutex<EngineSlot>>,
}

impl EngineHandle {
    pub fn key(&self) -> &StreamKey {
        &self.key
    }

    /// Process one candle under the key's lock.
    pub fn process(&self, candle: Candle) -> Snapshot {
        let mut slot = self.slot.lock();
        slot.last_used = Instant::now();
        slot.engine.process(candle)
    }

    /// Lock the slot for several operations in a row.
    pub fn lock(&self) -> MutexGuard<'_, EngineSlot> {
        let mut slot = self.slot.lock();
        slot.last_used = Instant::now();
        slot
    }

    /// Last processed candle, if any.
    pub fn last_candle(&self) -> Option<Candle> {
        self.slot.lock().engine.last_candle().copied()
    }
}

/// Registry of engines keyed by (symbol, interval).
#[derive(Debug)]
pub struct EngineRegistry {
    defaults: EngineConfig,
    overrides: RwLock<HashMap<StreamKey, EngineConfig>>,
    engines: RwLock<HashMap<StreamKey, Arc<Mutex<EngineSlot>>>>,
}

impl EngineRegistry {
    pub fn new(defaults: EngineConfig) -> Result<Self, ConfigError> {
        defaults.validate()?;
        Ok(Self {
            defaults,
            overrides: RwLock::new(HashMap::new()),
            engines: RwLock::new(HashMap::new()),
        })
    }

    /// Use `config` for `key` instead of the defaults. Takes effect the next
    /// time the engine is created.
    pub fn set_override(&self, key: StreamKey, config: EngineConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.overrides.write().insert(key, config);
        Ok(())
    }

    pub fn config_for(&self, key: &StreamKey) -> EngineConfig {
        self.overrides
            .read()
            .get(key)
            .copied()
            .unwrap_or(self.defaults)
    }

    pub fn get(&self, key: &StreamKey) -> Option<EngineHandle> {
        self.engines.read().get(key).map(|slot| EngineHandle {
            key: key.clone(),
            slot: Arc::clone(slot),
        })
    }

    /// Existing engine for `key`, or a fresh one.
    pub fn get_or_create(&self, key: &StreamKey) -> Result<EngineHandle, ConfigError> {
        if let Some(handle) = self.get(key) {
            return Ok(handle);
        }

        let mut engines = self.engines.write();
        // Another caller may have created it between the read and write locks.
        let slot = match engines.get(key) {
            Some(slot) => Arc::clone(slot),
            None => {
                let engine = IndicatorEngine::new(self.config_for(key))?;
                let slot = Arc::new(Mutex::new(EngineSlot {
                    engine,
                    last_used: Instant::now(),
                }));
                engines.insert(key.clone(), Arc::clone(&slot));
                debug!(%key, "engine created");
                slot
            }
        };
        Ok(EngineHandle {
            key: key.clone(),
            slot,
        })
    }

    /// Run `f` on the live engine for `key` under its lock.
    ///
    /// The slot is re-checked against the registry after locking: if
    /// `evict_idle` removed it between lookup and lock, a fresh engine is
    /// fetched instead, so the candle never lands on a detached engine.
    pub fn with_engine<R>(
        &self,
        key: &StreamKey,
        f: impl FnOnce(&mut EngineSlot) -> R,
    ) -> Result<R, ConfigError> {
        loop {
            let handle = self.get_or_create(key)?;
            let mut slot = handle.slot.lock();
            let live = self
                .engines
                .read()
                .get(key)
                .is_some_and(|current| Arc::ptr_eq(current, &handle.slot));
            if live {
                slot.last_used = Instant::now();
                return Ok(f(&mut *slot));
            }
            debug!(%key, "engine evicted before lock, retrying");
        }
    }

    /// Drop the engine for `key`. Outstanding handles keep working on the
    /// detached engine; the next `get_or_create` starts from scratch.
    pub fn evict(&self, key: &StreamKey) -> bool {
        self.engines.write().remove(key).is_some()
    }

    /// Drop engines unused for at least `max_idle`. Engines currently locked
    /// are in use and kept.
    ///
    /// An evicted key restarts cold: its next engine starts a fresh stop and
    /// crossover history, so its second candle after the restart fires a
    /// simple signal.
    pub fn evict_idle(&self, max_idle: Duration) -> Vec<StreamKey> {
        let now = Instant::now();
        let mut evicted = Vec::new();
        self.engines.write().retain(|key, slot| {
            let idle = match slot.try_lock() {
                Some(slot) => now.saturating_duration_since(slot.last_used) >= max_idle,
                None => false,
            };
            if idle {
                evicted.push(key.clone());
            }
            !idle
        });
        if !evicted.is_empty() {
            evicted.sort();
            info!(count = evicted.len(), "evicted idle engines");
        }
        evicted
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<StreamKey> {
        let mut keys: Vec<_> = self.engines.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.engines.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.read().is_empty()
    }

    pub fn defaults(&self) -> &EngineConfig {
        &self.defaults
    }
}
