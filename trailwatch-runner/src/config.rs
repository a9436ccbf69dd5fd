//! Service configuration loaded from TOML.
//!
//! ```toml
//! channel_capacity = 1024
//! broadcast_capacity = 4096
//! idle_eviction_secs = 3600
//!
//! [engine]
//! sensitivity = 8.0
//!
//! [[streams]]
//! symbol = "BTCUSDT"
//! interval = "1m"
//!
//! [[streams]]
//! symbol = "ETHUSDT"
//! interval = "5m"
//! engine = { sensitivity = 4.0, atr_period = 10 }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use trailwatch_core::{ConfigError, EngineConfig, Interval, StreamKey};

/// Errors from loading or validating a service config.
#[derive(Debug, Error)]
pub enum ServiceConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid engine config for {scope}: {source}")]
    Engine {
        scope: String,
        #[source]
        source: ConfigError,
    },

    #[error("{0} must be > 0")]
    ZeroCapacity(&'static str),

    #[error("stream {0} listed more than once")]
    DuplicateStream(StreamKey),
}

/// One configured stream with an optional engine override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    pub symbol: String,
    pub interval: Interval,
    /// Replaces the service-wide `[engine]` table for this stream.
    #[serde(default)]
    pub engine: Option<EngineConfig>,
}

impl StreamConfig {
    pub fn key(&self) -> StreamKey {
        StreamKey::new(self.symbol.clone(), self.interval)
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Engine parameters for any key without an override.
    pub engine: EngineConfig,
    /// Per-key candle queue depth.
    pub channel_capacity: usize,
    /// Snapshot fan-out buffer; slower subscribers skip ahead past this.
    pub broadcast_capacity: usize,
    /// Engines untouched for this long are dropped by `evict_idle`. `None` disables.
    pub idle_eviction_secs: Option<u64>,
    pub streams: Vec<StreamConfig>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            channel_capacity: 1024,
            broadcast_capacity: 4096,
            idle_eviction_secs: None,
            streams: Vec::new(),
        }
    }
}

impl ServiceConfig {
    /// Read, parse and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ServiceConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ServiceConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ServiceConfigError> {
        let config: ServiceConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ServiceConfigError> {
        if self.channel_capacity == 0 {
            return Err(ServiceConfigError::ZeroCapacity("channel_capacity"));
        }
        if self.broadcast_capacity == 0 {
            return Err(ServiceConfigError::ZeroCapacity("broadcast_capacity"));
        }
        self.engine
            .validate()
            .map_err(|source| ServiceConfigError::Engine {
                scope: "[engine]".into(),
                source,
            })?;

        let mut seen = std::collections::HashSet::new();
        for stream in &self.streams {
            let key = stream.key();
            if let Some(engine) = &stream.engine {
                engine
                    .validate()
                    .map_err(|source| ServiceConfigError::Engine {
                        scope: key.to_string(),
                        source,
                    })?;
            }
            if !seen.insert(key.clone()) {
                return Err(ServiceConfigError::DuplicateStream(key));
            }
        }
        Ok(())
    }

    pub fn idle_eviction(&self) -> Option<Duration> {
        self.idle_eviction_secs.map(Duration::from_secs)
    }

    /// Engine config for `key`: its stream override, else `[engine]`.
    pub fn engine_for(&self, key: &StreamKey) -> EngineConfig {
        self.streams
            .iter()
            .find(|s| s.symbol == key.symbol && s.interval == key.interval)
            .and_then(|s| s.engine)
            .unwrap_or(self.engine)
    }

    /// `(key, override)` pairs for streams that carry their own engine table.
    pub fn overrides(&self) -> impl Iterator<Item = (StreamKey, EngineConfig)> + '_ {
        self.streams
            .iter()
            .filter_map(|s| s.engine.map(|engine| (s.key(), engine)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
channel_capacity = 16
idle_eviction_secs = 600

[engine]
sensitivity = 3.0

[[streams]]
symbol = "BTCUSDT"
interval = "1m"

[[streams]]
symbol = "ETHUSDT"
interval = "5m"
engine = { sensitivity = 4.0, atr_period = 10 }
"#;

    #[test]
    fn parses_sample() {
        let config = ServiceConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.channel_capacity, 16);
        assert_eq!(config.broadcast_capacity, 4096);
        assert_eq!(config.engine.sensitivity, 3.0);
        assert_eq!(config.engine.atr_period, 20);
        assert_eq!(config.idle_eviction(), Some(Duration::from_secs(600)));
        assert_eq!(config.streams.len(), 2);

        let overrides: Vec<_> = config.overrides().collect();
        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides[0].0, StreamKey::new("ETHUSDT", Interval::M5));
        assert_eq!(overrides[0].1.atr_period, 10);
        // fields missing from the override fall back to engine defaults
        assert_eq!(overrides[0].1.rsi_period, 14);

        assert_eq!(config.engine_for(&StreamKey::new("ETHUSDT", Interval::M5)).atr_period, 10);
        assert_eq!(config.engine_for(&StreamKey::new("BTCUSDT", Interval::M1)).sensitivity, 3.0);
        assert_eq!(config.engine_for(&StreamKey::new("ETHUSDT", Interval::M1)).sensitivity, 3.0);
    }

    #[test]
    fn empty_config_is_default() {
        let config = ServiceConfig::from_toml("").unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn rejects_bad_interval() {
        let text = "[[streams]]\nsymbol = \"X\"\ninterval = \"2m\"\n";
        assert!(matches!(
            ServiceConfig::from_toml(text),
            Err(ServiceConfigError::Parse(_))
        ));
    }

    #[test]
    fn rejects_invalid_override() {
        let text = "[[streams]]\nsymbol = \"X\"\ninterval = \"1m\"\nengine = { rsi_period = 0 }\n";
        match ServiceConfig::from_toml(text) {
            Err(ServiceConfigError::Engine { scope, .. }) => assert_eq!(scope, "X@1m"),
            other => panic!("expected engine error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_duplicates_and_zero_capacity() {
        let text = "[[streams]]\nsymbol = \"X\"\ninterval = \"1m\"\n[[streams]]\nsymbol = \"X\"\ninterval = \"1m\"\n";
        assert!(matches!(
            ServiceConfig::from_toml(text),
            Err(ServiceConfigError::DuplicateStream(_))
        ));
        assert!(matches!(
            ServiceConfig::from_toml("channel_capacity = 0"),
            Err(ServiceConfigError::ZeroCapacity("channel_capacity"))
        ));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("service.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let config = ServiceConfig::load(&path).unwrap();
        assert_eq!(config.streams[0].symbol, "BTCUSDT");

        let missing = ServiceConfig::load(&dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(ServiceConfigError::Read { .. })));
    }
}
