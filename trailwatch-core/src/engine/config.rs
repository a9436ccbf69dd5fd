//! Engine configuration and validation.

use serde::{Deserialize, Serialize};

/// Minimum window capacity when none is configured.
pub const MIN_WINDOW_CAPACITY: usize = 5000;

/// Window capacity per unit of `atr_period` when none is configured.
pub const WINDOW_PER_ATR_PERIOD: usize = 10;

// ─── Error type ──────────────────────────────────────────────────────

/// Invalid engine configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be >= 1, got {value}")]
    InvalidPeriod { name: &'static str, value: usize },
    #[error("{name} must be a finite non-negative number, got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },
    #[error("window_len must be >= 2, got {0}")]
    InvalidWindow(usize),
}

// ─── Config ──────────────────────────────────────────────────────────

/// Parameters for one indicator engine. Every field has a default, so a
/// partial TOML/JSON table deserializes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Multiplier on ATR for the trailing-stop distance.
    pub sensitivity: f64,
    pub atr_period: usize,
    pub trend_ema_period: usize,
    pub rsi_period: usize,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    pub adx_period: usize,
    pub adx_threshold: f64,
    pub sl_multiplier: f64,
    pub tp_multiplier: f64,
    /// Candle window cap. `None` means `max(5000, 10 * atr_period)`.
    pub window_len: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sensitivity: 8.0,
            atr_period: 20,
            trend_ema_period: 50,
            rsi_period: 14,
            rsi_overbought: 60.0,
            rsi_oversold: 40.0,
            adx_period: 14,
            adx_threshold: 15.0,
            sl_multiplier: 1.5,
            tp_multiplier: 2.0,
            window_len: None,
        }
    }
}

impl EngineConfig {
    /// Check every period is >= 1, every threshold finite and non-negative,
    /// and an explicit window holds at least two candles.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("atr_period", self.atr_period),
            ("trend_ema_period", self.trend_ema_period),
            ("rsi_period", self.rsi_period),
            ("adx_period", self.adx_period),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidPeriod { name, value });
            }
        }

        for (name, value) in [
            ("sensitivity", self.sensitivity),
            ("rsi_overbought", self.rsi_overbought),
            ("rsi_oversold", self.rsi_oversold),
            ("adx_threshold", self.adx_threshold),
            ("sl_multiplier", self.sl_multiplier),
            ("tp_multiplier", self.tp_multiplier),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidThreshold { name, value });
            }
        }

        match self.window_len {
            Some(len) if len < 2 => Err(ConfigError::InvalidWindow(len)),
            _ => Ok(()),
        }
    }

    /// Number of candles the window retains.
    pub fn window_capacity(&self) -> usize {
        self.window_len.unwrap_or_else(|| {
            MIN_WINDOW_CAPACITY.max(WINDOW_PER_ATR_PERIOD.saturating_mul(self.atr_period))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.window_capacity(), 5000);
    }

    #[test]
    fn large_atr_period_grows_window() {
        let config = EngineConfig {
            atr_period: 700,
            ..EngineConfig::default()
        };
        assert_eq!(config.window_capacity(), 7000);
    }

    #[test]
    fn explicit_window_wins() {
        let config = EngineConfig {
            window_len: Some(10),
            ..EngineConfig::default()
        };
        assert_eq!(config.window_capacity(), 10);
    }

    #[test]
    fn zero_period_rejected() {
        let config = EngineConfig {
            rsi_period: 0,
            ..EngineConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidPeriod {
                name: "rsi_period",
                value: 0
            })
        );
    }

    #[test]
    fn bad_threshold_rejected() {
        let config = EngineConfig {
            sensitivity: f64::NAN,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidThreshold { name: "sensitivity", .. })
        ));

        let config = EngineConfig {
            sl_multiplier: -1.0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn tiny_window_rejected() {
        let config = EngineConfig {
            window_len: Some(1),
            ..EngineConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidWindow(1)));
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"sensitivity": 2.0, "rsi_period": 5}"#).unwrap();
        assert_eq!(config.sensitivity, 2.0);
        assert_eq!(config.rsi_period, 5);
        assert_eq!(config.atr_period, 20);
        assert_eq!(config.window_len, None);
    }
}
