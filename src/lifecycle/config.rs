//! Run configuration with the defaults of the original simulations.

use super::ConfigError;
use crate::coordinator::Policy;
use crate::model::DEFAULT_QUANTITY;
use crate::worker::WriterMode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Readers-writers market run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Number of items the collection starts with.
    pub items: usize,
    /// Visitor threads.
    pub readers: usize,
    /// Buyer threads.
    pub writers: usize,
    /// Units each item starts with.
    pub quantity: u32,
    pub policy: Policy,
    pub mode: WriterMode,
    /// Upper bound of the random pause between two operations of a worker.
    pub pause_ms: u64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            items: 100,
            readers: 2,
            writers: 32,
            quantity: DEFAULT_QUANTITY,
            policy: Policy::default(),
            mode: WriterMode::default(),
            pause_ms: 0,
        }
    }
}

impl MarketConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quantity == 0 {
            return Err(ConfigError::ZeroQuantity);
        }
        Ok(())
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

/// Dining-philosophers run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiningConfig {
    /// Seats at the table, and utensils between them.
    pub diners: usize,
    /// Pause scale: thinking and eating last up to `ponder * 250ms`. Zero means no pauses.
    pub ponder: u32,
}

impl Default for DiningConfig {
    fn default() -> Self {
        Self {
            diners: 100,
            ponder: 5,
        }
    }
}

impl DiningConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.diners == 0 {
            return Err(ConfigError::NoDiners);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(MarketConfig::default().validate(), Ok(()));
        assert_eq!(DiningConfig::default().validate(), Ok(()));
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let config = MarketConfig {
            quantity: 0,
            ..MarketConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroQuantity));
    }

    #[test]
    fn empty_table_is_rejected() {
        let config = DiningConfig {
            diners: 0,
            ..DiningConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoDiners));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: MarketConfig =
            serde_json::from_str(r#"{"readers": 4, "policy": "reader-preferring"}"#).unwrap();
        assert_eq!(config.readers, 4);
        assert_eq!(config.policy, Policy::ReaderPreferring);
        assert_eq!(config.items, 100);
        assert_eq!(config.writers, 32);
    }
}
