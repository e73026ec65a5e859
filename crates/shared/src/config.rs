use serde::Deserialize;

use crate::error::ConfigError;
use crate::order_key::KEY_LEN_LIMIT;

const DEFAULT_MAX_KEY_LEN: usize = 12;
const DEFAULT_REBALANCE_KEY_LEN: usize = 6;

/// Key length limits for the position allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderingConfig {
    /// Longest key the allocator hands out before it rebalances.
    pub max_key_len: usize,
    /// Key length a rebalance aims for, leaving the remaining digits as
    /// headroom for later insertions into the same gap.
    pub rebalance_key_len: usize,
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self {
            max_key_len: DEFAULT_MAX_KEY_LEN,
            rebalance_key_len: DEFAULT_REBALANCE_KEY_LEN,
        }
    }
}

impl OrderingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_key_len == 0 || self.max_key_len > KEY_LEN_LIMIT {
            return Err(ConfigError::MaxKeyLen {
                value: self.max_key_len,
                limit: KEY_LEN_LIMIT,
            });
        }
        if self.rebalance_key_len == 0 || self.rebalance_key_len > self.max_key_len {
            return Err(ConfigError::RebalanceKeyLen {
                value: self.rebalance_key_len,
                max: self.max_key_len,
            });
        }
        Ok(())
    }

    /// Read `ORDER_KEY_MAX_LEN` and `ORDER_KEY_REBALANCE_LEN`, falling back to
    /// the defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &'static str, default: usize| -> Result<usize, ConfigError> {
            match lookup(name) {
                Some(value) => value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidEnv { name, value }),
                None => Ok(default),
            }
        };
        let config = Self {
            max_key_len: read("ORDER_KEY_MAX_LEN", DEFAULT_MAX_KEY_LEN)?,
            rebalance_key_len: read("ORDER_KEY_REBALANCE_LEN", DEFAULT_REBALANCE_KEY_LEN)?,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(OrderingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_bounds() {
        let too_long = OrderingConfig {
            max_key_len: 21,
            rebalance_key_len: 6,
        };
        assert!(matches!(too_long.validate(), Err(ConfigError::MaxKeyLen { value: 21, .. })));

        let inverted = OrderingConfig {
            max_key_len: 4,
            rebalance_key_len: 5,
        };
        assert!(matches!(
            inverted.validate(),
            Err(ConfigError::RebalanceKeyLen { value: 5, max: 4 })
        ));
    }

    #[test]
    fn test_from_lookup_defaults_and_overrides() {
        let config = OrderingConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, OrderingConfig::default());

        let config = OrderingConfig::from_lookup(|name| match name {
            "ORDER_KEY_MAX_LEN" => Some("8".to_string()),
            "ORDER_KEY_REBALANCE_LEN" => Some(" 3 ".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.max_key_len, 8);
        assert_eq!(config.rebalance_key_len, 3);
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let err = OrderingConfig::from_lookup(|name| {
            (name == "ORDER_KEY_MAX_LEN").then(|| "lots".to_string())
        })
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidEnv {
                name: "ORDER_KEY_MAX_LEN",
                value: "lots".to_string()
            }
        );
    }

    #[test]
    fn test_deserialize_partial() {
        let config: OrderingConfig = serde_json::from_str(r#"{ "maxKeyLen": 9 }"#).unwrap();
        assert_eq!(config.max_key_len, 9);
        assert_eq!(config.rebalance_key_len, DEFAULT_REBALANCE_KEY_LEN);
    }
}
