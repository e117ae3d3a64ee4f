// Queue Configuration

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Environment variable prefix (`DISPATCHQ_CAPACITY`, `DISPATCHQ_POOL_SIZE`)
pub const ENV_PREFIX: &str = "DISPATCHQ";

/// Default buffer capacity
pub const DEFAULT_CAPACITY: usize = 64;

/// Default number of workers
pub const DEFAULT_POOL_SIZE: usize = 4;

/// Sanity ceiling for the buffer capacity
pub const MAX_CAPACITY: usize = 1 << 24;

/// Sanity ceiling for the worker pool
pub const MAX_POOL_SIZE: usize = 1 << 16;

/// Admission threshold + pool size. Zero is legal for both:
/// capacity 0 disables buffering, pool size 0 buffers everything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_pool_size() -> usize {
    DEFAULT_POOL_SIZE
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl QueueConfig {
    pub fn new(capacity: usize, pool_size: usize) -> Self {
        Self {
            capacity,
            pool_size,
        }
    }

    /// Load from `DISPATCHQ_*` environment variables, defaults for the rest
    pub fn from_env() -> crate::error::Result<Self> {
        Self::from_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
    }

    /// Load from any `config` source (env, file, in-memory map)
    pub fn from_source<S>(source: S) -> crate::error::Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let cfg: QueueConfig = config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;
        cfg.validate()
            .map_err(|e| crate::error::DispatchError::Config(e.to_string()))?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity > MAX_CAPACITY {
            return Err(DomainError::InvalidConfig(format!(
                "capacity {} exceeds maximum {}",
                self.capacity, MAX_CAPACITY
            )));
        }
        if self.pool_size > MAX_POOL_SIZE {
            return Err(DomainError::InvalidConfig(format!(
                "pool_size {} exceeds maximum {}",
                self.pool_size, MAX_POOL_SIZE
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = QueueConfig::default();
        assert_eq!(cfg.capacity, DEFAULT_CAPACITY);
        assert_eq!(cfg.pool_size, DEFAULT_POOL_SIZE);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_zero_values_are_valid() {
        assert!(QueueConfig::new(0, 0).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_oversized_pool() {
        let err = QueueConfig::new(1, MAX_POOL_SIZE + 1).validate().unwrap_err();
        assert!(err.to_string().contains("pool_size"));
    }

    #[test]
    fn test_validate_rejects_oversized_capacity() {
        let err = QueueConfig::new(MAX_CAPACITY + 1, 1).validate().unwrap_err();
        assert!(err.to_string().contains("capacity"));
    }

    #[test]
    fn test_from_source_parses_strings() {
        let mut vars = config::Map::new();
        vars.insert("DISPATCHQ_CAPACITY".to_string(), "12".to_string());
        vars.insert("DISPATCHQ_POOL_SIZE".to_string(), "3".to_string());

        let source = config::Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .source(Some(vars));
        let cfg = QueueConfig::from_source(source).unwrap();

        assert_eq!(cfg, QueueConfig::new(12, 3));
    }

    #[test]
    fn test_from_source_fills_missing_with_defaults() {
        let mut vars = config::Map::new();
        vars.insert("DISPATCHQ_POOL_SIZE".to_string(), "2".to_string());

        let source = config::Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .source(Some(vars));
        let cfg = QueueConfig::from_source(source).unwrap();

        assert_eq!(cfg.capacity, DEFAULT_CAPACITY);
        assert_eq!(cfg.pool_size, 2);
    }
}
