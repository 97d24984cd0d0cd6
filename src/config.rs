//! Engine constants and configuration

use crate::error::AnimError;
use crate::time::Ms;
use serde::{Deserialize, Serialize};

/// Length of one frame at unit speed, in milliseconds. Every duration, delay
/// and release accepted by the DSL is quantized to this grid.
pub const FRAME_MS: Ms = 16;

/// Upper bound on drain iterations of the async pipe within a single frame.
pub const MAX_ASYNC: u32 = 100;

/// Default cap on how far `Player::duration` probes forward.
pub const DEFAULT_MAX_DURATION: Ms = 600_000;

/// Configuration for an animation engine instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Cap for the duration probe, in milliseconds
    pub max_duration: Ms,
    /// Capacity of the property-value parse cache
    pub parse_cache_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_duration: DEFAULT_MAX_DURATION,
            parse_cache_size: 256,
        }
    }
}

impl EngineConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), AnimError> {
        if self.max_duration < FRAME_MS {
            return Err(AnimError::InvalidConfig {
                reason: format!("max_duration must be at least {} ms", FRAME_MS),
            });
        }
        if self.parse_cache_size == 0 {
            return Err(AnimError::InvalidConfig {
                reason: "parse_cache_size must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_cache() {
        let config = EngineConfig {
            parse_cache_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_sub_frame_duration() {
        let config = EngineConfig {
            max_duration: 8,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
