//! Engine configuration

use keel_core::{KeelError, DEFAULT_PRECISION};
use serde::{Deserialize, Serialize};

/// Settings fixed when the engine is built.
///
/// Every field has a default, so a partial JSON document is enough:
/// `{"precision": 20}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Decimal digits kept by division
    pub precision: u32,
    /// List similarly named functions when a call does not resolve
    pub suggestions: bool,
    /// Register the standard functions when the host registers no provider
    pub std_functions: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            suggestions: true,
            std_functions: true,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, KeelError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| KeelError::parse_error(format!("invalid engine config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), KeelError> {
        if self.precision == 0 {
            return Err(KeelError::parse_error("invalid engine config: precision must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.precision, 50);
        assert!(config.suggestions);
        assert!(config.std_functions);
    }

    #[test]
    fn test_partial_json() {
        let config = EngineConfig::from_json(r#"{"precision": 12, "std_functions": false}"#).unwrap();
        assert_eq!(config.precision, 12);
        assert!(config.suggestions);
        assert!(!config.std_functions);
    }

    #[test]
    fn test_zero_precision_rejected() {
        let err = EngineConfig::from_json(r#"{"precision": 0}"#).unwrap_err();
        assert_eq!(err.kind, keel_core::ErrorKind::ParseError);
        assert!(err.message.contains("precision"));
    }

    #[test]
    fn test_invalid_json() {
        let err = EngineConfig::from_json(r#"{"precision": "high"}"#).unwrap_err();
        assert_eq!(err.kind, keel_core::ErrorKind::ParseError);
    }
}
