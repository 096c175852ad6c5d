//! Configuration validation.
//!
//! Serde handles syntax; this checks value ranges and pin formats and
//! reports every problem at once.

use std::fmt;

use crate::config::schema::ServiceConfig;

/// A single semantic problem in a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting all errors.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.transport.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("transport.connect_timeout_secs", "must be > 0"));
    }
    if config.transport.request_timeout_secs == 0 {
        errors.push(ValidationError::new("transport.request_timeout_secs", "must be > 0"));
    }

    if config.retries.backoff_enabled && config.retries.max_delay_ms < config.retries.base_delay_ms {
        errors.push(ValidationError::new(
            "retries.max_delay_ms",
            "must be >= retries.base_delay_ms",
        ));
    }

    if config.padding.body_target_size == 0 {
        errors.push(ValidationError::new("padding.body_target_size", "must be > 0"));
    }
    if config.padding.header_target_size == 0 {
        errors.push(ValidationError::new("padding.header_target_size", "must be > 0"));
    }
    if config.padding.fake_header.trim().is_empty() {
        errors.push(ValidationError::new("padding.fake_header", "must not be empty"));
    }
    if config.padding.padding_header.trim().is_empty() {
        errors.push(ValidationError::new("padding.padding_header", "must not be empty"));
    }

    for (key, hashes) in &config.pinning.pins {
        let field = format!("pinning.pins.{key}");
        if hashes.is_empty() {
            errors.push(ValidationError::new(&field, "at least one pin is required"));
        }
        for hash in hashes {
            if hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
                errors.push(ValidationError::new(
                    &field,
                    format!("'{hash}' is not a hex SHA-256 digest"),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ServiceConfig::default()).is_ok());
    }

    #[test]
    fn test_all_errors_reported() {
        let mut config = ServiceConfig::default();
        config.transport.request_timeout_secs = 0;
        config.padding.fake_header = " ".into();
        config.pinning.pins.insert("api".into(), vec!["xyz".into()]);
        config.pinning.pins.insert("cdn".into(), Vec::new());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().any(|e| e.field == "pinning.pins.cdn"));
    }

    #[test]
    fn test_backoff_bounds_only_checked_when_enabled() {
        let mut config = ServiceConfig::default();
        config.retries.base_delay_ms = 500;
        config.retries.max_delay_ms = 100;
        assert!(validate_config(&config).is_ok());

        config.retries.backoff_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "retries.max_delay_ms");
    }
}
