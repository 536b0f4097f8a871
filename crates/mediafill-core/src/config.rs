//! Filler configuration

use crate::error::ConfigError;
use crate::markup::DEFAULT_MARKER_ATTRIBUTE;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

static ATTRIBUTE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_:][A-Za-z0-9_:.\-]*$").expect("attribute name regex should compile")
});

/// Configuration for a [`Filler`](crate::Filler)
///
/// # Example
/// ```rust
/// use mediafill_core::FillerConfig;
///
/// let config = FillerConfig::from_toml_str(r#"
///     marker_attribute = "data-helf"
///     resolve_timeout_ms = 1500
/// "#).unwrap();
/// assert_eq!(config.marker_attribute, "data-helf");
/// assert_eq!(config.resolve_timeout(), Some(std::time::Duration::from_millis(1500)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillerConfig {
    /// Markup attribute carrying media identifiers in rich text
    pub marker_attribute: String,
    /// Upper bound on the resolver call, in milliseconds
    pub resolve_timeout_ms: Option<u64>,
}

impl Default for FillerConfig {
    fn default() -> Self {
        Self {
            marker_attribute: DEFAULT_MARKER_ATTRIBUTE.to_owned(),
            resolve_timeout_ms: None,
        }
    }
}

impl FillerConfig {
    /// With markup marker attribute
    #[inline]
    #[must_use]
    pub fn with_marker_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.marker_attribute = attribute.into();
        self
    }

    /// With resolver timeout
    ///
    /// Stored at millisecond granularity; a non-zero sub-millisecond timeout
    /// rounds up to one millisecond.
    #[must_use]
    pub fn with_resolve_timeout(mut self, timeout: Duration) -> Self {
        let mut millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        if millis == 0 && !timeout.is_zero() {
            millis = 1;
        }
        self.resolve_timeout_ms = Some(millis);
        self
    }

    /// Resolver timeout, if configured
    #[inline]
    #[must_use]
    pub fn resolve_timeout(&self) -> Option<Duration> {
        self.resolve_timeout_ms.map(Duration::from_millis)
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    /// Returns [`ConfigError`] on malformed TOML or when [`validate`](Self::validate) fails.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the marker attribute is a usable attribute name and that a
    /// configured timeout is positive
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidMarkerAttribute`] or
    /// [`ConfigError::ZeroResolveTimeout`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !ATTRIBUTE_NAME.is_match(&self.marker_attribute) {
            return Err(ConfigError::InvalidMarkerAttribute(
                self.marker_attribute.clone(),
            ));
        }
        if self.resolve_timeout_ms == Some(0) {
            return Err(ConfigError::ZeroResolveTimeout);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = FillerConfig::default();
        assert_eq!(config.marker_attribute, "data-ref");
        assert!(config.resolve_timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_overrides() {
        let config = FillerConfig::default()
            .with_marker_attribute("data-helf")
            .with_resolve_timeout(Duration::from_secs(3));
        assert_eq!(config.marker_attribute, "data-helf");
        assert_eq!(config.resolve_timeout(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = FillerConfig::from_toml_str("resolve_timeout_ms = 2000").unwrap();
        assert_eq!(config.marker_attribute, "data-ref");
        assert_eq!(config.resolve_timeout(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn sub_second_timeout_keeps_millisecond_precision() {
        let config = FillerConfig::default().with_resolve_timeout(Duration::from_millis(500));
        assert_eq!(config.resolve_timeout_ms, Some(500));
        assert_eq!(config.resolve_timeout(), Some(Duration::from_millis(500)));

        let tiny = FillerConfig::default().with_resolve_timeout(Duration::from_micros(10));
        assert_eq!(tiny.resolve_timeout(), Some(Duration::from_millis(1)));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(matches!(
            FillerConfig::from_toml_str("resolve_timeout_ms = 0"),
            Err(ConfigError::ZeroResolveTimeout)
        ));
        let config = FillerConfig::default().with_resolve_timeout(Duration::ZERO);
        assert!(matches!(config.validate(), Err(ConfigError::ZeroResolveTimeout)));
    }

    #[test]
    fn invalid_attribute_names_are_rejected() {
        for name in ["", "data ref", "1abc", "a\"b", "x=y"] {
            let config = FillerConfig::default().with_marker_attribute(name);
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidMarkerAttribute(_))),
                "{name:?} accepted"
            );
        }
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            FillerConfig::from_toml_str("marker_attribute = "),
            Err(ConfigError::Parse(_))
        ));
    }
}
