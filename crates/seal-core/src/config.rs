//! Seal configuration
//!
//! Loaded from TOML; every field has a default so a partial file (or no
//! file at all) is valid.
//!
//! ```toml
//! ledger_path = "memory_vault.csv"
//! signal_ceiling = 92.6
//! reflex_interval_secs = 60
//!
//! [motifs]
//! Pulse = ["#heartbeat", "#diagnosis"]
//! ```

use crate::error::ConfigError;
use crate::signal::{parse_signal, HealthRule, DEFAULT_SIGNAL_CEILING};
use seal_ledger::LedgerOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default durable ledger file
pub const DEFAULT_LEDGER_PATH: &str = "memory_vault.csv";

/// Signal the reflex loop seals with when nobody has
pub const DEFAULT_REFLEX_SIGNAL: &str = "92.6";

/// Seconds between reflex ticks
pub const DEFAULT_REFLEX_INTERVAL_SECS: u64 = 60;

/// Events rendered by the journal when no limit is given
pub const DEFAULT_JOURNAL_LIMIT: usize = 5;

/// Seal configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SealConfig {
    /// Durable ledger file
    pub ledger_path: PathBuf,
    /// Health rule ceiling
    pub signal_ceiling: f64,
    /// Signal supplied by automatic seals
    pub reflex_signal: String,
    /// Seconds between reflex ticks
    pub reflex_interval_secs: u64,
    /// Whether front-ends should start the reflex loop
    pub reflex_enabled: bool,
    /// Default journal length
    pub journal_limit: usize,
    /// fsync after every append
    pub sync_on_append: bool,
    /// Hydrate the in-memory ledger from disk at startup
    pub recover_on_open: bool,
    /// Extra motif tags per event type, merged over the built-in table
    pub motifs: BTreeMap<String, Vec<String>>,
}

impl SealConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    /// - `ConfigError::Parse` on malformed TOML or unknown keys
    /// - `ConfigError::Invalid` if a value violates a constraint
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a TOML file
    ///
    /// # Errors
    /// `ConfigError::Read` if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str)
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Check value constraints
    ///
    /// # Errors
    /// `ConfigError::Invalid` describing the first violated constraint
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.signal_ceiling.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "signal_ceiling must be finite, got {}",
                self.signal_ceiling
            )));
        }
        if self.reflex_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "reflex_interval_secs must be at least 1".to_string(),
            ));
        }
        if parse_signal(&self.reflex_signal).is_err() {
            return Err(ConfigError::Invalid(format!(
                "reflex_signal {:?} is not a finite number",
                self.reflex_signal
            )));
        }
        if self.ledger_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("ledger_path must not be empty".to_string()));
        }
        Ok(())
    }

    /// With ledger path
    #[inline]
    #[must_use]
    pub fn with_ledger_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ledger_path = path.into();
        self
    }

    /// With health rule ceiling
    #[inline]
    #[must_use]
    pub fn with_signal_ceiling(mut self, ceiling: f64) -> Self {
        self.signal_ceiling = ceiling;
        self
    }

    /// With reflex interval in seconds
    #[inline]
    #[must_use]
    pub fn with_reflex_interval_secs(mut self, secs: u64) -> Self {
        self.reflex_interval_secs = secs;
        self
    }

    /// With reflex signal
    #[inline]
    #[must_use]
    pub fn with_reflex_signal(mut self, signal: impl Into<String>) -> Self {
        self.reflex_signal = signal.into();
        self
    }

    /// With reflex loop enabled or disabled
    #[inline]
    #[must_use]
    pub fn with_reflex_enabled(mut self, enabled: bool) -> Self {
        self.reflex_enabled = enabled;
        self
    }

    /// With recovery of the in-memory ledger at startup
    #[inline]
    #[must_use]
    pub fn with_recover_on_open(mut self, recover: bool) -> Self {
        self.recover_on_open = recover;
        self
    }

    /// Health rule derived from the ceiling
    #[inline]
    #[must_use]
    pub fn health_rule(&self) -> HealthRule {
        HealthRule::new(self.signal_ceiling)
    }

    /// Reflex tick interval
    #[inline]
    #[must_use]
    pub fn reflex_interval(&self) -> Duration {
        Duration::from_secs(self.reflex_interval_secs)
    }

    /// Ledger options derived from this configuration
    #[inline]
    #[must_use]
    pub fn ledger_options(&self) -> LedgerOptions {
        LedgerOptions::new()
            .with_sync_on_append(self.sync_on_append)
            .with_recover(self.recover_on_open)
    }
}

impl Default for SealConfig {
    fn default() -> Self {
        Self {
            ledger_path: PathBuf::from(DEFAULT_LEDGER_PATH),
            signal_ceiling: DEFAULT_SIGNAL_CEILING,
            reflex_signal: DEFAULT_REFLEX_SIGNAL.to_string(),
            reflex_interval_secs: DEFAULT_REFLEX_INTERVAL_SECS,
            reflex_enabled: true,
            journal_limit: DEFAULT_JOURNAL_LIMIT,
            sync_on_append: false,
            recover_on_open: false,
            motifs: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SealConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.reflex_interval(), Duration::from_secs(60));
        assert_eq!(config.health_rule().ceiling(), DEFAULT_SIGNAL_CEILING);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = SealConfig::from_toml_str(
            r##"
            ledger_path = "vault/audit.csv"
            reflex_interval_secs = 5

            [motifs]
            Pulse = ["#heartbeat", "#custom"]
            "##,
        )
        .unwrap();

        assert_eq!(config.ledger_path, PathBuf::from("vault/audit.csv"));
        assert_eq!(config.reflex_interval_secs, 5);
        assert_eq!(config.signal_ceiling, DEFAULT_SIGNAL_CEILING);
        assert_eq!(config.motifs["Pulse"], vec!["#heartbeat", "#custom"]);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = SealConfig::from_toml_str("ceiling = 90.0").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn zero_interval_is_invalid() {
        let err = SealConfig::from_toml_str("reflex_interval_secs = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn non_finite_ceiling_is_invalid() {
        let err = SealConfig::new()
            .with_signal_ceiling(f64::NAN)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("signal_ceiling"));
    }

    #[test]
    fn bad_reflex_signal_is_invalid() {
        let err = SealConfig::new()
            .with_reflex_signal("ninety")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("reflex_signal"));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SealConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
