use crate::error::{OrmError, OrmResult};
use crate::hook::Verbosity;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

/// Settings for an [`crate::Orm`] façade.
///
/// Defaults: info-level statement auditing, the wall clock for timestamps,
/// and no statement timeout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OrmConfig {
    /// Statement audit level (0 to 3 when deserialized).
    pub verbosity: Verbosity,
    /// Timestamp written into auto-time columns instead of the current time.
    pub fixed_time: Option<DateTime<Utc>>,
    /// Per-statement timeout in milliseconds. `None` means no timeout.
    pub statement_timeout_ms: Option<u64>,
}

impl OrmConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `TORM_VERBOSE` and `TORM_STATEMENT_TIMEOUT_MS`; unset variables keep their defaults.
    pub fn from_env() -> OrmResult<Self> {
        let mut config = Self::default();
        if let Ok(v) = std::env::var("TORM_VERBOSE") {
            let level: u8 = v
                .trim()
                .parse()
                .map_err(|_| OrmError::validation(format!("invalid TORM_VERBOSE `{v}`")))?;
            config.verbosity = Verbosity::from_level(level)?;
        }
        if let Ok(v) = std::env::var("TORM_STATEMENT_TIMEOUT_MS") {
            let ms: u64 = v.trim().parse().map_err(|_| {
                OrmError::validation(format!("invalid TORM_STATEMENT_TIMEOUT_MS `{v}`"))
            })?;
            config.statement_timeout_ms = Some(ms);
        }
        Ok(config)
    }

    /// Set the audit level from a number in `0..=3`.
    pub fn with_verbose_level(mut self, level: u8) -> OrmResult<Self> {
        self.verbosity = Verbosity::from_level(level)?;
        Ok(self)
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Stamp auto-time columns with `at` instead of the current time.
    pub fn with_fixed_time(mut self, at: DateTime<Utc>) -> Self {
        self.fixed_time = Some(at);
        self
    }

    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn statement_timeout(&self) -> Option<Duration> {
        self.statement_timeout_ms.map(Duration::from_millis)
    }

    /// The timestamp to stamp with now.
    pub fn now(&self) -> DateTime<Utc> {
        self.fixed_time.unwrap_or_else(Utc::now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn defaults() {
        let config = OrmConfig::default();
        assert_eq!(config.verbosity, Verbosity::Info);
        assert_eq!(config.statement_timeout(), None);
        assert!(config.fixed_time.is_none());
    }

    #[test]
    fn deserialize_from_json() {
        let config: OrmConfig = serde_json::from_value(serde_json::json!({
            "verbosity": 2,
            "statement_timeout_ms": 1500,
        }))
        .unwrap();
        assert_eq!(config.verbosity, Verbosity::Debug);
        assert_eq!(config.statement_timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn deserialize_rejects_bad_level() {
        let res: Result<OrmConfig, _> =
            serde_json::from_value(serde_json::json!({ "verbosity": 9 }));
        assert!(res.is_err());
    }

    #[test]
    fn fixed_time_wins() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let config = OrmConfig::new().with_fixed_time(at);
        assert_eq!(config.now(), at);
    }

    #[test]
    fn verbose_level_setter_validates() {
        assert!(OrmConfig::new().with_verbose_level(3).is_ok());
        assert!(OrmConfig::new().with_verbose_level(4).is_err());
    }
}
