use std::time::Duration;

/// Default polling interval.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

/// Lower bound applied to the polling interval.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Reconciler tunables, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// How often the scheduler runs a cycle on its own (default: 10 s).
    pub refresh_interval: Duration,
    /// Report nothing for the first successful load of a collection
    /// (default: `true`).
    pub suppress_first_load: bool,
    /// Subscribe to the backing store's change feed and refresh on every
    /// event (default: `true`).
    pub realtime: bool,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            suppress_first_load: true,
            realtime: true,
        }
    }
}

impl ReconcilerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                           | Default |
    /// |-----------------------------------|---------|
    /// | `ASSETFLOW_REFRESH_INTERVAL_SECS` | `10`    |
    /// | `ASSETFLOW_SUPPRESS_FIRST_LOAD`   | `true`  |
    /// | `ASSETFLOW_REALTIME`              | `true`  |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let refresh_interval = match lookup("ASSETFLOW_REFRESH_INTERVAL_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                    name: "ASSETFLOW_REFRESH_INTERVAL_SECS",
                    expected: "a whole number of seconds",
                    value: raw.clone(),
                })?;
                Duration::from_secs(secs)
            }
            None => defaults.refresh_interval,
        };

        let suppress_first_load = match lookup("ASSETFLOW_SUPPRESS_FIRST_LOAD") {
            Some(raw) => parse_bool("ASSETFLOW_SUPPRESS_FIRST_LOAD", &raw)?,
            None => defaults.suppress_first_load,
        };

        let realtime = match lookup("ASSETFLOW_REALTIME") {
            Some(raw) => parse_bool("ASSETFLOW_REALTIME", &raw)?,
            None => defaults.realtime,
        };

        Ok(Self {
            refresh_interval,
            suppress_first_load,
            realtime,
        })
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_suppress_first_load(mut self, suppress: bool) -> Self {
        self.suppress_first_load = suppress;
        self
    }

    pub fn with_realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    /// The interval the scheduler actually uses.
    pub fn effective_interval(&self) -> Duration {
        self.refresh_interval.max(MIN_REFRESH_INTERVAL)
    }
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            expected: "a boolean",
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ReconcilerConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(config, ReconcilerConfig::default());
        assert_eq!(config.refresh_interval, Duration::from_secs(10));
        assert!(config.suppress_first_load);
        assert!(config.realtime);
    }

    #[test]
    fn reads_overrides() {
        let config = ReconcilerConfig::from_vars(vars(&[
            ("ASSETFLOW_REFRESH_INTERVAL_SECS", "30"),
            ("ASSETFLOW_SUPPRESS_FIRST_LOAD", "off"),
            ("ASSETFLOW_REALTIME", "FALSE"),
        ]))
        .unwrap();
        assert_eq!(config.refresh_interval, Duration::from_secs(30));
        assert!(!config.suppress_first_load);
        assert!(!config.realtime);
    }

    #[test]
    fn rejects_garbage() {
        let err = ReconcilerConfig::from_vars(vars(&[("ASSETFLOW_REFRESH_INTERVAL_SECS", "soon")]))
            .unwrap_err();
        assert_matches!(
            err,
            ConfigError::Invalid { name: "ASSETFLOW_REFRESH_INTERVAL_SECS", .. }
        );
        assert!(ReconcilerConfig::from_vars(vars(&[("ASSETFLOW_REALTIME", "maybe")])).is_err());
    }

    #[test]
    fn interval_is_clamped() {
        let config = ReconcilerConfig::default().with_refresh_interval(Duration::ZERO);
        assert_eq!(config.effective_interval(), MIN_REFRESH_INTERVAL);
    }
}
