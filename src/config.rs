use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

pub const SERVERS_VAR: &str = "ADDRESS_POOL_SERVERS";
pub const CONNECT_TIMEOUT_VAR: &str = "ADDRESS_POOL_CONNECT_TIMEOUT_MS";
pub const RESET_INTERVAL_VAR: &str = "ADDRESS_POOL_RESET_INTERVAL_SECS";

const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 3_000;
const DEFAULT_RESET_INTERVAL_SECS: u64 = 60;
const MAX_RESET_INTERVAL_SECS: u64 = 365 * 24 * 60 * 60;

/// Settings for a [`Connector`](crate::Connector) and the pool it drives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectorConfig {
    pub addresses: Vec<String>,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_reset_interval_secs")]
    pub reset_interval_secs: u64,
}

fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

fn default_reset_interval_secs() -> u64 {
    DEFAULT_RESET_INTERVAL_SECS
}

impl ConnectorConfig {
    pub fn new(addresses: Vec<String>) -> Self {
        Self {
            addresses,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            reset_interval_secs: DEFAULT_RESET_INTERVAL_SECS,
        }
    }

    /// Reads `ADDRESS_POOL_SERVERS` (comma-separated, required) plus the
    /// optional timeout and reset interval overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addresses = lookup(SERVERS_VAR)
            .map(|s| parse_address_list(&s))
            .unwrap_or_default();

        let mut config = Self::new(addresses);
        if let Some(ms) = parse_u64(&lookup, CONNECT_TIMEOUT_VAR)? {
            config.connect_timeout_ms = ms;
        }
        if let Some(secs) = parse_u64(&lookup, RESET_INTERVAL_VAR)? {
            config.reset_interval_secs = secs;
        }

        config.validate()
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn reset_interval(&self) -> Duration {
        Duration::from_secs(self.reset_interval_secs)
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.addresses.is_empty() {
            return Err(ConfigError::NoAddresses);
        }
        // tokio::time::interval panics on a zero period, and the first tick is
        // scheduled at now + period, which must fit in an Instant.
        if self.reset_interval_secs == 0 || self.reset_interval_secs > MAX_RESET_INTERVAL_SECS {
            return Err(ConfigError::InvalidValue {
                name: RESET_INTERVAL_VAR,
                value: self.reset_interval_secs.to_string(),
            });
        }
        Ok(self)
    }
}

/// Splits a comma-separated list, trimming items and dropping empty ones.
pub fn parse_address_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_u64<F>(lookup: &F, name: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn address_list_is_trimmed_and_skips_empty_items() {
        assert_eq!(
            parse_address_list(" h1:10051, ,h2:10051,,"),
            vec!["h1:10051", "h2:10051"]
        );
        assert!(parse_address_list("").is_empty());
    }

    #[test]
    fn lookup_uses_defaults_for_missing_overrides() {
        let config = ConnectorConfig::from_lookup(lookup_from(&[(SERVERS_VAR, "a:1,b:2")]))
            .expect("valid config");

        assert_eq!(config.addresses, vec!["a:1", "b:2"]);
        assert_eq!(config.connect_timeout(), Duration::from_millis(3_000));
        assert_eq!(config.reset_interval(), Duration::from_secs(60));
    }

    #[test]
    fn lookup_applies_overrides() {
        let config = ConnectorConfig::from_lookup(lookup_from(&[
            (SERVERS_VAR, "a:1"),
            (CONNECT_TIMEOUT_VAR, "250"),
            (RESET_INTERVAL_VAR, " 5 "),
        ]))
        .expect("valid config");

        assert_eq!(config.connect_timeout_ms, 250);
        assert_eq!(config.reset_interval_secs, 5);
    }

    #[test]
    fn lookup_rejects_bad_numbers() {
        let err = ConnectorConfig::from_lookup(lookup_from(&[
            (SERVERS_VAR, "a:1"),
            (CONNECT_TIMEOUT_VAR, "soon"),
        ]))
        .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::InvalidValue { name: CONNECT_TIMEOUT_VAR, ref value } if value == "soon"
        ));
    }

    #[test]
    fn missing_servers_are_rejected() {
        let err = ConnectorConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::NoAddresses));

        let err = ConnectorConfig::from_lookup(lookup_from(&[(SERVERS_VAR, " , ")])).unwrap_err();
        assert!(matches!(err, ConfigError::NoAddresses));
    }

    #[test]
    fn zero_reset_interval_is_rejected() {
        let err = ConnectorConfig::from_lookup(lookup_from(&[
            (SERVERS_VAR, "a:1"),
            (RESET_INTERVAL_VAR, "0"),
        ]))
        .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidValue { name: RESET_INTERVAL_VAR, .. }));
    }

    #[test]
    fn oversized_reset_interval_is_rejected() {
        let err = ConnectorConfig::from_json_str(
            r#"{"addresses": ["h1:1"], "reset_interval_secs": 18446744073709551615}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: RESET_INTERVAL_VAR, .. }));

        let config = ConnectorConfig::from_lookup(lookup_from(&[
            (SERVERS_VAR, "a:1"),
            (RESET_INTERVAL_VAR, &MAX_RESET_INTERVAL_SECS.to_string()),
        ]))
        .expect("largest interval accepted");
        assert_eq!(config.reset_interval_secs, MAX_RESET_INTERVAL_SECS);
    }

    #[test]
    fn json_config_fills_defaults() {
        let config =
            ConnectorConfig::from_json_str(r#"{"addresses": ["h1:10051", "h2:10051"]}"#)
                .expect("valid config");

        assert_eq!(config, ConnectorConfig::new(vec!["h1:10051".into(), "h2:10051".into()]));
    }

    #[test]
    fn json_config_errors_are_reported() {
        assert!(matches!(
            ConnectorConfig::from_json_str("{not json"),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            ConnectorConfig::from_json_str(r#"{"addresses": []}"#),
            Err(ConfigError::NoAddresses)
        ));
    }
}
