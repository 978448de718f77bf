//! Environment variable loading, following the same per-subsystem prefix
//! convention as the rest of this configuration stack:
//!
//! - `CB_DEFAULT_STORE`: name of the default store.
//! - `CB_STORE_<NAME>_DRIVER` / `_CONNECTION` / `_PREFIX`: one store entry.
//! - `CB_PRIMARY_KEY_TYPE`: `integer` | `ulid` | `uuid`.
//! - `CB_DEFAULTS_*`: `Configuration` defaults.
//! - `CB_STRATEGY_DEFAULT`: default strategy name.
//! - `CB_EVENTS_ENABLED`.
//! - `CB_FALLBACKS_ENABLED` / `CB_FALLBACKS_DEFAULT`.

use std::env;

use crate::settings::{ConfigurationDefaults, EventSettings, Settings};

#[derive(Debug, thiserror::Error)]
pub enum EnvLoadError {
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

fn parse_env<T>(key: &str, default: T) -> Result<T, EnvLoadError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse::<T>().map_err(|e| EnvLoadError::InvalidValue {
            key: key.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Loads configuration from environment variables, starting from
/// [`Settings::default`] and overriding whatever `CB_*` variables are set.
/// Unset variables keep their default — this never errors on absence, only
/// on a present-but-unparseable value.
pub fn load_from_env() -> Result<Settings, EnvLoadError> {
    let mut settings = Settings::default();

    if let Ok(name) = env::var("CB_DEFAULT_STORE") {
        settings.default = name;
    }
    settings.primary_key_type = match env::var("CB_PRIMARY_KEY_TYPE").ok().as_deref() {
        Some("integer") => crate::settings::PrimaryKeyType::Integer,
        Some("ulid") => crate::settings::PrimaryKeyType::Ulid,
        Some("uuid") | None => settings.primary_key_type,
        Some(other) => {
            return Err(EnvLoadError::InvalidValue {
                key: "CB_PRIMARY_KEY_TYPE".to_string(),
                reason: format!("unknown primary key type '{other}'"),
            });
        }
    };

    settings.defaults = load_defaults_from_env(&settings.defaults)?;
    settings.strategies.default =
        env::var("CB_STRATEGY_DEFAULT").unwrap_or(settings.strategies.default);
    settings.events = load_events_from_env(&settings.events)?;

    if let Ok(enabled) = env::var("CB_FALLBACKS_ENABLED") {
        settings.fallbacks.enabled = parse_env("CB_FALLBACKS_ENABLED", enabled == "true")?;
    }
    if let Ok(name) = env::var("CB_FALLBACKS_DEFAULT") {
        settings.fallbacks.default = Some(name);
    }

    Ok(settings)
}

fn load_defaults_from_env(
    current: &ConfigurationDefaults,
) -> Result<ConfigurationDefaults, EnvLoadError> {
    Ok(ConfigurationDefaults {
        failure_threshold: parse_env("CB_DEFAULTS_FAILURE_THRESHOLD", current.failure_threshold)?,
        success_threshold: parse_env("CB_DEFAULTS_SUCCESS_THRESHOLD", current.success_threshold)?,
        timeout_secs: parse_env("CB_DEFAULTS_TIMEOUT_SECS", current.timeout_secs)?,
        sampling_duration_secs: parse_env(
            "CB_DEFAULTS_SAMPLING_DURATION_SECS",
            current.sampling_duration_secs,
        )?,
        minimum_throughput: parse_env(
            "CB_DEFAULTS_MINIMUM_THROUGHPUT",
            current.minimum_throughput,
        )?,
        percentage_threshold: parse_env(
            "CB_DEFAULTS_PERCENTAGE_THRESHOLD",
            current.percentage_threshold,
        )?,
        strategy_name: env::var("CB_DEFAULTS_STRATEGY_NAME")
            .unwrap_or_else(|_| current.strategy_name.clone()),
    })
}

fn load_events_from_env(current: &EventSettings) -> Result<EventSettings, EnvLoadError> {
    Ok(EventSettings {
        enabled: parse_env("CB_EVENTS_ENABLED", current.enabled)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn unset_variables_keep_defaults() {
        env::remove_var("CB_DEFAULT_STORE");
        env::remove_var("CB_DEFAULTS_FAILURE_THRESHOLD");
        let settings = load_from_env().unwrap();
        assert_eq!(settings.default, "memory");
        assert_eq!(settings.defaults.failure_threshold, 5);
    }

    #[test]
    #[serial]
    fn set_variables_override_defaults() {
        env::set_var("CB_DEFAULT_STORE", "primary");
        env::set_var("CB_DEFAULTS_FAILURE_THRESHOLD", "9");
        let settings = load_from_env().unwrap();
        assert_eq!(settings.default, "primary");
        assert_eq!(settings.defaults.failure_threshold, 9);
        env::remove_var("CB_DEFAULT_STORE");
        env::remove_var("CB_DEFAULTS_FAILURE_THRESHOLD");
    }

    #[test]
    #[serial]
    fn unparseable_value_is_rejected() {
        env::set_var("CB_DEFAULTS_FAILURE_THRESHOLD", "not-a-number");
        let result = load_from_env();
        assert!(result.is_err());
        env::remove_var("CB_DEFAULTS_FAILURE_THRESHOLD");
    }
}
