use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// The full configuration surface of the circuit breaker engine, as
/// described in `spec.md` §6. Every field round-trips through TOML, YAML,
/// and JSON via `serde`, and every numeric/string field that has a
/// plausible invalid range is checked by `validator`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Settings {
    /// Name of the store used when a breaker is made without an explicit
    /// store override.
    #[validate(length(min = 1))]
    pub default: String,

    pub stores: HashMap<String, StoreSettings>,

    pub primary_key_type: PrimaryKeyType,

    pub table_names: TableNames,

    #[validate(nested)]
    pub defaults: ConfigurationDefaults,

    #[validate(nested)]
    pub strategies: StrategySettings,

    #[validate(nested)]
    pub events: EventSettings,

    #[validate(nested)]
    pub fallbacks: FallbackSettings,

    #[validate(nested)]
    pub exceptions: ExceptionSettings,

    #[validate(nested)]
    pub scope_validation: ScopeValidationSettings,
}

impl Default for Settings {
    fn default() -> Self {
        let mut stores = HashMap::new();
        stores.insert("memory".to_string(), StoreSettings::memory());
        Self {
            default: "memory".to_string(),
            stores,
            primary_key_type: PrimaryKeyType::Uuid,
            table_names: TableNames::default(),
            defaults: ConfigurationDefaults::default(),
            strategies: StrategySettings::default(),
            events: EventSettings::default(),
            fallbacks: FallbackSettings::default(),
            exceptions: ExceptionSettings::default(),
            scope_validation: ScopeValidationSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryKeyType {
    Integer,
    Ulid,
    Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "driver")]
pub enum StoreSettings {
    Memory,
    Cache {
        #[serde(default)]
        prefix: Option<String>,
        connection: String,
    },
    Durable {
        #[serde(default)]
        prefix: Option<String>,
        connection: String,
    },
}

impl StoreSettings {
    #[must_use]
    pub fn memory() -> Self {
        StoreSettings::Memory
    }

    #[must_use]
    pub fn driver_name(&self) -> &'static str {
        match self {
            StoreSettings::Memory => "memory",
            StoreSettings::Cache { .. } => "cache",
            StoreSettings::Durable { .. } => "durable",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableNames {
    pub circuit_breakers: String,
    pub circuit_breaker_events: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            circuit_breakers: "circuit_breakers".to_string(),
            circuit_breaker_events: "circuit_breaker_events".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ConfigurationDefaults {
    #[validate(range(min = 1))]
    pub failure_threshold: u64,
    #[validate(range(min = 1))]
    pub success_threshold: u64,
    #[validate(range(min = 1))]
    pub timeout_secs: i64,
    #[validate(range(min = 1))]
    pub sampling_duration_secs: i64,
    pub minimum_throughput: u64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub percentage_threshold: f64,
    #[validate(length(min = 1))]
    pub strategy_name: String,
}

impl Default for ConfigurationDefaults {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            timeout_secs: 60,
            sampling_duration_secs: 120,
            minimum_throughput: 10,
            percentage_threshold: 50.0,
            strategy_name: "consecutive_failures".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct StrategySettings {
    #[validate(length(min = 1))]
    pub default: String,
    pub available: Vec<String>,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            default: "consecutive_failures".to_string(),
            available: vec![
                "consecutive_failures".to_string(),
                "percentage_failures".to_string(),
                "rolling_window".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct EventSettings {
    pub enabled: bool,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct FallbackSettings {
    pub enabled: bool,
    pub default: Option<String>,
    pub handlers: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ExceptionSettings {
    pub ignore: Vec<String>,
    pub record: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ScopeValidationSettings {
    pub morph_key_map: HashMap<String, String>,
    pub enforce_morph_key_map: bool,
    pub boundary_morph_key_map: HashMap<String, String>,
    pub enforce_boundary_morph_key_map: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate_cleanly() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn default_store_is_memory() {
        let settings = Settings::default();
        assert_eq!(settings.default, "memory");
        assert!(matches!(
            settings.stores.get("memory"),
            Some(StoreSettings::Memory)
        ));
    }

    #[test]
    fn out_of_range_percentage_threshold_fails_validation() {
        let mut settings = Settings::default();
        settings.defaults.percentage_threshold = 150.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn store_settings_serde_round_trips_driver_tag() {
        let cache = StoreSettings::Cache {
            prefix: Some("cb".to_string()),
            connection: "redis://localhost".to_string(),
        };
        let json = serde_json::to_string(&cache).unwrap();
        let back: StoreSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.driver_name(), "cache");
    }
}
