//! Configuration loading, precedence, validation, and hot reload for the
//! circuit breaker engine: environment variables, TOML/YAML files, and a
//! merge order of env > file > defaults (this crate has no CLI layer).

pub mod file_loader;
pub mod hot_reload;
pub mod loader;
pub mod precedence;
pub mod settings;
pub mod validator;

pub use file_loader::{load_from_file, load_from_toml, load_from_yaml, ConfigFileError};
pub use hot_reload::{watch, ConfigReloadEvent};
pub use loader::{load_from_env, EnvLoadError};
pub use precedence::merge;
pub use settings::{
    ConfigurationDefaults, EventSettings, ExceptionSettings, FallbackSettings, PrimaryKeyType,
    ScopeValidationSettings, Settings, StoreSettings, StrategySettings, TableNames,
};
pub use validator::validate;
