//! Configuration file loading: TOML or YAML, with format picked from the
//! file extension.

use std::path::Path;

use crate::settings::Settings;

#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("config file not found: {0}")]
    NotFound(String),

    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("config file has no extension: {0}")]
    NoExtension(String),

    #[error("unsupported config file format '{0}'")]
    UnsupportedFormat(String),
}

pub fn load_from_toml(path: &Path) -> Result<Settings, ConfigFileError> {
    let contents = read(path)?;
    Ok(toml::from_str(&contents)?)
}

pub fn load_from_yaml(path: &Path) -> Result<Settings, ConfigFileError> {
    let contents = read(path)?;
    Ok(serde_yaml::from_str(&contents)?)
}

/// Picks the loader by extension (`.toml`, `.yaml`/`.yml`).
pub fn load_from_file(path: &Path) -> Result<Settings, ConfigFileError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| ConfigFileError::NoExtension(path.display().to_string()))?;

    match ext {
        "toml" => load_from_toml(path),
        "yaml" | "yml" => load_from_yaml(path),
        other => Err(ConfigFileError::UnsupportedFormat(other.to_string())),
    }
}

fn read(path: &Path) -> Result<String, ConfigFileError> {
    if !path.exists() {
        return Err(ConfigFileError::NotFound(path.display().to_string()));
    }
    std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
        path: path.display().to_string(),
        source,
    })
}
