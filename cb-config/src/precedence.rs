//! Configuration precedence: merges settings loaded from defaults, a file,
//! and the environment. This crate has no CLI layer, so the documented
//! order collapses from "CLI > env > file > defaults" to "env > file >
//! defaults".

use crate::settings::Settings;

/// Merges `file` over `defaults`, then `env` over the result. Each
/// section that differs from the running base is logged at `info`, the
/// same granularity the teacher's `merge_with_logging` uses per field —
/// here per top-level section, since `Settings` sections are coarser.
pub fn merge(defaults: Settings, file: Settings, env: Settings) -> Settings {
    let mut merged = merge_with_logging(defaults, file, "file");
    merged = merge_with_logging(merged, env, "env");
    merged
}

fn merge_with_logging(mut base: Settings, overlay: Settings, source: &str) -> Settings {
    let mut changed = Vec::new();

    if overlay.default != base.default {
        changed.push("default");
        base.default = overlay.default;
    }
    if !overlay.stores.is_empty() {
        changed.push("stores");
        base.stores = overlay.stores;
    }
    base.primary_key_type = overlay.primary_key_type;
    if format!("{:?}", overlay.table_names) != format!("{:?}", base.table_names) {
        changed.push("table_names");
        base.table_names = overlay.table_names;
    }
    base.defaults = overlay.defaults;
    base.strategies = overlay.strategies;
    base.events = overlay.events;
    base.fallbacks = overlay.fallbacks;
    base.exceptions = overlay.exceptions;
    base.scope_validation = overlay.scope_validation;

    if !changed.is_empty() {
        tracing::info!("configuration overridden from {source}: {changed:?}");
    }

    base
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_overrides_defaults_and_env_overrides_file() {
        let defaults = Settings::default();
        let mut file = Settings::default();
        file.default = "from_file".to_string();
        let mut env = Settings::default();
        env.default = "from_env".to_string();

        let merged = merge(defaults, file, env);
        assert_eq!(merged.default, "from_env");
    }

    #[test]
    fn unset_overlay_keeps_defaults() {
        let defaults = Settings::default();
        let file = Settings::default();
        let env = Settings::default();

        let merged = merge(defaults, file, env);
        assert_eq!(merged.default, "memory");
    }
}
