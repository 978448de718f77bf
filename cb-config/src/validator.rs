//! Thin wrapper over the `validator` crate's derive-generated validation,
//! kept as its own module so callers import `cb_config::validate` rather
//! than reaching for the `Validate` trait directly.

use crate::settings::Settings;
pub use validator::Validate;

pub fn validate(settings: &Settings) -> Result<(), validator::ValidationErrors> {
    settings.validate()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        assert!(validate(&Settings::default()).is_ok());
    }

    #[test]
    fn empty_default_store_name_is_rejected() {
        let mut settings = Settings::default();
        settings.default = String::new();
        assert!(validate(&settings).is_err());
    }
}
