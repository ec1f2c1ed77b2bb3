use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{CacheSettings, EngineSettings, Settings};

/// Loads the engine configuration from the `config.toml` file.
///
/// This function is the primary entry point for this crate. It reads the
/// configuration file, deserializes it into our strongly-typed `Settings`
/// struct, validates it, and returns it. Library consumers (and tests) that
/// do not want a file on disk can use `Settings::default()` instead.
pub fn load_settings() -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name("config.toml"))
        .build()?;

    let settings = builder.try_deserialize::<Settings>()?;
    validate(&settings)?;

    Ok(settings)
}

/// Rejects settings the engine cannot run with.
fn validate(settings: &Settings) -> Result<(), ConfigError> {
    let engine = &settings.engine;
    if engine.initial_capital <= 0.0 {
        return Err(ConfigError::ValidationError(format!(
            "initial_capital must be positive, got {}",
            engine.initial_capital
        )));
    }
    for (name, weight) in [
        ("default_lending_weight", engine.default_lending_weight),
        ("default_lp_weight", engine.default_lp_weight),
    ] {
        if !(0.0..=1.0).contains(&weight) {
            return Err(ConfigError::ValidationError(format!(
                "{} must be within [0, 1], got {}",
                name, weight
            )));
        }
    }
    if engine.rebalance_threshold <= 0.0 {
        return Err(ConfigError::ValidationError(format!(
            "rebalance_threshold must be positive, got {}",
            engine.rebalance_threshold
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        assert!(validate(&Settings::default()).is_ok());
    }

    #[test]
    fn negative_capital_fails_validation() {
        let mut settings = Settings::default();
        settings.engine.initial_capital = -1.0;
        assert!(validate(&settings).is_err());
    }

    #[test]
    fn overweight_default_fails_validation() {
        let mut settings = Settings::default();
        settings.engine.default_lp_weight = 1.5;
        assert!(validate(&settings).is_err());
    }
}
