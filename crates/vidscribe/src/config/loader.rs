use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.progress_step == 0 || config.progress_step > 100 {
        return Err(ConfigError::Validation {
            message: format!(
                "progress_step must be between 1 and 100, got {}",
                config.progress_step
            ),
        });
    }

    if config.engine.language.is_empty() {
        return Err(ConfigError::Validation {
            message: "engine.language must not be empty".to_string(),
        });
    }

    if config.engine.n_threads == 0 {
        return Err(ConfigError::Validation {
            message: "engine.n_threads must be at least 1".to_string(),
        });
    }

    if config.engine.best_of < 1 {
        return Err(ConfigError::Validation {
            message: format!("engine.best_of must be at least 1, got {}", config.engine.best_of),
        });
    }

    if config.engine.beam_size < 1 {
        return Err(ConfigError::Validation {
            message: format!(
                "engine.beam_size must be at least 1, got {}",
                config.engine.beam_size
            ),
        });
    }

    if !(0.0..=1.0).contains(&config.engine.word_threshold) {
        return Err(ConfigError::Validation {
            message: format!(
                "engine.word_threshold must be within [0, 1], got {}",
                config.engine.word_threshold
            ),
        });
    }

    Ok(())
}
