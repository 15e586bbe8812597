pub mod doctor;
pub mod onboard;
pub mod reply;

use relaycord_config::{AppConfig, ConfigError};
use std::path::{Path, PathBuf};

/// The config file in effect: `--config` if given, else the default path.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path)
}

pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    AppConfig::load_with_env(&config_path(explicit))
}
