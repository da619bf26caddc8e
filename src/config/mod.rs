// Configuration management module
// TOML settings, environment overrides, and interactive setup

pub mod interactive;
pub mod settings;


pub use interactive::{run_interactive_config, show_config};
pub use settings::{Config, ConfigError, DatabaseConfig, OllamaConfig, SearchConfig, UpsertMode};

/// Resolve the configuration directory from an explicit override or the defaults
#[inline]
pub fn resolve_config_dir(
    explicit: Option<std::path::PathBuf>,
) -> Result<std::path::PathBuf, ConfigError> {
    explicit.map_or_else(Config::default_config_dir, Ok)
}
