//! Layered lane configuration
//!
//! Four layers, lowest precedence first:
//! 1. Built-in defaults
//! 2. Host config (`~/.config/xmake-lane/config.toml`)
//! 3. Repo config (`.xmake/lane.toml`)
//! 4. CLI flags

mod defaults;
mod effective;
mod merge;
mod settings;

pub use defaults::BuiltinDefaults;
pub use effective::{
    host_config_path, repo_config_path, ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig, HOST_CONFIG_PATH,
    REPO_CONFIG_PATH, SCHEMA_ID, SCHEMA_VERSION,
};
pub use merge::{deep_merge, merge_layers};
pub use settings::LaneSettings;
