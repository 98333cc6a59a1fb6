mod loader;
mod schema;

pub use loader::{apply_env_overrides, load, load_from_file, load_from_str, LoadError, CONFIG_ENV};
pub use schema::{EngineConfig, ServerConfig, StormwatchConfig};
