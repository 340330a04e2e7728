pub mod genes;
pub mod run;
pub mod supermatrix;
pub mod write_config;

use crate::core::config::{default_config, load_config, Config};
use std::path::Path;

/// Config from `--config`, or the built-in defaults
pub fn base_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            tracing::debug!("Loading configuration from {}", path.display());
            Ok(load_config(path)?)
        }
        None => Ok(default_config()),
    }
}
