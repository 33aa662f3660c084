//! Configuration file loading.
//!
//! Settings come from a TOML file found in one of several locations
//! (explicit path, working directory, platform config directory). Every
//! section and field is optional.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::color::Rgb;
use crate::graph_layout::{LayoutConfig, Viewport};
use crate::sizing::SizingConfig;

const LOCAL_CONFIG: &str = "flowdraft.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub layout: LayoutConfig,
    pub sizing: SizingConfig,
    pub viewport: Viewport,
    pub style: StyleConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Fill for nodes created without an explicit color. Any CSS color.
    pub default_fill: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            default_fill: Rgb::LIGHT_BLUE.to_string(),
        }
    }
}

impl StyleConfig {
    pub fn fill(&self) -> Rgb {
        self.default_fill.parse().unwrap_or_else(|err: String| {
            warn!(color = self.default_fill.as_str(), err = err.as_str(); "Invalid default fill, using light blue");
            Rgb::default()
        })
    }
}

/// Find and load configuration.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. `flowdraft.toml` in the working directory
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if an explicit path does not exist, or if a found file
/// cannot be read or parsed.
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, ConfigError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new(LOCAL_CONFIG);
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("org", "flowdraft", "flowdraft") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
}
