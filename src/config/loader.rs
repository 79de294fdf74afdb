// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::cli::CliArgs;
use crate::config::model::FileConfig;
use crate::config::settings::Settings;
use crate::config::validate::validate_settings;
use crate::errors::Result;

/// Read and deserialize a defaults file. No semantic validation happens
/// here; that needs the CLI flags as well.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<FileConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: FileConfig = toml::from_str(&contents)?;
    debug!(path = %path.display(), "loaded config file");

    Ok(config)
}

/// Resolve the settings for one invocation and validate them.
///
/// This is the entry point the rest of the application uses:
///
/// - Reads `--config` if given.
/// - Merges CLI flags over it, then built-in defaults.
/// - Rejects unusable combinations (see [`validate_settings`]).
pub fn load_settings(args: &CliArgs) -> Result<Settings> {
    let file = match &args.config {
        Some(path) => load_from_path(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(args, file);
    validate_settings(&settings)?;
    Ok(settings)
}
