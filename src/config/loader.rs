// src/config/loader.rs

use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// Files ending in `.toml` are parsed as TOML; everything else as JSON.
/// No semantic validation happens here. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    load_with(&RealFileSystem, path.as_ref())
}

/// Same as [`load_from_path`] but reads through the given filesystem.
pub fn load_with(fs: &dyn FileSystem, path: &Path) -> Result<RawConfigFile> {
    let contents = fs.read_to_string(path)?;
    parse_config(&contents, is_toml(path))
}

/// Parse config text in either supported format.
pub fn parse_config(contents: &str, toml: bool) -> Result<RawConfigFile> {
    let config = if toml {
        toml::from_str(contents)?
    } else {
        serde_json::from_str(contents)?
    };
    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// This is the entry point the binary uses:
///
/// - Reads JSON (or TOML).
/// - Applies serde defaults, then connection defaults.
/// - Checks devices, sources and columns, stat-ing local data files.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// `config.json` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("config.json")
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}
