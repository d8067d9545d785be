//! Configuration file parsing and discovery

use crate::config::types::{Config, TaskSpec};
use crate::error::{BatonError, ConfigError, ConfigResult};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default configuration file names to search for
pub const CONFIG_FILE_NAMES: &[&str] = &["baton.yml", "baton.yaml"];

/// Find the configuration file by searching current and parent directories
pub fn find_config_file() -> ConfigResult<PathBuf> {
    find_config_file_from(env::current_dir().map_err(|e| {
        ConfigError::Invalid(format!("Failed to get current directory: {}", e))
    })?)
}

/// Find the configuration file starting from a specific directory
pub fn find_config_file_from(start_dir: PathBuf) -> ConfigResult<PathBuf> {
    let mut current_dir = start_dir;
    let mut searched_paths = Vec::new();

    loop {
        for file_name in CONFIG_FILE_NAMES {
            let config_path = current_dir.join(file_name);
            searched_paths.push(config_path.display().to_string());

            if config_path.is_file() {
                return Ok(config_path);
            }
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => return Err(ConfigError::NotFound(searched_paths.join(", "))),
        }
    }
}

/// Parse a configuration file from a path
pub fn parse_config_file(path: &Path) -> Result<Config, BatonError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("Failed to read file: {}", e)))?;

    parse_config(&contents, Some(path))
}

/// Parse configuration from a string
///
/// With a `config_path`, task includes and the env file are resolved relative
/// to its directory.
pub fn parse_config(yaml: &str, config_path: Option<&Path>) -> Result<Config, BatonError> {
    let mut config: Config = serde_yaml::from_str(yaml)?;

    if let Some(path) = config_path {
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        process_includes(&mut config, base_dir)?;
        load_env_file(&mut config, base_dir)?;
    }

    Ok(config)
}

/// Replace tasks carrying `include` with the body of the included file
fn process_includes(config: &mut Config, base_dir: &Path) -> ConfigResult<()> {
    for task in config.tasks.iter_mut() {
        let Some(include_path) = task.include.clone() else {
            continue;
        };

        let mut included = load_included_task(&base_dir.join(&include_path))?;
        if included.include.is_some() {
            return Err(ConfigError::IncludeFile {
                path: base_dir.join(&include_path),
                error: "included task cannot include another file".to_string(),
            });
        }

        included.id = task.id.clone();
        if included.name.is_none() {
            included.name = task.name.clone();
        }
        debug!(task = %task.id, include = %include_path, "included task body");
        *task = included;
    }

    Ok(())
}

/// Load a task from an included file
fn load_included_task(path: &Path) -> ConfigResult<TaskSpec> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::IncludeFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    serde_yaml::from_str(&contents).map_err(|e| ConfigError::IncludeFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Merge the dotenv file into `vars`; explicit vars win
fn load_env_file(config: &mut Config, base_dir: &Path) -> ConfigResult<()> {
    let Some(env_file) = &config.env_file else {
        return Ok(());
    };
    let path = base_dir.join(env_file);

    let entries = dotenvy::from_path_iter(&path).map_err(|e| ConfigError::EnvFile {
        path: path.clone(),
        error: e.to_string(),
    })?;

    for entry in entries {
        let (key, value) = entry.map_err(|e| ConfigError::EnvFile {
            path: path.clone(),
            error: e.to_string(),
        })?;
        config.vars.entry(key).or_insert(value);
    }

    Ok(())
}

/// Parse configuration with automatic file discovery
pub fn parse_config_auto() -> Result<(Config, PathBuf), BatonError> {
    let config_path = find_config_file()?;
    let config = parse_config_file(&config_path)?;
    Ok((config, config_path))
}
