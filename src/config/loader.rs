use std::path::{Path, PathBuf};

use crate::error::RagchatError;

use super::types::RagchatConfig;

/// Find the config file to use.
///
/// Precedence:
/// 1. `--config` CLI flag
/// 2. `RAGCHAT_CONFIG` env var
/// 3. `./config/ragchat.json` (project-level)
/// 4. `~/.ragchat/ragchat.json` (home-level)
pub fn discover_config_file(cli_config: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = cli_config {
        return Some(PathBuf::from(path));
    }

    if let Ok(env_path) = std::env::var("RAGCHAT_CONFIG") {
        let p = PathBuf::from(env_path);
        if p.exists() {
            return Some(p);
        }
    }

    let project_config = PathBuf::from("./config/ragchat.json");
    if project_config.exists() {
        return Some(project_config);
    }

    let home_config = dirs::home_dir()?.join(".ragchat").join("ragchat.json");
    home_config.exists().then_some(home_config)
}

fn load_config_file(path: &Path) -> Result<RagchatConfig, RagchatError> {
    let content = std::fs::read_to_string(path).map_err(|e| RagchatError::ConfigError {
        path: path.to_path_buf(),
        detail: format!("Cannot read file: {}", e),
    })?;

    serde_json::from_str::<RagchatConfig>(&content).map_err(|e| RagchatError::ConfigError {
        path: path.to_path_buf(),
        detail: format!("Invalid JSON: {}", e),
    })
}

/// Apply `RAGCHAT_BASE_URL`, `RAGCHAT_SESSION` and `RAGCHAT_TIMEOUT`.
fn apply_env_overrides(
    config: &mut RagchatConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), RagchatError> {
    if let Some(url) = lookup("RAGCHAT_BASE_URL").filter(|v| !v.is_empty()) {
        config.base_url = url;
    }
    if let Some(session) = lookup("RAGCHAT_SESSION").filter(|v| !v.is_empty()) {
        config.session = session;
    }
    if let Some(timeout) = lookup("RAGCHAT_TIMEOUT") {
        config.timeout_secs = timeout.parse().map_err(|_| RagchatError::ConfigError {
            path: PathBuf::from("<env>"),
            detail: format!("RAGCHAT_TIMEOUT must be a number of seconds, got '{timeout}'"),
        })?;
    }
    Ok(())
}

/// Load the config file (if any) and apply environment overrides.
pub fn load_config(cli_config: Option<&str>) -> Result<RagchatConfig, RagchatError> {
    let mut config = match discover_config_file(cli_config) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            load_config_file(&path)?
        }
        None => RagchatConfig::default(),
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}
