// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::request_manager::{IdAllocator, RequestManager};

// Configuration structures
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ManagerConfig {
    #[serde(default)]
    pub requests: RequestSettings,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RequestSettings {
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,
    /// 0 means unbounded.
    #[serde(default)]
    pub max_pending: usize,
    #[serde(default)]
    pub id_strategy: IdStrategy,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    #[default]
    Random,
    Sequential,
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self {
            default_timeout_ms: default_timeout_ms(),
            max_pending: 0,
            id_strategy: IdStrategy::default(),
        }
    }
}

// Default values
fn default_timeout_ms() -> u64 { 20_000 }

impl ManagerConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.requests.default_timeout_ms)
    }

    /// Builds a fresh manager for one connection.
    pub fn build_manager(&self) -> RequestManager {
        let allocator = match self.requests.id_strategy {
            IdStrategy::Random => IdAllocator::random(),
            IdStrategy::Sequential => IdAllocator::sequential(1),
        };
        RequestManager::new()
            .with_allocator(allocator)
            .with_max_pending(self.requests.max_pending)
    }

    fn validate(&self) -> Result<()> {
        if self.requests.default_timeout_ms == 0 {
            return Err(anyhow!("Configuration error: requests.default_timeout_ms must be positive"));
        }
        Ok(())
    }
}

const CONFIG_FILE_NAME: &str = "RequestManager.json";

/// Names a config file explicitly; when set, nothing else is searched.
pub const CONFIG_PATH_VAR: &str = "REQUEST_MANAGER_CONFIG";

/// Candidate config locations in lookup order.
pub fn config_search_paths(explicit: Option<PathBuf>, home_dir: Option<PathBuf>) -> Vec<PathBuf> {
    if let Some(path) = explicit {
        return vec![path];
    }

    let mut paths = vec![
        PathBuf::from(CONFIG_FILE_NAME),
        Path::new("config").join(CONFIG_FILE_NAME),
    ];
    paths.extend(home_dir.map(|dir| dir.join(format!(".{CONFIG_FILE_NAME}"))));
    paths
}

fn first_existing(candidates: &[PathBuf]) -> Result<PathBuf> {
    if let Some(path) = candidates.iter().find(|path| path.is_file()) {
        debug!(path = %path.display(), "Using config file");
        return Ok(path.clone());
    }

    let searched: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
    Err(anyhow!("No config file found (searched: {})", searched.join(", ")))
}

pub fn find_config_file() -> Result<PathBuf> {
    let explicit = env::var_os(CONFIG_PATH_VAR).map(PathBuf::from);
    first_existing(&config_search_paths(explicit, home::home_dir()))
}

pub fn load_config() -> Result<ManagerConfig> {
    let config_path = find_config_file()?;
    load_config_from(&config_path)
}

pub fn load_config_from(path: &Path) -> Result<ManagerConfig> {
    let config_content = fs::read_to_string(path)
        .context(format!("Failed to read config file at {}", path.display()))?;

    let config: ManagerConfig = serde_json::from_str(&config_content)
        .context("Configuration file contains invalid JSON or missing required fields")?;
    config.validate()?;

    Ok(config)
}

pub fn create_default_config_file(path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&ManagerConfig::default())
        .context("Failed to serialize default configuration")?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .context(format!("Failed to create directory at {}", parent.display()))?;
        }
    }

    fs::write(path, json)
        .context(format!("Failed to write configuration to {}", path.display()))?;

    info!("Created default configuration file at: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request_manager::{RequestError, RequestId};
    use serde_json::Map;
    use uuid::Uuid;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("request-manager-{}", Uuid::new_v4()))
            .join(name)
    }

    #[test]
    fn test_defaults_from_empty_object() {
        let config: ManagerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.default_timeout(), Duration::from_secs(20));
        assert_eq!(config.requests.max_pending, 0);
        assert_eq!(config.requests.id_strategy, IdStrategy::Random);
    }

    #[test]
    fn test_partial_settings() {
        let config: ManagerConfig = serde_json::from_str(
            r#"{"requests": {"default_timeout_ms": 1500, "id_strategy": "sequential"}}"#,
        )
        .unwrap();
        assert_eq!(config.default_timeout(), Duration::from_millis(1500));
        assert_eq!(config.requests.id_strategy, IdStrategy::Sequential);
    }

    #[test]
    fn test_default_file_roundtrip() {
        let path = scratch_path("RequestManager.json");
        create_default_config_file(&path).unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.requests.default_timeout_ms, 20_000);

        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let path = scratch_path("RequestManager.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{"requests": {"default_timeout_ms": 0}}"#).unwrap();

        assert!(load_config_from(&path).is_err());
        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_explicit_path_is_the_only_candidate() {
        let explicit = PathBuf::from("/etc/rm/custom.json");
        let paths = config_search_paths(Some(explicit.clone()), Some(PathBuf::from("/home/u")));
        assert_eq!(paths, vec![explicit]);
    }

    #[test]
    fn test_search_order_ends_in_home_dir() {
        let paths = config_search_paths(None, Some(PathBuf::from("/home/u")));
        assert_eq!(
            paths,
            vec![
                PathBuf::from("RequestManager.json"),
                PathBuf::from("config/RequestManager.json"),
                PathBuf::from("/home/u/.RequestManager.json"),
            ]
        );
        assert_eq!(config_search_paths(None, None).len(), 2);
    }

    #[test]
    fn test_first_existing_skips_missing_candidates() {
        let present = scratch_path("RequestManager.json");
        create_default_config_file(&present).unwrap();
        let missing = scratch_path("RequestManager.json");

        let found = first_existing(&[missing.clone(), present.clone()]).unwrap();
        assert_eq!(found, present);

        let err = first_existing(&[missing.clone()]).unwrap_err();
        assert!(err.to_string().contains(&missing.display().to_string()));

        fs::remove_dir_all(present.parent().unwrap()).unwrap();
    }

    #[tokio::test]
    async fn test_build_manager_applies_limits() {
        let mut config = ManagerConfig::default();
        config.requests.max_pending = 3;
        config.requests.id_strategy = IdStrategy::Sequential;
        let manager = config.build_manager();

        let mut handles = Vec::new();
        for expected in ["1", "2", "3"] {
            let (message, handle) = manager
                .submit_json(Map::new(), config.default_timeout())
                .unwrap();
            assert_eq!(message.id, RequestId::from(expected));
            handles.push(handle);
        }

        let err = manager
            .submit_json(Map::new(), config.default_timeout())
            .unwrap_err();
        assert_eq!(err, RequestError::TooManyPending(3));
        assert_eq!(manager.pending_count(), 3);
    }
}
