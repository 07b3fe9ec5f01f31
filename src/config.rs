use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Optional on-disk configuration. Every value can also come from the environment.
#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub gitlab: GitLabSection,
    #[serde(default)]
    pub notion: NotionSection,
    #[serde(default)]
    pub sync: SyncSection,
}

#[derive(Debug, Deserialize, Default)]
pub struct GitLabSection {
    pub domain: Option<String>,
    pub project_id: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct NotionSection {
    pub token: Option<String>,
    pub database_id: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SyncSection {
    pub page_size: Option<u32>,
    pub group_size: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub max_attempts: Option<u32>,
    pub sync_taxonomy: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct GitLabConfig {
    pub domain: String,
    pub project_id: String,
    pub token: String,
}

impl GitLabConfig {
    /// API root for the configured instance. Bare hosts are assumed to speak https.
    pub fn api_base(&self) -> String {
        let domain = self.domain.trim_end_matches('/');
        if domain.starts_with("http://") || domain.starts_with("https://") {
            format!("{domain}/api/v4")
        } else {
            format!("https://{domain}/api/v4")
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotionConfig {
    pub token: String,
    pub database_id: String,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub gitlab: GitLabConfig,
    pub notion: NotionConfig,
    pub page_size: u32,
    pub group_size: usize,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub sync_taxonomy: bool,
}

pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_GROUP_SIZE: usize = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

fn config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".issue-mirror")
        .join("config.toml")
}

pub fn load_config() -> Result<SyncConfig, ConfigError> {
    let file = read_file_config(&config_path())?;
    resolve(file, |key| std::env::var(key).ok())
}

pub fn read_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Merge file values with `lookup` (environment in production); lookup wins.
pub fn resolve<F>(file: FileConfig, lookup: F) -> Result<SyncConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let present = |v: &String| !v.trim().is_empty();
    let mut missing = Vec::new();
    let mut require = |key: &'static str, fallback: Option<String>| {
        match lookup(key).filter(present).or(fallback.filter(present)) {
            Some(value) => value,
            None => {
                missing.push(key);
                String::new()
            }
        }
    };

    let domain = require("GITLAB_DOMAIN", file.gitlab.domain);
    let project_id = require("GITLAB_PROJECT_ID", file.gitlab.project_id);
    let gitlab_token = require("GITLAB_TOKEN", file.gitlab.token);
    let notion_token = require("NOTION_KEY", file.notion.token);
    let database_id = require("NOTION_DATABASE_ID", file.notion.database_id);

    if !missing.is_empty() {
        return Err(ConfigError::Missing(missing));
    }

    let sync = file.sync;
    let page_size = sync.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    let group_size = sync.group_size.unwrap_or(DEFAULT_GROUP_SIZE);
    let max_attempts = sync.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS);
    let timeout_secs = sync.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if page_size == 0 || group_size == 0 || max_attempts == 0 || timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "page_size, group_size, max_attempts and timeout_secs must be positive".into(),
        ));
    }

    Ok(SyncConfig {
        gitlab: GitLabConfig {
            domain,
            project_id,
            token: gitlab_token,
        },
        notion: NotionConfig {
            token: notion_token,
            database_id,
        },
        page_size,
        group_size,
        timeout_secs,
        max_attempts,
        sync_taxonomy: sync.sync_taxonomy.unwrap_or(true),
    })
}
