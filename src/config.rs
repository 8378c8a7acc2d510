use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    pub source: Option<SourceConfig>,
    pub store: Option<StoreConfig>,
    pub github: Option<GitHubConfig>,
    pub jira: Option<JiraConfig>,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct SourceConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct GitHubConfig {
    pub owner: String,
    pub repo: String,
    pub token: String,
    #[serde(default = "default_github_api")]
    pub api_url: String,
}

#[derive(Debug, Deserialize)]
pub struct JiraConfig {
    pub domain: String,
    pub email: String,
    pub api_token: String,
    pub project_key: String,
    #[serde(default = "default_issue_type")]
    pub issue_type: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct HttpConfig {
    pub timeout_secs: Option<u64>,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

impl AppConfig {
    /// Where the normalized documents live, falling back to the data dir.
    pub fn store_path(&self) -> PathBuf {
        self.store
            .as_ref()
            .map(|s| s.path.clone())
            .unwrap_or_else(|| data_dir().join("documents.json"))
    }
}

fn default_github_api() -> String {
    "https://api.github.com".to_string()
}

fn default_issue_type() -> String {
    "Task".to_string()
}

pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".rtc2tracker")
}

pub fn default_config_path() -> PathBuf {
    data_dir().join("config.toml")
}

pub fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

fn parse_config(contents: &str) -> Result<AppConfig> {
    Ok(toml::from_str(contents)?)
}
