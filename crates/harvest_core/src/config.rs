use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Complete runtime configuration. Every field has a default so partial files work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HarvestConfig {
    pub cycle: CycleSettings,
    pub rotation: RotationSettings,
    pub fetch: FetchConfig,
    pub paths: PathSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleSettings {
    /// Articles collected per cycle.
    pub articles_per_cycle: usize,
    /// Candidate draws allowed per cycle, duplicates and failures included.
    pub max_attempts_per_cycle: usize,
    /// Byte budget for a single batch, in decimal megabytes. `0` disables it.
    pub max_batch_mb: u64,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            articles_per_cycle: 3,
            max_attempts_per_cycle: 50,
            max_batch_mb: 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationSettings {
    pub max_files_per_repo: u64,
    pub repo_name_prefix: String,
    pub repo_index_width: usize,
    pub public: bool,
    pub api_base: String,
    pub git_host: String,
    pub remote: String,
    pub branch: String,
    pub commit_message: String,
    /// Persist the rotated record only after the push succeeded.
    pub require_sync: bool,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            max_files_per_repo: 25_000,
            repo_name_prefix: "wikiscraper-".to_string(),
            repo_index_width: 3,
            public: true,
            api_base: "https://api.github.com".to_string(),
            git_host: "github.com".to_string(),
            remote: "origin".to_string(),
            branch: "main".to_string(),
            commit_message: "Auto: Repo Rotation".to_string(),
            require_sync: false,
        }
    }
}

impl RotationSettings {
    /// `wikiscraper-003` for index 3 with the defaults.
    pub fn repo_name(&self, index: u64) -> String {
        format!(
            "{prefix}{index:0width$}",
            prefix = self.repo_name_prefix,
            width = self.repo_index_width
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub random_article_url: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub redirect_limit: usize,
    pub max_page_bytes: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            random_article_url: "https://en.wikipedia.org/wiki/Special:Random".to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            redirect_limit: 5,
            max_page_bytes: 5 * 1024 * 1024,
            user_agent: concat!("wikiharvest/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub state_file: PathBuf,
    pub output_dir: PathBuf,
    /// Working tree that holds the output directory and is pushed on rotation.
    pub repo_dir: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("scraper/state.json"),
            output_dir: PathBuf::from("scraper/scraped_data"),
            repo_dir: PathBuf::from("."),
        }
    }
}

impl HarvestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let cycle = &self.cycle;
        if cycle.articles_per_cycle == 0 {
            return Err(ConfigError::invalid(
                "cycle.articles_per_cycle",
                "must be at least 1",
            ));
        }
        if cycle.max_attempts_per_cycle < cycle.articles_per_cycle {
            return Err(ConfigError::invalid(
                "cycle.max_attempts_per_cycle",
                format!(
                    "{} is below articles_per_cycle ({})",
                    cycle.max_attempts_per_cycle, cycle.articles_per_cycle
                ),
            ));
        }

        let rotation = &self.rotation;
        if rotation.max_files_per_repo == 0 {
            return Err(ConfigError::invalid(
                "rotation.max_files_per_repo",
                "must be at least 1",
            ));
        }
        if rotation.repo_index_width == 0 {
            return Err(ConfigError::invalid(
                "rotation.repo_index_width",
                "must be at least 1",
            ));
        }
        if rotation.repo_name_prefix.trim().is_empty() {
            return Err(ConfigError::invalid(
                "rotation.repo_name_prefix",
                "must not be empty",
            ));
        }
        check_url("rotation.api_base", &rotation.api_base)?;

        check_url("fetch.random_article_url", &self.fetch.random_article_url)?;
        if self.fetch.user_agent.trim().is_empty() {
            return Err(ConfigError::invalid("fetch.user_agent", "must not be empty"));
        }
        Ok(())
    }
}

fn check_url(field: &'static str, raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw).map_err(|err| ConfigError::invalid(field, err.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::invalid(
            field,
            format!("unsupported scheme {other}"),
        )),
    }
}
