use std::fmt;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

pub const TOKEN_ENV: &str = "GH_TOKEN";
pub const ACCOUNT_ENV: &str = "GITHUB_ACTOR";

/// Access token and account name for the repository host.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub account: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            account: account.into(),
        }
    }

    /// Reads `GH_TOKEN` and `GITHUB_ACTOR`. Empty values count as missing.
    pub fn from_env() -> Result<Self, HostError> {
        let read = |name: &'static str| {
            std::env::var(name)
                .ok()
                .filter(|value| !value.trim().is_empty())
                .ok_or(HostError::MissingCredential(name))
        };
        Ok(Self::new(read(TOKEN_ENV)?, read(ACCOUNT_ENV)?))
    }

    /// Replaces every occurrence of the token so messages are safe to log.
    pub fn redact(&self, message: &str) -> String {
        if self.token.is_empty() {
            return message.to_string();
        }
        message.replace(&self.token, "***")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"***")
            .field("account", &self.account)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("environment variable {0} is not set")]
    MissingCredential(&'static str),
    #[error("repository host answered {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("repository host unreachable: {0}")]
    Network(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedRepository {
    pub name: String,
}

/// Remote service that provisions storage repositories.
#[async_trait::async_trait]
pub trait RepoHost: Send + Sync {
    async fn create_repository(
        &self,
        name: &str,
        public: bool,
    ) -> Result<CreatedRepository, HostError>;

    /// Authenticated URL the local working tree pushes to.
    fn push_url(&self, name: &str) -> String;

    /// Strips secrets from collaborator output before it is logged.
    fn redact(&self, message: &str) -> String {
        message.to_string()
    }
}

#[derive(Serialize)]
struct CreateRepositoryRequest<'a> {
    name: &'a str,
    private: bool,
}

/// GitHub REST implementation: `POST {api_base}/user/repos`.
#[derive(Debug, Clone)]
pub struct GithubHost {
    client: reqwest::Client,
    api_base: String,
    git_host: String,
    credentials: Credentials,
}

impl GithubHost {
    pub fn new(
        api_base: impl Into<String>,
        git_host: impl Into<String>,
        credentials: Credentials,
        user_agent: &str,
    ) -> Result<Self, HostError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| HostError::Network(err.to_string()))?;
        Ok(Self {
            client,
            api_base: api_base.into(),
            git_host: git_host.into(),
            credentials,
        })
    }
}

#[async_trait::async_trait]
impl RepoHost for GithubHost {
    async fn create_repository(
        &self,
        name: &str,
        public: bool,
    ) -> Result<CreatedRepository, HostError> {
        let endpoint = format!("{}/user/repos", self.api_base.trim_end_matches('/'));
        let response = self
            .client
            .post(endpoint)
            .header(AUTHORIZATION, format!("token {}", self.credentials.token))
            .header(ACCEPT, "application/vnd.github+json")
            .json(&CreateRepositoryRequest {
                name,
                private: !public,
            })
            .send()
            .await
            .map_err(|err| HostError::Network(self.credentials.redact(&err.to_string())))?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Err(HostError::Rejected {
                status: status.as_u16(),
                body: self.credentials.redact(&body),
            });
        }

        Ok(CreatedRepository {
            name: name.to_string(),
        })
    }

    fn push_url(&self, name: &str) -> String {
        let Credentials { token, account } = &self.credentials;
        format!("https://{account}:{token}@{}/{account}/{name}.git", self.git_host)
    }

    fn redact(&self, message: &str) -> String {
        self.credentials.redact(message)
    }
}
