use std::path::PathBuf;

use harvest_logging::harvest_debug;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum RepoSyncError {
    #[error("failed to run {program:?}: {source}")]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },
    #[error("git {step} failed: {stderr}")]
    Step { step: &'static str, stderr: String },
}

/// Lock files guard local runs and never belong in a storage repository.
const EXCLUDE_LOCK_FILES: &str = ":(exclude)*.lock";

/// Local working tree that mirrors a storage repository.
#[async_trait::async_trait]
pub trait RepoSync: Send + Sync {
    /// Points future pushes at `url`.
    async fn set_remote(&self, url: &str) -> Result<(), RepoSyncError>;

    /// Commits every pending change except lock files (if any) and pushes the branch.
    async fn commit_and_push(&self, message: &str) -> Result<(), RepoSyncError>;
}

/// Drives the `git` command line inside `repo_dir`.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
    repo_dir: PathBuf,
    remote: String,
    branch: String,
}

impl GitCli {
    pub fn new(repo_dir: impl Into<PathBuf>, remote: &str, branch: &str) -> Self {
        Self {
            program: PathBuf::from("git"),
            repo_dir: repo_dir.into(),
            remote: remote.to_string(),
            branch: branch.to_string(),
        }
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    async fn git(&self, step: &'static str, args: &[&str]) -> Result<String, RepoSyncError> {
        harvest_debug!("git {} in {:?}", step, self.repo_dir);
        let output = Command::new(&self.program)
            .args(args)
            .current_dir(&self.repo_dir)
            .output()
            .await
            .map_err(|source| RepoSyncError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(RepoSyncError::Step {
                step,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait::async_trait]
impl RepoSync for GitCli {
    async fn set_remote(&self, url: &str) -> Result<(), RepoSyncError> {
        self.git("remote set-url", &["remote", "set-url", self.remote.as_str(), url])
            .await
            .map(|_| ())
    }

    async fn commit_and_push(&self, message: &str) -> Result<(), RepoSyncError> {
        self.git("add", &["add", "--all", "--", ".", EXCLUDE_LOCK_FILES])
            .await?;
        let staged = self
            .git("diff", &["diff", "--cached", "--name-only"])
            .await?;
        if !staged.trim().is_empty() {
            self.git("commit", &["commit", "-m", message]).await?;
        }
        self.git("push", &["push", self.remote.as_str(), self.branch.as_str()])
            .await
            .map(|_| ())
    }
}
