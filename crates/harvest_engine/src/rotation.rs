use std::sync::Arc;

use harvest_core::{ProgressRecord, RotationPlan, RotationSettings};
use harvest_logging::{harvest_error, harvest_info, harvest_warn};
use thiserror::Error;

use crate::hosting::{HostError, RepoHost};
use crate::state_store::{StateError, StateStore};
use crate::sync::{RepoSync, RepoSyncError};

#[derive(Debug, Error)]
pub enum RotationError {
    /// The host refused or could not create the repository. Nothing was changed.
    #[error("rotation to {repo_name} failed: {source}")]
    RotationFailed {
        repo_name: String,
        source: HostError,
    },
    /// The repository exists but the local tree could not be pushed to it and
    /// `require_sync` is set. The record was left untouched.
    #[error("rotation to {repo_name} created the repository but could not sync: {message}")]
    SyncFailed { repo_name: String, message: String },
    #[error("rotation succeeded remotely but the progress record was not saved: {0}")]
    State(#[from] StateError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationReport {
    pub repo_name: String,
    pub repo_index: u64,
    /// Whether the remote redirect and push both succeeded.
    pub synced: bool,
}

/// Provisions the next storage repository and moves the working tree onto it.
pub struct RotationAgent {
    host: Arc<dyn RepoHost>,
    sync: Arc<dyn RepoSync>,
    settings: RotationSettings,
}

impl RotationAgent {
    pub fn new(
        host: Arc<dyn RepoHost>,
        sync: Arc<dyn RepoSync>,
        settings: RotationSettings,
    ) -> Self {
        Self {
            host,
            sync,
            settings,
        }
    }

    pub fn settings(&self) -> &RotationSettings {
        &self.settings
    }

    /// Runs one rotation against `record` and persists the outcome through `store`.
    ///
    /// Creation failure leaves `record` untouched. A failed push still advances the
    /// record unless `require_sync` is set, in which case it is reported as an error.
    pub async fn rotate(
        &self,
        store: &StateStore,
        record: &mut ProgressRecord,
    ) -> Result<RotationReport, RotationError> {
        let plan = RotationPlan::next(record, &self.settings);
        harvest_info!(
            "Rotating storage: creating repository {} (index {})",
            plan.repo_name,
            plan.new_index
        );

        self.host
            .create_repository(&plan.repo_name, self.settings.public)
            .await
            .map_err(|source| RotationError::RotationFailed {
                repo_name: plan.repo_name.clone(),
                source,
            })?;
        harvest_info!("Created repository {}", plan.repo_name);

        let synced = match self.sync_working_tree(&plan).await {
            Ok(()) => true,
            Err(err) => {
                let message = self.host.redact(&err.to_string());
                if self.settings.require_sync {
                    return Err(RotationError::SyncFailed {
                        repo_name: plan.repo_name,
                        message,
                    });
                }
                harvest_error!(
                    "Repository {} created but sync failed; local and remote may diverge: {}",
                    plan.repo_name,
                    message
                );
                false
            }
        };

        record.apply_rotation(plan.new_index);
        store.save(record)?;
        if synced {
            harvest_info!("Rotated to {} and pushed pending batches", plan.repo_name);
        } else {
            harvest_warn!("Rotated to {} without a successful push", plan.repo_name);
        }

        Ok(RotationReport {
            repo_name: plan.repo_name,
            repo_index: plan.new_index,
            synced,
        })
    }

    async fn sync_working_tree(&self, plan: &RotationPlan) -> Result<(), RepoSyncError> {
        self.sync
            .set_remote(&self.host.push_url(&plan.repo_name))
            .await?;
        self.sync
            .commit_and_push(&self.settings.commit_message)
            .await
    }
}
