use std::path::PathBuf;
use std::sync::Arc;

use harvest_core::{
    Batch, ByteBudget, CycleQuota, CycleSettings, Entry, ProgressRecord, QuotaStatus,
    RotationSettings,
};
use harvest_logging::{harvest_debug, harvest_error, harvest_info, harvest_warn};
use thiserror::Error;

use crate::clean::TextCleaner;
use crate::fetch::{ArticleSource, Fetcher};
use crate::output::{write_batch, OutputError};
use crate::rotation::{RotationAgent, RotationReport};
use crate::state_store::{StateError, StateStore};

/// Errors that abort a cycle. Candidate-level failures never surface here.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("failed to write batch: {0}")]
    Output(#[from] OutputError),
}

/// What happened to rotation at the end of a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationStatus {
    NotDue,
    Rotated(RotationReport),
    /// Logged and left for the next cycle; the record was not rotated.
    Failed(String),
    /// Due, but no agent was configured (missing credentials).
    Unconfigured,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// `None` when nothing was collected and no file was written.
    pub batch_file: Option<PathBuf>,
    pub entries: usize,
    pub attempts: usize,
    pub quota: QuotaStatus,
    pub rotation: RotationStatus,
}

/// One scheduled run: collect a batch, write it, advance the record, rotate if due.
pub struct CollectionCycle {
    settings: CycleSettings,
    output_dir: PathBuf,
    store: StateStore,
    source: Arc<dyn ArticleSource>,
    fetcher: Arc<dyn Fetcher>,
    cleaner: Arc<dyn TextCleaner>,
    file_limit: u64,
    rotation: Option<RotationAgent>,
}

impl CollectionCycle {
    pub fn new(
        settings: CycleSettings,
        output_dir: impl Into<PathBuf>,
        store: StateStore,
        source: Arc<dyn ArticleSource>,
        fetcher: Arc<dyn Fetcher>,
        cleaner: Arc<dyn TextCleaner>,
    ) -> Self {
        Self {
            settings,
            output_dir: output_dir.into(),
            store,
            source,
            fetcher,
            cleaner,
            file_limit: RotationSettings::default().max_files_per_repo,
            rotation: None,
        }
    }

    /// Enables rotation; the agent's `max_files_per_repo` becomes the file limit.
    pub fn with_rotation(mut self, agent: RotationAgent) -> Self {
        self.file_limit = agent.settings().max_files_per_repo;
        self.rotation = Some(agent);
        self
    }

    /// Sets the file limit used to detect a full repository when no agent is configured.
    pub fn with_file_limit(mut self, max_files_per_repo: u64) -> Self {
        self.file_limit = max_files_per_repo;
        self
    }

    pub async fn run(&self) -> Result<CycleReport, CycleError> {
        let _lock = self.store.lock()?;
        let mut record = self.store.load()?;

        let mut quota = CycleQuota::new(
            self.settings.articles_per_cycle,
            self.settings.max_attempts_per_cycle,
        );
        let budget = ByteBudget::from_megabytes(self.settings.max_batch_mb);
        let mut batch = Batch::new();
        let mut budget_hit = false;

        while !quota.is_met() && quota.begin_attempt() {
            let url = match self.source.next_candidate().await {
                Ok(url) => url,
                Err(err) => {
                    harvest_warn!("Failed to draw a random article: {}", err);
                    continue;
                }
            };
            if record.is_visited(&url) {
                harvest_debug!("Skipping already visited {}", url);
                continue;
            }

            let text = match self.fetcher.fetch(&url).await.and_then(|page| page.decode_text()) {
                Ok(text) => text,
                Err(err) => {
                    harvest_warn!("Failed to scrape {}: {}", url, err);
                    continue;
                }
            };

            let entry = match Entry::new(url, self.cleaner.clean(&text)) {
                Ok(entry) => entry,
                Err(empty) => {
                    harvest_warn!("Empty or junk content at {}, skipping", empty.url);
                    continue;
                }
            };

            if !budget.admits(&batch, &entry) {
                harvest_info!(
                    "Batch byte budget reached at {} bytes; stopping before {}",
                    batch.byte_len(),
                    entry.url
                );
                budget_hit = true;
                break;
            }

            record.mark_visited(entry.url.clone());
            harvest_info!("Collected {} ({} bytes)", entry.url, entry.content.len());
            batch.push(entry);
            quota.accept();
        }

        let quota_status = if budget_hit {
            quota.budget_reached()
        } else {
            quota.status()
        };
        if let QuotaStatus::Unreachable { collected, target } = quota_status {
            harvest_warn!(
                "Quota unreachable: collected {}/{} after {} attempts",
                collected,
                target,
                quota.attempts()
            );
        }

        if batch.is_empty() {
            harvest_warn!("No new articles to save.");
            return Ok(CycleReport {
                batch_file: None,
                entries: 0,
                attempts: quota.attempts(),
                quota: quota_status,
                rotation: RotationStatus::NotDue,
            });
        }

        let path = write_batch(&self.output_dir, record.current_file_number(), &batch)?;
        harvest_info!("Wrote {} entries to {:?}", batch.len(), path);
        record.advance_file_number();
        self.store.save(&record)?;

        let rotation = self.rotate_if_due(&mut record).await;

        Ok(CycleReport {
            batch_file: Some(path),
            entries: batch.len(),
            attempts: quota.attempts(),
            quota: quota_status,
            rotation,
        })
    }

    async fn rotate_if_due(&self, record: &mut ProgressRecord) -> RotationStatus {
        if !record.exceeds_file_limit(self.file_limit) {
            return RotationStatus::NotDue;
        }
        let Some(agent) = self.rotation.as_ref() else {
            harvest_warn!(
                "File limit {} exceeded (next file {}) but rotation is not configured",
                self.file_limit,
                record.current_file_number()
            );
            return RotationStatus::Unconfigured;
        };

        match agent.rotate(&self.store, record).await {
            Ok(report) => RotationStatus::Rotated(report),
            Err(err) => {
                harvest_error!("{}", err);
                RotationStatus::Failed(err.to_string())
            }
        }
    }
}
