use std::sync::Arc;

use anyhow::{bail, Context};
use harvest_core::{rotation_due, HarvestConfig, ProgressRecord, QuotaStatus};
use harvest_engine::{
    ensure_output_dir, CollectionCycle, CycleReport, Credentials, FetchSettings, GitCli,
    GithubHost, HostError, RandomArticleSource, ReqwestFetcher, RotationAgent, RotationStatus,
    StateStore, WikiTextCleaner,
};
use harvest_logging::{harvest_info, harvest_warn};

fn rotation_agent(config: &HarvestConfig) -> Result<RotationAgent, HostError> {
    let rotation = &config.rotation;
    let credentials = Credentials::from_env()?;
    let host = GithubHost::new(
        &rotation.api_base,
        &rotation.git_host,
        credentials,
        &config.fetch.user_agent,
    )?;
    let sync = GitCli::new(&config.paths.repo_dir, &rotation.remote, &rotation.branch);
    Ok(RotationAgent::new(
        Arc::new(host),
        Arc::new(sync),
        rotation.clone(),
    ))
}

/// One scheduled collection cycle with the production collaborators.
pub async fn run(config: &HarvestConfig) -> anyhow::Result<CycleReport> {
    let fetch = FetchSettings::from(&config.fetch);
    let cycle = CollectionCycle::new(
        config.cycle.clone(),
        config.paths.output_dir.clone(),
        StateStore::new(&config.paths.state_file),
        Arc::new(RandomArticleSource::new(
            config.fetch.random_article_url.clone(),
            fetch.clone(),
        )),
        Arc::new(ReqwestFetcher::new(fetch)),
        Arc::new(WikiTextCleaner),
    );
    let cycle = match rotation_agent(config) {
        Ok(agent) => cycle.with_rotation(agent),
        Err(err) => {
            harvest_warn!("Repository rotation disabled: {}", err);
            cycle.with_file_limit(config.rotation.max_files_per_repo)
        }
    };

    let report = cycle.run().await.context("collection cycle aborted")?;
    match &report.batch_file {
        Some(path) => harvest_info!(
            "Cycle finished: {} entries in {:?} after {} attempts",
            report.entries,
            path,
            report.attempts
        ),
        None => harvest_info!("Cycle finished without a batch after {} attempts", report.attempts),
    }
    if let QuotaStatus::BudgetReached { collected, target } = report.quota {
        harvest_info!("Batch budget stopped the cycle at {}/{} articles", collected, target);
    }
    if let RotationStatus::Rotated(rotated) = &report.rotation {
        harvest_info!(
            "Now writing to {} (synced: {})",
            rotated.repo_name,
            rotated.synced
        );
    }
    Ok(report)
}

/// Creates the progress record and the output directory for a fresh deployment.
pub fn init(config: &HarvestConfig, file_number: u64, repo_index: u64) -> anyhow::Result<()> {
    if file_number == 0 || repo_index == 0 {
        bail!("file number and repository index start at 1");
    }
    let store = StateStore::new(&config.paths.state_file);
    store
        .initialize(&ProgressRecord::new(file_number, repo_index))
        .context("failed to create the progress record")?;
    ensure_output_dir(&config.paths.output_dir)?;
    harvest_info!(
        "Initialized {:?} at file {} in repository {}",
        store.path(),
        file_number,
        repo_index
    );
    Ok(())
}

/// Human-readable summary of the progress record.
pub fn status(config: &HarvestConfig) -> anyhow::Result<Vec<String>> {
    let store = StateStore::new(&config.paths.state_file);
    let record = store.load()?;
    let rotation = &config.rotation;

    let mut lines = vec![
        format!("state file:       {}", store.path().display()),
        format!("visited articles: {}", record.visited_count()),
        format!("next batch file:  {}", record.current_file_number()),
        format!(
            "repository:       {} ({} of {} files used)",
            rotation.repo_name(record.repo_index()),
            record.current_file_number().saturating_sub(1),
            rotation.max_files_per_repo
        ),
    ];
    match rotation_due(&record, rotation) {
        Some(plan) => lines.push(format!("rotation:         due, next is {}", plan.repo_name)),
        None => lines.push("rotation:         not due".to_string()),
    }
    Ok(lines)
}

/// Rotates immediately, regardless of the file count.
pub async fn rotate(config: &HarvestConfig) -> anyhow::Result<()> {
    let agent = rotation_agent(config).context("rotation is not configured")?;
    let store = StateStore::new(&config.paths.state_file);
    let _lock = store.lock()?;
    let mut record = store.load()?;

    let report = agent.rotate(&store, &mut record).await?;
    if !report.synced {
        harvest_warn!("{} was created but the working tree was not pushed", report.repo_name);
    }
    harvest_info!("Rotated to {}", report.repo_name);
    Ok(())
}
