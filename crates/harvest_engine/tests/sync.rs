mod common;

use std::fs;
use std::sync::Arc;

use common::*;
use harvest_core::{ProgressRecord, RotationSettings};
use harvest_engine::{GitCli, RepoSync, RepoSyncError, RotationAgent, RotationStatus};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

struct Repos {
    _temp: TempDir,
    work: std::path::PathBuf,
    remote: std::path::PathBuf,
}

fn repos() -> Repos {
    let temp = TempDir::new().unwrap();
    let work = temp.path().join("work");
    let remote = temp.path().join("remote.git");
    fs::create_dir_all(&work).unwrap();
    fs::create_dir_all(&remote).unwrap();
    init_work_repo(&work);
    init_bare_remote(&remote);
    Repos {
        _temp: temp,
        work,
        remote,
    }
}

#[tokio::test]
async fn missing_git_binary_is_a_spawn_error() {
    let temp = TempDir::new().unwrap();
    let git = GitCli::new(temp.path(), "origin", "main")
        .with_program(temp.path().join("no-such-git"));

    let err = git
        .set_remote("https://example.test/repo.git")
        .await
        .unwrap_err();
    assert!(matches!(err, RepoSyncError::Spawn { .. }));
}

#[cfg(unix)]
#[tokio::test]
async fn failing_step_stops_the_push() {
    let temp = TempDir::new().unwrap();
    let git = GitCli::new(temp.path(), "origin", "main").with_program("false");

    let err = git.commit_and_push("Auto: Repo Rotation").await.unwrap_err();
    match err {
        RepoSyncError::Step { step, .. } => assert_eq!(step, "add"),
        other => panic!("expected a failed step, got {other:?}"),
    }
}

#[tokio::test]
async fn set_remote_redirects_origin() {
    if !git_available() {
        return;
    }
    let repos = repos();
    let git = GitCli::new(&repos.work, "origin", "main");
    let url = repos.remote.display().to_string();

    git.set_remote(&url).await.unwrap();

    assert_eq!(common::git(&repos.work, &["remote", "get-url", "origin"]), url);
}

#[tokio::test]
async fn dirty_tree_is_committed_and_pushed_without_lock_files() {
    if !git_available() {
        return;
    }
    let repos = repos();
    fs::create_dir_all(repos.work.join("scraper/scraped_data")).unwrap();
    fs::write(
        repos.work.join("scraper/scraped_data/scrape_00001.jsonl"),
        "{}\n",
    )
    .unwrap();
    fs::write(repos.work.join("scraper/state.json"), "{}").unwrap();
    fs::write(repos.work.join("scraper/state.json.lock"), "1234\n").unwrap();
    let git = GitCli::new(&repos.work, "origin", "main");
    git.set_remote(&repos.remote.display().to_string())
        .await
        .unwrap();

    git.commit_and_push("Auto: Repo Rotation").await.unwrap();

    assert_eq!(
        pushed_files(&repos.remote),
        vec![
            "scraper/scraped_data/scrape_00001.jsonl".to_string(),
            "scraper/state.json".to_string(),
        ]
    );
    assert_eq!(
        common::git(&repos.remote, &["log", "-1", "--format=%s", "main"]),
        "Auto: Repo Rotation"
    );
}

#[tokio::test]
async fn clean_tree_pushes_without_a_new_commit() {
    if !git_available() {
        return;
    }
    let repos = repos();
    fs::write(repos.work.join("scrape_00001.jsonl"), "{}\n").unwrap();
    let git = GitCli::new(&repos.work, "origin", "main");
    git.set_remote(&repos.remote.display().to_string())
        .await
        .unwrap();
    git.commit_and_push("first").await.unwrap();

    // Only an untracked lock file changed since the last push.
    fs::write(repos.work.join("state.json.lock"), "1\n").unwrap();
    git.commit_and_push("second").await.unwrap();

    assert_eq!(commit_count(&repos.remote), 1);
    assert_eq!(commit_count(&repos.work), 1);
}

#[tokio::test]
async fn rotation_pushes_batches_but_not_the_held_state_lock() {
    if !git_available() {
        return;
    }
    init_logging();
    let repos = repos();
    let article = "https://en.wikipedia.org/wiki/Alpha";
    let store = store_with(&repos.work, ProgressRecord::new(25_000, 2));
    let host = Arc::new(LocalHost::new(&repos.remote));
    let sync = Arc::new(GitCli::new(&repos.work, "origin", "main"));
    let agent = RotationAgent::new(host.clone(), sync, RotationSettings::default());
    let cycle = build_cycle(
        cycle_settings(1),
        &repos.work,
        &store,
        ScriptedSource::new([article]),
        Arc::new(PageFetcher::default().with_page(article, "Alpha")),
    )
    .with_rotation(agent);

    let report = cycle.run().await.unwrap();

    match report.rotation {
        RotationStatus::Rotated(rotated) => assert!(rotated.synced),
        other => panic!("expected rotation, got {other:?}"),
    }
    assert_eq!(host.created(), vec!["wikiscraper-003".to_string()]);
    assert_eq!(
        pushed_files(&repos.remote),
        vec!["out/scrape_25000.jsonl".to_string(), "state.json".to_string()]
    );

    // A fresh run from the same tree is not blocked by the leftover lock file.
    assert!(store.lock().is_ok());
}
