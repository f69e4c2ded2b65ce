use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// On-disk shape of the progress record. Field order is the file's key order.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RecordFile {
    visited_articles: Vec<String>,
    current_file_number: u64,
    repo_index: u64,
}

/// Persisted cursor: visited articles plus the file and repository counters.
///
/// `visited` keeps insertion order for storage while `seen` answers membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RecordFile", into = "RecordFile")]
pub struct ProgressRecord {
    visited: Vec<String>,
    seen: HashSet<String>,
    current_file_number: u64,
    repo_index: u64,
}

impl ProgressRecord {
    pub fn new(current_file_number: u64, repo_index: u64) -> Self {
        Self {
            visited: Vec::new(),
            seen: HashSet::new(),
            current_file_number,
            repo_index,
        }
    }

    /// Builder-style helper that marks every url as visited, in order.
    pub fn with_visited<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for url in urls {
            self.mark_visited(url);
        }
        self
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    /// Appends `url` to the visited list. Returns `false` if it was already there.
    pub fn mark_visited(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        if !self.seen.insert(url.clone()) {
            return false;
        }
        self.visited.push(url);
        true
    }

    pub fn visited(&self) -> &[String] {
        &self.visited
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn current_file_number(&self) -> u64 {
        self.current_file_number
    }

    pub fn repo_index(&self) -> u64 {
        self.repo_index
    }

    /// Called once per batch file written.
    pub fn advance_file_number(&mut self) {
        self.current_file_number += 1;
    }

    /// The storage unit is full once the next file number passes the limit.
    pub fn exceeds_file_limit(&self, max_files_per_repo: u64) -> bool {
        self.current_file_number > max_files_per_repo
    }

    /// Switches to a new storage unit and restarts file numbering at 1.
    pub fn apply_rotation(&mut self, new_repo_index: u64) {
        self.repo_index = new_repo_index;
        self.current_file_number = 1;
    }
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl From<RecordFile> for ProgressRecord {
    fn from(file: RecordFile) -> Self {
        ProgressRecord::new(file.current_file_number, file.repo_index)
            .with_visited(file.visited_articles)
    }
}

impl From<ProgressRecord> for RecordFile {
    fn from(record: ProgressRecord) -> Self {
        RecordFile {
            visited_articles: record.visited,
            current_file_number: record.current_file_number,
            repo_index: record.repo_index,
        }
    }
}
