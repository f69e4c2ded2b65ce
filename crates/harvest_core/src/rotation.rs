use crate::{ProgressRecord, RotationSettings};

/// What a rotation would do, computed from the current record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPlan {
    pub new_index: u64,
    pub repo_name: String,
}

impl RotationPlan {
    pub fn next(record: &ProgressRecord, settings: &RotationSettings) -> Self {
        let new_index = record.repo_index() + 1;
        Self {
            new_index,
            repo_name: settings.repo_name(new_index),
        }
    }
}

/// Rotation is due when the record has moved past the per-repo file limit.
pub fn rotation_due(record: &ProgressRecord, settings: &RotationSettings) -> Option<RotationPlan> {
    record
        .exceeds_file_limit(settings.max_files_per_repo)
        .then(|| RotationPlan::next(record, settings))
}
