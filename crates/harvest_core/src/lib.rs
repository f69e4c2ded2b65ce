//! Harvest core: progress record, batches, quotas and rotation decisions. No I/O.
mod batch;
mod config;
mod quota;
mod record;
mod rotation;

pub use batch::{batch_filename, parse_jsonl, Batch, EmptyContent, Entry, FILE_NUMBER_WIDTH};
pub use config::{
    ConfigError, CycleSettings, FetchConfig, HarvestConfig, PathSettings, RotationSettings,
};
pub use quota::{ByteBudget, CycleQuota, QuotaStatus};
pub use record::ProgressRecord;
pub use rotation::{rotation_due, RotationPlan};
