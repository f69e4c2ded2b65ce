//! Harvest engine: fetching, cleaning, persistence, and the cycle/rotation workflow.
mod clean;
mod cycle;
mod fetch;
mod hosting;
mod output;
mod persist;
mod rotation;
mod state_store;
mod sync;
mod types;

pub use clean::{TextCleaner, WikiTextCleaner};
pub use cycle::{CollectionCycle, CycleError, CycleReport, RotationStatus};
pub use fetch::{ArticleSource, FetchSettings, Fetcher, RandomArticleSource, ReqwestFetcher};
pub use hosting::{
    CreatedRepository, Credentials, GithubHost, HostError, RepoHost, ACCOUNT_ENV, TOKEN_ENV,
};
pub use output::{read_batch, write_batch, OutputError};
pub use persist::{ensure_output_dir, write_atomically, AtomicFileWriter, PersistError};
pub use rotation::{RotationAgent, RotationError, RotationReport};
pub use state_store::{StateError, StateLock, StateStore};
pub use sync::{GitCli, RepoSync, RepoSyncError};
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput};
