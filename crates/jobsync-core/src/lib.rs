pub mod config;
pub mod error;
pub mod model;
pub mod progress;
mod progress_paths;
mod progress_summary;
pub mod replay;

pub use error::{ProgressError, ResourceError};
pub use model::{FileAction, JobResourceResult, JobState, JobStatus, RepositoryUrls};
pub use progress::{JobProgressRecorder, ProgressFn};
