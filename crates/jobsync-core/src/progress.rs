use crate::config::RecorderOptions;
use crate::error::{ProgressError, ResourceError};
use crate::model::{FileAction, JobResourceResult, JobState, JobStatus, RepositoryUrls};
use crate::progress_paths::{any_under, is_under_any};
use crate::progress_summary::SummaryTable;
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;
use time::OffsetDateTime;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Sink that receives every published status, checkpoints and the final one.
pub type ProgressFn = dyn Fn(&JobStatus) -> anyhow::Result<()> + Send + Sync;

const COMPLETED_SUCCESSFULLY: &str = "completed successfully";

enum Lifecycle {
    Open,
    Completed(JobStatus),
}

struct RecorderState {
    lifecycle: Lifecycle,
    total: usize,
    result_count: usize,
    error_count: usize,
    errors: Vec<String>,
    failed_creations: BTreeSet<String>,
    failed_deletions: BTreeSet<String>,
    summaries: SummaryTable,
    ref_urls: Option<RepositoryUrls>,
    message: String,
    final_message: String,
}

impl RecorderState {
    fn new() -> Self {
        Self {
            lifecycle: Lifecycle::Open,
            total: 0,
            result_count: 0,
            error_count: 0,
            errors: Vec::new(),
            failed_creations: BTreeSet::new(),
            failed_deletions: BTreeSet::new(),
            summaries: SummaryTable::default(),
            ref_urls: None,
            message: String::new(),
            final_message: String::new(),
        }
    }

    fn is_open(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Open)
    }

    fn progress(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let ratio = self.result_count as f64 / self.total as f64;
        (ratio * 100.0).min(100.0)
    }
}

/// Thread-safe accumulator for the outcome of every resource operation in one
/// job run.
///
/// Workers call [`record`](Self::record) concurrently; the driver calls
/// [`complete`](Self::complete) once at the end to freeze and publish the
/// terminal [`JobStatus`]. The sink is never invoked while the state lock is
/// held, so a sink may query the recorder. Publishes are serialized, and a
/// checkpoint never reaches the sink after the final status; a sink must not
/// publish through the same recorder.
pub struct JobProgressRecorder {
    job_id: Uuid,
    started: OffsetDateTime,
    options: RecorderOptions,
    report: Box<ProgressFn>,
    last_checkpoint: Mutex<Option<Instant>>,
    publish: Mutex<()>,
    state: RwLock<RecorderState>,
}

impl JobProgressRecorder {
    pub fn new<F>(report: F) -> Self
    where
        F: Fn(&JobStatus) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::with_options(report, RecorderOptions::default())
    }

    pub fn with_options<F>(report: F, options: RecorderOptions) -> Self
    where
        F: Fn(&JobStatus) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            job_id: Uuid::new_v4(),
            started: OffsetDateTime::now_utc(),
            options,
            report: Box::new(report),
            last_checkpoint: Mutex::new(None),
            publish: Mutex::new(()),
            state: RwLock::new(RecorderState::new()),
        }
    }

    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    pub fn options(&self) -> &RecorderOptions {
        &self.options
    }

    /// Classifies one operation outcome.
    ///
    /// Ignored actions leave the recorder untouched even when they carry an
    /// error. Folder creation failures register their folder, failed deletes
    /// register their exact path, and every other error only counts.
    pub fn record(&self, result: JobResourceResult) {
        let mut state = self.write();
        if !state.is_open() {
            warn!(
                job_id = %self.job_id,
                path = %result.path,
                "record after job completed; ignoring"
            );
            return;
        }

        if result.action == FileAction::Ignored {
            if let Some(error) = &result.error {
                debug!(path = %result.path, error = %error, "ignored resource carried an error");
            }
            return;
        }

        state.result_count += 1;
        state.summaries.record(&result);

        let Some(error) = &result.error else {
            return;
        };
        match error {
            ResourceError::FolderCreation { folder_path, .. } => {
                state.failed_creations.insert(folder_path.clone());
            }
            ResourceError::Generic(_) if result.action == FileAction::Deleted => {
                state.failed_deletions.insert(result.path.clone());
            }
            ResourceError::Generic(_) => {}
        }
        state.error_count += 1;
        if state.errors.len() < self.options.max_error_messages {
            let line = format!("{} ({}): {error}", result.path, result.action);
            state.errors.push(line);
        }
        warn!(
            job_id = %self.job_id,
            path = %result.path,
            action = %result.action,
            folder = ?error.folder_path(),
            error = %error,
            "resource operation failed"
        );
    }

    /// Replaces the reference links; `None` clears them.
    pub fn set_ref_urls(&self, urls: Option<RepositoryUrls>) {
        let mut state = self.write();
        if !state.is_open() {
            warn!(job_id = %self.job_id, "set ref urls after job completed; ignoring");
            return;
        }
        state.ref_urls = urls;
    }

    pub fn set_total(&self, total: usize) {
        let mut state = self.write();
        if !state.is_open() {
            warn!(job_id = %self.job_id, "set total after job completed; ignoring");
            return;
        }
        state.total = total;
    }

    pub fn set_message(&self, message: impl Into<String>) {
        let mut state = self.write();
        if !state.is_open() {
            warn!(job_id = %self.job_id, "set message after job completed; ignoring");
            return;
        }
        state.message = message.into();
    }

    /// Message used instead of the default one when the job succeeds.
    pub fn set_final_message(&self, message: impl Into<String>) {
        let mut state = self.write();
        if !state.is_open() {
            warn!(job_id = %self.job_id, "set final message after job completed; ignoring");
            return;
        }
        state.final_message = message.into();
    }

    /// True if `path` equals or lies beneath a folder that failed to be created.
    pub fn is_nested_under_failed_creation(&self, path: &str) -> bool {
        is_under_any(&self.read().failed_creations, path)
    }

    /// True if any failed deletion lies at or beneath `path`.
    pub fn has_failed_deletions_under(&self, path: &str) -> bool {
        any_under(&self.read().failed_deletions, path)
    }

    /// Drops failure accounting and progress for a fresh pass. Reference links,
    /// messages and the job id survive.
    pub fn reset_results(&self) {
        let mut state = self.write();
        if !state.is_open() {
            warn!(job_id = %self.job_id, "reset after job completed; ignoring");
            return;
        }
        state.result_count = 0;
        state.error_count = 0;
        state.errors.clear();
        state.failed_creations.clear();
        state.failed_deletions.clear();
        state.summaries.clear();
        debug!(job_id = %self.job_id, "job results reset");
    }

    pub fn error_count(&self) -> usize {
        self.read().error_count
    }

    pub fn is_completed(&self) -> bool {
        !self.read().is_open()
    }

    /// Fails once the error count exceeds the configured strict budget.
    pub fn too_many_errors(&self) -> Result<(), ProgressError> {
        let limit = self.options.strict_max_errors;
        if limit == 0 {
            return Ok(());
        }
        let count = self.read().error_count;
        if count > limit {
            return Err(ProgressError::TooManyErrors { count, limit });
        }
        Ok(())
    }

    /// Current status: `Working` while open, the frozen final status after.
    pub fn snapshot(&self) -> JobStatus {
        let state = self.read();
        match &state.lifecycle {
            Lifecycle::Completed(status) => status.clone(),
            Lifecycle::Open => self.working_status(&state),
        }
    }

    pub fn final_status(&self) -> Option<JobStatus> {
        match &self.read().lifecycle {
            Lifecycle::Completed(status) => Some(status.clone()),
            Lifecycle::Open => None,
        }
    }

    /// Publishes the current snapshot through the sink.
    pub fn checkpoint(&self) -> Result<(), ProgressError> {
        let _publish = self.publish_guard();
        let status = {
            let state = self.read();
            if !state.is_open() {
                return Err(ProgressError::AlreadyCompleted);
            }
            self.working_status(&state)
        };
        *self
            .last_checkpoint
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
        (self.report)(&status).map_err(ProgressError::Report)
    }

    /// Like [`checkpoint`](Self::checkpoint) but skipped until the configured
    /// interval has elapsed since the previous push. Returns whether a
    /// snapshot was published.
    pub fn maybe_checkpoint(&self) -> Result<bool, ProgressError> {
        {
            let mut last = self
                .last_checkpoint
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let due = last.is_none_or(|at| at.elapsed() >= self.options.checkpoint_interval());
            if !due {
                return Ok(false);
            }
            *last = Some(Instant::now());
        }
        let _publish = self.publish_guard();
        let status = {
            let state = self.read();
            if !state.is_open() {
                return Err(ProgressError::AlreadyCompleted);
            }
            self.working_status(&state)
        };
        (self.report)(&status).map_err(ProgressError::Report)?;
        Ok(true)
    }

    /// Freezes the recorder and publishes the terminal status.
    ///
    /// A second call returns [`ProgressError::AlreadyCompleted`] without
    /// touching the sink. A sink failure is returned as
    /// [`ProgressError::Report`]; the recorder is completed regardless and
    /// the status stays available through [`final_status`](Self::final_status).
    pub fn complete(&self, err: Option<&anyhow::Error>) -> Result<JobStatus, ProgressError> {
        let _publish = self.publish_guard();
        let status = {
            let mut state = self.write();
            if !state.is_open() {
                return Err(ProgressError::AlreadyCompleted);
            }
            let mut status = self.working_status(&state);
            status.progress = 100.0;
            status.finished = Some(unix_millis(OffsetDateTime::now_utc()));
            if let Some(err) = err {
                status.state = JobState::Error;
                status.message = format!("{err:#}");
            } else if state.error_count > 0 {
                status.state = JobState::Error;
                status.message = completed_with_errors(state.error_count);
            } else {
                status.state = JobState::Success;
                status.message = if state.final_message.is_empty() {
                    COMPLETED_SUCCESSFULLY.to_string()
                } else {
                    state.final_message.clone()
                };
            }
            state.lifecycle = Lifecycle::Completed(status.clone());
            status
        };

        info!(
            job_id = %self.job_id,
            state = %status.state,
            errors = status.errors.len(),
            message = %status.message,
            "job completed"
        );
        (self.report)(&status).map_err(ProgressError::Report)?;
        Ok(status)
    }

    fn working_status(&self, state: &RecorderState) -> JobStatus {
        JobStatus {
            state: JobState::Working,
            message: state.message.clone(),
            errors: state.errors.clone(),
            progress: state.progress(),
            summary: state.summaries.snapshot(),
            urls: state.ref_urls.clone(),
            started: unix_millis(self.started),
            finished: None,
        }
    }

    fn publish_guard(&self) -> MutexGuard<'_, ()> {
        self.publish.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self) -> RwLockReadGuard<'_, RecorderState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RecorderState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn completed_with_errors(count: usize) -> String {
    if count == 1 {
        "completed with 1 error".to_string()
    } else {
        format!("completed with {count} errors")
    }
}

fn unix_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}
