use crate::error::{ProgressError, ResourceError};
use crate::model::{FileAction, JobResourceResult, RepositoryUrls};
use crate::progress::JobProgressRecorder;
use crate::progress_paths::{depth, is_folder};
use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{info, warn};

/// A recorded set of operations and their outcomes, replayed against a
/// recorder the way a sync pass would apply them.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReplayPlan {
    #[serde(default)]
    pub ref_urls: Option<RepositoryUrls>,
    pub operations: Vec<PlannedOperation>,
}

impl ReplayPlan {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("read replay plan {}", path.display()))?;
        let plan = serde_json::from_str(&data).context("parse replay plan")?;
        Ok(plan)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlannedOperation {
    pub path: String,
    pub action: FileAction,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Failure message; absent means the operation succeeded.
    #[serde(default)]
    pub error: Option<String>,
    /// Set when the failure was the creation of this ancestor folder.
    #[serde(default)]
    pub folder_path: Option<String>,
}

impl PlannedOperation {
    fn into_result(self) -> JobResourceResult {
        let error = match (self.folder_path, self.error) {
            (Some(folder), message) => Some(ResourceError::folder_creation(
                folder,
                anyhow!(message.unwrap_or_else(|| "folder creation failed".to_string())),
            )),
            (None, Some(message)) => Some(ResourceError::Generic(anyhow!(message))),
            (None, None) => None,
        };
        JobResourceResult {
            path: self.path,
            action: self.action,
            group: self.group,
            kind: self.kind,
            name: self.name,
            error,
        }
    }

    fn suppressed(self, reason: &str) -> JobResourceResult {
        let mut result = JobResourceResult::new(self.path, FileAction::Ignored)
            .with_error(anyhow!(reason.to_string()));
        result.group = self.group;
        result.kind = self.kind;
        result.name = self.name;
        result
    }
}

#[derive(Debug, Default)]
pub struct ReplayReport {
    pub dispatched: usize,
    pub suppressed: usize,
    pub skipped: usize,
    pub checkpoint_failures: usize,
    /// Set when dispatch stopped early; pass it on to `complete`.
    pub error: Option<anyhow::Error>,
}

#[derive(Default)]
struct ReplayCounters {
    dispatched: AtomicUsize,
    suppressed: AtomicUsize,
    skipped: AtomicUsize,
    checkpoint_failures: AtomicUsize,
    stopped: AtomicBool,
}

const SKIPPED_UNDER_FAILED_FOLDER: &str = "skipped: parent folder could not be created";
const FOLDER_NOT_EMPTY: &str = "skipped: resources under this folder failed to delete";

/// Replays `plan` in three phases: folder creations shallowest first, file
/// operations spread over `workers` threads, then folder deletions deepest
/// first.
pub fn run_plan(
    recorder: &JobProgressRecorder,
    plan: ReplayPlan,
    workers: usize,
) -> ReplayReport {
    let total = plan.operations.len();
    recorder.set_ref_urls(plan.ref_urls);
    recorder.set_total(total);
    recorder.set_message(format!("replaying {total} operations"));
    info!(job_id = %recorder.job_id(), total, workers, "starting replay");

    let (mut folder_creations, files, mut folder_deletions) = partition(plan.operations);
    let counters = ReplayCounters::default();

    folder_creations.sort_by(|a, b| {
        depth(&a.path)
            .cmp(&depth(&b.path))
            .then_with(|| a.path.cmp(&b.path))
    });
    for op in folder_creations {
        if !dispatch_allowed(recorder, &counters) {
            counters.skipped.fetch_add(1, Ordering::Relaxed);
            continue;
        }
        counters.dispatched.fetch_add(1, Ordering::Relaxed);
        if recorder.is_nested_under_failed_creation(&op.path) {
            counters.suppressed.fetch_add(1, Ordering::Relaxed);
            recorder.record(op.suppressed(SKIPPED_UNDER_FAILED_FOLDER));
        } else {
            recorder.record(op.into_result());
        }
        checkpoint(recorder, &counters);
    }

    if workers <= 1 {
        for op in files {
            apply_file_operation(recorder, &counters, op);
        }
    } else {
        run_files_parallel(recorder, &counters, files, workers);
    }

    folder_deletions.sort_by(|a, b| {
        depth(&b.path)
            .cmp(&depth(&a.path))
            .then_with(|| a.path.cmp(&b.path))
    });
    for op in folder_deletions {
        if !dispatch_allowed(recorder, &counters) {
            counters.skipped.fetch_add(1, Ordering::Relaxed);
            continue;
        }
        counters.dispatched.fetch_add(1, Ordering::Relaxed);
        if recorder.has_failed_deletions_under(&op.path) {
            counters.suppressed.fetch_add(1, Ordering::Relaxed);
            info!(path = %op.path, "keeping folder with failed deletions beneath it");
            recorder.record(op.suppressed(FOLDER_NOT_EMPTY));
        } else {
            recorder.record(op.into_result());
        }
        checkpoint(recorder, &counters);
    }

    let error = recorder.too_many_errors().err().map(anyhow::Error::new);
    let report = ReplayReport {
        dispatched: counters.dispatched.into_inner(),
        suppressed: counters.suppressed.into_inner(),
        skipped: counters.skipped.into_inner(),
        checkpoint_failures: counters.checkpoint_failures.into_inner(),
        error,
    };
    info!(
        job_id = %recorder.job_id(),
        dispatched = report.dispatched,
        suppressed = report.suppressed,
        skipped = report.skipped,
        "replay finished"
    );
    report
}

fn partition(
    operations: Vec<PlannedOperation>,
) -> (Vec<PlannedOperation>, Vec<PlannedOperation>, Vec<PlannedOperation>) {
    let mut folder_creations = Vec::new();
    let mut files = Vec::new();
    let mut folder_deletions = Vec::new();
    for op in operations {
        match op.action {
            FileAction::Created if is_folder(&op.path) => folder_creations.push(op),
            FileAction::Deleted if is_folder(&op.path) => folder_deletions.push(op),
            _ => files.push(op),
        }
    }
    (folder_creations, files, folder_deletions)
}

fn run_files_parallel(
    recorder: &JobProgressRecorder,
    counters: &ReplayCounters,
    files: Vec<PlannedOperation>,
    workers: usize,
) {
    let mut files = files;
    files.reverse();
    let queue = Mutex::new(files);
    std::thread::scope(|scope| {
        for _ in 0..workers {
            let queue = &queue;
            scope.spawn(move || {
                loop {
                    let next = {
                        let mut guard = queue
                            .lock()
                            .unwrap_or_else(std::sync::PoisonError::into_inner);
                        guard.pop()
                    };
                    let Some(op) = next else {
                        break;
                    };
                    apply_file_operation(recorder, counters, op);
                }
            });
        }
    });
}

fn apply_file_operation(
    recorder: &JobProgressRecorder,
    counters: &ReplayCounters,
    op: PlannedOperation,
) {
    if !dispatch_allowed(recorder, counters) {
        counters.skipped.fetch_add(1, Ordering::Relaxed);
        return;
    }
    counters.dispatched.fetch_add(1, Ordering::Relaxed);
    if op.action != FileAction::Deleted && recorder.is_nested_under_failed_creation(&op.path) {
        counters.suppressed.fetch_add(1, Ordering::Relaxed);
        recorder.record(op.suppressed(SKIPPED_UNDER_FAILED_FOLDER));
    } else {
        recorder.record(op.into_result());
    }
    checkpoint(recorder, counters);
}

fn dispatch_allowed(recorder: &JobProgressRecorder, counters: &ReplayCounters) -> bool {
    if counters.stopped.load(Ordering::Acquire) {
        return false;
    }
    match recorder.too_many_errors() {
        Ok(()) => true,
        Err(err) => {
            if !counters.stopped.swap(true, Ordering::AcqRel) {
                warn!(job_id = %recorder.job_id(), error = %err, "stopping replay");
            }
            false
        }
    }
}

fn checkpoint(recorder: &JobProgressRecorder, counters: &ReplayCounters) {
    match recorder.maybe_checkpoint() {
        Ok(_) => {}
        Err(ProgressError::Report(err)) => {
            counters.checkpoint_failures.fetch_add(1, Ordering::Relaxed);
            warn!(job_id = %recorder.job_id(), error = %format!("{err:#}"), "checkpoint failed");
        }
        Err(err) => {
            warn!(job_id = %recorder.job_id(), error = %err, "checkpoint skipped");
        }
    }
}
