use anyhow::Context;
use jobsync_core::JobStatus;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reporting sink for the CLI: logs every status and, when configured,
/// mirrors the latest one to a JSON file.
#[derive(Clone, Debug)]
pub struct StatusSink {
    path: Option<PathBuf>,
}

impl StatusSink {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn publish(&self, status: &JobStatus) -> anyhow::Result<()> {
        if status.state.is_finished() {
            info!(state = %status.state, message = %status.message, "job status");
        } else {
            debug!(
                progress = status.progress,
                errors = status.errors.len(),
                message = %status.message,
                "job checkpoint"
            );
        }
        if let Some(path) = &self.path {
            write_status(path, status)?;
        }
        Ok(())
    }
}

fn write_status(path: &Path, status: &JobStatus) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create status directory")?;
    }
    let data = serde_json::to_string_pretty(status).context("serialize job status")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, data).with_context(|| format!("write status {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("replace status {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobsync_core::JobState;
    use tempfile::TempDir;

    fn status(state: JobState) -> JobStatus {
        JobStatus {
            state,
            message: "completed successfully".into(),
            errors: Vec::new(),
            progress: 100.0,
            summary: Vec::new(),
            urls: None,
            started: 1,
            finished: Some(2),
        }
    }

    #[test]
    fn writes_latest_status_to_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out").join("status.json");
        let sink = StatusSink::new(Some(path.clone()));

        sink.publish(&status(JobState::Working)).unwrap();
        sink.publish(&status(JobState::Success)).unwrap();

        let data = fs::read_to_string(&path).unwrap();
        let written: JobStatus = serde_json::from_str(&data).unwrap();
        assert_eq!(written.state, JobState::Success);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn without_path_only_logs() {
        let sink = StatusSink::new(None);
        assert!(sink.publish(&status(JobState::Success)).is_ok());
    }
}
