use crate::error::ResourceError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileAction {
    Created,
    Updated,
    Deleted,
    Renamed,
    Ignored,
}

impl FileAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileAction::Created => "created",
            FileAction::Updated => "updated",
            FileAction::Deleted => "deleted",
            FileAction::Renamed => "renamed",
            FileAction::Ignored => "ignored",
        }
    }
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one resource-level operation, fed to
/// [`JobProgressRecorder::record`](crate::progress::JobProgressRecorder::record).
#[derive(Debug)]
pub struct JobResourceResult {
    pub path: String,
    pub action: FileAction,
    pub group: Option<String>,
    pub kind: Option<String>,
    pub name: Option<String>,
    pub error: Option<ResourceError>,
}

impl JobResourceResult {
    pub fn new(path: impl Into<String>, action: FileAction) -> Self {
        Self {
            path: path.into(),
            action,
            group: None,
            kind: None,
            name: None,
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<ResourceError>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_resource(
        mut self,
        group: impl Into<String>,
        kind: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.group = Some(group.into());
        self.kind = Some(kind.into());
        self.name = Some(name.into());
        self
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RepositoryUrls {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub compare_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub new_pull_request_url: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Working,
    Success,
    Error,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Working => "working",
            JobState::Success => "success",
            JobState::Error => "error",
        }
    }

    pub fn is_finished(&self) -> bool {
        !matches!(self, JobState::Working)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters for one `(group, kind)` pair.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct JobResourceSummary {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    pub create: u32,
    pub update: u32,
    pub delete: u32,
    pub rename: u32,
    pub error: u32,
}

/// Snapshot of a job, either in flight (`Working`) or terminal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub state: JobState,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    pub progress: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub summary: Vec<JobResourceSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<RepositoryUrls>,
    pub started: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn file_action_serializes_lowercase() {
        let json = serde_json::to_string(&FileAction::Ignored).unwrap();
        assert_eq!(json, "\"ignored\"");
        let action: FileAction = serde_json::from_str("\"deleted\"").unwrap();
        assert_eq!(action, FileAction::Deleted);
    }

    #[test]
    fn status_omits_absent_urls() {
        let status = JobStatus {
            state: JobState::Success,
            message: "completed successfully".into(),
            errors: Vec::new(),
            progress: 100.0,
            summary: Vec::new(),
            urls: None,
            started: 1,
            finished: Some(2),
        };
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["state"], "success");
        assert!(value.get("urls").is_none());
        assert!(value.get("errors").is_none());
    }

    #[test]
    fn result_builder_sets_resource_and_error() {
        let result = JobResourceResult::new("dashboards/a.json", FileAction::Created)
            .with_resource("dashboards", "Dashboard", "a")
            .with_error(anyhow!("boom"));
        assert_eq!(result.kind.as_deref(), Some("Dashboard"));
        assert!(matches!(result.error, Some(ResourceError::Generic(_))));
    }
}
