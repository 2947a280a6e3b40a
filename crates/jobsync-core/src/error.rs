use thiserror::Error;

/// Failure attached to a single resource operation.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error(transparent)]
    Generic(#[from] anyhow::Error),
    #[error("failed to create folder {folder_path}: {source}")]
    FolderCreation {
        folder_path: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ResourceError {
    pub fn folder_creation(folder_path: impl Into<String>, source: anyhow::Error) -> Self {
        ResourceError::FolderCreation {
            folder_path: folder_path.into(),
            source,
        }
    }

    pub fn folder_path(&self) -> Option<&str> {
        match self {
            ResourceError::FolderCreation { folder_path, .. } => Some(folder_path),
            ResourceError::Generic(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("job progress already completed")]
    AlreadyCompleted,
    #[error("too many errors: {count} (limit {limit})")]
    TooManyErrors { count: usize, limit: usize },
    #[error("report job status")]
    Report(#[source] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn folder_creation_exposes_folder_path() {
        let err = ResourceError::folder_creation("folder1/", anyhow!("permission denied"));
        assert_eq!(err.folder_path(), Some("folder1/"));
        assert_eq!(
            err.to_string(),
            "failed to create folder folder1/: permission denied"
        );
    }

    #[test]
    fn generic_error_has_no_folder_path() {
        let err = ResourceError::from(anyhow!("conflict"));
        assert_eq!(err.folder_path(), None);
        assert_eq!(err.to_string(), "conflict");
    }
}
