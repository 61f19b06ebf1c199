use crate::path::VfsPath;

/// Errors produced while exporting or importing a project.
///
/// Import never leaves the VFS partially replaced: every variant is raised before the swap.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("malformed archive: {message}")]
    Malformed { message: String },

    #[error("malformed legacy project json: {0}")]
    LegacyJson(#[from] serde_json::Error),

    #[error("payload is neither a zip archive nor a legacy json project")]
    UnrecognizedPayload,

    #[error("archive task failed: {0}")]
    Task(String),
}

impl ArchiveError {
    pub(crate) fn malformed(err: impl std::fmt::Display) -> Self {
        // `{:#}` renders an anyhow context chain on one line.
        ArchiveError::Malformed {
            message: format!("{err:#}"),
        }
    }
}

/// Errors produced by the move primitives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("nothing to move at {0}")]
    NotFound(VfsPath),

    #[error("cannot move {source_path} into its own subtree {destination}")]
    IntoDescendant {
        source_path: VfsPath,
        destination: VfsPath,
    },
}
