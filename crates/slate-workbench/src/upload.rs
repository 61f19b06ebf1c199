//! Multi-file upload from the host file system into the VFS.
//!
//! Reads run concurrently on the tokio runtime, bounded by `import.max_concurrency`. Each file
//! becomes one synchronous `create_file` call once its bytes are in memory, so sibling uploads
//! land in completion order. Cancellation is cooperative: the token is checked before each file
//! is read and again before it is written, never in the middle of a read.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use slate_config::ImportConfig;
use slate_vfs::path::{is_within, resolve_relative};
use slate_vfs::{data_uri, is_binary_path, mime_for_path, Vfs, VfsPath};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} is {size} bytes, over the {limit} byte limit")]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("`{0}` does not name a file inside the destination folder")]
    InvalidPath(String),

    #[error("upload cancelled")]
    Cancelled,

    #[error("upload task failed: {0}")]
    Task(String),
}

/// One host file to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadItem {
    /// Path relative to the destination folder; may contain subfolders (`img/logo.png`).
    pub relative_path: String,
    pub source: PathBuf,
}

impl UploadItem {
    pub fn new(relative_path: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            relative_path: relative_path.into(),
            source: source.into(),
        }
    }
}

#[derive(Debug)]
pub struct UploadOutcome {
    pub item: UploadItem,
    pub result: Result<VfsPath, UploadError>,
}

/// Per-item results, in the order the items were given.
#[derive(Debug, Default)]
pub struct UploadReport {
    pub outcomes: Vec<UploadOutcome>,
}

impl UploadReport {
    pub fn created(&self) -> impl Iterator<Item = &VfsPath> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&UploadItem, &UploadError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|err| (&o.item, err)))
    }

    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }
}

#[derive(Debug, Clone)]
pub struct Uploader {
    vfs: Vfs,
    limits: ImportConfig,
    // Serializes the folder-check-then-create step between concurrent uploads.
    commit: Arc<parking_lot::Mutex<()>>,
}

impl Uploader {
    pub fn new(vfs: Vfs, limits: ImportConfig) -> Self {
        Self {
            vfs,
            limits,
            commit: Arc::new(parking_lot::Mutex::new(())),
        }
    }

    /// Uploads `items` below `dest_folder`, creating missing intermediate folders.
    pub async fn upload(
        &self,
        items: Vec<UploadItem>,
        dest_folder: impl AsRef<str>,
        cancel: &CancellationToken,
    ) -> UploadReport {
        let dest = VfsPath::new(dest_folder);
        let permits = Arc::new(Semaphore::new(self.limits.max_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for (idx, item) in items.iter().cloned().enumerate() {
            let uploader = self.clone();
            let dest = dest.clone();
            let permits = permits.clone();
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let result = match permits.acquire_owned().await {
                    Ok(_permit) => uploader.upload_one(&item, &dest, &cancel).await,
                    Err(_) => Err(UploadError::Cancelled),
                };
                (idx, result)
            });
        }

        let mut results: Vec<Option<Result<VfsPath, UploadError>>> =
            items.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, result)) => results[idx] = Some(result),
                Err(err) => {
                    tracing::error!(target: "slate.workbench", error = %err, "upload task panicked");
                }
            }
        }

        let outcomes: Vec<UploadOutcome> = items
            .into_iter()
            .zip(results)
            .map(|(item, result)| UploadOutcome {
                item,
                result: result
                    .unwrap_or_else(|| Err(UploadError::Task("task did not complete".into()))),
            })
            .collect();
        let report = UploadReport { outcomes };
        tracing::info!(
            target: "slate.workbench",
            dest = %dest,
            created = report.created().count(),
            failed = report.failed().count(),
            "upload finished"
        );
        report
    }

    async fn upload_one(
        &self,
        item: &UploadItem,
        dest: &VfsPath,
        cancel: &CancellationToken,
    ) -> Result<VfsPath, UploadError> {
        if cancel.is_cancelled() {
            return Err(UploadError::Cancelled);
        }
        let target = target_path(dest, &item.relative_path)?;

        let io_err = |source| UploadError::Io {
            path: item.source.clone(),
            source,
        };
        let size = tokio::fs::metadata(&item.source).await.map_err(io_err)?.len();
        if size > self.limits.max_file_bytes {
            return Err(UploadError::TooLarge {
                path: item.source.clone(),
                size,
                limit: self.limits.max_file_bytes,
            });
        }
        let bytes = tokio::fs::read(&item.source).await.map_err(io_err)?;
        let content = if is_binary_path(target.as_str()) {
            data_uri::encode(mime_for_path(target.as_str()), &bytes)
        } else {
            match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(err) => {
                    tracing::warn!(
                        target: "slate.workbench",
                        path = %target,
                        "uploaded text file is not valid UTF-8; decoding lossily"
                    );
                    String::from_utf8_lossy(err.as_bytes()).into_owned()
                }
            }
        };

        if cancel.is_cancelled() {
            return Err(UploadError::Cancelled);
        }
        let _commit = self.commit.lock();
        self.ensure_folders(&target.parent());
        self.vfs.create_file(&target, content);
        Ok(target)
    }

    fn ensure_folders(&self, folder: &VfsPath) {
        let mut missing = Vec::new();
        let mut current = folder.clone();
        while !current.is_root() && !self.vfs.folder_exists(&current) {
            let parent = current.parent();
            missing.push(current);
            current = parent;
        }
        for folder in missing.into_iter().rev() {
            self.vfs.create_folder(&folder);
        }
    }
}

fn target_path(dest: &VfsPath, relative: &str) -> Result<VfsPath, UploadError> {
    let relative_trimmed = relative.trim_start_matches(['/', '\\']);
    if relative_trimmed.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(UploadError::InvalidPath(relative.to_owned()));
    }
    let resolved = resolve_relative(dest.as_str(), relative_trimmed);
    if !is_within(&resolved, dest.as_str()) {
        return Err(UploadError::InvalidPath(relative.to_owned()));
    }
    Ok(VfsPath::new(resolved))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_stay_inside_destination() {
        let dest = VfsPath::new("/assets");
        assert_eq!(
            target_path(&dest, "img/logo.png").unwrap().as_str(),
            "/assets/img/logo.png"
        );
        assert_eq!(
            target_path(&dest, "/abs.txt").unwrap().as_str(),
            "/assets/abs.txt"
        );
        assert!(matches!(
            target_path(&dest, "../escape.txt"),
            Err(UploadError::InvalidPath(_))
        ));
        assert!(matches!(
            target_path(&VfsPath::root(), "a/../../b.txt"),
            Err(UploadError::InvalidPath(_))
        ));
        assert!(matches!(
            target_path(&dest, ""),
            Err(UploadError::InvalidPath(_))
        ));
    }

    #[test]
    fn missing_folders_are_created_parent_first() {
        let vfs = Vfs::empty();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = seen.clone();
        vfs.watch(move |event| {
            if let Some(path) = event.path() {
                sink.lock().push(path.to_string());
            }
        });
        vfs.create_folder("/a");
        let uploader = Uploader::new(vfs.clone(), ImportConfig::default());

        uploader.ensure_folders(&VfsPath::new("/a/b/c"));

        assert_eq!(*seen.lock(), vec!["/a", "/a/b", "/a/b/c"]);
    }
}
