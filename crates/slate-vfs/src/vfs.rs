use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use slate_archive::Archive;
use time::OffsetDateTime;

use crate::archive::{self, ImportSummary, ProjectFormat, ProjectSnapshot};
use crate::change::VfsEvent;
use crate::classify::is_binary_path;
use crate::entry::{File, Folder};
use crate::error::ArchiveError;
use crate::legacy;
use crate::notifier::{lock_recovering, ChangeNotifier, Subscription, SubscriptionId};
use crate::path::VfsPath;
use crate::seed::DEFAULT_PROJECT;
use crate::tree::{project_tree, NodeKind, TreeNode};

#[derive(Debug, Default)]
pub(crate) struct VfsState {
    pub(crate) files: HashMap<VfsPath, File>,
    pub(crate) folders: HashMap<VfsPath, Folder>,
}

/// A direct child returned by [`Vfs::list_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: NodeKind,
    pub path: VfsPath,
}

/// The in-memory project file system.
///
/// Files and folders live in two maps keyed by canonical path; hierarchy is always derived from
/// path prefixes. Every mutation releases the state lock before notifying subscribers, so a
/// subscriber may call back into the VFS (including mutators) without deadlocking.
///
/// `Vfs` is a cheap handle: clones share the same state and subscribers.
#[derive(Debug, Clone)]
pub struct Vfs {
    pub(crate) state: Arc<Mutex<VfsState>>,
    pub(crate) notifier: ChangeNotifier,
}

impl Default for Vfs {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

impl Vfs {
    /// Creates a VFS seeded with the default starter project.
    pub fn new() -> Self {
        let vfs = Self::empty();
        vfs.load_default_project();
        vfs
    }

    /// Creates a VFS with no files and no folders.
    pub fn empty() -> Self {
        Self {
            state: Arc::new(Mutex::new(VfsState::default())),
            notifier: ChangeNotifier::new(),
        }
    }

    #[track_caller]
    pub(crate) fn lock_state(&self) -> MutexGuard<'_, VfsState> {
        lock_recovering(&self.state)
    }

    /// Registers a change subscriber. Events are delivered synchronously, after the mutation
    /// that produced them has completed.
    pub fn watch<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&VfsEvent) + Send + Sync + 'static,
    {
        self.notifier.subscribe(callback)
    }

    pub fn unwatch(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.notifier.subscriber_count()
    }

    /// Replaces all contents with the starter project and fires `initialized`.
    pub fn load_default_project(&self) {
        let now = now();
        let files: HashMap<VfsPath, File> = DEFAULT_PROJECT
            .iter()
            .map(|(path, content)| {
                let path = VfsPath::new(path);
                (path.clone(), File::new(path, (*content).to_owned(), now))
            })
            .collect();
        let file_count = files.len();
        {
            let mut state = self.lock_state();
            state.files = files;
            state.folders.clear();
        }
        tracing::debug!(target: "slate.vfs", file_count, "loaded default project");
        self.notifier.notify(VfsEvent::Initialized { file_count });
    }

    /// Inserts a file, silently overwriting any file already at `path`. Fires `file-created`.
    pub fn create_file(&self, path: impl AsRef<str>, content: impl Into<String>) -> File {
        let path = VfsPath::new(path);
        let file = File::new(path.clone(), content.into(), now());
        self.lock_state().files.insert(path, file.clone());
        tracing::debug!(target: "slate.vfs", path = %file.path(), size = file.size(), "created file");
        self.notifier.notify(VfsEvent::FileCreated { file: file.clone() });
        file
    }

    /// Updates an existing file (`file-modified`) or creates it (`file-created`).
    pub fn write_file(&self, path: impl AsRef<str>, content: impl Into<String>) -> File {
        let path = VfsPath::new(path);
        let content = content.into();
        let now = now();
        let (file, existed) = {
            let mut state = self.lock_state();
            match state.files.get_mut(&path) {
                Some(existing) => {
                    existing.set_content(content, now);
                    (existing.clone(), true)
                }
                None => {
                    let file = File::new(path.clone(), content, now);
                    state.files.insert(path, file.clone());
                    (file, false)
                }
            }
        };
        tracing::debug!(
            target: "slate.vfs",
            path = %file.path(),
            size = file.size(),
            existed,
            "wrote file"
        );
        let event = if existed {
            VfsEvent::FileModified { file: file.clone() }
        } else {
            VfsEvent::FileCreated { file: file.clone() }
        };
        self.notifier.notify(event);
        file
    }

    pub fn read_file(&self, path: impl AsRef<str>) -> Option<File> {
        let path = VfsPath::new(path);
        self.lock_state().files.get(&path).cloned()
    }

    /// Removes a file. Returns `false` (and fires nothing) when no file exists at `path`.
    pub fn delete_file(&self, path: impl AsRef<str>) -> bool {
        let path = VfsPath::new(path);
        if self.lock_state().files.remove(&path).is_none() {
            return false;
        }
        tracing::debug!(target: "slate.vfs", path = %path, "deleted file");
        self.notifier.notify(VfsEvent::FileDeleted { path });
        true
    }

    /// Inserts (or overwrites) a folder record. Fires `folder-created`.
    pub fn create_folder(&self, path: impl AsRef<str>) -> Folder {
        let path = VfsPath::new(path);
        let folder = Folder::new(path.clone(), now());
        self.lock_state().folders.insert(path, folder.clone());
        tracing::debug!(target: "slate.vfs", path = %folder.path(), "created folder");
        self.notifier.notify(VfsEvent::FolderCreated {
            folder: folder.clone(),
        });
        folder
    }

    /// Removes a folder with every file and folder below it, firing a single `folder-deleted`.
    pub fn delete_folder(&self, path: impl AsRef<str>) -> bool {
        let path = VfsPath::new(path);
        let (removed_files, removed_folders) = {
            let mut state = self.lock_state();
            if !state.folders.contains_key(&path) {
                return false;
            }
            let files_before = state.files.len();
            state.files.retain(|file, _| !file.is_within(&path));
            let folders_before = state.folders.len();
            state.folders.retain(|folder, _| !folder.is_within(&path));
            state.folders.remove(&path);
            (
                files_before - state.files.len(),
                // The folder itself is not counted.
                folders_before - state.folders.len() - 1,
            )
        };
        tracing::debug!(
            target: "slate.vfs",
            path = %path,
            removed_files,
            removed_folders,
            "deleted folder"
        );
        self.notifier.notify(VfsEvent::FolderDeleted {
            path,
            removed_files,
            removed_folders,
        });
        true
    }

    /// Moves a file to `new_path`, overwriting whatever is there. Returns `false` when the
    /// source does not exist. Content is re-encoded when the new extension switches between
    /// text and binary.
    pub fn rename_file(&self, old_path: impl AsRef<str>, new_path: impl AsRef<str>) -> bool {
        let old_path = VfsPath::new(old_path);
        let new_path = VfsPath::new(new_path);
        let file = {
            let mut state = self.lock_state();
            let Some(mut file) = state.files.remove(&old_path) else {
                return false;
            };
            file.relocate(new_path.clone(), now());
            state.files.insert(new_path.clone(), file.clone());
            file
        };
        tracing::debug!(target: "slate.vfs", from = %old_path, to = %new_path, "renamed file");
        self.notifier.notify(VfsEvent::FileRenamed {
            old_path,
            new_path,
            file,
        });
        true
    }

    pub fn file_exists(&self, path: impl AsRef<str>) -> bool {
        let path = VfsPath::new(path);
        self.lock_state().files.contains_key(&path)
    }

    pub fn folder_exists(&self, path: impl AsRef<str>) -> bool {
        let path = VfsPath::new(path);
        self.lock_state().folders.contains_key(&path)
    }

    pub fn exists(&self, path: impl AsRef<str>) -> bool {
        let path = VfsPath::new(path);
        let state = self.lock_state();
        state.files.contains_key(&path) || state.folders.contains_key(&path)
    }

    /// Unordered snapshot of every file.
    pub fn all_files(&self) -> Vec<File> {
        self.lock_state().files.values().cloned().collect()
    }

    /// Unordered snapshot of every folder.
    pub fn all_folders(&self) -> Vec<Folder> {
        self.lock_state().folders.values().cloned().collect()
    }

    pub fn file_count(&self) -> usize {
        self.lock_state().files.len()
    }

    pub fn folder_count(&self) -> usize {
        self.lock_state().folders.len()
    }

    /// Direct children of `path`, folders first and then by name.
    pub fn list_dir(&self, path: impl AsRef<str>) -> Vec<DirEntry> {
        let dir = VfsPath::new(path);
        let mut out: Vec<DirEntry> = {
            let state = self.lock_state();
            let folders = state
                .folders
                .keys()
                .filter(|p| !p.is_root() && p.parent() == dir)
                .map(|p| (NodeKind::Folder, p));
            let files = state
                .files
                .keys()
                .filter(|p| p.parent() == dir)
                .map(|p| (NodeKind::File, p));
            folders
                .chain(files)
                .map(|(kind, p)| DirEntry {
                    name: p.name().to_owned(),
                    kind,
                    path: p.clone(),
                })
                .collect()
        };
        out.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.name.cmp(&b.name)));
        out
    }

    /// Builds the sorted hierarchical view of the current contents.
    pub fn file_tree(&self) -> TreeNode {
        let state = self.lock_state();
        project_tree(state.files.keys(), state.folders.keys())
    }

    /// Whether `path` has a binary-classified extension. Pure function of the path.
    pub fn is_binary_classified(&self, path: impl AsRef<str>) -> bool {
        is_binary_path(VfsPath::new(path).as_str())
    }

    fn snapshot_contents(&self) -> (Vec<File>, Vec<Folder>) {
        let state = self.lock_state();
        (
            state.files.values().cloned().collect(),
            state.folders.values().cloned().collect(),
        )
    }

    /// Packs the project into a zip archive on the calling thread.
    pub fn export_archive(&self) -> Result<Archive, ArchiveError> {
        let (files, folders) = self.snapshot_contents();
        let archive = archive::encode_project(&files, &folders)?;
        tracing::info!(
            target: "slate.vfs",
            files = files.len(),
            folders = folders.len(),
            bytes = archive.as_bytes().len(),
            "exported project"
        );
        Ok(archive)
    }

    /// Packs the project into a zip archive, compressing on tokio's blocking pool.
    ///
    /// The contents are captured when this is called; later mutations do not affect the result.
    pub async fn export_project(&self) -> Result<Archive, ArchiveError> {
        let (files, folders) = self.snapshot_contents();
        let archive = tokio::task::spawn_blocking(move || {
            archive::encode_project(&files, &folders).map(|archive| (archive, files.len()))
        })
        .await
        .map_err(|err| ArchiveError::Task(err.to_string()))?;
        let (archive, file_count) = archive?;
        tracing::info!(
            target: "slate.vfs",
            files = file_count,
            bytes = archive.as_bytes().len(),
            "exported project"
        );
        Ok(archive)
    }

    /// Serializes the project in the legacy flat JSON format.
    pub fn export_legacy_json(&self) -> Result<String, ArchiveError> {
        let (files, folders) = self.snapshot_contents();
        legacy::encode(&files, &folders)
    }

    /// Replaces the whole project with a zip archive or legacy JSON payload.
    ///
    /// The payload is decoded completely before anything is replaced; on error the VFS is left
    /// untouched and no event fires.
    pub fn import_bytes(&self, bytes: &[u8]) -> Result<ImportSummary, ArchiveError> {
        let (format, snapshot) = archive::decode_payload(bytes).map_err(log_rejected)?;
        Ok(self.replace_contents(format, snapshot))
    }

    /// Async counterpart of [`Vfs::import_bytes`]; decompression runs on tokio's blocking pool.
    pub async fn import_project(
        &self,
        payload: impl Into<Vec<u8>>,
    ) -> Result<ImportSummary, ArchiveError> {
        let payload = payload.into();
        let decoded = tokio::task::spawn_blocking(move || archive::decode_payload(&payload))
            .await
            .map_err(|err| ArchiveError::Task(err.to_string()))?;
        let (format, snapshot) = decoded.map_err(log_rejected)?;
        Ok(self.replace_contents(format, snapshot))
    }

    /// Swaps a decoded snapshot in as the new contents and fires one `project-imported`.
    ///
    /// `format` is the payload format the snapshot was decoded from; it is reported back in the
    /// summary.
    pub fn replace_contents(
        &self,
        format: ProjectFormat,
        snapshot: ProjectSnapshot,
    ) -> ImportSummary {
        let ProjectSnapshot { files, folders } = snapshot;
        let files: HashMap<VfsPath, File> = files
            .into_iter()
            .map(|file| (file.path().clone(), file))
            .collect();
        let folders: HashMap<VfsPath, Folder> = folders
            .into_iter()
            .map(|folder| (folder.path().clone(), folder))
            .collect();
        let summary = ImportSummary {
            format,
            file_count: files.len(),
            folder_count: folders.len(),
        };
        {
            let mut state = self.lock_state();
            state.files = files;
            state.folders = folders;
        }
        tracing::info!(
            target: "slate.vfs",
            format = ?summary.format,
            files = summary.file_count,
            folders = summary.folder_count,
            "imported project"
        );
        self.notifier.notify(VfsEvent::ProjectImported {
            file_count: summary.file_count,
            folder_count: summary.folder_count,
        });
        summary
    }
}

fn log_rejected(err: ArchiveError) -> ArchiveError {
    tracing::warn!(target: "slate.vfs", error = %err, "project import rejected");
    err
}
