use std::fmt;

use crate::entry::{File, Folder};
use crate::path::VfsPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VfsEventKind {
    FileCreated,
    FileModified,
    FileDeleted,
    FileRenamed,
    FolderCreated,
    FolderDeleted,
    ProjectImported,
    Initialized,
}

impl VfsEventKind {
    /// Wire name shared with UI code (`file-created`, `folder-deleted`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            VfsEventKind::FileCreated => "file-created",
            VfsEventKind::FileModified => "file-modified",
            VfsEventKind::FileDeleted => "file-deleted",
            VfsEventKind::FileRenamed => "file-renamed",
            VfsEventKind::FolderCreated => "folder-created",
            VfsEventKind::FolderDeleted => "folder-deleted",
            VfsEventKind::ProjectImported => "project-imported",
            VfsEventKind::Initialized => "initialized",
        }
    }
}

impl fmt::Display for VfsEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change emitted by the VFS after a mutation completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VfsEvent {
    FileCreated {
        file: File,
    },
    FileModified {
        file: File,
    },
    FileDeleted {
        path: VfsPath,
    },
    FileRenamed {
        old_path: VfsPath,
        new_path: VfsPath,
        file: File,
    },
    FolderCreated {
        folder: Folder,
    },
    /// A folder and everything below it was removed. Descendants do not get their own events.
    FolderDeleted {
        path: VfsPath,
        removed_files: usize,
        removed_folders: usize,
    },
    /// The whole project was replaced by an import.
    ProjectImported {
        file_count: usize,
        folder_count: usize,
    },
    /// The default project was loaded.
    Initialized {
        file_count: usize,
    },
}

impl VfsEvent {
    pub fn kind(&self) -> VfsEventKind {
        match self {
            VfsEvent::FileCreated { .. } => VfsEventKind::FileCreated,
            VfsEvent::FileModified { .. } => VfsEventKind::FileModified,
            VfsEvent::FileDeleted { .. } => VfsEventKind::FileDeleted,
            VfsEvent::FileRenamed { .. } => VfsEventKind::FileRenamed,
            VfsEvent::FolderCreated { .. } => VfsEventKind::FolderCreated,
            VfsEvent::FolderDeleted { .. } => VfsEventKind::FolderDeleted,
            VfsEvent::ProjectImported { .. } => VfsEventKind::ProjectImported,
            VfsEvent::Initialized { .. } => VfsEventKind::Initialized,
        }
    }

    /// The primary path this event is about, if any.
    pub fn path(&self) -> Option<&VfsPath> {
        match self {
            VfsEvent::FileCreated { file } | VfsEvent::FileModified { file } => Some(file.path()),
            VfsEvent::FileRenamed { new_path, .. } => Some(new_path),
            VfsEvent::FileDeleted { path } | VfsEvent::FolderDeleted { path, .. } => Some(path),
            VfsEvent::FolderCreated { folder } => Some(folder.path()),
            VfsEvent::ProjectImported { .. } | VfsEvent::Initialized { .. } => None,
        }
    }
}
