//! Move primitives.
//!
//! The state transition happens under a single lock, so no reader ever sees both copies. Observers
//! still receive the events of the create-then-delete composition UI code was written against:
//! a file move fires `file-created` (new path) then `file-deleted` (old path); a folder move fires
//! `folder-created` for the new folder and each descendant folder, `file-created` for each moved
//! file, then one `folder-deleted` for the source folder.

use crate::change::VfsEvent;
use crate::entry::{File, Folder};
use crate::error::MoveError;
use crate::path::VfsPath;
use crate::vfs::{now, Vfs};

impl Vfs {
    /// Moves a file into `dest_folder`, keeping its name. Returns the new path.
    ///
    /// Whatever already exists at the destination is overwritten. Moving a file into the folder
    /// it already lives in is a no-op that fires nothing.
    pub fn move_file(
        &self,
        from: impl AsRef<str>,
        dest_folder: impl AsRef<str>,
    ) -> Result<VfsPath, MoveError> {
        let from = VfsPath::new(from);
        let to = VfsPath::new(dest_folder).join(from.name());

        let moved = {
            let mut state = self.lock_state();
            let Some(file) = state.files.get(&from) else {
                return Err(MoveError::NotFound(from));
            };
            if to == from {
                return Ok(to);
            }
            let moved = File::with_timestamps(
                to.clone(),
                file.content().to_owned(),
                file.kind(),
                file.created_at(),
                now(),
            );
            state.files.remove(&from);
            state.files.insert(to.clone(), moved.clone());
            moved
        };

        tracing::debug!(target: "slate.vfs", from = %from, to = %to, "moved file");
        self.notifier.notify(VfsEvent::FileCreated { file: moved });
        self.notifier.notify(VfsEvent::FileDeleted { path: from });
        Ok(to)
    }

    /// Moves a folder and its whole subtree into `dest_folder`. Returns the folder's new path.
    pub fn move_folder(
        &self,
        from: impl AsRef<str>,
        dest_folder: impl AsRef<str>,
    ) -> Result<VfsPath, MoveError> {
        let from = VfsPath::new(from);
        let dest = VfsPath::new(dest_folder);
        if dest == from || dest.is_within(&from) {
            return Err(MoveError::IntoDescendant {
                source_path: from,
                destination: dest,
            });
        }
        let to = dest.join(from.name());

        let (created_folders, created_files, removed_files, removed_folders) = {
            let mut state = self.lock_state();
            if !state.folders.contains_key(&from) {
                return Err(MoveError::NotFound(from));
            }
            if to == from {
                return Ok(to);
            }
            let now = now();

            let mut folder_paths: Vec<VfsPath> = state
                .folders
                .keys()
                .filter(|path| **path == from || path.is_within(&from))
                .cloned()
                .collect();
            folder_paths.sort();
            let mut file_paths: Vec<VfsPath> = state
                .files
                .keys()
                .filter(|path| path.is_within(&from))
                .cloned()
                .collect();
            file_paths.sort();

            let mut created_folders = Vec::with_capacity(folder_paths.len());
            for old in &folder_paths {
                let Some(folder) = state.folders.remove(old) else {
                    continue;
                };
                let new_path = rebased(old, &from, &to);
                let moved = Folder::new(new_path.clone(), folder.created_at());
                state.folders.insert(new_path, moved.clone());
                created_folders.push(moved);
            }

            let mut created_files = Vec::with_capacity(file_paths.len());
            for old in &file_paths {
                let Some(file) = state.files.remove(old) else {
                    continue;
                };
                let new_path = rebased(old, &from, &to);
                let moved = File::with_timestamps(
                    new_path.clone(),
                    file.content().to_owned(),
                    file.kind(),
                    file.created_at(),
                    now,
                );
                state.files.insert(new_path, moved.clone());
                created_files.push(moved);
            }

            let removed_folders = created_folders.len().saturating_sub(1);
            let removed_files = created_files.len();
            (created_folders, created_files, removed_files, removed_folders)
        };

        tracing::debug!(
            target: "slate.vfs",
            from = %from,
            to = %to,
            files = removed_files,
            folders = removed_folders,
            "moved folder"
        );
        for folder in created_folders {
            self.notifier.notify(VfsEvent::FolderCreated { folder });
        }
        for file in created_files {
            self.notifier.notify(VfsEvent::FileCreated { file });
        }
        self.notifier.notify(VfsEvent::FolderDeleted {
            path: from,
            removed_files,
            removed_folders,
        });
        Ok(to)
    }
}

fn rebased(path: &VfsPath, from: &VfsPath, to: &VfsPath) -> VfsPath {
    match crate::path::rebase(path.as_str(), from.as_str(), to.as_str()) {
        Some(rebased) => VfsPath::new(rebased),
        // Only called for `from` and its descendants.
        None => path.clone(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::change::VfsEventKind;

    fn record(vfs: &Vfs) -> Arc<Mutex<Vec<(VfsEventKind, String)>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        vfs.watch(move |event| {
            let path = event.path().map(ToString::to_string).unwrap_or_default();
            sink.lock().unwrap().push((event.kind(), path));
        });
        seen
    }

    #[test]
    fn file_move_emits_create_then_delete() {
        let vfs = Vfs::empty();
        vfs.create_folder("/dest");
        let original = vfs.create_file("/a.txt", "alpha");
        let seen = record(&vfs);

        let to = vfs.move_file("/a.txt", "/dest").unwrap();
        assert_eq!(to.as_str(), "/dest/a.txt");
        assert!(!vfs.file_exists("/a.txt"));
        let moved = vfs.read_file("/dest/a.txt").unwrap();
        assert_eq!(moved.content(), "alpha");
        assert_eq!(moved.created_at(), original.created_at());

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (VfsEventKind::FileCreated, "/dest/a.txt".to_owned()),
                (VfsEventKind::FileDeleted, "/a.txt".to_owned()),
            ]
        );
    }

    #[test]
    fn moving_into_same_folder_is_a_noop() {
        let vfs = Vfs::empty();
        vfs.create_file("/a.txt", "alpha");
        let seen = record(&vfs);
        assert_eq!(vfs.move_file("/a.txt", "/").unwrap().as_str(), "/a.txt");
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn folder_move_relocates_subtree() {
        let vfs = Vfs::empty();
        vfs.create_folder("/src");
        vfs.create_folder("/src/lib");
        vfs.create_file("/src/main.js", "main");
        vfs.create_file("/src/lib/util.js", "util");
        vfs.create_folder("/pkg");
        let seen = record(&vfs);

        let to = vfs.move_folder("/src", "/pkg").unwrap();
        assert_eq!(to.as_str(), "/pkg/src");

        let mut files: Vec<_> = vfs.all_files().iter().map(|f| f.path().to_string()).collect();
        files.sort();
        assert_eq!(files, vec!["/pkg/src/lib/util.js", "/pkg/src/main.js"]);
        assert!(!vfs.folder_exists("/src"));
        assert!(vfs.folder_exists("/pkg/src/lib"));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (VfsEventKind::FolderCreated, "/pkg/src".to_owned()),
                (VfsEventKind::FolderCreated, "/pkg/src/lib".to_owned()),
                (VfsEventKind::FileCreated, "/pkg/src/lib/util.js".to_owned()),
                (VfsEventKind::FileCreated, "/pkg/src/main.js".to_owned()),
                (VfsEventKind::FolderDeleted, "/src".to_owned()),
            ]
        );
    }

    #[test]
    fn folder_cannot_move_into_itself() {
        let vfs = Vfs::empty();
        vfs.create_folder("/a");
        vfs.create_folder("/a/b");
        assert!(matches!(
            vfs.move_folder("/a", "/a/b"),
            Err(MoveError::IntoDescendant { .. })
        ));
        assert!(matches!(
            vfs.move_folder("/a", "/a"),
            Err(MoveError::IntoDescendant { .. })
        ));
        assert_eq!(
            vfs.move_folder("/missing", "/a"),
            Err(MoveError::NotFound(VfsPath::new("/missing")))
        );
        assert_eq!(
            vfs.move_file("/missing.txt", "/a"),
            Err(MoveError::NotFound(VfsPath::new("/missing.txt")))
        );
    }
}
