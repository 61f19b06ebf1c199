use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use slate_vfs::{MoveError, TreeNode, TreeRow, Vfs, VfsPath};

use crate::tabs::TabController;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DropError {
    #[error(transparent)]
    Move(#[from] MoveError),

    #[error("drop target {0} is not a folder")]
    NotAFolder(VfsPath),

    #[error("{0} already exists")]
    AlreadyExists(VfsPath),

    /// A file would replace a folder or the other way round; never allowed, even when
    /// overwriting.
    #[error("{0} already exists as a different kind of entry")]
    KindConflict(VfsPath),
}

/// File-tree view state plus the move/delete actions it triggers.
#[derive(Debug)]
pub struct Explorer {
    vfs: Vfs,
    tabs: Arc<TabController>,
    expanded: Mutex<HashSet<VfsPath>>,
}

impl Explorer {
    pub fn new(vfs: Vfs, tabs: Arc<TabController>) -> Self {
        Self {
            vfs,
            tabs,
            expanded: Mutex::new(HashSet::new()),
        }
    }

    pub fn tree(&self) -> TreeNode {
        self.vfs.file_tree()
    }

    /// Visible rows, honouring the current expansion state.
    pub fn rows(&self) -> Vec<TreeRow> {
        let tree = self.vfs.file_tree();
        let expanded = self.expanded.lock();
        tree.rows(|path| expanded.contains(path))
    }

    /// Flips a folder between expanded and collapsed. Returns the new state.
    pub fn toggle(&self, folder: impl AsRef<str>) -> bool {
        let folder = VfsPath::new(folder);
        let mut expanded = self.expanded.lock();
        if expanded.remove(&folder) {
            false
        } else {
            expanded.insert(folder);
            true
        }
    }

    /// Checks a drag-and-drop target without changing anything.
    ///
    /// Returns the path the entry would end up at.
    pub fn can_drop(
        &self,
        source: impl AsRef<str>,
        dest_folder: impl AsRef<str>,
    ) -> Result<VfsPath, DropError> {
        let source = VfsPath::new(source);
        let dest = VfsPath::new(dest_folder);
        if !dest.is_root() && !self.vfs.folder_exists(&dest) {
            return Err(DropError::NotAFolder(dest));
        }
        let is_folder = self.vfs.folder_exists(&source);
        if !is_folder && !self.vfs.file_exists(&source) {
            return Err(MoveError::NotFound(source).into());
        }
        if is_folder && (dest == source || dest.is_within(&source)) {
            return Err(MoveError::IntoDescendant {
                source_path: source,
                destination: dest,
            }
            .into());
        }
        let target = dest.join(source.name());
        if target == source {
            return Ok(target);
        }
        if self.vfs.folder_exists(&target) != is_folder && self.vfs.exists(&target) {
            return Err(DropError::KindConflict(target));
        }
        if self.vfs.exists(&target) {
            return Err(DropError::AlreadyExists(target));
        }
        Ok(target)
    }

    /// Moves a file or folder into `dest_folder`, keeping open tabs attached.
    ///
    /// With `overwrite` unset an existing entry at the destination rejects the move; callers
    /// confirm with the user and retry with `overwrite` set. A file never replaces a folder or
    /// the reverse.
    pub fn move_entry(
        &self,
        source: impl AsRef<str>,
        dest_folder: impl AsRef<str>,
        overwrite: bool,
    ) -> Result<VfsPath, DropError> {
        let source = VfsPath::new(source);
        let dest = VfsPath::new(dest_folder);
        let target = match self.can_drop(&source, &dest) {
            Ok(target) => target,
            Err(DropError::AlreadyExists(target)) if overwrite => target,
            Err(err) => return Err(err),
        };
        if target == source {
            return Ok(target);
        }

        // Tabs move first so the delete half of the move does not close them.
        self.tabs.retarget(&source, &target);
        let moved = if self.vfs.folder_exists(&source) {
            self.vfs.move_folder(&source, &dest)
        } else {
            self.vfs.move_file(&source, &dest)
        };
        match moved {
            Ok(path) => {
                let mut expanded = self.expanded.lock();
                let rebased: Vec<VfsPath> = expanded
                    .iter()
                    .filter(|p| **p == source || p.is_within(&source))
                    .cloned()
                    .collect();
                for old in rebased {
                    expanded.remove(&old);
                    if let Some(new) =
                        slate_vfs::path::rebase(old.as_str(), source.as_str(), target.as_str())
                    {
                        expanded.insert(VfsPath::new(new));
                    }
                }
                tracing::debug!(target: "slate.workbench", from = %source, to = %path, "moved entry");
                Ok(path)
            }
            Err(err) => {
                self.tabs.retarget(&target, &source);
                Err(err.into())
            }
        }
    }

    /// Deletes a file or a folder subtree. Returns `false` when nothing exists at `path`.
    pub fn delete_entry(&self, path: impl AsRef<str>) -> bool {
        let path = VfsPath::new(path);
        if self.vfs.folder_exists(&path) {
            self.expanded
                .lock()
                .retain(|p| *p != path && !p.is_within(&path));
            self.vfs.delete_folder(&path)
        } else {
            self.vfs.delete_file(&path)
        }
    }
}

#[cfg(test)]
mod tests {
    use slate_config::EditorConfig;

    use super::*;

    fn explorer() -> (Vfs, Arc<TabController>, Explorer) {
        let vfs = Vfs::empty();
        let tabs = Arc::new(TabController::new(vfs.clone(), &EditorConfig::default()));
        let explorer = Explorer::new(vfs.clone(), tabs.clone());
        (vfs, tabs, explorer)
    }

    #[test]
    fn moved_file_keeps_its_tab() {
        let (vfs, tabs, explorer) = explorer();
        vfs.create_folder("/dest");
        vfs.create_file("/a.js", "let a;");
        tabs.open("/a.js").unwrap();
        tabs.edit("/a.js", "let a = 1;").unwrap();

        let to = explorer.move_entry("/a.js", "/dest", false).unwrap();

        assert_eq!(to.as_str(), "/dest/a.js");
        let active = tabs.active().unwrap();
        assert_eq!(active.path, "/dest/a.js");
        assert_eq!(active.buffer, "let a = 1;");
        assert!(active.is_modified);
    }

    #[test]
    fn moved_folder_keeps_tabs_and_expansion() {
        let (vfs, tabs, explorer) = explorer();
        vfs.create_folder("/src");
        vfs.create_folder("/src/lib");
        vfs.create_folder("/pkg");
        vfs.create_file("/src/lib/util.js", "u");
        tabs.open("/src/lib/util.js").unwrap();
        explorer.toggle("/src");
        explorer.toggle("/src/lib");

        explorer.move_entry("/src", "/pkg", false).unwrap();

        assert_eq!(tabs.tabs()[0].path, "/pkg/src/lib/util.js");
        explorer.toggle("/pkg");
        let rows: Vec<_> = explorer.rows().into_iter().map(|r| r.path.to_string()).collect();
        assert_eq!(
            rows,
            vec!["/pkg", "/pkg/src", "/pkg/src/lib", "/pkg/src/lib/util.js"]
        );
    }

    #[test]
    fn drop_validation() {
        let (vfs, _tabs, explorer) = explorer();
        vfs.create_folder("/a");
        vfs.create_folder("/a/b");
        vfs.create_folder("/c");
        vfs.create_file("/x.txt", "");
        vfs.create_file("/c/x.txt", "");

        assert!(matches!(
            explorer.can_drop("/a", "/a/b"),
            Err(DropError::Move(MoveError::IntoDescendant { .. }))
        ));
        assert_eq!(
            explorer.can_drop("/x.txt", "/x.txt"),
            Err(DropError::NotAFolder(VfsPath::new("/x.txt")))
        );
        assert_eq!(
            explorer.can_drop("/x.txt", "/c"),
            Err(DropError::AlreadyExists(VfsPath::new("/c/x.txt")))
        );
        assert_eq!(explorer.can_drop("/a", "/c").unwrap().as_str(), "/c/a");
        assert_eq!(explorer.can_drop("/x.txt", "/").unwrap().as_str(), "/x.txt");
    }

    #[test]
    fn overwrite_replaces_existing_entry() {
        let (vfs, _tabs, explorer) = explorer();
        vfs.create_folder("/c");
        vfs.create_file("/x.txt", "new");
        vfs.create_file("/c/x.txt", "old");

        assert!(explorer.move_entry("/x.txt", "/c", false).is_err());
        explorer.move_entry("/x.txt", "/c", true).unwrap();
        assert_eq!(vfs.read_file("/c/x.txt").unwrap().content(), "new");
        assert!(!vfs.file_exists("/x.txt"));
    }

    #[test]
    fn overwrite_never_mixes_files_and_folders() {
        let (vfs, _tabs, explorer) = explorer();
        vfs.create_folder("/c");
        vfs.create_folder("/c/logo");
        vfs.create_file("/logo", "file");
        vfs.create_folder("/d");
        vfs.create_file("/d/c", "file");

        assert_eq!(
            explorer.move_entry("/logo", "/c", true),
            Err(DropError::KindConflict(VfsPath::new("/c/logo")))
        );
        assert_eq!(
            explorer.move_entry("/c", "/d", true),
            Err(DropError::KindConflict(VfsPath::new("/d/c")))
        );
        assert!(vfs.file_exists("/logo"));
        assert!(vfs.folder_exists("/c/logo"));
        assert!(vfs.folder_exists("/c"));
        assert_eq!(vfs.read_file("/d/c").unwrap().content(), "file");
    }

    #[test]
    fn delete_entry_closes_tabs_below_folder() {
        let (vfs, tabs, explorer) = explorer();
        vfs.create_folder("/src");
        vfs.create_file("/src/a.js", "");
        vfs.create_file("/b.js", "");
        tabs.open("/src/a.js").unwrap();
        tabs.open("/b.js").unwrap();

        assert!(explorer.delete_entry("/src"));
        let open: Vec<_> = tabs.tabs().into_iter().map(|t| t.path.to_string()).collect();
        assert_eq!(open, vec!["/b.js"]);
        assert!(!explorer.delete_entry("/src"));
    }
}
