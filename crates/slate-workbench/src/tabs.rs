//! Open editor tabs kept consistent with the VFS.
//!
//! A tab holds its own buffer, which diverges from the backing file between edits and the next
//! save. The controller subscribes to VFS events and:
//! - retargets tabs on rename,
//! - closes tabs whose file was deleted (directly or by a cascading folder delete),
//! - reloads unmodified tabs when their file is written or overwritten,
//! - after an import or a default-project reload, closes tabs whose file vanished and reloads
//!   the unmodified rest.
//!
//! The tab lock is never held while calling into the VFS: VFS mutators notify subscribers
//! synchronously, and this controller is one of them.

use std::sync::Arc;

use parking_lot::Mutex;
use slate_config::EditorConfig;
use slate_vfs::{File, SubscriptionId, Vfs, VfsEvent, VfsPath};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TabError {
    #[error("no file at {0}")]
    FileNotFound(VfsPath),
    #[error("{0} is not open")]
    NotOpen(VfsPath),
    #[error("{0} is a binary file and cannot be edited as text")]
    ReadOnly(VfsPath),
}

/// Editor language mode chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxMode {
    Html,
    Css,
    JavaScript,
    TypeScript,
    Json,
    Markdown,
    Xml,
    PlainText,
    /// Binary files open in a viewer, not the text editor.
    Binary,
}

impl SyntaxMode {
    pub fn for_path(path: &VfsPath) -> Self {
        if slate_vfs::is_binary_path(path.as_str()) {
            return SyntaxMode::Binary;
        }
        match path.extension().to_ascii_lowercase().as_str() {
            "html" | "htm" => SyntaxMode::Html,
            "css" | "scss" | "less" => SyntaxMode::Css,
            "js" | "mjs" | "cjs" | "jsx" => SyntaxMode::JavaScript,
            "ts" | "tsx" => SyntaxMode::TypeScript,
            "json" => SyntaxMode::Json,
            "md" | "markdown" => SyntaxMode::Markdown,
            "xml" | "svg" => SyntaxMode::Xml,
            _ => SyntaxMode::PlainText,
        }
    }

    /// Mode identifier understood by the editor widget.
    pub fn as_str(self) -> &'static str {
        match self {
            SyntaxMode::Html => "htmlmixed",
            SyntaxMode::Css => "css",
            SyntaxMode::JavaScript => "javascript",
            SyntaxMode::TypeScript => "text/typescript",
            SyntaxMode::Json => "application/json",
            SyntaxMode::Markdown => "markdown",
            SyntaxMode::Xml => "xml",
            SyntaxMode::PlainText => "text/plain",
            SyntaxMode::Binary => "binary",
        }
    }
}

/// Preferences applied to every editor tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorOptions {
    pub font_size: u32,
    pub tab_width: u32,
    pub word_wrap: bool,
}

impl From<&EditorConfig> for EditorOptions {
    fn from(config: &EditorConfig) -> Self {
        Self {
            font_size: config.font_size,
            tab_width: config.tab_width,
            word_wrap: config.word_wrap,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenTab {
    pub path: VfsPath,
    pub mode: SyntaxMode,
    pub buffer: String,
    pub is_modified: bool,
}

impl OpenTab {
    fn for_file(file: &File) -> Self {
        Self {
            path: file.path().clone(),
            mode: SyntaxMode::for_path(file.path()),
            buffer: file.content().to_owned(),
            is_modified: false,
        }
    }

    fn retarget(&mut self, path: VfsPath) {
        self.mode = SyntaxMode::for_path(&path);
        self.path = path;
    }
}

#[derive(Debug, Default)]
struct TabState {
    tabs: Vec<OpenTab>,
    active: Option<VfsPath>,
}

impl TabState {
    fn position(&self, path: &VfsPath) -> Option<usize> {
        self.tabs.iter().position(|tab| tab.path == *path)
    }

    fn get_mut(&mut self, path: &VfsPath) -> Option<&mut OpenTab> {
        self.tabs.iter_mut().find(|tab| tab.path == *path)
    }

    fn close(&mut self, path: &VfsPath) -> bool {
        let Some(idx) = self.position(path) else {
            return false;
        };
        self.tabs.remove(idx);
        if self.active.as_ref() == Some(path) {
            // Focus moves to the right-hand neighbour, or the left one when closing the last tab.
            self.active = self
                .tabs
                .get(idx)
                .or_else(|| idx.checked_sub(1).and_then(|prev| self.tabs.get(prev)))
                .map(|tab| tab.path.clone());
        }
        true
    }

    fn close_where(&mut self, mut pred: impl FnMut(&VfsPath) -> bool) -> usize {
        let doomed: Vec<VfsPath> = self
            .tabs
            .iter()
            .filter(|tab| pred(&tab.path))
            .map(|tab| tab.path.clone())
            .collect();
        for path in &doomed {
            self.close(path);
        }
        doomed.len()
    }

    fn rename(&mut self, from: &VfsPath, to: &VfsPath) -> bool {
        if from == to || self.position(from).is_none() {
            return false;
        }
        // A tab already showing the destination is replaced by the moved one.
        if let Some(existing) = self.position(to) {
            self.tabs.remove(existing);
        }
        if let Some(tab) = self.get_mut(from) {
            tab.retarget(to.clone());
        }
        if self.active.as_ref() == Some(from) {
            self.active = Some(to.clone());
        }
        true
    }

    fn reload(&mut self, file: &File) {
        if let Some(tab) = self.get_mut(file.path()) {
            if tab.is_modified {
                tracing::debug!(
                    target: "slate.workbench",
                    path = %file.path(),
                    "file changed under a modified tab; keeping buffer"
                );
            } else {
                tab.buffer = file.content().to_owned();
            }
        }
    }
}

/// Tracks open tabs and keeps them in step with the VFS.
///
/// Unsubscribes from the VFS when dropped.
#[derive(Debug)]
pub struct TabController {
    vfs: Vfs,
    state: Arc<Mutex<TabState>>,
    options: EditorOptions,
    subscription: SubscriptionId,
}

impl TabController {
    pub fn new(vfs: Vfs, editor: &EditorConfig) -> Self {
        let state = Arc::new(Mutex::new(TabState::default()));
        let subscription = {
            let state = state.clone();
            let reader = vfs.clone();
            vfs.watch(move |event| handle_event(&state, &reader, event))
                .id()
        };
        Self {
            vfs,
            state,
            options: EditorOptions::from(editor),
            subscription,
        }
    }

    pub fn options(&self) -> EditorOptions {
        self.options
    }

    /// Opens (or focuses) the tab for `path` and makes it active.
    pub fn open(&self, path: impl AsRef<str>) -> Result<OpenTab, TabError> {
        let path = VfsPath::new(path);
        let file = self
            .vfs
            .read_file(&path)
            .ok_or_else(|| TabError::FileNotFound(path.clone()))?;

        let mut state = self.state.lock();
        state.active = Some(path.clone());
        if let Some(tab) = state.get_mut(&path) {
            return Ok(tab.clone());
        }
        let tab = OpenTab::for_file(&file);
        state.tabs.push(tab.clone());
        tracing::debug!(target: "slate.workbench", path = %path, "opened tab");
        Ok(tab)
    }

    /// Closes the tab without saving. Returns `false` if it was not open.
    pub fn close(&self, path: impl AsRef<str>) -> bool {
        self.state.lock().close(&VfsPath::new(path))
    }

    pub fn activate(&self, path: impl AsRef<str>) -> Result<(), TabError> {
        let path = VfsPath::new(path);
        let mut state = self.state.lock();
        if state.position(&path).is_none() {
            return Err(TabError::NotOpen(path));
        }
        state.active = Some(path);
        Ok(())
    }

    /// Replaces the tab buffer. The VFS is untouched until [`TabController::save`].
    pub fn edit(&self, path: impl AsRef<str>, buffer: impl Into<String>) -> Result<(), TabError> {
        let path = VfsPath::new(path);
        let mut state = self.state.lock();
        let tab = state
            .get_mut(&path)
            .ok_or_else(|| TabError::NotOpen(path.clone()))?;
        if tab.mode == SyntaxMode::Binary {
            return Err(TabError::ReadOnly(path));
        }
        tab.buffer = buffer.into();
        tab.is_modified = true;
        Ok(())
    }

    /// Writes the tab buffer back to the VFS.
    pub fn save(&self, path: impl AsRef<str>) -> Result<File, TabError> {
        let path = VfsPath::new(path);
        let buffer = {
            let mut state = self.state.lock();
            let tab = state
                .get_mut(&path)
                .ok_or_else(|| TabError::NotOpen(path.clone()))?;
            tab.is_modified = false;
            tab.buffer.clone()
        };
        Ok(self.vfs.write_file(&path, buffer))
    }

    /// Saves every modified tab, in tab order.
    pub fn save_all(&self) -> Vec<File> {
        let dirty: Vec<VfsPath> = self
            .state
            .lock()
            .tabs
            .iter()
            .filter(|tab| tab.is_modified)
            .map(|tab| tab.path.clone())
            .collect();
        dirty
            .into_iter()
            .filter_map(|path| self.save(&path).ok())
            .collect()
    }

    /// Points tabs at `from` (or below it, for folders) to the matching path under `to`.
    ///
    /// Returns how many tabs were retargeted.
    pub fn retarget(&self, from: impl AsRef<str>, to: impl AsRef<str>) -> usize {
        let from = VfsPath::new(from);
        let to = VfsPath::new(to);
        let mut state = self.state.lock();
        let moves: Vec<(VfsPath, VfsPath)> = state
            .tabs
            .iter()
            .filter_map(|tab| {
                slate_vfs::path::rebase(tab.path.as_str(), from.as_str(), to.as_str())
                    .map(|new| (tab.path.clone(), VfsPath::new(new)))
            })
            .collect();
        let mut retargeted = 0;
        for (old, new) in &moves {
            if state.rename(old, new) {
                retargeted += 1;
            }
        }
        retargeted
    }

    pub fn tabs(&self) -> Vec<OpenTab> {
        self.state.lock().tabs.clone()
    }

    pub fn active(&self) -> Option<OpenTab> {
        let state = self.state.lock();
        let active = state.active.as_ref()?;
        state.tabs.iter().find(|tab| tab.path == *active).cloned()
    }

    pub fn is_open(&self, path: impl AsRef<str>) -> bool {
        self.state.lock().position(&VfsPath::new(path)).is_some()
    }
}

impl Drop for TabController {
    fn drop(&mut self) {
        self.vfs.unwatch(self.subscription);
    }
}

fn handle_event(state: &Mutex<TabState>, vfs: &Vfs, event: &VfsEvent) {
    match event {
        VfsEvent::FileRenamed {
            old_path,
            new_path,
            file,
        } => {
            let mut state = state.lock();
            if state.rename(old_path, new_path) {
                // The content is re-encoded when the rename changes text/binary class.
                state.reload(file);
            }
        }
        VfsEvent::FileDeleted { path } => {
            if state.lock().close(path) {
                tracing::debug!(target: "slate.workbench", path = %path, "closed tab of deleted file");
            }
        }
        VfsEvent::FolderDeleted { path, .. } => {
            let closed = state.lock().close_where(|tab| tab.is_within(path));
            if closed > 0 {
                tracing::debug!(target: "slate.workbench", folder = %path, closed, "closed tabs of deleted folder");
            }
        }
        VfsEvent::FileCreated { file } | VfsEvent::FileModified { file } => {
            state.lock().reload(file);
        }
        VfsEvent::ProjectImported { .. } | VfsEvent::Initialized { .. } => {
            let open: Vec<VfsPath> = state.lock().tabs.iter().map(|tab| tab.path.clone()).collect();
            let current: Vec<(VfsPath, Option<File>)> = open
                .into_iter()
                .map(|path| {
                    let file = vfs.read_file(&path);
                    (path, file)
                })
                .collect();
            let mut state = state.lock();
            for (path, file) in current {
                match file {
                    Some(file) => state.reload(&file),
                    None => {
                        state.close(&path);
                    }
                }
            }
        }
        VfsEvent::FolderCreated { .. } => {}
    }
}
