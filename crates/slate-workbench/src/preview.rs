//! Read-side contract of the live preview.
//!
//! [`PreviewResolver`] answers "which document is the entry point" and "which VFS file does this
//! `src`/`href` refer to". [`PreviewRefresher`] watches the VFS and publishes a generation number
//! that increases whenever something the preview renders may have changed.

use std::sync::Arc;

use slate_vfs::path::{directory_of, resolve_relative};
use slate_vfs::{File, SubscriptionId, Vfs, VfsEvent, VfsPath};
use tokio::sync::watch;

const ENTRY_DOCUMENT: &str = "/index.html";

const PREVIEW_EXTENSIONS: &[&str] = &["html", "htm", "css", "js", "mjs", "json", "svg"];

/// Whether a change to `path` can alter the rendered preview.
pub fn is_previewable(path: &VfsPath) -> bool {
    let ext = path.extension().to_ascii_lowercase();
    PREVIEW_EXTENSIONS.contains(&ext.as_str()) || slate_vfs::is_binary_path(path.as_str())
}

/// Outcome of resolving an asset reference found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetResolution {
    /// `http:`, `https:`, protocol-relative or `data:` references are left to the browser.
    External,
    /// The reference points at this VFS file.
    Found(File),
    /// The reference resolves to a path with no file behind it.
    Missing(VfsPath),
}

#[derive(Debug, Clone)]
pub struct PreviewResolver {
    vfs: Vfs,
}

impl PreviewResolver {
    pub fn new(vfs: Vfs) -> Self {
        Self { vfs }
    }

    /// `/index.html` when present, otherwise the first HTML file in path order.
    pub fn entry_document(&self) -> Option<File> {
        if let Some(file) = self.vfs.read_file(ENTRY_DOCUMENT) {
            return Some(file);
        }
        self.vfs
            .all_files()
            .into_iter()
            .filter(|file| matches!(file.path().extension(), "html" | "htm"))
            .min_by(|a, b| a.path().cmp(b.path()))
    }

    /// Resolves `reference` as written inside `document`.
    pub fn resolve_asset(&self, document: &VfsPath, reference: &str) -> AssetResolution {
        match asset_path(document, reference) {
            None => AssetResolution::External,
            Some(path) => match self.vfs.read_file(&path) {
                Some(file) => AssetResolution::Found(file),
                None => AssetResolution::Missing(path),
            },
        }
    }
}

/// Maps a reference to the VFS path it names, or `None` for external references.
///
/// Query strings and fragments are dropped; relative references resolve against the document's
/// directory and absolute ones against the project root.
pub fn asset_path(document: &VfsPath, reference: &str) -> Option<VfsPath> {
    let reference = reference.trim();
    let lower = reference.to_ascii_lowercase();
    if lower.starts_with("http:")
        || lower.starts_with("https:")
        || lower.starts_with("//")
        || lower.starts_with("data:")
    {
        return None;
    }
    let end = reference.find(['?', '#']).unwrap_or(reference.len());
    let reference = &reference[..end];
    if reference.is_empty() {
        return None;
    }
    let base = directory_of(document.as_str());
    Some(VfsPath::new(resolve_relative(&base, reference)))
}

/// Publishes a refresh generation for the preview pane.
///
/// Unsubscribes from the VFS when dropped.
#[derive(Debug)]
pub struct PreviewRefresher {
    vfs: Vfs,
    generation: Arc<watch::Sender<u64>>,
    subscription: SubscriptionId,
}

impl PreviewRefresher {
    pub fn new(vfs: Vfs) -> Self {
        let (generation, _) = watch::channel(0u64);
        let generation = Arc::new(generation);
        let subscription = {
            let generation = generation.clone();
            vfs.watch(move |event| {
                if affects_preview(event) {
                    generation.send_modify(|value| *value += 1);
                }
            })
            .id()
        };
        Self {
            vfs,
            generation,
            subscription,
        }
    }

    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }

    /// A receiver that is notified on every bump, for an async render loop.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }
}

impl Drop for PreviewRefresher {
    fn drop(&mut self) {
        self.vfs.unwatch(self.subscription);
    }
}

fn affects_preview(event: &VfsEvent) -> bool {
    match event {
        VfsEvent::FileCreated { file } | VfsEvent::FileModified { file } => {
            is_previewable(file.path())
        }
        VfsEvent::FileDeleted { path } => is_previewable(path),
        VfsEvent::FileRenamed {
            old_path, new_path, ..
        } => is_previewable(old_path) || is_previewable(new_path),
        VfsEvent::FolderCreated { .. }
        | VfsEvent::FolderDeleted { .. }
        | VfsEvent::ProjectImported { .. }
        | VfsEvent::Initialized { .. } => true,
    }
}
