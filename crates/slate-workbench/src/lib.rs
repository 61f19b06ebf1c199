//! The VFS-facing half of the IDE shell: editor tabs, file explorer, live preview and uploads.
//!
//! [`Workbench`] is the composition root. It owns one [`Vfs`] and hands a handle of it to every
//! consumer, which subscribe before the default project is loaded so they all observe the
//! `initialized` event.

mod explorer;
mod preview;
mod tabs;
mod upload;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use slate_config::{ConfigError, SlateConfig};
use slate_vfs::{ArchiveError, ImportSummary, Vfs};

pub use explorer::{DropError, Explorer};
pub use preview::{asset_path, is_previewable, AssetResolution, PreviewRefresher, PreviewResolver};
pub use tabs::{EditorOptions, OpenTab, SyntaxMode, TabController, TabError};
pub use tokio_util::sync::CancellationToken;
pub use upload::{UploadError, UploadItem, UploadOutcome, UploadReport, Uploader};

#[derive(Debug)]
pub struct Workbench {
    config: SlateConfig,
    vfs: Vfs,
    tabs: Arc<TabController>,
    explorer: Explorer,
    preview: PreviewResolver,
    refresher: PreviewRefresher,
    uploader: Uploader,
}

impl Workbench {
    /// Builds a workbench around the default starter project, with its entry document open.
    pub fn new(config: SlateConfig) -> Self {
        let workbench = Self::with_vfs(Vfs::empty(), config);
        workbench.vfs.load_default_project();
        if let Some(entry) = workbench.preview.entry_document() {
            if let Err(err) = workbench.tabs.open(entry.path()) {
                tracing::warn!(target: "slate.workbench", error = %err, "failed to open entry document");
            }
        }
        workbench
    }

    /// Wires every consumer to an existing VFS without touching its contents.
    pub fn with_vfs(vfs: Vfs, config: SlateConfig) -> Self {
        let tabs = Arc::new(TabController::new(vfs.clone(), &config.editor));
        let explorer = Explorer::new(vfs.clone(), tabs.clone());
        let preview = PreviewResolver::new(vfs.clone());
        let refresher = PreviewRefresher::new(vfs.clone());
        let uploader = Uploader::new(vfs.clone(), config.import);
        Self {
            config,
            vfs,
            tabs,
            explorer,
            preview,
            refresher,
            uploader,
        }
    }

    /// Loads `slate.toml` for `root` (see [`slate_config::discover_config_path`]) and builds a
    /// workbench from it.
    pub fn open(root: &Path) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let (config, path) = slate_config::load_for_root(root)?;
        tracing::info!(
            target: "slate.workbench",
            config = ?path,
            "opening workbench"
        );
        Ok((Self::new(config), path))
    }

    pub fn config(&self) -> &SlateConfig {
        &self.config
    }

    pub fn vfs(&self) -> &Vfs {
        &self.vfs
    }

    pub fn tabs(&self) -> &TabController {
        &self.tabs
    }

    pub fn explorer(&self) -> &Explorer {
        &self.explorer
    }

    pub fn preview(&self) -> &PreviewResolver {
        &self.preview
    }

    pub fn refresher(&self) -> &PreviewRefresher {
        &self.refresher
    }

    pub fn uploader(&self) -> &Uploader {
        &self.uploader
    }

    /// Replaces the project with an archive or legacy JSON payload.
    ///
    /// Destructive: callers confirm with the user first. Tabs whose file is gone afterwards are
    /// closed; modified tabs whose file survived keep their buffer.
    pub async fn import_project(&self, payload: Vec<u8>) -> Result<ImportSummary, ArchiveError> {
        self.vfs.import_project(payload).await
    }

    /// Saves modified tabs, then exports the project as a zip archive.
    pub async fn export_project(&self) -> Result<slate_vfs::Archive, ArchiveError> {
        self.tabs.save_all();
        self.vfs.export_project().await
    }
}
