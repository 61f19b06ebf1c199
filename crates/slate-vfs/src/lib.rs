//! In-memory virtual file system for a browser-style IDE workspace.
//!
//! [`Vfs`] owns two flat maps (files and folders) keyed by canonical [`VfsPath`]. Hierarchy is
//! never stored: [`Vfs::file_tree`] projects it from path prefixes on demand. Every mutation is
//! synchronous and reports itself to `watch` subscribers as a [`VfsEvent`] before returning.
//!
//! Projects are exported to, and imported from, zip archives (see [`archive`]) or the legacy flat
//! JSON format. Imports are decoded completely before the current contents are replaced.

pub mod archive;
mod change;
mod classify;
pub mod data_uri;
mod entry;
mod error;
mod legacy;
mod moves;
mod notifier;
pub mod path;
mod seed;
mod tree;
mod vfs;

pub use archive::{ImportSummary, ProjectFormat, ProjectSnapshot};
pub use change::{VfsEvent, VfsEventKind};
pub use classify::{is_binary_path, mime_for_extension, mime_for_path, BINARY_EXTENSIONS};
pub use data_uri::{DataUriError, DecodedDataUri};
pub use entry::{File, FileKind, Folder};
pub use error::{ArchiveError, MoveError};
pub use notifier::{ChangeNotifier, SubscriberFault, Subscription, SubscriptionId, WatchCallback};
pub use path::VfsPath;
pub use tree::{project_tree, NodeKind, TreeNode, TreeRow};
pub use vfs::{DirEntry, Vfs};

pub use slate_archive::Archive;
