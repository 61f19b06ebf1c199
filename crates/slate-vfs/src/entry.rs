use serde::Serialize;
use time::OffsetDateTime;

use crate::classify::{is_binary_path, mime_for_path};
use crate::data_uri::{self, DataUriError};
use crate::path::VfsPath;

/// How a file's `content` string is to be interpreted.
///
/// Always matches the classification of the file's current path. Writes never change it; a
/// rename that crosses between classes re-encodes the content (see [`File::relocate`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// UTF-8 text.
    Text,
    /// A base64 data URI (`data:<mime>;base64,...`).
    Binary,
}

impl FileKind {
    pub fn for_path(path: &VfsPath) -> Self {
        if is_binary_path(path.as_str()) {
            FileKind::Binary
        } else {
            FileKind::Text
        }
    }
}

/// A file stored in the virtual file system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    path: VfsPath,
    content: String,
    kind: FileKind,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    modified_at: OffsetDateTime,
    size: usize,
}

impl File {
    pub(crate) fn new(path: VfsPath, content: String, now: OffsetDateTime) -> Self {
        let kind = FileKind::for_path(&path);
        Self::with_timestamps(path, content, kind, now, now)
    }

    pub(crate) fn with_timestamps(
        path: VfsPath,
        content: String,
        kind: FileKind,
        created_at: OffsetDateTime,
        modified_at: OffsetDateTime,
    ) -> Self {
        let size = content.len();
        Self {
            path,
            content,
            kind,
            created_at,
            modified_at,
            size,
        }
    }

    pub(crate) fn set_content(&mut self, content: String, now: OffsetDateTime) {
        self.size = content.len();
        self.content = content;
        self.modified_at = now;
    }

    /// Moves the file to `path`.
    ///
    /// When the new extension classifies differently, text content becomes a data URI of its
    /// bytes and a data URI whose payload is valid UTF-8 becomes that text. Other binary content
    /// is kept verbatim as text, and empty content stays empty.
    pub(crate) fn relocate(&mut self, path: VfsPath, now: OffsetDateTime) {
        let kind = FileKind::for_path(&path);
        if kind != self.kind {
            let content = std::mem::take(&mut self.content);
            self.content = match kind {
                _ if content.is_empty() => content,
                FileKind::Binary => {
                    data_uri::encode(mime_for_path(path.as_str()), content.as_bytes())
                }
                FileKind::Text => match data_uri::decode(&content) {
                    Ok(decoded) => String::from_utf8(decoded.bytes).unwrap_or(content),
                    Err(_) => content,
                },
            };
            self.size = self.content.len();
            self.kind = kind;
        }
        self.path = path;
        self.modified_at = now;
    }

    pub fn path(&self) -> &VfsPath {
        &self.path
    }

    /// Text for text files, the data URI for binary files.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn is_binary(&self) -> bool {
        self.kind == FileKind::Binary
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn modified_at(&self) -> OffsetDateTime {
        self.modified_at
    }

    /// Length of `content` in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Raw bytes of the file, decoding the data URI of binary files.
    pub fn bytes(&self) -> Result<Vec<u8>, DataUriError> {
        match self.kind {
            FileKind::Text => Ok(self.content.as_bytes().to_vec()),
            FileKind::Binary => Ok(data_uri::decode(&self.content)?.bytes),
        }
    }
}

/// A folder record. Hierarchy is derived from path prefixes, never stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    path: VfsPath,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

impl Folder {
    pub(crate) fn new(path: VfsPath, created_at: OffsetDateTime) -> Self {
        Self { path, created_at }
    }

    pub fn path(&self) -> &VfsPath {
        &self.path
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }
}
