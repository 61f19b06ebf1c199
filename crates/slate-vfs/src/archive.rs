//! Project export/import through the zip container.
//!
//! Every file becomes one entry named after its path without the leading slash. Binary files are
//! stored as their decoded bytes, text files as UTF-8. Folders are written as directory entries so
//! empty folders survive a round trip; on import the folder set is additionally re-derived from
//! every entry's ancestor chain, so archives produced elsewhere need no directory entries at all.
//! An empty entry imports as an empty file of either kind.

use std::collections::{BTreeMap, BTreeSet};

use slate_archive::{looks_like_zip, Archive, ArchiveBuilder};
use time::OffsetDateTime;

use crate::classify::{is_binary_path, mime_for_path};
use crate::data_uri;
use crate::entry::{File, Folder};
use crate::error::ArchiveError;
use crate::legacy;
use crate::path::VfsPath;

/// Fully decoded project contents that have not been applied to a VFS yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectSnapshot {
    pub(crate) files: Vec<File>,
    pub(crate) folders: Vec<Folder>,
}

impl ProjectSnapshot {
    pub(crate) fn new(files: Vec<File>, folders: Vec<Folder>) -> Self {
        Self { files, folders }
    }

    pub fn files(&self) -> &[File] {
        &self.files
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn folder_count(&self) -> usize {
        self.folders.len()
    }
}

/// Serialization format of an import payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectFormat {
    Zip,
    LegacyJson,
}

impl ProjectFormat {
    /// Sniffs the payload: zip local/end-of-central-directory magic, or a JSON object.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if looks_like_zip(bytes) {
            return Some(ProjectFormat::Zip);
        }
        // A UTF-8 BOM is tolerated in front of the JSON object.
        let body = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
        let first = body.iter().copied().find(|b| !b.is_ascii_whitespace());
        match first {
            Some(b'{') => Some(ProjectFormat::LegacyJson),
            _ => None,
        }
    }
}

/// Result of a successful import, as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub format: ProjectFormat,
    pub file_count: usize,
    pub folder_count: usize,
}

/// Packs the given files and folders into a zip archive.
///
/// Entries are written in path order so identical projects produce identical archives.
pub fn encode_project(files: &[File], folders: &[Folder]) -> Result<Archive, ArchiveError> {
    let mut builder = ArchiveBuilder::new();

    let mut folder_paths: Vec<&VfsPath> = folders
        .iter()
        .map(Folder::path)
        .filter(|path| !path.is_root())
        .collect();
    folder_paths.sort();
    for path in folder_paths {
        builder
            .add_directory(path.relative())
            .map_err(ArchiveError::malformed)?;
    }

    let mut sorted: Vec<&File> = files.iter().collect();
    sorted.sort_by(|a, b| a.path().cmp(b.path()));
    for file in sorted {
        builder
            .add_file(file.path().relative(), &entry_bytes(file))
            .map_err(ArchiveError::malformed)?;
    }

    builder.finish().map_err(ArchiveError::malformed)
}

/// Bytes stored for `file`.
///
/// A binary file whose content is not a data URI (an empty placeholder, or plain text from a
/// legacy payload) is stored as its content bytes rather than failing the whole export.
fn entry_bytes(file: &File) -> Vec<u8> {
    match file.bytes() {
        Ok(bytes) => bytes,
        Err(_) if file.content().is_empty() => Vec::new(),
        Err(err) => {
            tracing::warn!(
                target: "slate.vfs",
                path = %file.path(),
                error = %err,
                "binary file does not hold a data URI; exporting its content as-is"
            );
            file.content().as_bytes().to_vec()
        }
    }
}

/// Decodes a zip archive into a snapshot without touching any VFS.
pub fn decode_archive(archive: &Archive) -> Result<ProjectSnapshot, ArchiveError> {
    let entries = archive.entries().map_err(ArchiveError::malformed)?;
    let now = OffsetDateTime::now_utc();

    let mut folders: BTreeSet<VfsPath> = BTreeSet::new();
    let mut files: BTreeMap<VfsPath, File> = BTreeMap::new();

    for entry in entries {
        let path = VfsPath::new(&entry.name);
        if path.is_root() {
            continue;
        }
        if entry.is_dir {
            insert_with_ancestors(&mut folders, path);
            continue;
        }

        let parent = path.parent();
        if !parent.is_root() {
            insert_with_ancestors(&mut folders, parent);
        }

        let content = if entry.data.is_empty() {
            String::new()
        } else if is_binary_path(path.as_str()) {
            data_uri::encode(mime_for_path(path.as_str()), &entry.data)
        } else {
            match String::from_utf8(entry.data) {
                Ok(text) => text,
                Err(err) => {
                    tracing::warn!(
                        target: "slate.vfs",
                        path = %path,
                        "text entry is not valid UTF-8; decoding lossily"
                    );
                    String::from_utf8_lossy(err.as_bytes()).into_owned()
                }
            }
        };
        // Later duplicates of the same name win, matching zip extraction tools.
        files.insert(path.clone(), File::new(path, content, now));
    }

    let folders = folders
        .into_iter()
        .map(|path| Folder::new(path, now))
        .collect();
    Ok(ProjectSnapshot::new(files.into_values().collect(), folders))
}

/// Decodes either supported payload format.
pub fn decode_payload(bytes: &[u8]) -> Result<(ProjectFormat, ProjectSnapshot), ArchiveError> {
    match ProjectFormat::detect(bytes) {
        Some(ProjectFormat::Zip) => {
            let archive = Archive::from_bytes(bytes.to_vec());
            Ok((ProjectFormat::Zip, decode_archive(&archive)?))
        }
        Some(ProjectFormat::LegacyJson) => {
            let text = String::from_utf8_lossy(bytes);
            let text = text.trim_start_matches('\u{feff}');
            Ok((ProjectFormat::LegacyJson, legacy::decode(text)?))
        }
        None => Err(ArchiveError::UnrecognizedPayload),
    }
}

fn insert_with_ancestors(folders: &mut BTreeSet<VfsPath>, path: VfsPath) {
    let mut current = path;
    while !current.is_root() {
        let parent = current.parent();
        if !folders.insert(current) {
            // Already present, so its ancestors are too.
            return;
        }
        current = parent;
    }
}
