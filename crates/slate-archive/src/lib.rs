//! In-memory zip containers for project export and import.
//!
//! This crate only knows about named byte entries. Mapping entries to files and folders (and
//! deciding which entries are binary) is the job of `slate-vfs`.

use std::borrow::Cow;
use std::fs::File;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use anyhow::Context;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Local file header magic of a zip container.
const ZIP_LOCAL_HEADER_MAGIC: &[u8] = b"PK\x03\x04";
/// End-of-central-directory magic; an archive without entries starts with it.
const ZIP_EMPTY_MAGIC: &[u8] = b"PK\x05\x06";

/// Returns `true` when `bytes` start like a zip container.
#[must_use]
pub fn looks_like_zip(bytes: &[u8]) -> bool {
    bytes.starts_with(ZIP_LOCAL_HEADER_MAGIC) || bytes.starts_with(ZIP_EMPTY_MAGIC)
}

/// Strips leading separators and converts `\` to `/`.
///
/// Some zip producers (notably on Windows) write backslash-separated names.
pub fn normalize_entry_name(name: &str) -> Cow<'_, str> {
    let name = name.trim_start_matches(['/', '\\']);
    if name.contains('\\') {
        Cow::Owned(name.replace('\\', "/"))
    } else {
        Cow::Borrowed(name)
    }
}

/// One entry of an [`Archive`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Entry name with separators normalized and no leading slash.
    pub name: String,
    /// Uncompressed entry contents. Empty for directories.
    pub data: Vec<u8>,
    pub is_dir: bool,
}

/// A complete zip container held in memory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Archive {
    bytes: Vec<u8>,
}

impl Archive {
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Loads a zip container from disk.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let mut bytes = Vec::new();
        File::open(path)
            .with_context(|| format!("failed to open archive {}", path.display()))?
            .read_to_end(&mut bytes)
            .with_context(|| format!("failed to read archive {}", path.display()))?;
        Ok(Self { bytes })
    }

    /// Writes the container to disk, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        std::fs::write(path, &self.bytes)
            .with_context(|| format!("failed to write archive {}", path.display()))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    fn zip(&self) -> anyhow::Result<ZipArchive<Cursor<&[u8]>>> {
        ZipArchive::new(Cursor::new(self.bytes.as_slice())).context("failed to read zip container")
    }

    /// Names of every entry in central-directory order.
    pub fn entry_names(&self) -> anyhow::Result<Vec<String>> {
        let zip = self.zip()?;
        Ok(zip
            .file_names()
            .map(|name| normalize_entry_name(name).into_owned())
            .collect())
    }

    /// Read a single entry.
    ///
    /// Returns `Ok(None)` when the entry isn't present.
    pub fn read(&self, name: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let wanted = normalize_entry_name(name);
        let mut zip = self.zip()?;
        for idx in 0..zip.len() {
            let mut entry = zip
                .by_index(idx)
                .with_context(|| format!("failed to read zip entry #{idx}"))?;
            if normalize_entry_name(entry.name()) != wanted || entry.is_dir() {
                continue;
            }
            let mut buf = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut buf)
                .with_context(|| format!("failed to read {wanted} from zip"))?;
            return Ok(Some(buf));
        }
        Ok(None)
    }

    /// Decompresses every entry.
    ///
    /// Fails on the first unreadable entry so callers never see a partial listing.
    pub fn entries(&self) -> anyhow::Result<Vec<ArchiveEntry>> {
        let mut zip = self.zip()?;
        let mut out = Vec::with_capacity(zip.len());
        for idx in 0..zip.len() {
            let mut entry = zip
                .by_index(idx)
                .with_context(|| format!("failed to read zip entry #{idx}"))?;
            let name = normalize_entry_name(entry.name()).into_owned();
            if entry.is_dir() {
                out.push(ArchiveEntry {
                    name: name.trim_end_matches('/').to_owned(),
                    data: Vec::new(),
                    is_dir: true,
                });
                continue;
            }
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut data)
                .with_context(|| format!("failed to decompress {name}"))?;
            out.push(ArchiveEntry {
                name,
                data,
                is_dir: false,
            });
        }
        tracing::debug!(target: "slate.archive", entries = out.len(), "read zip container");
        Ok(out)
    }
}

/// Incrementally builds an [`Archive`] with deflate-compressed entries.
pub struct ArchiveBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
    entries: usize,
}

impl std::fmt::Debug for ArchiveBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveBuilder")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
            entries: 0,
        }
    }

    pub fn add_file(&mut self, name: &str, data: &[u8]) -> anyhow::Result<()> {
        let name = normalize_entry_name(name);
        self.writer
            .start_file(name.as_ref(), self.options)
            .with_context(|| format!("failed to start zip entry {name}"))?;
        self.writer
            .write_all(data)
            .with_context(|| format!("failed to write zip entry {name}"))?;
        self.entries += 1;
        Ok(())
    }

    pub fn add_directory(&mut self, name: &str) -> anyhow::Result<()> {
        let name = normalize_entry_name(name);
        let name = name.trim_end_matches('/');
        self.writer
            .add_directory(name, self.options)
            .with_context(|| format!("failed to add zip directory {name}"))?;
        self.entries += 1;
        Ok(())
    }

    pub fn finish(self) -> anyhow::Result<Archive> {
        let cursor = self
            .writer
            .finish()
            .context("failed to finalize zip container")?;
        tracing::debug!(target: "slate.archive", entries = self.entries, "wrote zip container");
        Ok(Archive::from_bytes(cursor.into_inner()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_output_is_readable() {
        let mut builder = ArchiveBuilder::new();
        builder.add_directory("assets/").unwrap();
        builder.add_file("assets/logo.png", &[0x89, b'P', b'N', b'G']).unwrap();
        builder.add_file("/index.html", b"<html></html>").unwrap();
        let archive = builder.finish().unwrap();

        assert!(looks_like_zip(archive.as_bytes()));
        assert_eq!(
            archive.read("index.html").unwrap().as_deref(),
            Some(b"<html></html>".as_slice())
        );
        assert_eq!(archive.read("missing.txt").unwrap(), None);

        let entries = archive.entries().unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries[0].is_dir);
        assert_eq!(entries[0].name, "assets");
        assert_eq!(entries[1].data, vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn normalizes_windows_entry_names() {
        assert_eq!(normalize_entry_name("\\src\\main.js"), "src/main.js");
        assert_eq!(normalize_entry_name("//a/b"), "a/b");
        assert!(matches!(normalize_entry_name("a/b"), Cow::Borrowed(_)));
    }

    #[test]
    fn garbage_is_rejected() {
        let archive = Archive::from_bytes(b"definitely not a zip".to_vec());
        assert!(!looks_like_zip(archive.as_bytes()));
        assert!(archive.entries().is_err());
        assert!(archive.read("a").is_err());
    }

    #[test]
    fn empty_builder_produces_empty_container() {
        let archive = ArchiveBuilder::new().finish().unwrap();
        assert!(looks_like_zip(archive.as_bytes()));
        assert!(archive.entries().unwrap().is_empty());
    }
}
