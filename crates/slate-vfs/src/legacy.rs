//! The flat `{ "files": [...], "folders": [...] }` JSON project format.
//!
//! Records are loaded as-is: no folder re-derivation, sizes recomputed from content.

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::archive::ProjectSnapshot;
use crate::entry::{File, FileKind, Folder};
use crate::error::ArchiveError;
use crate::path::VfsPath;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyProject {
    #[serde(default)]
    files: Vec<LegacyFile>,
    #[serde(default)]
    folders: Vec<LegacyFolder>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyFile {
    path: String,
    #[serde(default)]
    content: String,
    // Written for older readers; ignored on load.
    #[serde(default)]
    size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    modified_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyFolder {
    path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<String>,
}

pub(crate) fn decode(text: &str) -> Result<ProjectSnapshot, ArchiveError> {
    let project: LegacyProject = serde_json::from_str(text)?;
    let now = OffsetDateTime::now_utc();

    let files = project
        .files
        .into_iter()
        .map(|record| {
            let path = VfsPath::new(&record.path);
            let kind = FileKind::for_path(&path);
            let created_at = parse_timestamp(record.created_at.as_deref(), now);
            let modified_at = parse_timestamp(record.modified_at.as_deref(), created_at);
            File::with_timestamps(path, record.content, kind, created_at, modified_at)
        })
        .collect();
    let folders = project
        .folders
        .into_iter()
        .map(|record| {
            let created_at = parse_timestamp(record.created_at.as_deref(), now);
            Folder::new(VfsPath::new(&record.path), created_at)
        })
        .collect();

    Ok(ProjectSnapshot::new(files, folders))
}

pub(crate) fn encode(files: &[File], folders: &[Folder]) -> Result<String, ArchiveError> {
    let mut files: Vec<&File> = files.iter().collect();
    files.sort_by(|a, b| a.path().cmp(b.path()));
    let mut folders: Vec<&Folder> = folders.iter().collect();
    folders.sort_by(|a, b| a.path().cmp(b.path()));

    let project = LegacyProject {
        files: files
            .into_iter()
            .map(|file| LegacyFile {
                path: file.path().to_string(),
                content: file.content().to_owned(),
                size: file.size(),
                created_at: format_timestamp(file.created_at()),
                modified_at: format_timestamp(file.modified_at()),
            })
            .collect(),
        folders: folders
            .into_iter()
            .map(|folder| LegacyFolder {
                path: folder.path().to_string(),
                created_at: format_timestamp(folder.created_at()),
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&project)?)
}

fn parse_timestamp(raw: Option<&str>, fallback: OffsetDateTime) -> OffsetDateTime {
    let Some(raw) = raw else {
        return fallback;
    };
    match OffsetDateTime::parse(raw, &Rfc3339) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::debug!(target: "slate.vfs", raw, error = %err, "ignoring unparsable timestamp");
            fallback
        }
    }
}

fn format_timestamp(value: OffsetDateTime) -> Option<String> {
    value.format(&Rfc3339).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_minimal_project() {
        let snapshot = decode(
            r#"{"files":[{"path":"/x.txt","content":"hi","size":2,"createdAt":"2024-01-01T00:00:00.000Z"}],"folders":[]}"#,
        )
        .unwrap();
        let file = &snapshot.files()[0];
        assert_eq!(file.path(), &VfsPath::new("/x.txt"));
        assert_eq!(file.content(), "hi");
        assert_eq!(file.created_at().year(), 2024);
        // modifiedAt falls back to createdAt when absent.
        assert_eq!(file.modified_at(), file.created_at());
    }

    #[test]
    fn recomputes_size_and_normalizes_paths() {
        let snapshot =
            decode(r#"{"files":[{"path":"src\\a.js","content":"abc","size":99}]}"#).unwrap();
        let file = &snapshot.files()[0];
        assert_eq!(file.path().as_str(), "/src/a.js");
        assert_eq!(file.size(), 3);
        // No folder re-derivation for the legacy format.
        assert!(snapshot.folders().is_empty());
    }

    #[test]
    fn rejects_malformed_json() {
        let err = decode(r#"{"files": [ {"content": "no path"} ]}"#).unwrap_err();
        assert!(matches!(err, ArchiveError::LegacyJson(_)), "{err}");
    }

    #[test]
    fn encoded_output_is_readable_again() {
        let now = OffsetDateTime::now_utc();
        let files = vec![File::new(VfsPath::new("/b.txt"), "bee".into(), now)];
        let folders = vec![Folder::new(VfsPath::new("/docs"), now)];
        let json = encode(&files, &folders).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["files"][0]["size"], 3);
        assert_eq!(value["folders"][0]["path"], "/docs");

        let snapshot = decode(&json).unwrap();
        assert_eq!(snapshot.files()[0].content(), "bee");
        assert_eq!(snapshot.folders()[0].path().as_str(), "/docs");
    }
}
