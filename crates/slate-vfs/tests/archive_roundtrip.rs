use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use slate_vfs::data_uri;
use slate_vfs::{ArchiveError, ProjectFormat, Vfs, VfsEventKind};

fn contents(vfs: &Vfs) -> BTreeMap<String, String> {
    vfs.all_files()
        .into_iter()
        .map(|f| (f.path().to_string(), f.content().to_owned()))
        .collect()
}

fn sample_project() -> Vfs {
    let vfs = Vfs::empty();
    vfs.create_folder("/src");
    vfs.create_folder("/assets");
    vfs.create_folder("/empty");
    vfs.create_file("/index.html", "<h1>hi</h1>");
    vfs.create_file("/src/app.js", "console.log('ü');\n");
    vfs.create_file(
        "/assets/logo.png",
        data_uri::encode("image/png", &[0x89, 0x50, 0x4E, 0x47, 0x00, 0xFF, 0x10]),
    );
    vfs.create_file("/assets/font.woff2", data_uri::encode("font/woff2", b"wOF2\0\0"));
    vfs
}

#[tokio::test]
async fn export_then_import_preserves_every_file() {
    let source = sample_project();
    let before = contents(&source);
    let archive = source.export_project().await.unwrap();

    let target = Vfs::new();
    let summary = target.import_project(archive.into_bytes()).await.unwrap();

    assert_eq!(summary.format, ProjectFormat::Zip);
    assert_eq!(summary.file_count, 4);
    assert_eq!(contents(&target), before);
    assert!(target.read_file("/assets/logo.png").unwrap().is_binary());
    assert!(target.folder_exists("/empty"));
    assert!(!target.file_exists("/README.md"), "import replaces contents");
}

#[test]
fn import_fires_single_project_imported_event() {
    let archive = sample_project().export_archive().unwrap();
    let target = Vfs::empty();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    target.watch(move |event| sink.lock().unwrap().push(event.kind()));

    target.import_bytes(archive.as_bytes()).unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![VfsEventKind::ProjectImported]);
}

#[test]
fn malformed_archive_leaves_contents_intact() {
    let vfs = sample_project();
    let before = contents(&vfs);
    let seen = Arc::new(Mutex::new(0usize));
    let sink = seen.clone();
    vfs.watch(move |_| *sink.lock().unwrap() += 1);

    let err = vfs.import_bytes(b"PK\x03\x04 truncated garbage").unwrap_err();
    assert!(matches!(err, ArchiveError::Malformed { .. }), "{err}");
    let err = vfs.import_bytes(b"not a project").unwrap_err();
    assert!(matches!(err, ArchiveError::UnrecognizedPayload), "{err}");
    let err = vfs.import_bytes(b"{\"files\": 3}").unwrap_err();
    assert!(matches!(err, ArchiveError::LegacyJson(_)), "{err}");

    assert_eq!(contents(&vfs), before);
    assert_eq!(*seen.lock().unwrap(), 0);
}

#[test]
fn legacy_json_payload_is_imported() {
    let vfs = Vfs::new();
    let payload = br#"{"files":[{"path":"/x.txt","content":"hi","size":2,"createdAt":"2024-05-01T10:00:00.000Z","modifiedAt":"2024-05-02T10:00:00.000Z"}],"folders":[]}"#;

    let summary = vfs.import_bytes(payload).unwrap();

    assert_eq!(summary.format, ProjectFormat::LegacyJson);
    let file = vfs.read_file("/x.txt").unwrap();
    assert_eq!(file.content(), "hi");
    assert_eq!(file.size(), 2);
    assert_eq!(vfs.file_count(), 1);
}

#[test]
fn legacy_json_export_round_trips() {
    let source = sample_project();
    let json = source.export_legacy_json().unwrap();

    let target = Vfs::empty();
    target.import_bytes(json.as_bytes()).unwrap();

    assert_eq!(contents(&target), contents(&source));
    assert_eq!(target.folder_count(), source.folder_count());
}

#[test]
fn empty_binary_file_does_not_block_export() {
    let source = Vfs::empty();
    source.create_file("/index.html", "<p>");
    source.create_file("/img.png", "");

    let archive = source.export_archive().unwrap();
    assert_eq!(archive.read("img.png").unwrap().unwrap(), b"");

    let target = Vfs::empty();
    target.import_bytes(archive.as_bytes()).unwrap();
    assert_eq!(contents(&target), contents(&source));
    assert!(target.read_file("/img.png").unwrap().is_binary());
}

#[test]
fn legacy_binary_record_without_data_uri_exports() {
    let vfs = Vfs::empty();
    let payload = br#"{"files":[{"path":"/raw.png","content":"PNG?","size":4}],"folders":[]}"#;
    vfs.import_bytes(payload).unwrap();

    let archive = vfs.export_archive().unwrap();

    assert_eq!(archive.read("raw.png").unwrap().unwrap(), b"PNG?");
}

#[test]
fn renames_across_text_and_binary_survive_round_trip() {
    let source = Vfs::empty();
    source.create_file("/notes.txt", "hi");
    source.create_file("/pic.png", data_uri::encode("image/png", &[0x89, 0xFF, 0x00]));
    source.rename_file("/notes.txt", "/notes.png");
    source.rename_file("/pic.png", "/pic.txt");
    assert!(source.read_file("/notes.png").unwrap().is_binary());
    assert!(!source.read_file("/pic.txt").unwrap().is_binary());

    let target = Vfs::empty();
    target
        .import_bytes(source.export_archive().unwrap().as_bytes())
        .unwrap();

    assert_eq!(contents(&target), contents(&source));
    assert_eq!(
        target.read_file("/notes.png").unwrap().bytes().unwrap(),
        b"hi"
    );
}
