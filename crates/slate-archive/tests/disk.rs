use slate_archive::{Archive, ArchiveBuilder};

#[test]
fn saved_archive_reopens_with_same_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.zip");

    let mut builder = ArchiveBuilder::new();
    builder.add_file("README.md", b"# hello").unwrap();
    builder.add_file("src/app.js", b"console.log(1)").unwrap();
    builder.finish().unwrap().save(&path).unwrap();

    let reopened = Archive::open(&path).unwrap();
    assert_eq!(
        reopened.entry_names().unwrap(),
        vec!["README.md".to_owned(), "src/app.js".to_owned()]
    );
    assert_eq!(
        reopened.read("src/app.js").unwrap().as_deref(),
        Some(b"console.log(1)".as_slice())
    );
}

#[test]
fn opening_missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.zip");
    let err = Archive::open(&path).unwrap_err();
    assert!(format!("{err:#}").contains("nope.zip"), "{err:#}");
}
