use slate_config::{ImportConfig, SlateConfig};
use slate_vfs::Vfs;
use slate_workbench::{CancellationToken, UploadError, UploadItem, Uploader, Workbench};

fn write(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

#[tokio::test]
async fn uploads_text_and_binary_files() {
    let dir = tempfile::tempdir().unwrap();
    let text = write(&dir, "app.js", b"console.log(1);");
    let image = write(&dir, "logo.png", &[0x89, b'P', b'N', b'G']);

    let vfs = Vfs::empty();
    let uploader = Uploader::new(vfs.clone(), ImportConfig::default());
    let report = uploader
        .upload(
            vec![
                UploadItem::new("js/app.js", text),
                UploadItem::new("img/logo.png", image),
            ],
            "/assets",
            &CancellationToken::new(),
        )
        .await;

    assert!(report.is_complete(), "{report:?}");
    assert_eq!(
        vfs.read_file("/assets/js/app.js").unwrap().content(),
        "console.log(1);"
    );
    let logo = vfs.read_file("/assets/img/logo.png").unwrap();
    assert!(logo.is_binary());
    assert_eq!(logo.bytes().unwrap(), vec![0x89, b'P', b'N', b'G']);
    assert!(vfs.folder_exists("/assets"));
    assert!(vfs.folder_exists("/assets/img"));
}

#[tokio::test]
async fn failures_are_reported_per_item() {
    let dir = tempfile::tempdir().unwrap();
    let small = write(&dir, "small.txt", b"ok");
    let big = write(&dir, "big.txt", &[b'x'; 64]);

    let vfs = Vfs::empty();
    let limits = ImportConfig {
        max_file_bytes: 16,
        max_concurrency: 2,
    };
    let uploader = Uploader::new(vfs.clone(), limits);
    let report = uploader
        .upload(
            vec![
                UploadItem::new("small.txt", small),
                UploadItem::new("big.txt", big),
                UploadItem::new("gone.txt", dir.path().join("missing.txt")),
                UploadItem::new("../escape.txt", dir.path().join("small.txt")),
            ],
            "/",
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(report.created().map(|p| p.as_str()).collect::<Vec<_>>(), vec!["/small.txt"]);
    let results: Vec<_> = report.outcomes.iter().map(|o| &o.result).collect();
    assert!(matches!(results[1], Err(UploadError::TooLarge { size: 64, limit: 16, .. })));
    assert!(matches!(results[2], Err(UploadError::Io { .. })));
    assert!(matches!(results[3], Err(UploadError::InvalidPath(_))));
    assert_eq!(vfs.file_count(), 1);
}

#[tokio::test]
async fn cancelled_upload_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(&dir, "a.txt", b"a");
    let vfs = Vfs::empty();
    let uploader = Uploader::new(vfs.clone(), ImportConfig::default());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = uploader
        .upload(vec![UploadItem::new("a.txt", file)], "/", &cancel)
        .await;

    assert!(matches!(report.outcomes[0].result, Err(UploadError::Cancelled)));
    assert_eq!(vfs.file_count(), 0);
}

#[tokio::test]
async fn uploaded_files_show_up_in_workbench_preview() {
    let dir = tempfile::tempdir().unwrap();
    let css = write(&dir, "extra.css", b"p{}");
    let workbench = Workbench::new(SlateConfig::default());
    let before = workbench.refresher().generation();

    workbench
        .uploader()
        .upload(vec![UploadItem::new("extra.css", css)], "/", &CancellationToken::new())
        .await;

    assert!(workbench.refresher().generation() > before);
    let page = slate_vfs::VfsPath::new("/index.html");
    assert!(matches!(
        workbench.preview().resolve_asset(&page, "extra.css?v=2"),
        slate_workbench::AssetResolution::Found(_)
    ));
}
