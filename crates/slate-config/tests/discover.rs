use slate_config::{discover_config_path, load_for_root, SlateConfig, SLATE_CONFIG_ENV_VAR};

// Discovery reads a process-global env var, so every scenario runs in one test.
#[test]
fn discovery_order_and_loading() {
    std::env::remove_var(SLATE_CONFIG_ENV_VAR);

    let root = tempfile::tempdir().unwrap();
    let (config, path) = load_for_root(root.path()).unwrap();
    assert_eq!(config, SlateConfig::default());
    assert_eq!(path, None);

    std::fs::write(
        root.path().join(".slate.toml"),
        "[editor]\ntab_width = 8\n",
    )
    .unwrap();
    assert_eq!(
        discover_config_path(root.path()),
        Some(root.path().join(".slate.toml"))
    );

    std::fs::write(
        root.path().join("slate.toml"),
        "[editor]\ntab_width = 4\nword_wrap = true\n",
    )
    .unwrap();
    let (config, path) = load_for_root(root.path()).unwrap();
    assert_eq!(path, Some(root.path().join("slate.toml")));
    assert_eq!(config.editor.tab_width, 4);
    assert!(config.editor.word_wrap);

    std::fs::write(root.path().join("custom.toml"), "[import]\nmax_concurrency = 2\n").unwrap();
    std::env::set_var(SLATE_CONFIG_ENV_VAR, "custom.toml");
    let (config, path) = load_for_root(root.path()).unwrap();
    std::env::remove_var(SLATE_CONFIG_ENV_VAR);
    assert_eq!(path, Some(root.path().join("custom.toml")));
    assert_eq!(config.import.max_concurrency, 2);
}

#[test]
fn unknown_keys_are_reported() {
    let (config, diagnostics) = SlateConfig::load_from_str_with_diagnostics(
        "[editor]\nfontsize = 20\n\n[theme]\nname = \"dark\"\n",
    )
    .unwrap();
    assert_eq!(config.editor.font_size, 14);
    assert_eq!(
        diagnostics.unknown_keys,
        vec!["editor.fontsize".to_owned(), "theme".to_owned()]
    );
}

#[test]
fn missing_file_is_an_io_error() {
    let root = tempfile::tempdir().unwrap();
    let err = SlateConfig::load_from_path(root.path().join("absent.toml")).unwrap_err();
    assert!(err.to_string().contains("absent.toml"), "{err}");
}
