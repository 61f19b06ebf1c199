// Run locally:
//   cargo +nightly fuzz run fuzz_path_normalize -- -runs=10000
#![no_main]

use libfuzzer_sys::fuzz_target;
use slate_vfs::path::{directory_of, is_within, join, name_of, normalize};

mod utils;

fuzz_target!(|data: &[u8]| {
    let Some(text) = utils::truncate_utf8(data) else {
        return;
    };

    let canonical = normalize(text);
    assert_eq!(normalize(&canonical), canonical, "normalize is idempotent");
    assert!(canonical.starts_with('/'));
    assert!(!canonical.contains("//"));
    assert!(!canonical.contains('\\'));

    let parent = directory_of(&canonical);
    let name = name_of(&canonical);
    if canonical != "/" {
        assert!(is_within(&canonical, &parent));
        assert_eq!(join(&parent, &name), canonical);
    } else {
        assert!(name.is_empty());
    }
});
