// Run locally:
//   cargo +nightly fuzz run fuzz_project_import -- -runs=10000
#![no_main]

use libfuzzer_sys::fuzz_target;
use slate_vfs::Vfs;

mod utils;

fuzz_target!(|data: &[u8]| {
    let data = &data[..data.len().min(utils::MAX_INPUT_SIZE)];

    // Oracle: never panic; on failure the previous contents stay untouched.
    let vfs = Vfs::new();
    let before = vfs.file_count();
    match vfs.import_bytes(data) {
        Ok(summary) => {
            assert_eq!(vfs.file_count(), summary.file_count);
            let _ = vfs.file_tree();
            let _ = vfs.export_archive();
        }
        Err(_) => assert_eq!(vfs.file_count(), before),
    }

    let _ = slate_archive::Archive::from_bytes(data.to_vec()).entry_names();
});
