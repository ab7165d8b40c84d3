#![no_main]

use libfuzzer_sys::fuzz_target;
use std::path::PathBuf;

fuzz_target!(|data: &[u8]| {
    let Ok(file) = ir_root::RootFile::from_bytes(data.to_vec(), PathBuf::from("fuzz.root")) else {
        return;
    };
    if let Ok(keys) = file.list_keys() {
        for key in keys.iter().take(16) {
            let _ = file.get_histogram(&key.name);
        }
    }
    let _ = file.histograms();
});
