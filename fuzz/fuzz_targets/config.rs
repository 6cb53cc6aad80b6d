#![no_main]

use std::path::Path;

use iree_suite_core::TestConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Configuration documents are UTF-8 JSON; anything else is rejected before parsing
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = TestConfig::from_json_str(s, Path::new("fuzz.json"));
    }
});
