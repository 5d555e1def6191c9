#![no_main]

use libfuzzer_sys::fuzz_target;
use sqlgate_guard::{KeywordPolicy, Validator};

fuzz_target!(|data: &[u8]| {
    if let Ok(sql) = std::str::from_utf8(data) {
        let _ = Validator::new(KeywordPolicy::default()).validate(sql);
    }
});
