#![no_main]

use libfuzzer_sys::fuzz_target;
use sqlgate_guard::Lexer;

fuzz_target!(|data: &[u8]| {
    if let Ok(sql) = std::str::from_utf8(data) {
        let mut last_start = 0;
        for token in Lexer::new(sql) {
            // Tokens must cover valid, forward-moving slices.
            assert!(token.start >= last_start);
            assert!(token.start + token.text.len() <= sql.len());
            last_start = token.start;
        }
    }
});
