#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sqlgate_guard::{KeywordPolicy, Validator};

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    sql: &'a str,
    extra_keyword: &'a str,
}

fuzz_target!(|input: Input<'_>| {
    let policy = KeywordPolicy::default().with(input.extra_keyword);
    let _ = Validator::new(policy).validate(input.sql);
});
