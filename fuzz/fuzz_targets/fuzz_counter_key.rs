#![no_main]

use folio_core::counter_key::{CounterKey, slugify};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|label: &str| {
    let slug = slugify(label);
    assert!(slug.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-'));
    assert!(!slug.starts_with('-') && !slug.ends_with('-'));
    assert!(!slug.contains("--"));
    assert_eq!(slugify(&slug), slug);

    let key = CounterKey::project("folio", label);
    let url = key.hit_url("https://counter.test");
    assert!(url.starts_with("https://counter.test/"));
    assert!(!url.contains(' '));
});
