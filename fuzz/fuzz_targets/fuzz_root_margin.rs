#![no_main]

use folio_core::geometry::{Rect, RootMargin};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(margin) = RootMargin::parse(raw) else {
        return;
    };
    // Anything accepted must print back into accepted shorthand.
    let printed = margin.to_string();
    assert!(
        RootMargin::parse(&printed).is_ok(),
        "reprint of {raw:?} rejected: {printed:?}"
    );
    let _ = margin.apply(&Rect::new(0.0, 0.0, 1280.0, 800.0));
});
