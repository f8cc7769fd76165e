#![no_main]

use arbitrary::Arbitrary;
use folio_runtime::view_counter::parse_hit_response;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct HitResponse {
    status: u16,
    body: String,
}

fuzz_target!(|input: HitResponse| {
    if let Ok(_count) = parse_hit_response(input.status, &input.body) {
        assert!((200..300).contains(&input.status));
    }
});
