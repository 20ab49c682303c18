#![no_main]

use libfuzzer_sys::fuzz_target;
use rece_formats::core::RecordCodec;

fuzz_target!(|data: &[u8]| {
    // Every byte sequence is valid Latin-1, so this exercises the line reader directly.
    let text = rece_formats::txt::decode_latin1(data);
    let _ = rece_formats::txt::read_txt(&text, &RecordCodec::default());
});
