#![no_main]

use libfuzzer_sys::fuzz_target;
use rece_formats::core::RecordCodec;
use rece_formats::txt::{decode_latin1, read_txt, write_txt};

fuzz_target!(|data: &[u8]| {
    let codec = RecordCodec::default();
    let batch = read_txt(&decode_latin1(data), &codec);
    // Re-encoding what was read must succeed and read back the same number of invoices.
    if let Ok(text) = write_txt(&batch.invoices, &codec) {
        let again = read_txt(&text, &codec);
        assert_eq!(again.invoices.len(), batch.invoices.len());
    }
});
