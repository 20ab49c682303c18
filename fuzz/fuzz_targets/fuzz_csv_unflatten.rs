#![no_main]

use libfuzzer_sys::fuzz_target;
use rece_formats::core::TabularFlattener;

fuzz_target!(|data: &[u8]| {
    if let Ok(table) = rece_formats::sheet::read_csv(data) {
        let flattener = TabularFlattener::default();
        if let Ok(invoices) = flattener.unflatten(&table) {
            let table = flattener.flatten(&invoices);
            assert!(table.rows.iter().all(|r| r.len() == table.header.len()));
        }
    }
});
