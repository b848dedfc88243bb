#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Errors are fine, panics are bugs.
    if let Ok(doc) = tradesync::core::TradeDocument::from_json(data) {
        let _ = doc.flattened_rows();
    }
});
