#![no_main]

use libfuzzer_sys::fuzz_target;
use tradesync::core::TradeDocument;

fuzz_target!(|data: &[u8]| {
    // Whatever parses must survive a write and a second parse unchanged.
    if let Ok(doc) = TradeDocument::from_json(data) {
        let bytes = doc.to_json().unwrap();
        let again = TradeDocument::from_json(&bytes).unwrap();
        assert_eq!(again, doc);
    }
});
