#![no_main]
use libfuzzer_sys::fuzz_target;

// Repair is a bounded one-shot pass and must be idempotent.
fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let once = rfax_xml::repair::repair_xml(text);
        assert_eq!(rfax_xml::repair::repair_xml(&once), once);
    }
});
