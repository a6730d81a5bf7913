#![no_main]
use libfuzzer_sys::fuzz_target;

// The locator must reject arbitrary bytes without panicking; a rejected
// candidate is a search miss, never an error.
fuzz_target!(|data: &[u8]| {
    let _ = rfax_xml::locate_embedded_xml(data);
});
