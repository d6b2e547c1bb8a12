#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Parse → convert must not panic at any step.
        if let Ok(invoice) = szamla::core::Invoice::from_json(s) {
            let _ = szamla::nav::to_nav_xml(&invoice);
        }
    }
});
