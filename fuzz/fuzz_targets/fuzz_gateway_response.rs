#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Errors are fine, panics are bugs.
        let _ = szamla::gateway::parse_token_exchange(s);
        let _ = szamla::gateway::parse_transaction_status(s);
        let _ = szamla::gateway::parse_error(500, s);
    }
});
