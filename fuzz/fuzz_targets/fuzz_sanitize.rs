#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        for error in gstlink::classify::sanitize_error_message(s) {
            assert!(!error.contains(':') || !s.contains(" : "));
        }
    }
});
