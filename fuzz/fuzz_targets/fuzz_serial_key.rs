//! Fuzz target: canonical serial keys.
//!
//! The key of any textual serial must be stable when fed back in as a serial,
//! so a stored key always collides with the value that produced it.

#![no_main]

use libfuzzer_sys::fuzz_target;
use problemset_core::Serial;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let key = Serial::Text(text.to_owned()).key();
    let again = Serial::Text(key.as_str().to_owned()).key();
    assert_eq!(key, again, "key of {text:?} is not a fixed point");

    if let Ok(n) = text.trim().parse::<i64>() {
        assert_eq!(key, Serial::Number(n).key());
    }
});
