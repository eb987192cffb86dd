//! Fuzz target: catalog payload validation.
//!
//! Arbitrary bytes are parsed as a JSON payload and validated. Validation may
//! reject the input but must never panic, and an accepted draft must carry no
//! raw HTML metacharacters in its text fields.

#![no_main]

use libfuzzer_sys::fuzz_target;
use problemset_core::{validate_problem, ProblemInput, Serial};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = serde_json::from_slice::<ProblemInput>(data) else {
        return;
    };
    let Ok(draft) = validate_problem(&input) else {
        return;
    };

    for text in [draft.title.as_str(), draft.topic.as_str()] {
        assert!(!text.contains(['<', '>', '"', '\'']), "unescaped text: {text:?}");
        assert_eq!(text, text.trim());
    }
    if let Serial::Text(serial) = &draft.serial {
        assert!(!serial.contains(['<', '>']), "unescaped serial: {serial:?}");
    }
    assert!(draft.question_link.starts_with("http"));
    assert!(draft.solution_link.is_empty() || draft.solution_link.starts_with("http"));
});
