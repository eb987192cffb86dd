//! Fuzz target: protected path classification.
//!
//! Classification must never panic and must agree with a segment-wise
//! comparison of the path.

#![no_main]

use libfuzzer_sys::fuzz_target;
use problemset_gateway::gate::PathGroup;

fuzz_target!(|path: &str| {
    let group = PathGroup::classify(path);
    let mut segments = path.split('/').skip(1);
    let expected = match (segments.next(), segments.next()) {
        (Some("api"), Some("problems")) if path.starts_with("/api/problems") => Some(PathGroup::Problems),
        (Some("api"), Some("admin-auth")) if path.starts_with("/api/admin-auth") => Some(PathGroup::AdminAuth),
        _ => None,
    };
    assert_eq!(group, expected, "path {path:?}");
});
