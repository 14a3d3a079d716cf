//! Fuzz target for the textual selector parser and inspector.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_selector_parser
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use sift_query::ErrorCode;
use sift_query::selector::{inspect, parser};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    match parser::parse(input) {
        Ok(expr) => {
            if let Err(err) = inspect::field_names(&expr) {
                assert_eq!(err.code, ErrorCode::UnsupportedSelectorShape);
            }
        }
        Err(err) => assert_eq!(err.code, ErrorCode::InvalidSelectorSyntax),
    }
});
