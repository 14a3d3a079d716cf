//! Fuzz target for the `sift.toml` parser.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_config_parser
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use sift_query::{ErrorCode, SiftConfig};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // The parser should never panic, only return errors
        if let Err(err) = input.parse::<SiftConfig>() {
            assert_eq!(err.code, ErrorCode::InvalidConfiguration);
        }
    }
});
