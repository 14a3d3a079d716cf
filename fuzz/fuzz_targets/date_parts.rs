//! Fuzz target for decomposed-date evaluation.
//!
//! Arbitrary components must either agree with chrono within the supported
//! years or fail with `DateConstructionError`; nothing may be clamped or panic.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_date_parts
//! ```

#![no_main]

use arbitrary::Arbitrary;
use chrono::NaiveDate;
use libfuzzer_sys::fuzz_target;
use sift_query::strategy::{SUPPORTED_YEARS, date_from_parts};
use sift_query::{ErrorCode, FieldDef, FieldType, FilterValue, Record};

#[derive(Debug, Arbitrary)]
struct Parts {
    year: i64,
    month: i64,
    day: i64,
}

impl Record for Parts {
    const RECORD_NAME: &'static str = "Parts";
    const TABLE_NAME: &'static str = "parts";
    const FIELDS: &'static [FieldDef] = &[
        FieldDef::required("year", FieldType::Int),
        FieldDef::required("month", FieldType::Int),
        FieldDef::required("day", FieldType::Int),
    ];

    fn value(&self, field: &str) -> FilterValue {
        match field {
            "year" => self.year.into(),
            "month" => self.month.into(),
            "day" => self.day.into(),
            _ => FilterValue::Null,
        }
    }
}

fuzz_target!(|parts: Parts| {
    let expected = match (i32::try_from(parts.year), u32::try_from(parts.month), u32::try_from(parts.day)) {
        (Ok(y), Ok(m), Ok(d)) if SUPPORTED_YEARS.contains(&parts.year) => NaiveDate::from_ymd_opt(y, m, d),
        _ => None,
    };

    match date_from_parts(&parts, "year", "month", "day") {
        Ok(date) => assert_eq!(Some(date), expected),
        Err(err) => {
            assert!(expected.is_none());
            assert_eq!(err.code, ErrorCode::DateConstructionError);
        }
    }
});
