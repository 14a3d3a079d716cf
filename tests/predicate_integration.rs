//! Integration tests for predicate construction, evaluation and translation.
//!
//! These tests exercise the public API the way an application would: define
//! a record, build predicates from selectors, then run them in memory and
//! render them for pushdown.

use std::sync::{Arc, Mutex};
use std::thread;

use chrono::{Datelike, NaiveDate};
use pretty_assertions::assert_eq;
use sift::prelude::*;
use sift::{BoxFuture, Operand, where_max};

#[derive(Debug, Clone, PartialEq)]
struct Archive {
    year: i64,
    month: i64,
    day: i64,
    stored_on: NaiveDate,
    purged_on: Option<NaiveDate>,
    checked_on: NaiveDate,
}

impl Archive {
    fn new(year: i64, month: i64, day: i64) -> Self {
        let stored_on = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32).unwrap();
        Self {
            year,
            month,
            day,
            stored_on,
            purged_on: None,
            checked_on: stored_on,
        }
    }
}

impl Record for Archive {
    const RECORD_NAME: &'static str = "Archive";
    const TABLE_NAME: &'static str = "archives";
    const FIELDS: &'static [FieldDef] = &[
        FieldDef::required("year", FieldType::Int),
        FieldDef::required("month", FieldType::Int),
        FieldDef::required("day", FieldType::Int),
        FieldDef::required("stored_on", FieldType::Date),
        FieldDef::optional("purged_on", FieldType::Date),
        FieldDef::required("checked_on", FieldType::Date),
    ];

    fn value(&self, field: &str) -> FilterValue {
        match field {
            "year" => self.year.into(),
            "month" => self.month.into(),
            "day" => self.day.into(),
            "stored_on" => self.stored_on.into(),
            "purged_on" => self.purged_on.into(),
            "checked_on" => self.checked_on.into(),
            _ => FilterValue::Null,
        }
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn archives() -> Vec<Archive> {
    vec![Archive::new(2012, 1, 1), Archive::new(2012, 4, 16), Archive::new(2012, 5, 18)]
}

fn decomposed(include_point: bool) -> Predicate<Archive> {
    WhereAfterStrategy::date_parts(
        &selector!(year),
        &selector!(month),
        &selector!(day),
        date(2012, 4, 16),
        include_point,
    )
    .expect("valid decomposed predicate")
}

fn direct(include_point: bool) -> Predicate<Archive> {
    WhereAfterStrategy::field(&selector!(stored_on), date(2012, 4, 16), include_point)
        .expect("valid direct predicate")
}

/// Decomposed dates select the records on or after the threshold
#[test]
fn test_decomposed_date_scenario() {
    let records = archives();

    let inclusive = decomposed(true).filter(&records).unwrap();
    assert_eq!(inclusive, vec![&records[1], &records[2]]);

    let exclusive = decomposed(false).filter(&records).unwrap();
    assert_eq!(exclusive, vec![&records[2]]);
}

/// Decomposed and direct comparisons agree on every valid date
#[test]
fn test_decomposed_agrees_with_direct() {
    let mut day = date(2011, 12, 25);
    let end = date(2012, 6, 1);
    while day <= end {
        let record = Archive::new(day.year() as i64, day.month() as i64, day.day() as i64);
        for include_point in [true, false] {
            assert_eq!(
                decomposed(include_point).evaluate(&record).unwrap(),
                direct(include_point).evaluate(&record).unwrap(),
                "{day} include_point={include_point}"
            );
        }
        day = day.succ_opt().unwrap();
    }
}

/// Inclusive accepts everything exclusive does, plus the threshold itself
#[test]
fn test_inclusive_superset_of_exclusive() {
    for record in archives() {
        let exclusive = direct(false).evaluate(&record).unwrap();
        let inclusive = direct(true).evaluate(&record).unwrap();
        assert!(!exclusive || inclusive);
        assert_eq!(inclusive && !exclusive, record.stored_on == date(2012, 4, 16));
    }
}

/// An absent nullable field evaluates to the lift value regardless of threshold
#[test]
fn test_null_lift_independent_of_threshold() {
    let record = Archive::new(2012, 1, 1);
    for threshold in [date(1900, 1, 1), date(2012, 1, 1), date(2999, 12, 31)] {
        for include_point in [true, false] {
            let lifted: Predicate<Archive> =
                WhereAfterStrategy::nullable_field(&selector!(purged_on), threshold, true, include_point).unwrap();
            let dropped: Predicate<Archive> =
                WhereAfterStrategy::nullable_field(&selector!(purged_on), threshold, false, include_point).unwrap();
            assert!(lifted.evaluate(&record).unwrap());
            assert!(!dropped.evaluate(&record).unwrap());
        }
    }
}

/// A present nullable field compares exactly like the non-nullable case
#[test]
fn test_present_nullable_compares_normally() {
    let mut record = Archive::new(2012, 1, 1);
    record.purged_on = Some(date(2012, 4, 16));

    let purged_on: Selector<Archive> = selector!(purged_on);
    let inclusive = WhereAfterStrategy::nullable_field(&purged_on, date(2012, 4, 16), true, true).unwrap();
    let exclusive = WhereAfterStrategy::nullable_field(&purged_on, date(2012, 4, 16), true, false).unwrap();
    assert!(inclusive.evaluate(&record).unwrap());
    assert!(!exclusive.evaluate(&record).unwrap());
}

/// The threshold may be another field of the same record
#[test]
fn test_correlated_field_threshold() {
    let mut record = Archive::new(2012, 4, 16);
    record.checked_on = date(2012, 4, 20);

    let checked_after_store: Predicate<Archive> =
        WhereAfterStrategy::field(&selector!(checked_on), Selector::field("stored_on"), false).unwrap();
    assert!(checked_after_store.evaluate(&record).unwrap());
    assert_eq!(
        checked_after_store.expr(),
        &PredicateExpr::FieldCompare {
            field: "checked_on".into(),
            op: sift::CompareOp::Gt,
            operand: Operand::Field("stored_on".into()),
            on_null: None,
        }
    );
}

/// Construction errors surface before any record is touched
#[test]
fn test_construction_errors() {
    let err = WhereAfterStrategy::field(&Selector::<Archive>::parse("year + 1").unwrap(), date(2012, 1, 1), true)
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::UnsupportedSelectorShape);

    let err = WhereAfterStrategy::field::<Archive>(&selector!(stored_on), FilterValue::Int(2012), true).unwrap_err();
    assert_eq!(err.code, ErrorCode::TypeMismatch);

    let err = WhereAfterStrategy::date_parts::<Archive>(
        &selector!(year),
        &selector!(stored_on),
        &selector!(day),
        date(2012, 1, 1),
        true,
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::TypeMismatch);
    assert!(err.is_construction_error());
}

/// Invalid decomposed dates fail at evaluation instead of wrapping
#[test]
fn test_invalid_decomposed_date_fails() {
    let mut record = Archive::new(2012, 2, 1);
    record.day = 30;

    let err = decomposed(true).evaluate(&record).unwrap_err();
    assert_eq!(err.code, ErrorCode::DateConstructionError);
    assert!(err.is_evaluation_error());
    assert!(err.message.contains("2012-02-30"));
}

/// Selector inspection round-trips
#[test]
fn test_selector_inspection() {
    let single: Selector<Archive> = Selector::parse("|a| a.year").unwrap();
    assert_eq!(single.field_names().unwrap(), ["year"]);

    let composite: Selector<Archive> = Selector::parse("{ year, month }").unwrap();
    assert_eq!(composite.field_names().unwrap(), ["year", "month"]);

    for computed in ["year * 2", "len(year)", "if year then month else day"] {
        let sel: Selector<Archive> = Selector::parse(computed).unwrap();
        assert_eq!(sel.field_names().unwrap_err().code, ErrorCode::UnsupportedSelectorShape);
    }
}

/// The same predicate renders for every dialect
#[test]
fn test_pushdown_rendering() {
    let options = SqlOptions::new(DatabaseType::PostgreSQL).quote_identifiers(false);

    assert_eq!(direct(true).to_sql(&options, 0).unwrap().0, "stored_on >= $1");

    let (sql, _) = decomposed(false).to_sql(&options, 0).unwrap();
    assert!(sql.starts_with("make_date(CASE WHEN year BETWEEN 1 AND 9999 AND year = FLOOR(year)"));
    assert!(sql.ends_with("THEN CAST(day AS INT) ELSE 0 END) > $1"));

    let lifted: Predicate<Archive> =
        WhereAfterStrategy::nullable_field(&selector!(purged_on), date(2012, 4, 16), true, true).unwrap();
    let (sql, params) = lifted.to_sql(&options, 4).unwrap();
    assert_eq!(sql, "(purged_on IS NULL OR purged_on >= $5)");
    assert_eq!(params, vec![FilterValue::Date(date(2012, 4, 16))]);
}

/// Rows whose parts are not a date fail in memory, and pushdown either
/// guards every part so the database raises an error too, or refuses
#[test]
fn test_invalid_components_agree_with_pushdown() {
    let invalid = [(2012, 2, 31), (2012, 13, 1), (0, 1, 1), (10_000, 1, 1)];
    for (year, month, day) in invalid {
        let mut record = Archive::new(2012, 1, 1);
        record.year = year;
        record.month = month;
        record.day = day;
        let err = decomposed(true).evaluate(&record).unwrap_err();
        assert_eq!(err.code, ErrorCode::DateConstructionError, "{year}-{month}-{day}");
    }

    for db in [DatabaseType::PostgreSQL, DatabaseType::MSSQL] {
        let (sql, _) = decomposed(true).to_sql(&SqlOptions::new(db).quote_identifiers(false), 0).unwrap();
        for (part, low, high) in [("year", 1, 9999), ("month", 1, 12), ("day", 1, 31)] {
            let guard = format!(
                "CASE WHEN {part} BETWEEN {low} AND {high} AND {part} = FLOOR({part}) THEN CAST({part} AS INT) ELSE 0 END"
            );
            assert!(sql.contains(&guard), "{db}: {sql}");
        }
    }

    for db in [DatabaseType::MySQL, DatabaseType::SQLite] {
        let err = decomposed(true).to_sql(&SqlOptions::new(db), 0).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedPushdown);
        assert!(!err.is_retryable());
    }
}

fn assert_send_sync<T: Send + Sync>() {}

/// Predicates are plain data and can be shared across threads
#[test]
fn test_predicate_is_send_sync() {
    assert_send_sync::<Predicate<Archive>>();
    assert_send_sync::<Selector<Archive>>();
    assert_send_sync::<QueryError>();
}

/// One predicate evaluated from several threads gives the sequential answer
#[test]
fn test_concurrent_evaluation() {
    let predicate = decomposed(true);
    let records: Vec<Archive> = (1..=12)
        .flat_map(|month| [Archive::new(2012, month, 1), Archive::new(2012, month, 28)])
        .collect();
    let expected = predicate.filter(&records).unwrap().len();

    let counts: Vec<usize> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| predicate.filter(&records).unwrap().len()))
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    assert_eq!(counts, vec![expected; 4]);
    assert_eq!(expected, 17);
}

#[derive(Clone, Default)]
struct RecordingEngine {
    statements: Arc<Mutex<Vec<String>>>,
}

impl QueryEngine for RecordingEngine {
    fn execute_delete(&self, sql: &str, params: Vec<FilterValue>) -> BoxFuture<'_, QueryResult<u64>> {
        self.statements.lock().unwrap().push(sql.to_string());
        Box::pin(async move { Ok(params.len() as u64) })
    }
}

/// Bulk delete renders one statement and reports affected rows
#[tokio::test]
async fn test_bulk_delete() {
    let engine = RecordingEngine::default();

    let affected = DeleteOperation::new(engine.clone())
        .with_options(SqlOptions::new(DatabaseType::SQLite))
        .where_(direct(true))
        .exec()
        .await
        .unwrap();

    assert_eq!(affected, 1);
    assert_eq!(
        engine.statements.lock().unwrap().as_slice(),
        ["DELETE FROM archives WHERE stored_on >= ?;"]
    );
}

/// A decomposed date is not deleted through a dialect that would drop or keep invalid rows silently
#[tokio::test]
async fn test_bulk_delete_refuses_lossy_dialect() {
    let engine = RecordingEngine::default();

    let err = DeleteOperation::new(engine.clone())
        .with_options(SqlOptions::new(DatabaseType::SQLite))
        .where_(decomposed(true))
        .exec()
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::UnsupportedPushdown);
    assert!(engine.statements.lock().unwrap().is_empty());

    let affected = DeleteOperation::new(engine.clone())
        .with_options(SqlOptions::new(DatabaseType::PostgreSQL))
        .where_(decomposed(true))
        .exec()
        .await
        .unwrap();
    assert_eq!(affected, 1);
    let statements = engine.statements.lock().unwrap();
    assert!(statements[0].starts_with("DELETE FROM archives WHERE make_date(CASE WHEN \"year\" BETWEEN 1 AND 9999"));
}

/// Ties at the maximum are all kept, in input order
#[test]
fn test_extremum_filter() {
    assert_eq!(where_max(vec![3, 1, 3, 2], |x| *x), vec![3, 3]);

    let records = archives();
    let latest = records.iter().where_max(|a| a.stored_on);
    assert_eq!(latest, vec![&records[2]]);
}
