//! # sift-query
//!
//! Predicate strategies over structured records.
//!
//! This crate provides:
//! - Selectors describing which field(s) of a record a predicate inspects,
//!   with an inspector that resolves them to field declarations
//! - `WhereAfterStrategy`, building "on or after" predicates over dates,
//!   nullable dates and dates split across year/month/day fields
//! - An inspectable predicate IR that is evaluated in memory or translated
//!   to SQL for pushdown
//! - A bulk delete operation driven by a [`QueryEngine`]
//! - Multi-winner extremum filtering and pre-order tree flattening
//!
//! ## Building a predicate
//!
//! ```rust
//! use chrono::NaiveDate;
//! use sift_query::prelude::*;
//!
//! struct Visit {
//!     year: i64,
//!     month: i64,
//!     day: i64,
//! }
//!
//! impl Record for Visit {
//!     const RECORD_NAME: &'static str = "Visit";
//!     const TABLE_NAME: &'static str = "visits";
//!     const FIELDS: &'static [FieldDef] = &[
//!         FieldDef::required("year", FieldType::Int),
//!         FieldDef::required("month", FieldType::Int),
//!         FieldDef::required("day", FieldType::Int),
//!     ];
//!
//!     fn value(&self, field: &str) -> FilterValue {
//!         match field {
//!             "year" => self.year.into(),
//!             "month" => self.month.into(),
//!             "day" => self.day.into(),
//!             _ => FilterValue::Null,
//!         }
//!     }
//! }
//!
//! let after: Predicate<Visit> = WhereAfterStrategy::date_parts(
//!     &selector!(year),
//!     &selector!(month),
//!     &selector!(day),
//!     NaiveDate::from_ymd_opt(2012, 4, 16).unwrap(),
//!     true,
//! )
//! .unwrap();
//!
//! let visit = Visit { year: 2012, month: 5, day: 18 };
//! assert!(after.evaluate(&visit).unwrap());
//!
//! let (sql, params) = after
//!     .to_sql(&SqlOptions::new(DatabaseType::PostgreSQL).quote_identifiers(false), 0)
//!     .unwrap();
//! assert!(sql.starts_with("make_date(CASE WHEN year BETWEEN 1 AND 9999"));
//! assert!(sql.ends_with(" >= $1"));
//! assert_eq!(params.len(), 1);
//!
//! // SQLite has no date function that rejects 2012-02-31, so the predicate stays in memory
//! let err = after.to_sql(&SqlOptions::new(DatabaseType::SQLite), 0).unwrap_err();
//! assert_eq!(err.code, ErrorCode::UnsupportedPushdown);
//! ```
//!
//! ## Errors
//!
//! Every fallible operation returns [`QueryResult`]. Construction problems
//! (`UnsupportedSelectorShape`, `TypeMismatch`) surface when the predicate is
//! built; `DateConstructionError` only when a decomposed date is evaluated;
//! `UnsupportedPushdown` when a dialect cannot reproduce in-memory results.
//!
//! ```rust
//! use sift_query::{ErrorCode, Selector};
//!
//! let err = Selector::<()>::parse("year + 1").unwrap().field_names().unwrap_err();
//! assert_eq!(err.code, ErrorCode::UnsupportedSelectorShape);
//! ```

pub mod config;
pub mod error;
pub mod extremum;
pub mod filter;
pub mod logging;
#[macro_use]
pub mod macros;
pub mod operations;
pub mod selector;
pub mod sql;
pub mod strategy;
pub mod traits;
pub mod traverse;

pub use config::{DebugConfig, SiftConfig, SqlConfig};
pub use error::{ErrorCode, ErrorContext, QueryError, QueryResult, Suggestion};
pub use extremum::{WhereExtremum, where_max, where_min};
pub use filter::{FieldType, FilterValue};
pub use operations::DeleteOperation;
pub use selector::{Selector, SelectorExpr};
pub use sql::{DatabaseType, SqlBuilder, SqlOptions};
pub use strategy::{
    CompareOp, ComparisonMode, Operand, Predicate, PredicateExpr, Threshold, WhereAfterStrategy,
};
pub use traits::{BoxFuture, FieldDef, QueryEngine, Record};
pub use traverse::{select_more, select_more_where};

// Re-export logging utilities
pub use logging::{LogFormat, LogLevel, is_debug_enabled};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{ErrorCode, QueryError, QueryResult};
    pub use crate::extremum::WhereExtremum;
    pub use crate::filter::{FieldType, FilterValue};
    pub use crate::operations::*;
    pub use crate::selector;
    pub use crate::selector::{Selector, SelectorExpr};
    pub use crate::sql::{DatabaseType, SqlOptions};
    pub use crate::strategy::{ComparisonMode, Predicate, PredicateExpr, WhereAfterStrategy};
    pub use crate::traits::{FieldDef, QueryEngine, Record};
}
