//! # Sift
//!
//! Composable, provider-translatable predicate strategies over structured records.
//!
//! Sift provides:
//! - Selectors that name the fields a predicate inspects, checked against a
//!   record's declared fields when the predicate is built
//! - Date-after predicates over plain, nullable and decomposed dates
//! - One predicate value that is evaluated in memory or rendered as SQL
//! - Multi-winner extremum filtering
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use sift::prelude::*;
//!
//! struct Task {
//!     due_on: Option<NaiveDate>,
//! }
//!
//! impl Record for Task {
//!     const RECORD_NAME: &'static str = "Task";
//!     const TABLE_NAME: &'static str = "tasks";
//!     const FIELDS: &'static [FieldDef] = &[FieldDef::optional("due_on", FieldType::Date)];
//!
//!     fn value(&self, field: &str) -> FilterValue {
//!         match field {
//!             "due_on" => self.due_on.into(),
//!             _ => FilterValue::Null,
//!         }
//!     }
//! }
//!
//! let cutoff = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
//! let pending: Predicate<Task> =
//!     WhereAfterStrategy::nullable_field(&selector!(due_on), cutoff, true, true).unwrap();
//!
//! let tasks = [Task { due_on: None }, Task { due_on: NaiveDate::from_ymd_opt(2024, 1, 1) }];
//! assert_eq!(pending.filter(&tasks).unwrap().len(), 1);
//! ```
//!
//! ## Logging
//!
//! Enable the `tracing-subscriber` feature and set `SIFT_DEBUG=true` (or
//! `SIFT_LOG_LEVEL`) before calling [`logging::init`].

pub use sift_query::*;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use sift_query::prelude::*;
    pub use sift_query::config::SiftConfig;
}
