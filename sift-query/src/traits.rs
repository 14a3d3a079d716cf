//! Traits connecting predicates to record types and execution engines.

use std::future::Future;
use std::pin::Pin;

use crate::error::QueryResult;
use crate::filter::{FieldType, FilterValue};

/// A boxed future for async engine operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Declaration of one field of a record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Field name, as referenced by selectors.
    pub name: &'static str,
    /// Declared type.
    pub ty: FieldType,
    /// Whether the field may be absent.
    pub nullable: bool,
}

impl FieldDef {
    /// A field that always holds a value.
    pub const fn required(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            nullable: false,
        }
    }

    /// A field that may be null.
    pub const fn optional(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            nullable: true,
        }
    }
}

/// A structured record that predicates can inspect.
///
/// # Example
///
/// ```rust
/// use sift_query::{FieldDef, FieldType, FilterValue, Record};
///
/// struct Ledger {
///     year: i64,
///     closed: Option<chrono::NaiveDate>,
/// }
///
/// impl Record for Ledger {
///     const RECORD_NAME: &'static str = "Ledger";
///     const TABLE_NAME: &'static str = "ledgers";
///     const FIELDS: &'static [FieldDef] = &[
///         FieldDef::required("year", FieldType::Int),
///         FieldDef::optional("closed", FieldType::Date),
///     ];
///
///     fn value(&self, field: &str) -> FilterValue {
///         match field {
///             "year" => self.year.into(),
///             "closed" => self.closed.into(),
///             _ => FilterValue::Null,
///         }
///     }
/// }
///
/// assert!(Ledger::field_def("closed").unwrap().nullable);
/// ```
pub trait Record {
    /// Name used in error messages.
    const RECORD_NAME: &'static str;
    /// Table the record is stored in.
    const TABLE_NAME: &'static str;
    /// The record's fields, in declaration order.
    const FIELDS: &'static [FieldDef];

    /// Read a field. Absent values and unknown names yield `FilterValue::Null`.
    fn value(&self, field: &str) -> FilterValue;

    /// Look up a field declaration by name.
    fn field_def(name: &str) -> Option<&'static FieldDef> {
        Self::FIELDS.iter().find(|f| f.name == name)
    }
}

/// Execution collaborator that runs translated predicates.
///
/// The core never talks to storage itself; engines receive rendered SQL
/// and bound parameters.
pub trait QueryEngine: Send + Sync + Clone + 'static {
    /// Execute a delete statement, returning the number of affected rows.
    fn execute_delete(&self, sql: &str, params: Vec<FilterValue>) -> BoxFuture<'_, QueryResult<u64>>;
}
