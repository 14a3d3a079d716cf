//! Date-after predicate strategies.

use chrono::NaiveDate;
use tracing::debug;

use super::predicate::{ComparisonMode, CompareOp, Operand, Predicate, PredicateExpr, Threshold};
use crate::error::{QueryError, QueryResult};
use crate::selector::Selector;
use crate::selector::inspect::resolve_single;
use crate::traits::{FieldDef, Record};

/// Builds "on or after" predicates over temporal fields.
///
/// Every builder validates selector shapes and types up front and returns a
/// [`Predicate`] that captures only field names and literal values.
///
/// # Example
///
/// ```rust
/// use chrono::NaiveDate;
/// use sift_query::{FieldDef, FieldType, FilterValue, Record, Selector, WhereAfterStrategy};
///
/// struct Invoice {
///     issued_on: NaiveDate,
///     paid_on: Option<NaiveDate>,
/// }
///
/// impl Record for Invoice {
///     const RECORD_NAME: &'static str = "Invoice";
///     const TABLE_NAME: &'static str = "invoices";
///     const FIELDS: &'static [FieldDef] = &[
///         FieldDef::required("issued_on", FieldType::Date),
///         FieldDef::optional("paid_on", FieldType::Date),
///     ];
///
///     fn value(&self, field: &str) -> FilterValue {
///         match field {
///             "issued_on" => self.issued_on.into(),
///             "paid_on" => self.paid_on.into(),
///             _ => FilterValue::Null,
///         }
///     }
/// }
///
/// let cutoff = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let unpaid_or_late = WhereAfterStrategy::nullable_field(
///     &Selector::<Invoice>::field("paid_on"),
///     cutoff,
///     true,
///     true,
/// )
/// .unwrap();
///
/// let open = Invoice { issued_on: cutoff, paid_on: None };
/// assert!(unpaid_or_late.evaluate(&open).unwrap());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct WhereAfterStrategy;

impl WhereAfterStrategy {
    /// `member >= threshold` (or `>` when `include_point` is false) for a
    /// field that can never be absent.
    ///
    /// The threshold is a literal or another non-nullable field of the same record.
    pub fn field<R: Record>(
        member: &Selector<R>,
        threshold: impl Into<Threshold<R>>,
        include_point: bool,
    ) -> QueryResult<Predicate<R>> {
        let def = temporal_member(member)?;
        if def.nullable {
            return Err(QueryError::type_mismatch(
                def.name,
                format!("non-nullable {}", def.ty),
                format!("nullable {}", def.ty),
            )
            .with_record(R::RECORD_NAME)
            .with_suggestion("Use WhereAfterStrategy::nullable_field and choose how absent values are lifted"));
        }

        let operand = resolve_threshold(def, threshold.into())?;
        let mode = ComparisonMode {
            inclusive: include_point,
            lift_null_to_true: false,
        };
        Ok(build::<R>(
            PredicateExpr::FieldCompare {
                field: def.name.into(),
                op: mode.op(),
                operand,
                on_null: None,
            },
            mode,
        ))
    }

    /// Like [`field`](Self::field) for a nullable field.
    ///
    /// An absent value evaluates to `lift_null_to_true`; a present value is
    /// compared exactly as in the non-nullable case.
    pub fn nullable_field<R: Record>(
        member: &Selector<R>,
        threshold: impl Into<Threshold<R>>,
        lift_null_to_true: bool,
        include_point: bool,
    ) -> QueryResult<Predicate<R>> {
        let def = temporal_member(member)?;
        let operand = resolve_threshold(def, threshold.into())?;
        let mode = ComparisonMode {
            inclusive: include_point,
            lift_null_to_true,
        };
        Ok(build::<R>(
            PredicateExpr::FieldCompare {
                field: def.name.into(),
                op: mode.op(),
                operand,
                on_null: Some(lift_null_to_true),
            },
            mode,
        ))
    }

    /// Dispatch on the member's nullability using a [`ComparisonMode`].
    ///
    /// `lift_null_to_true` is ignored for non-nullable members.
    pub fn with_mode<R: Record>(
        member: &Selector<R>,
        threshold: impl Into<Threshold<R>>,
        mode: ComparisonMode,
    ) -> QueryResult<Predicate<R>> {
        if resolve_single(member)?.nullable {
            Self::nullable_field(member, threshold, mode.lift_null_to_true, mode.inclusive)
        } else {
            Self::field(member, threshold, mode.inclusive)
        }
    }

    /// `date(year, month, day) >= after` (or `>`), with the date assembled
    /// from three numeric fields.
    ///
    /// Components may be nullable or floating point. Whether the values form
    /// a date is only known per record: in-memory evaluation fails with
    /// `DateConstructionError` on a null, fractional or impossible
    /// combination, and pushdown renders a guard that makes the database
    /// raise an error for the same rows.
    pub fn date_parts<R: Record>(
        year: &Selector<R>,
        month: &Selector<R>,
        day: &Selector<R>,
        after: NaiveDate,
        include_point: bool,
    ) -> QueryResult<Predicate<R>> {
        let year = date_component(year)?;
        let month = date_component(month)?;
        let day = date_component(day)?;

        let mode = ComparisonMode {
            inclusive: include_point,
            lift_null_to_true: false,
        };
        Ok(build::<R>(
            PredicateExpr::DateFromPartsCompare {
                year: year.name.into(),
                month: month.name.into(),
                day: day.name.into(),
                op: CompareOp::after(include_point),
                threshold: after,
            },
            mode,
        ))
    }
}

fn build<R: Record>(expr: PredicateExpr, mode: ComparisonMode) -> Predicate<R> {
    debug!(record = R::RECORD_NAME, predicate = %expr, "Built date-after predicate");
    Predicate::new(expr, mode)
}

fn temporal_member<R: Record>(member: &Selector<R>) -> QueryResult<&'static FieldDef> {
    let def = resolve_single(member)?;
    if !def.ty.is_temporal() {
        return Err(QueryError::type_mismatch(def.name, "date or datetime", def.ty).with_record(R::RECORD_NAME));
    }
    Ok(def)
}

fn date_component<R: Record>(selector: &Selector<R>) -> QueryResult<&'static FieldDef> {
    let def = resolve_single(selector)?;
    if !def.ty.is_numeric() {
        return Err(QueryError::type_mismatch(def.name, "int or float", def.ty)
            .with_record(R::RECORD_NAME)
            .with_context("Building date-from-parts predicate"));
    }
    Ok(def)
}

fn resolve_threshold<R: Record>(def: &FieldDef, threshold: Threshold<R>) -> QueryResult<Operand> {
    match threshold {
        Threshold::Value(value) => match value.field_type() {
            Some(ty) if ty.is_temporal() && def.ty.is_comparable_with(ty) => Ok(Operand::Value(value)),
            found => Err(QueryError::type_mismatch(
                def.name,
                def.ty,
                found.map_or("null", |t| t.name()),
            )
            .with_record(R::RECORD_NAME)),
        },
        Threshold::Field(selector) => {
            let other = resolve_single(&selector)?;
            if !def.ty.is_comparable_with(other.ty) {
                return Err(QueryError::type_mismatch(def.name, def.ty, other.ty).with_record(R::RECORD_NAME));
            }
            if other.nullable {
                return Err(QueryError::type_mismatch(
                    other.name,
                    format!("non-nullable {}", other.ty),
                    format!("nullable {}", other.ty),
                )
                .with_record(R::RECORD_NAME));
            }
            Ok(Operand::Field(other.name.into()))
        }
    }
}
