//! Inspectable predicate expressions and their in-memory evaluation.

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use std::ops::RangeInclusive;

use chrono::NaiveDate;
use smol_str::SmolStr;

use crate::error::{QueryError, QueryResult};
use crate::filter::FilterValue;
use crate::selector::Selector;
use crate::traits::Record;

/// Comparison operator of a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// Strictly greater than.
    Gt,
    /// Greater than or equal.
    Gte,
}

impl CompareOp {
    /// `Gte` when the threshold itself satisfies the comparison, `Gt` otherwise.
    pub fn after(include_point: bool) -> Self {
        if include_point { Self::Gte } else { Self::Gt }
    }

    /// SQL symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Gte => ">=",
        }
    }

    /// Whether an ordering of `field` against `threshold` satisfies the operator.
    ///
    /// Unordered pairs never do.
    #[inline]
    pub fn holds(&self, ordering: Option<Ordering>) -> bool {
        match self {
            Self::Gt => ordering == Some(Ordering::Greater),
            Self::Gte => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        }
    }
}

/// Comparison parameters shared by the strategy builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComparisonMode {
    /// `>=` when true, `>` when false.
    pub inclusive: bool,
    /// Truth value substituted when a nullable field is absent.
    pub lift_null_to_true: bool,
}

impl ComparisonMode {
    /// `>=`, nulls fail.
    pub const fn inclusive() -> Self {
        Self {
            inclusive: true,
            lift_null_to_true: false,
        }
    }

    /// `>`, nulls fail.
    pub const fn exclusive() -> Self {
        Self {
            inclusive: false,
            lift_null_to_true: false,
        }
    }

    /// Set the truth value for absent fields.
    pub const fn lift_null(mut self, to_true: bool) -> Self {
        self.lift_null_to_true = to_true;
        self
    }

    /// The operator this mode selects.
    pub fn op(&self) -> CompareOp {
        CompareOp::after(self.inclusive)
    }
}

impl Default for ComparisonMode {
    fn default() -> Self {
        Self::inclusive()
    }
}

/// What a field is compared against, as supplied by the caller.
pub enum Threshold<R> {
    /// A literal value.
    Value(FilterValue),
    /// Another field of the same record instance.
    Field(Selector<R>),
}

impl<R> Clone for Threshold<R> {
    fn clone(&self) -> Self {
        match self {
            Self::Value(v) => Self::Value(v.clone()),
            Self::Field(s) => Self::Field(s.clone()),
        }
    }
}

impl<R> fmt::Debug for Threshold<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Field(s) => f.debug_tuple("Field").field(s).finish(),
        }
    }
}

impl<R> From<FilterValue> for Threshold<R> {
    fn from(value: FilterValue) -> Self {
        Self::Value(value)
    }
}

impl<R> From<NaiveDate> for Threshold<R> {
    fn from(value: NaiveDate) -> Self {
        Self::Value(value.into())
    }
}

impl<R> From<chrono::NaiveDateTime> for Threshold<R> {
    fn from(value: chrono::NaiveDateTime) -> Self {
        Self::Value(value.into())
    }
}

impl<R> From<Selector<R>> for Threshold<R> {
    fn from(selector: Selector<R>) -> Self {
        Self::Field(selector)
    }
}

/// The right-hand side of a built comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A captured literal.
    Value(FilterValue),
    /// A field of the same record (correlated, not a join).
    Field(SmolStr),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{}", v),
            Self::Field(name) => f.write_str(name),
        }
    }
}

/// A single comparison, in a form both evaluators and translators can match on.
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateExpr {
    /// `field OP operand`.
    FieldCompare {
        /// Compared field.
        field: SmolStr,
        /// Operator.
        op: CompareOp,
        /// Threshold.
        operand: Operand,
        /// Result when the field is absent; `None` for fields that can't be.
        on_null: Option<bool>,
    },
    /// `date(year, month, day) OP threshold`.
    DateFromPartsCompare {
        /// Year component field.
        year: SmolStr,
        /// Month component field.
        month: SmolStr,
        /// Day component field.
        day: SmolStr,
        /// Operator.
        op: CompareOp,
        /// Threshold date.
        threshold: NaiveDate,
    },
}

impl PredicateExpr {
    /// Fields the expression reads, in order.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Self::FieldCompare { field, operand, .. } => match operand {
                Operand::Field(other) => vec![field.as_str(), other.as_str()],
                Operand::Value(_) => vec![field.as_str()],
            },
            Self::DateFromPartsCompare {
                year, month, day, ..
            } => vec![year.as_str(), month.as_str(), day.as_str()],
        }
    }

    /// Evaluate against one record.
    pub fn evaluate<R: Record>(&self, record: &R) -> QueryResult<bool> {
        match self {
            Self::FieldCompare {
                field,
                op,
                operand,
                on_null,
            } => {
                let value = record.value(field);
                if value.is_null() {
                    return Ok(on_null.unwrap_or(false));
                }
                let fetched;
                let threshold = match operand {
                    Operand::Value(v) => v,
                    Operand::Field(name) => {
                        fetched = record.value(name);
                        &fetched
                    }
                };
                Ok(op.holds(value.compare(threshold)))
            }
            Self::DateFromPartsCompare {
                year,
                month,
                day,
                op,
                threshold,
            } => {
                let date = date_from_parts(record, year, month, day)?;
                Ok(op.holds(Some(date.cmp(threshold))))
            }
        }
    }
}

impl fmt::Display for PredicateExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldCompare {
                field,
                op,
                operand,
                on_null,
            } => {
                write!(f, "{} {} {}", field, op.symbol(), operand)?;
                if let Some(lift) = on_null {
                    write!(f, " (null: {})", lift)?;
                }
                Ok(())
            }
            Self::DateFromPartsCompare {
                year,
                month,
                day,
                op,
                threshold,
            } => write!(f, "date({}, {}, {}) {} {}", year, month, day, op.symbol(), threshold),
        }
    }
}

/// Years a decomposed date may carry.
///
/// SQL date types and date-from-parts functions stop at these bounds, so
/// in-memory evaluation does too.
pub const SUPPORTED_YEARS: RangeInclusive<i64> = 1..=9999;

/// Build a calendar date from three numeric fields of a record.
///
/// Invalid combinations fail rather than being clamped or wrapped: a null or
/// fractional component, a year outside [`SUPPORTED_YEARS`], or a month and
/// day that do not exist in the calendar.
pub fn date_from_parts<R: Record>(record: &R, year: &str, month: &str, day: &str) -> QueryResult<NaiveDate> {
    let y = date_component(record, year)?;
    let m = date_component(record, month)?;
    let d = date_component(record, day)?;

    let invalid = || QueryError::date_construction(y, m, d).with_record(R::RECORD_NAME);
    if !SUPPORTED_YEARS.contains(&y) {
        return Err(invalid());
    }
    let (Ok(year32), Ok(month32), Ok(day32)) = (i32::try_from(y), u32::try_from(m), u32::try_from(d)) else {
        return Err(invalid());
    };
    NaiveDate::from_ymd_opt(year32, month32, day32).ok_or_else(invalid)
}

fn date_component<R: Record>(record: &R, field: &str) -> QueryResult<i64> {
    match record.value(field) {
        FilterValue::Int(v) => Ok(v),
        FilterValue::Float(v) if v.is_finite() && v.fract() == 0.0 => Ok(v as i64),
        FilterValue::Float(v) => {
            Err(QueryError::date_component_not_integral(field, v).with_record(R::RECORD_NAME))
        }
        FilterValue::Null => Err(QueryError::date_component_missing(field).with_record(R::RECORD_NAME)),
        other => Err(QueryError::type_mismatch(
            field,
            "a numeric date component",
            other.field_type().map_or("null", |t| t.name()),
        )
        .with_record(R::RECORD_NAME)),
    }
}

/// An immutable boolean predicate over records of type `R`.
///
/// Built once by a strategy builder and owned by the caller. It captures
/// only field names and values, so it may be shared across threads and
/// evaluated concurrently.
pub struct Predicate<R> {
    expr: PredicateExpr,
    mode: ComparisonMode,
    _record: PhantomData<fn(&R) -> bool>,
}

impl<R> Predicate<R> {
    pub(crate) fn new(expr: PredicateExpr, mode: ComparisonMode) -> Self {
        Self {
            expr,
            mode,
            _record: PhantomData,
        }
    }

    /// The underlying comparison.
    pub fn expr(&self) -> &PredicateExpr {
        &self.expr
    }

    /// The comparison mode the predicate was built with.
    pub fn mode(&self) -> ComparisonMode {
        self.mode
    }

    /// Fields the predicate reads.
    pub fn fields(&self) -> Vec<&str> {
        self.expr.fields()
    }

    /// Consume into the untyped expression.
    pub fn into_expr(self) -> PredicateExpr {
        self.expr
    }
}

impl<R: Record> Predicate<R> {
    /// Evaluate against one record.
    pub fn evaluate(&self, record: &R) -> QueryResult<bool> {
        self.expr.evaluate(record)
    }

    /// Keep the records that satisfy the predicate, preserving order.
    ///
    /// Stops at the first evaluation error.
    pub fn filter<'a, I>(&self, records: I) -> QueryResult<Vec<&'a R>>
    where
        I: IntoIterator<Item = &'a R>,
        R: 'a,
    {
        let mut matched = Vec::new();
        for record in records {
            if self.evaluate(record)? {
                matched.push(record);
            }
        }
        Ok(matched)
    }
}

impl<R> Clone for Predicate<R> {
    fn clone(&self) -> Self {
        Self::new(self.expr.clone(), self.mode)
    }
}

impl<R> fmt::Debug for Predicate<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("expr", &self.expr)
            .field("mode", &self.mode)
            .finish()
    }
}

impl<R> fmt::Display for Predicate<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.expr, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::filter::FieldType;
    use crate::traits::FieldDef;

    struct Parts {
        year: Option<i64>,
        month: i64,
        day: i64,
    }

    impl Record for Parts {
        const RECORD_NAME: &'static str = "Parts";
        const TABLE_NAME: &'static str = "parts";
        const FIELDS: &'static [FieldDef] = &[
            FieldDef::optional("year", FieldType::Int),
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

    fn parts(year: i64, month: i64, day: i64) -> Parts {
        Parts {
            year: Some(year),
            month,
            day,
        }
    }

    #[test]
    fn test_compare_op_holds() {
        assert!(CompareOp::Gte.holds(Some(Ordering::Equal)));
        assert!(!CompareOp::Gt.holds(Some(Ordering::Equal)));
        assert!(CompareOp::Gt.holds(Some(Ordering::Greater)));
        assert!(!CompareOp::Gte.holds(None));
    }

    #[test]
    fn test_mode_defaults() {
        let mode = ComparisonMode::default();
        assert!(mode.inclusive);
        assert!(!mode.lift_null_to_true);
        assert_eq!(ComparisonMode::exclusive().lift_null(true).op(), CompareOp::Gt);
    }

    #[test]
    fn test_date_from_parts() {
        let date = date_from_parts(&parts(2012, 4, 16), "year", "month", "day").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2012, 4, 16).unwrap());
    }

    #[test]
    fn test_date_from_parts_rejects_invalid() {
        for (y, m, d) in [
            (2012, 13, 1),
            (2013, 2, 29),
            (2012, 4, 31),
            (2012, 0, 1),
            (2012, 1, -1),
            (0, 1, 1),
            (-44, 3, 15),
            (10_000, 1, 1),
        ] {
            let err = date_from_parts(&parts(y, m, d), "year", "month", "day").unwrap_err();
            assert_eq!(err.code, ErrorCode::DateConstructionError, "{y}-{m}-{d}");
        }
    }

    #[test]
    fn test_date_from_parts_missing_component() {
        let record = Parts {
            year: None,
            month: 1,
            day: 1,
        };
        let err = date_from_parts(&record, "year", "month", "day").unwrap_err();
        assert_eq!(err.code, ErrorCode::DateConstructionError);
        assert_eq!(err.context.field.as_deref(), Some("year"));
    }

    #[test]
    fn test_date_from_parts_year_bounds() {
        let first = date_from_parts(&parts(1, 1, 1), "year", "month", "day").unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(1, 1, 1).unwrap());
        let last = date_from_parts(&parts(9999, 12, 31), "year", "month", "day").unwrap();
        assert_eq!(last, NaiveDate::from_ymd_opt(9999, 12, 31).unwrap());
    }

    struct Measured {
        year: f64,
        month: f64,
        day: Option<f64>,
    }

    impl Record for Measured {
        const RECORD_NAME: &'static str = "Measured";
        const TABLE_NAME: &'static str = "measured";
        const FIELDS: &'static [FieldDef] = &[
            FieldDef::required("year", FieldType::Float),
            FieldDef::required("month", FieldType::Float),
            FieldDef::optional("day", FieldType::Float),
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

    #[test]
    fn test_date_from_float_parts() {
        let record = Measured {
            year: 2012.0,
            month: 4.0,
            day: Some(16.0),
        };
        let date = date_from_parts(&record, "year", "month", "day").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2012, 4, 16).unwrap());
    }

    #[test]
    fn test_date_from_float_parts_rejects_fractions() {
        for (month, day) in [(4.5, Some(16.0)), (4.0, Some(f64::NAN)), (f64::INFINITY, Some(1.0)), (4.0, None)] {
            let record = Measured {
                year: 2012.0,
                month,
                day,
            };
            let err = date_from_parts(&record, "year", "month", "day").unwrap_err();
            assert_eq!(err.code, ErrorCode::DateConstructionError, "{month} {day:?}");
            assert!(err.is_evaluation_error());
        }
    }

    #[test]
    fn test_field_compare_null_branch() {
        let expr = PredicateExpr::FieldCompare {
            field: "year".into(),
            op: CompareOp::Gte,
            operand: Operand::Value(FilterValue::Int(2000)),
            on_null: Some(true),
        };
        let absent = Parts {
            year: None,
            month: 1,
            day: 1,
        };
        assert!(expr.evaluate(&absent).unwrap());
        assert!(expr.evaluate(&parts(2000, 1, 1)).unwrap());
        assert!(!expr.evaluate(&parts(1999, 1, 1)).unwrap());
    }

    #[test]
    fn test_field_to_field_compare() {
        let expr = PredicateExpr::FieldCompare {
            field: "day".into(),
            op: CompareOp::Gt,
            operand: Operand::Field("month".into()),
            on_null: None,
        };
        assert!(expr.evaluate(&parts(2012, 4, 16)).unwrap());
        assert!(!expr.evaluate(&parts(2012, 4, 4)).unwrap());
        assert_eq!(expr.fields(), ["day", "month"]);
    }

    #[test]
    fn test_display() {
        let expr = PredicateExpr::DateFromPartsCompare {
            year: "year".into(),
            month: "month".into(),
            day: "day".into(),
            op: CompareOp::Gt,
            threshold: NaiveDate::from_ymd_opt(2012, 4, 16).unwrap(),
        };
        assert_eq!(expr.to_string(), "date(year, month, day) > 2012-04-16");
    }
}
