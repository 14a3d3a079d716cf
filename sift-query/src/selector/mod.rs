//! Selectors describe which field(s) of a record a predicate inspects.
//!
//! A selector is an explicit, inspectable description of a projection from a
//! record to one field or to an ordered tuple of fields. Selectors are never
//! evaluated against an instance to discover their fields; the
//! [inspector](inspect) walks their shape instead.
//!
//! Selectors can be built directly, with the [`selector!`](crate::selector!)
//! macro, or parsed from text:
//!
//! ```rust
//! use sift_query::selector::{Selector, SelectorExpr};
//! # use sift_query::{FieldDef, FieldType, FilterValue, Record};
//! # struct Reading;
//! # impl Record for Reading {
//! #     const RECORD_NAME: &'static str = "Reading";
//! #     const TABLE_NAME: &'static str = "readings";
//! #     const FIELDS: &'static [FieldDef] = &[];
//! #     fn value(&self, _: &str) -> FilterValue { FilterValue::Null }
//! # }
//!
//! let single: Selector<Reading> = Selector::field("taken_on");
//! let pair: Selector<Reading> = Selector::fields(["year", "month"]);
//! let parsed: Selector<Reading> = Selector::parse("|r| { r.year, r.month }").unwrap();
//!
//! assert_eq!(pair.expr(), parsed.expr());
//! assert!(matches!(single.expr(), SelectorExpr::Field(_)));
//! ```

pub mod inspect;
pub mod parser;

use std::fmt;
use std::marker::PhantomData;

use smol_str::SmolStr;

use crate::error::QueryResult;
use crate::filter::{FieldType, FilterValue};
use crate::traits::{FieldDef, Record};

/// Arithmetic operators that may appear in a selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
}

impl BinaryOp {
    /// Operator symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
        }
    }
}

/// The shape of a selector.
///
/// Only [`Field`](Self::Field), [`Convert`](Self::Convert) over a field, and
/// [`Composite`](Self::Composite) of those reduce to field references. The
/// remaining variants exist so callers and the parser can describe any
/// projection; the inspector rejects them.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorExpr {
    /// Access to one field of the record.
    Field(SmolStr),
    /// Type-widening conversion of the inner selector.
    Convert {
        /// Converted selector.
        inner: Box<SelectorExpr>,
        /// Target type.
        target: FieldType,
    },
    /// Construction of a composite value, one member per selector.
    Composite(Vec<SelectorExpr>),
    /// A constant.
    Literal(FilterValue),
    /// Member access on something other than the record (e.g. `r.owner.name`).
    Member {
        /// Accessed value.
        base: Box<SelectorExpr>,
        /// Member name.
        name: SmolStr,
    },
    /// Arithmetic.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<SelectorExpr>,
        /// Right operand.
        rhs: Box<SelectorExpr>,
    },
    /// Function or method call.
    Call {
        /// Function name.
        method: SmolStr,
        /// Arguments; a method receiver comes first.
        args: Vec<SelectorExpr>,
    },
    /// `if test then a else b`.
    Conditional {
        /// Condition.
        test: Box<SelectorExpr>,
        /// Value when the condition holds.
        then: Box<SelectorExpr>,
        /// Value otherwise.
        otherwise: Box<SelectorExpr>,
    },
}

impl SelectorExpr {
    /// A single field access.
    pub fn field(name: impl Into<SmolStr>) -> Self {
        Self::Field(name.into())
    }

    /// Wrap in a type-widening conversion.
    pub fn convert(self, target: FieldType) -> Self {
        Self::Convert {
            inner: Box::new(self),
            target,
        }
    }

    /// Short name of the shape, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Field(_) => "field",
            Self::Convert { .. } => "conversion",
            Self::Composite(_) => "composite",
            Self::Literal(_) => "literal",
            Self::Member { .. } => "member access",
            Self::Binary { .. } => "arithmetic",
            Self::Call { .. } => "call",
            Self::Conditional { .. } => "conditional",
        }
    }
}

impl fmt::Display for SelectorExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Convert { inner, target } => write!(f, "{} as {}", inner, target),
            Self::Composite(members) => {
                f.write_str("{ ")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", member)?;
                }
                f.write_str(" }")
            }
            Self::Literal(value) => write!(f, "{}", value),
            Self::Member { base, name } => write!(f, "{}.{}", base, name),
            Self::Binary { op, lhs, rhs } => write!(f, "({} {} {})", lhs, op.symbol(), rhs),
            Self::Call { method, args } => {
                write!(f, "{}(", method)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
            Self::Conditional {
                test,
                then,
                otherwise,
            } => write!(f, "if {} then {} else {}", test, then, otherwise),
        }
    }
}

/// A selector bound to record type `R`.
pub struct Selector<R> {
    expr: SelectorExpr,
    _record: PhantomData<fn() -> R>,
}

impl<R> Selector<R> {
    /// Wrap an explicit selector shape.
    pub fn from_expr(expr: SelectorExpr) -> Self {
        Self {
            expr,
            _record: PhantomData,
        }
    }

    /// Select a single field.
    pub fn field(name: impl Into<SmolStr>) -> Self {
        Self::from_expr(SelectorExpr::field(name))
    }

    /// Select several fields as a composite, in the given order.
    pub fn fields<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        Self::from_expr(SelectorExpr::Composite(
            names.into_iter().map(SelectorExpr::field).collect(),
        ))
    }

    /// Parse a textual selector such as `year`, `|r| r.year as i64` or `{ year, month }`.
    pub fn parse(input: &str) -> QueryResult<Self> {
        parser::parse(input).map(Self::from_expr)
    }

    /// The selector shape.
    pub fn expr(&self) -> &SelectorExpr {
        &self.expr
    }

    /// Names of the fields this selector denotes, in order.
    pub fn field_names(&self) -> QueryResult<Vec<SmolStr>> {
        inspect::field_names(&self.expr)
    }
}

impl<R: Record> Selector<R> {
    /// Resolve the selector against `R`'s declared fields.
    pub fn resolve(&self) -> QueryResult<Vec<&'static FieldDef>> {
        inspect::resolve(self)
    }
}

impl<R> Clone for Selector<R> {
    fn clone(&self) -> Self {
        Self::from_expr(self.expr.clone())
    }
}

impl<R> fmt::Debug for Selector<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Selector").field(&self.expr).finish()
    }
}

impl<R> fmt::Display for Selector<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.expr, f)
    }
}

impl<R> From<SelectorExpr> for Selector<R> {
    fn from(expr: SelectorExpr) -> Self {
        Self::from_expr(expr)
    }
}

impl<R> From<&str> for Selector<R> {
    fn from(name: &str) -> Self {
        Self::field(name)
    }
}
