//! Predicate strategies.
//!
//! A strategy turns selectors and comparison parameters into a single
//! [`Predicate`]. The predicate is an explicit expression tree
//! ([`PredicateExpr`]) rather than a closure, so the same value can be
//! evaluated in memory or translated for pushdown (see [`crate::sql`]).

pub mod predicate;
pub mod where_after;

pub use predicate::{
    CompareOp, ComparisonMode, Operand, Predicate, PredicateExpr, SUPPORTED_YEARS, Threshold, date_from_parts,
};
pub use where_after::WhereAfterStrategy;
