//! Selector inspection: recover the fields a selector denotes.
//!
//! Inspection walks the selector's shape and never evaluates it. A selector
//! reduces to fields when it is:
//! - a single field access, optionally behind a type-widening conversion
//! - a composite whose members are each such a field access
//!
//! Anything else (arithmetic, calls, conditionals, literals, nested member
//! access) is rejected with `UnsupportedSelectorShape`; no partial evaluation
//! or inlining is attempted.

use smol_str::SmolStr;

use super::{Selector, SelectorExpr};
use crate::error::{QueryError, QueryResult};
use crate::filter::FieldType;
use crate::traits::{FieldDef, Record};

/// Names of the fields a selector denotes, in declaration order.
///
/// ```rust
/// use sift_query::selector::{inspect, SelectorExpr};
///
/// let composite = SelectorExpr::Composite(vec![
///     SelectorExpr::field("a"),
///     SelectorExpr::field("b"),
/// ]);
/// assert_eq!(inspect::field_names(&composite).unwrap(), ["a", "b"]);
/// ```
pub fn field_names(expr: &SelectorExpr) -> QueryResult<Vec<SmolStr>> {
    Ok(members(expr)?.into_iter().map(|(name, _)| name).collect())
}

/// Resolve a selector to the field declarations of its record type.
///
/// A conversion is only accepted when it widens the declared type.
pub fn resolve<R: Record>(selector: &Selector<R>) -> QueryResult<Vec<&'static FieldDef>> {
    members(selector.expr())?
        .into_iter()
        .map(|(name, target)| {
            let def =
                R::field_def(&name).ok_or_else(|| QueryError::unknown_field(R::RECORD_NAME, name.as_str()))?;
            match target {
                Some(target) if !def.ty.widens_to(target) => Err(unsupported(selector.expr())
                    .with_field(name.as_str())
                    .with_help(format!(
                        "`{}` is {}; converting it to {} does not widen the type",
                        name,
                        def.ty.name(),
                        target.name()
                    ))),
                _ => Ok(def),
            }
        })
        .collect()
}

/// Resolve a selector that must denote exactly one field.
pub fn resolve_single<R: Record>(selector: &Selector<R>) -> QueryResult<&'static FieldDef> {
    let fields = resolve(selector)?;
    match fields.as_slice() {
        [field] => Ok(*field),
        _ => Err(unsupported(selector.expr()).with_help("A single field is required here")),
    }
}

/// Field references with their conversion target, if any.
fn members(expr: &SelectorExpr) -> QueryResult<Vec<(SmolStr, Option<FieldType>)>> {
    match expr {
        SelectorExpr::Composite(members) if members.is_empty() => {
            Err(unsupported(expr).with_help("A composite selector needs at least one field"))
        }
        SelectorExpr::Composite(members) => members
            .iter()
            .map(|member| member_field(member).ok_or_else(|| unsupported(expr)))
            .collect(),
        single => member_field(single)
            .map(|member| vec![member])
            .ok_or_else(|| unsupported(expr)),
    }
}

fn member_field(expr: &SelectorExpr) -> Option<(SmolStr, Option<FieldType>)> {
    match expr {
        SelectorExpr::Field(name) => Some((name.clone(), None)),
        SelectorExpr::Convert { inner, target } => match inner.as_ref() {
            SelectorExpr::Field(name) => Some((name.clone(), Some(*target))),
            _ => None,
        },
        _ => None,
    }
}

fn unsupported(expr: &SelectorExpr) -> QueryError {
    QueryError::unsupported_selector_shape(expr.to_string())
        .with_context(format!("Inspecting {} selector", expr.kind()))
}
