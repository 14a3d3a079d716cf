//! Selector construction macros.
//!
//! ```rust
//! use sift_query::selector;
//! use sift_query::selector::{Selector, SelectorExpr};
//!
//! let year: Selector<()> = selector!(year);
//! assert_eq!(year.expr(), &SelectorExpr::field("year"));
//!
//! let parts: Selector<()> = selector!({ year, month, day });
//! assert_eq!(parts.field_names().unwrap(), ["year", "month", "day"]);
//! ```

/// Build a [`Selector`](crate::selector::Selector) from field names.
///
/// # Syntax
///
/// - `selector!(field)` - Single field
/// - `selector!(field as Float)` - Field behind a conversion to a [`FieldType`](crate::filter::FieldType)
/// - `selector!({ a, b, c })` - Composite of fields
#[macro_export]
macro_rules! selector {
    ({ $($field:ident),+ $(,)? }) => {
        $crate::selector::Selector::fields([$(stringify!($field)),+])
    };

    ($field:ident as $ty:ident) => {
        $crate::selector::Selector::from_expr(
            $crate::selector::SelectorExpr::field(stringify!($field))
                .convert($crate::filter::FieldType::$ty),
        )
    };

    ($field:ident) => {
        $crate::selector::Selector::field(stringify!($field))
    };
}
