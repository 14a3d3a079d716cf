//! Operations executed through a [`QueryEngine`](crate::traits::QueryEngine).
//!
//! - `DeleteOperation` - Bulk delete of records matching a predicate

mod delete;

pub use delete::DeleteOperation;
