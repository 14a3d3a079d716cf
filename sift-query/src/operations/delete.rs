//! Delete operation for removing records matching a predicate.

use std::marker::PhantomData;

use tracing::debug;

use crate::error::QueryResult;
use crate::filter::FilterValue;
use crate::sql::SqlOptions;
use crate::strategy::{Predicate, PredicateExpr};
use crate::traits::{QueryEngine, Record};

/// A bulk delete translated entirely into one statement.
///
/// # Example
///
/// ```rust,ignore
/// let predicate = WhereAfterStrategy::field(&Selector::field("shipped_on"), cutoff, false)?;
/// let removed = DeleteOperation::<_, Shipment>::new(engine)
///     .where_(predicate)
///     .exec()
///     .await?;
/// ```
pub struct DeleteOperation<E: QueryEngine, R: Record> {
    engine: E,
    conditions: Vec<PredicateExpr>,
    options: SqlOptions,
    _record: PhantomData<fn() -> R>,
}

impl<E: QueryEngine, R: Record> DeleteOperation<E, R> {
    /// Create a new Delete operation.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            conditions: Vec::new(),
            options: SqlOptions::default(),
            _record: PhantomData,
        }
    }

    /// Add a filter condition. Repeated calls are combined with `AND`.
    pub fn where_(mut self, predicate: Predicate<R>) -> Self {
        self.conditions.push(predicate.into_expr());
        self
    }

    /// Set the SQL rendering options.
    pub fn with_options(mut self, options: SqlOptions) -> Self {
        self.options = options;
        self
    }

    /// Build the SQL statement.
    ///
    /// Fails when a condition cannot be rendered for the configured dialect.
    pub fn build_sql(&self) -> QueryResult<(String, Vec<FilterValue>)> {
        let mut sql = String::new();
        let mut params = Vec::new();

        sql.push_str("DELETE FROM ");
        sql.push_str(&self.options.identifier(R::TABLE_NAME));

        for (i, condition) in self.conditions.iter().enumerate() {
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            let (fragment, bound) = condition.to_sql(&self.options, params.len())?;
            sql.push_str(&fragment);
            params.extend(bound);
        }

        sql.push(';');
        Ok((sql, params))
    }

    /// Execute the delete and return the count of deleted records.
    ///
    /// Engine errors carry the statement that failed.
    pub async fn exec(self) -> QueryResult<u64> {
        let (sql, params) = self.build_sql()?;
        debug!(record = R::RECORD_NAME, sql = %sql, params = params.len(), "Executing delete");
        let result = self.engine.execute_delete(&sql, params).await;
        result.map_err(|e| e.with_sql(sql))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCode, QueryError};
    use crate::filter::FieldType;
    use crate::selector::Selector;
    use crate::sql::DatabaseType;
    use crate::strategy::WhereAfterStrategy;
    use crate::traits::{BoxFuture, FieldDef};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    struct Order;

    impl Record for Order {
        const RECORD_NAME: &'static str = "Order";
        const TABLE_NAME: &'static str = "order";
        const FIELDS: &'static [FieldDef] = &[
            FieldDef::required("placed_on", FieldType::Date),
            FieldDef::optional("shipped_on", FieldType::Date),
            FieldDef::required("year", FieldType::Int),
            FieldDef::required("month", FieldType::Int),
            FieldDef::required("day", FieldType::Int),
        ];

        fn value(&self, _field: &str) -> FilterValue {
            FilterValue::Null
        }
    }

    #[derive(Clone, Default)]
    struct MockEngine {
        seen: Arc<Mutex<Vec<(String, usize)>>>,
        fail: bool,
    }

    impl QueryEngine for MockEngine {
        fn execute_delete(&self, sql: &str, params: Vec<FilterValue>) -> BoxFuture<'_, QueryResult<u64>> {
            let sql = sql.to_string();
            Box::pin(async move {
                if self.fail {
                    return Err(QueryError::database("connection reset"));
                }
                self.seen.lock().unwrap().push((sql, params.len()));
                Ok(3)
            })
        }
    }

    fn cutoff() -> NaiveDate {
        NaiveDate::from_ymd_opt(2012, 4, 16).unwrap()
    }

    #[test]
    fn test_delete_without_predicate() {
        let op = DeleteOperation::<_, Order>::new(MockEngine::default());
        let (sql, params) = op.build_sql().unwrap();
        assert_eq!(sql, "DELETE FROM \"order\";");
        assert!(params.is_empty());
    }

    #[test]
    fn test_delete_conjunction() {
        let placed = WhereAfterStrategy::field(&Selector::<Order>::field("placed_on"), cutoff(), true).unwrap();
        let shipped =
            WhereAfterStrategy::nullable_field(&Selector::<Order>::field("shipped_on"), cutoff(), false, false)
                .unwrap();

        let op = DeleteOperation::new(MockEngine::default())
            .where_(placed)
            .where_(shipped);
        let (sql, params) = op.build_sql().unwrap();
        assert_eq!(
            sql,
            "DELETE FROM \"order\" WHERE placed_on >= $1 AND (shipped_on IS NOT NULL AND shipped_on > $2);"
        );
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_delete_with_dialect() {
        let placed = WhereAfterStrategy::field(&Selector::<Order>::field("placed_on"), cutoff(), false).unwrap();
        let op = DeleteOperation::new(MockEngine::default())
            .with_options(SqlOptions::new(DatabaseType::MySQL))
            .where_(placed);
        assert_eq!(op.build_sql().unwrap().0, "DELETE FROM `order` WHERE placed_on > ?;");
    }

    fn placed_after_parts() -> Predicate<Order> {
        WhereAfterStrategy::date_parts(
            &Selector::field("year"),
            &Selector::field("month"),
            &Selector::field("day"),
            cutoff(),
            true,
        )
        .unwrap()
    }

    #[test]
    fn test_delete_decomposed_date_guarded() {
        let op = DeleteOperation::new(MockEngine::default())
            .with_options(SqlOptions::new(DatabaseType::MSSQL))
            .where_(placed_after_parts());
        let (sql, params) = op.build_sql().unwrap();
        assert!(sql.starts_with("DELETE FROM [order] WHERE DATEFROMPARTS(CASE WHEN [year] BETWEEN 1 AND 9999"));
        assert!(sql.ends_with(") >= @P1;"));
        assert_eq!(params.len(), 1);
    }

    #[tokio::test]
    async fn test_exec_refuses_unsupported_pushdown() {
        let engine = MockEngine::default();
        let err = DeleteOperation::new(engine.clone())
            .with_options(SqlOptions::new(DatabaseType::SQLite))
            .where_(placed_after_parts())
            .exec()
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::UnsupportedPushdown);
        assert!(engine.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_exec_reports_affected_rows() {
        let engine = MockEngine::default();
        let placed = WhereAfterStrategy::field(&Selector::<Order>::field("placed_on"), cutoff(), true).unwrap();

        let affected = DeleteOperation::new(engine.clone()).where_(placed).exec().await.unwrap();

        assert_eq!(affected, 3);
        let seen = engine.seen.lock().unwrap();
        assert_eq!(seen.as_slice(), [("DELETE FROM \"order\" WHERE placed_on >= $1;".to_string(), 1)]);
    }

    #[tokio::test]
    async fn test_exec_propagates_engine_error() {
        let engine = MockEngine {
            fail: true,
            ..Default::default()
        };
        let err = DeleteOperation::<_, Order>::new(engine).exec().await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.context.sql.as_deref(), Some("DELETE FROM \"order\";"));
        assert!(err.display_full().contains("SQL: DELETE FROM"));
    }
}
