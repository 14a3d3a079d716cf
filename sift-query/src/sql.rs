//! Pushdown translation of predicates into SQL.
//!
//! The translator pattern-matches on [`PredicateExpr`] and renders a WHERE
//! fragment plus bound parameters. Decomposed-date comparisons are pushed
//! down through the dialect's native date-from-parts function when that
//! function fails on impossible dates the way in-memory evaluation does.
//! Components are guarded so that a null, fractional or out-of-range part
//! reaches the function as `0`, which it rejects. Dialects whose date
//! functions return NULL or an unchecked string instead refuse the
//! translation with `UnsupportedPushdown`.
//!
//! ```rust
//! use sift_query::sql::{DatabaseType, SqlOptions};
//!
//! let options = SqlOptions::new(DatabaseType::MSSQL);
//! assert!(options.db.date_from_parts("y", "m", "d").unwrap().starts_with("DATEFROMPARTS("));
//! assert_eq!(DatabaseType::SQLite.date_from_parts("y", "m", "d"), None);
//! assert_eq!(DatabaseType::MSSQL.placeholder(2), "@P2");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{QueryError, QueryResult};
use crate::filter::FilterValue;
use crate::strategy::{Operand, Predicate, PredicateExpr, SUPPORTED_YEARS};

/// Escape an identifier with double quotes.
pub fn escape_identifier(name: &str) -> String {
    let escaped = name.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

/// Check if an identifier needs quoting.
pub fn needs_quoting(name: &str) -> bool {
    let reserved = [
        "user", "order", "group", "select", "from", "where", "table", "index", "key", "primary",
        "foreign", "check", "default", "null", "not", "and", "or", "in", "is", "like", "between",
        "case", "when", "then", "else", "end", "as", "on", "join", "left", "right", "inner",
        "outer", "cross", "natural", "using", "limit", "offset", "union", "intersect", "except",
        "all", "distinct", "having", "create", "alter", "drop", "insert", "update", "delete",
        "into", "values", "set", "returning", "year", "month", "day", "date",
    ];

    if reserved.contains(&name.to_lowercase().as_str()) {
        return true;
    }

    !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// PostgreSQL uses $1, $2, etc.
    #[default]
    #[serde(alias = "postgres")]
    PostgreSQL,
    /// MySQL uses ?, ?, etc.
    MySQL,
    /// SQLite uses ?, ?, etc.
    SQLite,
    /// SQL Server uses @P1, @P2, etc.
    #[serde(alias = "sqlserver")]
    MSSQL,
}

impl DatabaseType {
    /// Get the parameter placeholder for this database type.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Self::PostgreSQL => format!("${}", index),
            Self::MSSQL => format!("@P{}", index),
            Self::MySQL | Self::SQLite => "?".to_string(),
        }
    }

    /// Quote an identifier in this dialect's style.
    pub fn quote(&self, name: &str) -> String {
        match self {
            Self::MySQL => format!("`{}`", name.replace('`', "``")),
            Self::MSSQL => format!("[{}]", name.replace(']', "]]")),
            Self::PostgreSQL | Self::SQLite => escape_identifier(name),
        }
    }

    /// Lowercase dialect name, as written in configuration.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PostgreSQL => "postgresql",
            Self::MySQL => "mysql",
            Self::SQLite => "sqlite",
            Self::MSSQL => "mssql",
        }
    }

    /// Whether the dialect has a date-from-parts function that raises an
    /// error on impossible dates.
    ///
    /// MySQL's `STR_TO_DATE` and SQLite's `date()` return NULL or pass the
    /// text through instead.
    pub fn supports_strict_date_from_parts(&self) -> bool {
        matches!(self, Self::PostgreSQL | Self::MSSQL)
    }

    /// Strict expression building a date from three numeric columns, or
    /// `None` when the dialect has no strict function.
    pub fn date_from_parts(&self, year: &str, month: &str, day: &str) -> Option<String> {
        let function = match self {
            Self::PostgreSQL => "make_date",
            Self::MSSQL => "DATEFROMPARTS",
            Self::MySQL | Self::SQLite => return None,
        };
        Some(format!(
            "{}({}, {}, {})",
            function,
            strict_component(year, *SUPPORTED_YEARS.start(), *SUPPORTED_YEARS.end()),
            strict_component(month, 1, 12),
            strict_component(day, 1, 31),
        ))
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A whole number within `low..=high` passes through as an integer; anything
/// else, null included, becomes `0`, which no date-from-parts function accepts.
fn strict_component(column: &str, low: i64, high: i64) -> String {
    format!(
        "CASE WHEN {c} BETWEEN {low} AND {high} AND {c} = FLOOR({c}) THEN CAST({c} AS INT) ELSE 0 END",
        c = column,
        low = low,
        high = high,
    )
}

/// Options controlling SQL rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlOptions {
    /// Target dialect.
    pub db: DatabaseType,
    /// Quote identifiers that are reserved words or contain special characters.
    pub quote_identifiers: bool,
}

impl SqlOptions {
    /// Options for a dialect, with identifier quoting on.
    pub fn new(db: DatabaseType) -> Self {
        Self {
            db,
            quote_identifiers: true,
        }
    }

    /// Turn identifier quoting on or off.
    pub fn quote_identifiers(mut self, quote: bool) -> Self {
        self.quote_identifiers = quote;
        self
    }

    /// Render an identifier, quoting it when needed.
    pub fn identifier(&self, name: &str) -> String {
        if self.quote_identifiers && needs_quoting(name) {
            self.db.quote(name)
        } else {
            name.to_string()
        }
    }
}

impl Default for SqlOptions {
    fn default() -> Self {
        Self::new(DatabaseType::default())
    }
}

/// A SQL builder collecting text and bound parameters.
#[derive(Debug, Clone)]
pub struct SqlBuilder {
    options: SqlOptions,
    sql: String,
    params: Vec<FilterValue>,
    param_offset: usize,
}

impl SqlBuilder {
    /// Create a builder whose first placeholder is `param_offset + 1`.
    pub fn new(options: SqlOptions, param_offset: usize) -> Self {
        Self {
            options,
            sql: String::with_capacity(64),
            params: Vec::new(),
            param_offset,
        }
    }

    /// Push a literal SQL string.
    pub fn push(&mut self, sql: impl AsRef<str>) -> &mut Self {
        self.sql.push_str(sql.as_ref());
        self
    }

    /// Push a parameter placeholder and record its value.
    pub fn push_param(&mut self, value: impl Into<FilterValue>) -> &mut Self {
        self.params.push(value.into());
        let index = self.param_offset + self.params.len();
        let placeholder = self.options.db.placeholder(index);
        self.sql.push_str(&placeholder);
        self
    }

    /// Push an identifier (quoted if needed).
    pub fn push_identifier(&mut self, name: &str) -> &mut Self {
        let ident = self.options.identifier(name);
        self.sql.push_str(&ident);
        self
    }

    /// Push a field or literal operand.
    pub fn push_operand(&mut self, operand: &Operand) -> &mut Self {
        match operand {
            Operand::Value(v) => self.push_param(v.clone()),
            Operand::Field(name) => self.push_identifier(name),
        }
    }

    /// Build the final SQL string and parameters.
    pub fn build(self) -> (String, Vec<FilterValue>) {
        (self.sql, self.params)
    }
}

impl PredicateExpr {
    /// Render as a SQL condition. Placeholders start at `param_offset + 1`.
    ///
    /// Fails with `UnsupportedPushdown` when the dialect cannot reproduce
    /// in-memory evaluation exactly.
    pub fn to_sql(&self, options: &SqlOptions, param_offset: usize) -> QueryResult<(String, Vec<FilterValue>)> {
        let mut builder = SqlBuilder::new(*options, param_offset);
        self.write_sql(&mut builder)?;
        let (sql, params) = builder.build();
        trace!(predicate = %self, sql = %sql, params = params.len(), "Translated predicate");
        Ok((sql, params))
    }

    /// Append this condition to a builder.
    pub fn write_sql(&self, builder: &mut SqlBuilder) -> QueryResult<()> {
        match self {
            Self::FieldCompare {
                field,
                op,
                operand,
                on_null,
            } => match on_null {
                None => {
                    builder
                        .push_identifier(field)
                        .push(" ")
                        .push(op.symbol())
                        .push(" ")
                        .push_operand(operand);
                }
                Some(lift) => {
                    let null_test = if *lift {
                        " IS NULL OR "
                    } else {
                        " IS NOT NULL AND "
                    };
                    builder
                        .push("(")
                        .push_identifier(field)
                        .push(null_test)
                        .push_identifier(field)
                        .push(" ")
                        .push(op.symbol())
                        .push(" ")
                        .push_operand(operand)
                        .push(")");
                }
            },
            Self::DateFromPartsCompare {
                year,
                month,
                day,
                op,
                threshold,
            } => {
                let db = builder.options.db;
                let assembled = db
                    .date_from_parts(
                        &builder.options.identifier(year),
                        &builder.options.identifier(month),
                        &builder.options.identifier(day),
                    )
                    .ok_or_else(|| {
                        QueryError::unsupported_pushdown(db, "Decomposed date comparison")
                            .with_context(format!("Translating `{}`", self))
                            .with_help(format!(
                                "{} has no date-from-parts function that rejects impossible dates",
                                db
                            ))
                    })?;
                builder
                    .push(assembled)
                    .push(" ")
                    .push(op.symbol())
                    .push(" ")
                    .push_param(*threshold);
            }
        }
        Ok(())
    }
}

impl<R> Predicate<R> {
    /// Render as a SQL condition for pushdown.
    pub fn to_sql(&self, options: &SqlOptions, param_offset: usize) -> QueryResult<(String, Vec<FilterValue>)> {
        self.expr().to_sql(options, param_offset)
    }
}
