//! Error types for predicate construction, evaluation and translation.
//!
//! Every error carries:
//! - An error code for programmatic handling
//! - Actionable suggestions for fixing the issue
//! - Context about the record, field and operation involved
//!
//! # Error Codes
//!
//! Error codes follow a pattern: S{category}{number}
//! - 1xxx: Selector errors (unsupported shape, unknown field, syntax)
//! - 2xxx: Typing errors (threshold not comparable with the field)
//! - 3xxx: Evaluation errors (invalid decomposed date)
//! - 5xxx: Translation and execution errors
//! - 7xxx: Configuration errors
//!
//! # Creating Errors
//!
//! ```rust
//! use sift_query::{QueryError, ErrorCode};
//!
//! let err = QueryError::unsupported_selector_shape("year + 1");
//! assert_eq!(err.code, ErrorCode::UnsupportedSelectorShape);
//! assert!(err.is_construction_error());
//!
//! let err = QueryError::date_construction(2012, 2, 31);
//! assert_eq!(err.code, ErrorCode::DateConstructionError);
//! assert!(err.to_string().contains("2012-02-31"));
//! ```
//!
//! None of the errors raised by the core are retryable: construction and
//! evaluation are pure, so a retry reproduces the identical failure.

use std::fmt;
use thiserror::Error;

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Selector errors (1xxx)
    /// Selector does not reduce to plain field reference(s) (S1001).
    UnsupportedSelectorShape = 1001,
    /// Selector names a field the record type does not declare (S1002).
    UnknownField = 1002,
    /// Textual selector could not be parsed (S1003).
    InvalidSelectorSyntax = 1003,

    // Typing errors (2xxx)
    /// Threshold type is not comparable to the field type (S2001).
    TypeMismatch = 2001,

    // Evaluation errors (3xxx)
    /// Decomposed date components do not form a valid date (S3001).
    DateConstructionError = 3001,

    // Translation and execution errors (5xxx)
    /// General database error reported by a query engine (S5001).
    DatabaseError = 5001,
    /// Predicate cannot be rendered for the target dialect (S5002).
    UnsupportedPushdown = 5002,

    // Configuration errors (7xxx)
    /// Invalid configuration (S7001).
    InvalidConfiguration = 7001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "S1001").
    pub fn code(&self) -> String {
        format!("S{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::UnsupportedSelectorShape => "Unsupported selector shape",
            Self::UnknownField => "Unknown field",
            Self::InvalidSelectorSyntax => "Invalid selector syntax",
            Self::TypeMismatch => "Type mismatch",
            Self::DateConstructionError => "Date construction error",
            Self::DatabaseError => "Database error",
            Self::UnsupportedPushdown => "Unsupported pushdown",
            Self::InvalidConfiguration => "Invalid configuration",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Suggestion for fixing an error.
#[derive(Debug, Clone)]
pub struct Suggestion {
    /// The suggestion text.
    pub text: String,
    /// Optional code example.
    pub code: Option<String>,
}

impl Suggestion {
    /// Create a new suggestion.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            code: None,
        }
    }

    /// Add a code example.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation that was being performed.
    pub operation: Option<String>,
    /// The record type involved.
    pub record: Option<String>,
    /// The field involved.
    pub field: Option<String>,
    /// The SQL text (if available).
    pub sql: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<Suggestion>,
    /// Help text.
    pub help: Option<String>,
}

/// Errors raised while building, evaluating or translating predicates.
#[derive(Error, Debug)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add context about the operation.
    pub fn with_context(mut self, operation: impl Into<String>) -> Self {
        self.context.operation = Some(operation.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(Suggestion::new(suggestion));
        self
    }

    /// Add a code suggestion.
    pub fn with_code_suggestion(mut self, text: impl Into<String>, code: impl Into<String>) -> Self {
        self.context
            .suggestions
            .push(Suggestion::new(text).with_code(code));
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    /// Set the record type.
    pub fn with_record(mut self, record: impl Into<String>) -> Self {
        self.context.record = Some(record.into());
        self
    }

    /// Set the field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    /// Set the SQL text.
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.context.sql = Some(sql.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// A selector that is not a field access or a composite of field accesses.
    pub fn unsupported_selector_shape(shape: impl Into<String>) -> Self {
        let shape = shape.into();
        Self::new(
            ErrorCode::UnsupportedSelectorShape,
            format!(
                "Selector `{}` must be a field access or a composite of field accesses",
                shape
            ),
        )
        .with_suggestion("Select the field directly instead of computing a value from it")
        .with_code_suggestion(
            "Use a single field or a composite of fields",
            "Selector::field(\"year\") or Selector::fields([\"year\", \"month\"])",
        )
    }

    /// A selector naming a field the record does not declare.
    pub fn unknown_field(record: impl Into<String>, field: impl Into<String>) -> Self {
        let record = record.into();
        let field = field.into();
        Self::new(
            ErrorCode::UnknownField,
            format!("{} has no field named `{}`", record, field),
        )
        .with_record(&record)
        .with_field(&field)
        .with_suggestion("Check the field name against the record's FIELDS catalogue")
    }

    /// A textual selector that failed to parse.
    pub fn invalid_selector_syntax(input: impl Into<String>, position: usize, message: impl Into<String>) -> Self {
        let input = input.into();
        let message = message.into();
        Self::new(
            ErrorCode::InvalidSelectorSyntax,
            format!("Invalid selector `{}` at offset {}: {}", input, position, message),
        )
    }

    /// A threshold or component whose type cannot be compared with the field.
    pub fn type_mismatch(field: impl Into<String>, expected: impl fmt::Display, found: impl fmt::Display) -> Self {
        let field = field.into();
        Self::new(
            ErrorCode::TypeMismatch,
            format!("Type mismatch on `{}`: expected {}, found {}", field, expected, found),
        )
        .with_field(&field)
    }

    /// Decomposed date components that do not form a calendar date.
    pub fn date_construction(year: i64, month: i64, day: i64) -> Self {
        Self::new(
            ErrorCode::DateConstructionError,
            format!("Cannot construct a date from {:04}-{:02}-{:02}", year, month, day),
        )
        .with_help("Component values are not clamped or wrapped; fix the stored year, month or day")
    }

    /// Decomposed date with an absent component.
    pub fn date_component_missing(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(
            ErrorCode::DateConstructionError,
            format!("Cannot construct a date: component `{}` is null", field),
        )
        .with_field(&field)
    }

    /// Decomposed date with a fractional or non-finite component.
    pub fn date_component_not_integral(field: impl Into<String>, value: f64) -> Self {
        let field = field.into();
        Self::new(
            ErrorCode::DateConstructionError,
            format!("Cannot construct a date: component `{}` is {}, not a whole number", field, value),
        )
        .with_field(&field)
    }

    /// A predicate the dialect cannot evaluate with the same result as memory.
    pub fn unsupported_pushdown(dialect: impl fmt::Display, what: impl Into<String>) -> Self {
        let what = what.into();
        Self::new(
            ErrorCode::UnsupportedPushdown,
            format!("{} cannot be pushed down to {}", what, dialect),
        )
        .with_suggestion("Load the rows and evaluate the predicate in memory with `Predicate::filter`")
    }

    /// Create a general database error.
    pub fn database(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorCode::DatabaseError, message)
            .with_suggestion("Check the database logs for more details")
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(
            ErrorCode::InvalidConfiguration,
            format!("Invalid configuration: {}", message),
        )
    }

    // ============== Error Checks ==============

    /// Check if this error was raised while building a predicate.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::UnsupportedSelectorShape
                | ErrorCode::UnknownField
                | ErrorCode::InvalidSelectorSyntax
                | ErrorCode::TypeMismatch
        )
    }

    /// Check if this error was raised while evaluating a predicate.
    pub fn is_evaluation_error(&self) -> bool {
        self.code == ErrorCode::DateConstructionError
    }

    /// Check if this error is retryable.
    ///
    /// Only engine-reported failures can change between attempts.
    pub fn is_retryable(&self) -> bool {
        self.code == ErrorCode::DatabaseError
    }

    /// Display the full error with all context and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error [{}]: {}\n", self.code.code(), self.message));

        if let Some(ref op) = self.context.operation {
            output.push_str(&format!("  → While: {}\n", op));
        }
        if let Some(ref record) = self.context.record {
            output.push_str(&format!("  → Record: {}\n", record));
        }
        if let Some(ref field) = self.context.field {
            output.push_str(&format!("  → Field: {}\n", field));
        }
        if let Some(ref sql) = self.context.sql {
            let sql_display = match sql.char_indices().nth(200) {
                Some((cut, _)) => format!("{}...", &sql[..cut]),
                None => sql.clone(),
            };
            output.push_str(&format!("  → SQL: {}\n", sql_display));
        }

        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion.text));
                if let Some(ref code) = suggestion.code {
                    output.push_str(&format!(
                        "     ```\n     {}\n     ```\n",
                        code.replace('\n', "\n     ")
                    ));
                }
            }
        }

        if let Some(ref help) = self.context.help {
            output.push_str(&format!("\nHelp: {}\n", help));
        }

        output
    }
}

/// Helper for creating errors with context.
#[macro_export]
macro_rules! query_error {
    ($code:expr, $msg:expr) => {
        $crate::error::QueryError::new($code, $msg)
    };
    ($code:expr, $msg:expr, $($key:ident = $value:expr),+ $(,)?) => {{
        let mut err = $crate::error::QueryError::new($code, $msg);
        $(
            err = err.$key($value);
        )+
        err
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::UnsupportedSelectorShape.code(), "S1001");
        assert_eq!(ErrorCode::TypeMismatch.code(), "S2001");
        assert_eq!(ErrorCode::DateConstructionError.code(), "S3001");
    }

    #[test]
    fn test_unsupported_shape_is_construction_error() {
        let err = QueryError::unsupported_selector_shape("len(name)");
        assert!(err.is_construction_error());
        assert!(!err.is_evaluation_error());
        assert!(err.message.contains("len(name)"));
        assert!(!err.context.suggestions.is_empty());
    }

    #[test]
    fn test_date_construction_is_evaluation_error() {
        let err = QueryError::date_construction(2012, 13, 1);
        assert!(err.is_evaluation_error());
        assert!(!err.is_retryable());
        assert!(err.message.contains("2012-13-01"));
    }

    #[test]
    fn test_unknown_field_context() {
        let err = QueryError::unknown_field("Order", "shipped");
        assert_eq!(err.context.record.as_deref(), Some("Order"));
        assert_eq!(err.context.field.as_deref(), Some("shipped"));
    }

    #[test]
    fn test_type_mismatch_message() {
        let err = QueryError::type_mismatch("created_at", "date", "text");
        assert_eq!(err.code, ErrorCode::TypeMismatch);
        assert_eq!(err.to_string(), "[S2001] Type mismatch on `created_at`: expected date, found text");
    }

    #[test]
    fn test_display_full() {
        let err = QueryError::unknown_field("Order", "shipped").with_context("Building date-after predicate");

        let output = err.display_full();
        assert!(output.contains("S1002"));
        assert!(output.contains("Order"));
        assert!(output.contains("While: Building date-after predicate"));
        assert!(output.contains("Suggestions"));
    }

    #[test]
    fn test_error_macro() {
        let err = query_error!(
            ErrorCode::DatabaseError,
            "engine rejected filter",
            with_sql = "DELETE FROM t WHERE x > $1;",
        );

        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(err.context.sql.is_some());
    }

    #[test]
    fn test_display_full_truncates_on_char_boundary() {
        let sql = format!("SELECT '{}'", "é".repeat(300));
        let output = QueryError::database("failed").with_sql(sql).display_full();

        let line = output.lines().find(|l| l.contains("SQL:")).unwrap();
        assert!(line.ends_with("..."));
        assert_eq!(line.trim_start_matches("  → SQL: ").trim_end_matches("...").chars().count(), 200);
    }

    #[test]
    fn test_unsupported_pushdown() {
        let err = QueryError::unsupported_pushdown("sqlite", "Decomposed date comparison");
        assert_eq!(err.code.code(), "S5002");
        assert!(!err.is_construction_error());
        assert!(!err.is_retryable());
        assert!(err.message.contains("sqlite"));
    }
}
