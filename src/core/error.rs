//! Typed error handling for graft
//!
//! This module provides an error type hierarchy that lets callers handle
//! failures specifically instead of matching on strings.
//!
//! # Error Categories
//!
//! - [`FetchError`]: Errors raised while executing a fetch (lookup, fetcher, composition)
//! - [`SchemaError`]: Errors raised while building result type descriptors
//! - [`ConfigError`]: Errors raised while loading configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use graft::prelude::*;
//!
//! match executor.fetch(&query).await {
//!     Ok(records) => println!("{} records", records.len()),
//!     Err(FetchError::NoRootFetcherFound { query }) => {
//!         eprintln!("nothing registered for {}", query.variant());
//!     }
//!     Err(e) => eprintln!("fetch failed: {}", e),
//! }
//! ```

use serde::Serialize;
use thiserror::Error;

use crate::core::query::Query;

/// The main error type for graft
///
/// Each variant wraps the more specific error type for that category.
#[derive(Debug, Error)]
pub enum GraftError {
    /// Fetch execution errors
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Result type descriptor errors
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Internal errors (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Serializable error summary, suitable for logs or API payloads
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl GraftError {
    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            GraftError::Fetch(e) => e.error_code(),
            GraftError::Schema(e) => e.error_code(),
            GraftError::Config(e) => e.error_code(),
            GraftError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            GraftError::Fetch(e) => e.details(),
            GraftError::Schema(SchemaError::Cycle { path }) => {
                Some(serde_json::json!({ "path": path }))
            }
            _ => None,
        }
    }
}

// =============================================================================
// Fetch Errors
// =============================================================================

/// Errors raised by [`Executor::fetch`](crate::executor::Executor::fetch)
///
/// Every variant aborts the enclosing fetch call; no partial output is
/// produced.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No registered root fetcher accepts the query's variant
    #[error("No root fetcher registered for query {query}")]
    NoRootFetcherFound { query: Query },

    /// No registered field fetcher accepts the (query variant, parent type) pair
    #[error("No field fetcher registered for query {query} on parent type '{parent_type}'")]
    NoFieldFetcherFound { query: Query, parent_type: String },

    /// A fetcher implementation failed; the source error is passed through unmodified
    #[error(transparent)]
    Fetcher(anyhow::Error),

    /// A field fetcher returned a batch whose outer length differs from its parents
    #[error(
        "Field fetcher for '{field}' on '{parent_type}' returned {actual} values for {expected} parents"
    )]
    MisalignedBatch {
        field: String,
        parent_type: String,
        expected: usize,
        actual: usize,
    },

    /// Flattened leaf count does not match the recorded shape
    #[error("Shape expects {expected} leaves but {actual} were supplied")]
    ShapeMismatch { expected: usize, actual: usize },

    /// The fetcher produced a different core type than the result type extends
    #[error(
        "Result type '{result_type}' extends '{expected}' but the matched fetcher produces '{actual}'"
    )]
    CoreTypeMismatch {
        result_type: String,
        expected: String,
        actual: String,
    },

    /// Declared fields were requested on a scalar leaf
    #[error("Cannot attach field '{field}' to a non-record value of type '{value_type}'")]
    NotARecord { field: String, value_type: String },

    /// A declared field collides with an attribute of the core record
    #[error("Field '{field}' already exists on '{type_name}'")]
    FieldConflict { type_name: String, field: String },

    /// Declaration nesting went past the configured limit
    #[error("Field '{field}' exceeds the maximum nesting depth of {max_depth}")]
    DepthExceeded { field: String, max_depth: usize },
}

impl FetchError {
    pub fn error_code(&self) -> &'static str {
        match self {
            FetchError::NoRootFetcherFound { .. } => "NO_ROOT_FETCHER_FOUND",
            FetchError::NoFieldFetcherFound { .. } => "NO_FIELD_FETCHER_FOUND",
            FetchError::Fetcher(_) => "FETCHER_FAILED",
            FetchError::MisalignedBatch { .. } => "MISALIGNED_BATCH",
            FetchError::ShapeMismatch { .. } => "SHAPE_MISMATCH",
            FetchError::CoreTypeMismatch { .. } => "CORE_TYPE_MISMATCH",
            FetchError::NotARecord { .. } => "NOT_A_RECORD",
            FetchError::FieldConflict { .. } => "FIELD_CONFLICT",
            FetchError::DepthExceeded { .. } => "DEPTH_EXCEEDED",
        }
    }

    /// Whether the error originated inside a fetcher implementation
    pub fn is_fetcher_failure(&self) -> bool {
        matches!(self, FetchError::Fetcher(_))
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            FetchError::NoRootFetcherFound { query } => Some(serde_json::json!({
                "variant": query.variant().as_str(),
                "result_type": query.result_type().name(),
            })),
            FetchError::NoFieldFetcherFound { query, parent_type } => Some(serde_json::json!({
                "variant": query.variant().as_str(),
                "result_type": query.result_type().name(),
                "parent_type": parent_type,
            })),
            FetchError::MisalignedBatch {
                expected, actual, ..
            }
            | FetchError::ShapeMismatch { expected, actual } => Some(serde_json::json!({
                "expected": expected,
                "actual": actual,
            })),
            _ => None,
        }
    }
}

// =============================================================================
// Schema Errors
// =============================================================================

/// Errors raised while building result type descriptors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The same field name is declared twice on one result type
    #[error("Field '{field}' is declared more than once on '{result_type}'")]
    DuplicateField { result_type: String, field: String },

    /// The same result type name is defined twice in one configuration
    #[error("Result type '{name}' is defined more than once")]
    DuplicateResultType { name: String },

    /// A query references a result type that is not defined
    #[error("Unknown result type '{name}' referenced by '{referenced_by}'")]
    UnknownResultType { name: String, referenced_by: String },

    /// A result type extends a core type that is not declared
    #[error("Result type '{result_type}' extends unknown core type '{core}'")]
    UnknownCoreType { result_type: String, core: String },

    /// The field declaration graph loops back on itself
    #[error("Result type declarations form a cycle: {}", join_path(.path))]
    Cycle { path: Vec<String> },
}

impl SchemaError {
    pub fn error_code(&self) -> &'static str {
        match self {
            SchemaError::DuplicateField { .. } => "DUPLICATE_FIELD",
            SchemaError::DuplicateResultType { .. } => "DUPLICATE_RESULT_TYPE",
            SchemaError::UnknownResultType { .. } => "UNKNOWN_RESULT_TYPE",
            SchemaError::UnknownCoreType { .. } => "UNKNOWN_CORE_TYPE",
            SchemaError::Cycle { .. } => "SCHEMA_CYCLE",
        }
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration
    #[error("Failed to parse config{}: {message}", file_suffix(.file))]
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// IO error while reading configuration
    #[error("IO error: {message}")]
    IoError { message: String },
}

fn join_path(path: &[String]) -> String {
    path.join(" -> ")
}

fn file_suffix(file: &Option<String>) -> String {
    file.as_ref()
        .map(|f| format!(" file '{}'", f))
        .unwrap_or_default()
}

impl ConfigError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigError::ParseError { .. } => "CONFIG_PARSE_ERROR",
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND",
            ConfigError::IoError { .. } => "CONFIG_IO_ERROR",
        }
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for GraftError {
    fn from(err: serde_yaml::Error) -> Self {
        GraftError::Config(err.into())
    }
}

impl From<std::io::Error> for GraftError {
    fn from(err: std::io::Error) -> Self {
        GraftError::Config(err.into())
    }
}

/// Convert from anyhow::Error for callers mixing both styles
impl From<anyhow::Error> for GraftError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<FetchError>() {
            Ok(fetch_err) => GraftError::Fetch(fetch_err),
            Err(err) => GraftError::Internal(err.to_string()),
        }
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for graft operations
pub type GraftResult<T> = Result<T, GraftError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::query::ResultType;

    fn post_query() -> Query {
        Query::new("post", ResultType::core("post"))
    }

    #[test]
    fn test_no_root_fetcher_display() {
        let err = FetchError::NoRootFetcherFound {
            query: post_query(),
        };
        assert!(err.to_string().contains("post"));
        assert_eq!(err.error_code(), "NO_ROOT_FETCHER_FOUND");
    }

    #[test]
    fn test_no_field_fetcher_carries_parent_type() {
        let err = FetchError::NoFieldFetcherFound {
            query: post_query(),
            parent_type: "user".to_string(),
        };
        assert!(err.to_string().contains("'user'"));

        let response = GraftError::from(err).to_response();
        assert_eq!(response.code, "NO_FIELD_FETCHER_FOUND");
        let details = response.details.expect("details should be present");
        assert_eq!(details["parent_type"], "user");
    }

    #[test]
    fn test_fetcher_error_is_transparent() {
        let err = FetchError::Fetcher(anyhow::anyhow!("connection refused"));
        assert_eq!(err.to_string(), "connection refused");
        assert!(err.is_fetcher_failure());
    }

    #[test]
    fn test_schema_cycle_display() {
        let err = SchemaError::Cycle {
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(
            err.to_string(),
            "Result type declarations form a cycle: a -> b -> a"
        );
    }

    #[test]
    fn test_config_parse_error_mentions_file() {
        let err = ConfigError::ParseError {
            file: Some("schema.yaml".to_string()),
            message: "bad indent".to_string(),
        };
        assert!(err.to_string().contains("schema.yaml"));

        let err = ConfigError::ParseError {
            file: None,
            message: "bad indent".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to parse config: bad indent");
    }

    #[test]
    fn test_anyhow_downcast_keeps_fetch_error() {
        let err = anyhow::Error::new(FetchError::ShapeMismatch {
            expected: 2,
            actual: 3,
        });
        let graft_err: GraftError = err.into();
        assert_eq!(graft_err.error_code(), "SHAPE_MISMATCH");

        let graft_err: GraftError = anyhow::anyhow!("boom").into();
        assert!(matches!(graft_err, GraftError::Internal(_)));
    }
}
