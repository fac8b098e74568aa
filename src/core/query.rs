//! Queries and result type descriptors
//!
//! A [`Query`] names the variant used to pick a fetcher, carries filter
//! parameters, and points at the [`ResultType`] describing the shape the
//! caller wants back. A result type extends a core type with an ordered list
//! of declared fields, each driven by its own sub-query.
//!
//! Descriptors are built once and shared through `Arc`; nothing is
//! recomputed per fetch call.
//!
//! # Example
//!
//! ```rust,ignore
//! let user = ResultType::core("user");
//! let comment_with_author = ResultType::builder("comment_with_author", "comment")
//!     .field("author", Query::new("user", user))
//!     .build()?;
//! let post_with_comments = ResultType::builder("post_with_comments", "post")
//!     .field("comments", Query::new("comment", comment_with_author))
//!     .build()?;
//!
//! let query = Query::new("post", post_with_comments).with_param("title", "<post 1>");
//! ```

use indexmap::IndexMap;
use serde_json::Value as Json;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::core::error::SchemaError;

/// Tag identifying the variant of a query
///
/// Fetchers declare the variant they accept; the registry matches on
/// equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryVariant(String);

impl QueryVariant {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QueryVariant {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for QueryVariant {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// A declarative request for records of a given shape
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    variant: QueryVariant,
    result_type: Arc<ResultType>,
    params: IndexMap<String, Json>,
}

impl Query {
    /// Create a query with no filter parameters
    pub fn new(variant: impl Into<QueryVariant>, result_type: Arc<ResultType>) -> Self {
        Self {
            variant: variant.into(),
            result_type,
            params: IndexMap::new(),
        }
    }

    /// Return a copy of this query with one more filter parameter
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Json>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn variant(&self) -> &QueryVariant {
        &self.variant
    }

    pub fn result_type(&self) -> &Arc<ResultType> {
        &self.result_type
    }

    /// Get a filter parameter by name
    pub fn param(&self, name: &str) -> Option<&Json> {
        self.params.get(name)
    }

    pub fn params(&self) -> &IndexMap<String, Json> {
        &self.params
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<{}>", self.variant, self.result_type.name())?;

        if !self.params.is_empty() {
            let params: Vec<String> = self
                .params
                .iter()
                .map(|(key, value)| format!("{}={}", key, value))
                .collect();
            write!(f, "({})", params.join(", "))?;
        }

        Ok(())
    }
}

/// A declared extra field: its name and the sub-query resolving it
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    name: String,
    query: Query,
}

impl FieldDecl {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn query(&self) -> &Query {
        &self.query
    }
}

/// Describes the shape of a result: a core type plus declared fields
///
/// The composed record carries every attribute of the core record followed
/// by the declared fields, in declaration order.
#[derive(Debug, PartialEq)]
pub struct ResultType {
    name: String,
    core: String,
    fields: Vec<FieldDecl>,
}

impl ResultType {
    /// A result type that is exactly its core type, with no extra fields
    pub fn core(name: impl Into<String>) -> Arc<Self> {
        let name = name.into();
        Arc::new(Self {
            core: name.clone(),
            name,
            fields: Vec::new(),
        })
    }

    /// Start describing a result type extending `core`
    pub fn builder(name: impl Into<String>, core: impl Into<String>) -> ResultTypeBuilder {
        ResultTypeBuilder {
            name: name.into(),
            core: core.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the core type this result type extends
    pub fn core_type(&self) -> &str {
        &self.core
    }

    /// Declared fields, in declaration order
    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn has_fields(&self) -> bool {
        !self.fields.is_empty()
    }

    /// Number of field levels below this type (0 when there are no fields)
    pub fn depth(&self) -> usize {
        self.fields
            .iter()
            .map(|field| 1 + field.query.result_type.depth())
            .max()
            .unwrap_or(0)
    }
}

/// Builder for [`ResultType`]
#[derive(Debug)]
pub struct ResultTypeBuilder {
    name: String,
    core: String,
    fields: Vec<FieldDecl>,
}

impl ResultTypeBuilder {
    /// Declare an extra field resolved by `query`
    pub fn field(mut self, name: impl Into<String>, query: Query) -> Self {
        self.fields.push(FieldDecl {
            name: name.into(),
            query,
        });
        self
    }

    /// Finish the descriptor, rejecting duplicate field names
    pub fn build(self) -> Result<Arc<ResultType>, SchemaError> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    result_type: self.name.clone(),
                    field: field.name.clone(),
                });
            }
        }

        Ok(Arc::new(ResultType {
            name: self.name,
            core: self.core,
            fields: self.fields,
        }))
    }
}
