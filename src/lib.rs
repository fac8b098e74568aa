//! # Graft
//!
//! A generic object-graph fetch executor.
//!
//! A query names the shape of the result it wants: a core type plus any
//! number of declared fields, each resolved by its own sub-query. The
//! executor fetches the core records through a root fetcher, then resolves
//! every declared field with one batched call per field per nesting level,
//! whatever the number of parent records.
//!
//! ## Features
//!
//! - **Pluggable Fetchers**: Root and field fetchers are async traits registered by query variant
//! - **Batched Resolution**: One field fetch per field per level, no N+1 queries
//! - **Order Preserving**: Output order always equals root fetcher order
//! - **Arbitrary Nesting**: Fields may return lists of lists; nesting survives resolution
//! - **Configuration-Based**: Define result types via YAML configuration
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use graft::prelude::*;
//!
//! let comment_with_author = ResultType::builder("comment_with_author", "comment")
//!     .field("author", Query::new("user", ResultType::core("user")))
//!     .build()?;
//! let post_with_comments = ResultType::builder("post_with_comments", "post")
//!     .field("comments", Query::new("comment", comment_with_author))
//!     .build()?;
//!
//! let executor = Executor::new(
//!     FetcherRegistry::new()
//!         .register_root("post", "post", posts)
//!         .register_field("comment", "comment", "post", post_comments)
//!         .register_field("user", "user", "comment", comment_author),
//! );
//!
//! // One call for posts, one for all comments, one for all authors
//! let posts = executor.fetch(&Query::new("post", post_with_comments)).await?;
//! ```

pub mod config;
pub mod core;
pub mod executor;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core Types ===
    pub use crate::core::{
        error::{ConfigError, ErrorResponse, FetchError, GraftError, GraftResult, SchemaError},
        fetcher::{FieldFetcher, RootFetcher},
        query::{FieldDecl, Query, QueryVariant, ResultType},
        registry::FetcherRegistry,
        value::{Record, Value},
    };

    // === Executor ===
    pub use crate::executor::Executor;

    // === Config ===
    pub use crate::config::{ExecutorConfig, Schema, SchemaConfig};

    // === Storage ===
    pub use crate::storage::{Cardinality, InMemoryRelation, InMemoryRootFetcher};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use serde_json::json;
}
