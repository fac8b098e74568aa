//! Fetch executor
//!
//! The executor resolves a query in two phases:
//! - `core`: root dispatch and output orchestration
//! - `field_resolver`: batched, recursive resolution of declared fields

mod core;
mod field_resolver;

pub use self::core::Executor;
