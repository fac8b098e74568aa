//! Fetcher capability
//!
//! Fetchers are the executor's only boundary with storage. A concrete
//! fetcher (SQL adapter, HTTP client, in-memory store) implements one of
//! these traits and is registered in a
//! [`FetcherRegistry`](crate::core::registry::FetcherRegistry).

use anyhow::Result;
use async_trait::async_trait;

use crate::core::query::Query;
use crate::core::value::{Record, Value};

/// Resolves a query directly into core records
#[async_trait]
pub trait RootFetcher: Send + Sync {
    /// Fetch the core records matching `query`
    ///
    /// # Returns
    /// Core records in the order they should appear in the output
    async fn fetch(&self, query: &Query) -> Result<Vec<Record>>;

    /// Name used in logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Resolves a sub-query into field values for a batch of parents
#[async_trait]
pub trait FieldFetcher: Send + Sync {
    /// Fetch the field value of every parent in one call
    ///
    /// # Arguments
    /// * `query` - The sub-query attached to the declared field
    /// * `parents` - The whole batch of parent records at this level
    ///
    /// # Returns
    /// Exactly one value per parent, in parent order. A value may be a leaf
    /// or a (possibly nested) [`Value::List`] of leaves.
    async fn fetch(&self, query: &Query, parents: &[Record]) -> Result<Vec<Value>>;

    /// Name used in logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
