//! Core executor orchestration

use crate::config::ExecutorConfig;
use crate::core::error::FetchError;
use crate::core::query::{FieldDecl, Query, ResultType};
use crate::core::registry::FetcherRegistry;
use crate::core::value::Record;

/// Executes queries against a registry of fetchers
///
/// One root fetch resolves the core records; each declared field is then
/// resolved with exactly one field fetch per nesting level, whatever the
/// number of parents. Output order always equals root fetcher order.
///
/// # Example
///
/// ```rust,ignore
/// let executor = Executor::new(
///     FetcherRegistry::new()
///         .register_root("post", "post", PostFetcher::new(store.clone()))
///         .register_field("comment", "comment", "post", PostCommentFetcher::new(store)),
/// );
///
/// let posts = executor.fetch(&Query::new("post", post_with_comments)).await?;
/// ```
#[derive(Debug)]
pub struct Executor {
    pub(super) registry: FetcherRegistry,
    pub(super) config: ExecutorConfig,
}

impl Executor {
    /// Create an executor with the default configuration
    pub fn new(registry: FetcherRegistry) -> Self {
        Self::with_config(registry, ExecutorConfig::default())
    }

    pub fn with_config(registry: FetcherRegistry, config: ExecutorConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &FetcherRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Fetch the records described by `query`
    ///
    /// Any lookup, fetcher or composition failure aborts the whole call.
    /// A result type nested deeper than `max_depth` is rejected before any
    /// fetcher runs.
    pub async fn fetch(&self, query: &Query) -> Result<Vec<Record>, FetchError> {
        let root = self.registry.find_root(query)?;
        let result_type = query.result_type();
        check_core_type(result_type, root.core_type)?;

        if let Some(max_depth) = self.config.max_depth
            && result_type.depth() > max_depth
        {
            return Err(FetchError::DepthExceeded {
                field: field_beyond(result_type, max_depth)
                    .map(|field| field.name().to_string())
                    .unwrap_or_default(),
                max_depth,
            });
        }

        tracing::debug!(
            variant = %query.variant(),
            result_type = result_type.name(),
            fetcher = root.fetcher.name(),
            "dispatching root fetch"
        );

        let cores = root
            .fetcher
            .fetch(query)
            .await
            .map_err(FetchError::Fetcher)?;

        tracing::debug!(
            variant = %query.variant(),
            records = cores.len(),
            fields = result_type.fields().len(),
            "root fetch complete"
        );

        if !result_type.has_fields() {
            return Ok(cores);
        }

        self.add_fields(cores, result_type, root.core_type).await
    }
}

/// A result type must extend the type its fetcher actually produces
pub(super) fn check_core_type(result_type: &ResultType, produced: &str) -> Result<(), FetchError> {
    if result_type.core_type() == produced {
        Ok(())
    } else {
        Err(FetchError::CoreTypeMismatch {
            result_type: result_type.name().to_string(),
            expected: result_type.core_type().to_string(),
            actual: produced.to_string(),
        })
    }
}

/// First declared field found below `levels` levels of nesting
fn field_beyond(result_type: &ResultType, levels: usize) -> Option<&FieldDecl> {
    result_type.fields().iter().find_map(|field| match levels {
        0 => Some(field),
        _ => field_beyond(field.query().result_type(), levels - 1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fetcher::RootFetcher;
    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::json;

    struct FixedPosts;

    #[async_trait]
    impl RootFetcher for FixedPosts {
        async fn fetch(&self, _query: &Query) -> Result<Vec<Record>> {
            Ok(vec![
                Record::new("post").with("id", json!(2)),
                Record::new("post").with("id", json!(1)),
            ])
        }
    }

    struct FailingRoot;

    #[async_trait]
    impl RootFetcher for FailingRoot {
        async fn fetch(&self, _query: &Query) -> Result<Vec<Record>> {
            Err(anyhow::anyhow!("database unavailable"))
        }
    }

    #[tokio::test]
    async fn test_fetch_without_fields_returns_root_output() {
        let executor = Executor::new(FetcherRegistry::new().register_root("post", "post", FixedPosts));

        let records = executor
            .fetch(&Query::new("post", ResultType::core("post")))
            .await
            .unwrap();

        assert_eq!(records, FixedPosts.fetch(&Query::new("post", ResultType::core("post"))).await.unwrap());
    }

    #[tokio::test]
    async fn test_fetch_rejects_core_type_mismatch() {
        let executor = Executor::new(FetcherRegistry::new().register_root("post", "post", FixedPosts));

        let err = executor
            .fetch(&Query::new("post", ResultType::core("user")))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::CoreTypeMismatch { ref actual, .. } if actual == "post"));
    }

    #[tokio::test]
    async fn test_fetcher_failure_passes_through() {
        let executor = Executor::new(FetcherRegistry::new().register_root("post", "post", FailingRoot));

        let err = executor
            .fetch(&Query::new("post", ResultType::core("post")))
            .await
            .unwrap_err();

        assert!(err.is_fetcher_failure());
        assert_eq!(err.to_string(), "database unavailable");
    }

    fn post_with_threads() -> std::sync::Arc<ResultType> {
        let comment_with_author = ResultType::builder("comment_with_author", "comment")
            .field("author", Query::new("user", ResultType::core("user")))
            .build()
            .unwrap();
        ResultType::builder("post_with_threads", "post")
            .field("tags", Query::new("tag", ResultType::core("tag")))
            .field("comments", Query::new("comment", comment_with_author))
            .build()
            .unwrap()
    }

    #[test]
    fn test_field_beyond_finds_first_too_deep_field() {
        let result_type = post_with_threads();

        assert_eq!(field_beyond(&result_type, 0).map(FieldDecl::name), Some("tags"));
        assert_eq!(field_beyond(&result_type, 1).map(FieldDecl::name), Some("author"));
        assert!(field_beyond(&result_type, 2).is_none());
    }

    #[tokio::test]
    async fn test_depth_limit_checked_before_root_fetch() {
        let executor = Executor::with_config(
            FetcherRegistry::new().register_root("post", "post", FailingRoot),
            ExecutorConfig { max_depth: Some(1) },
        );

        let err = executor
            .fetch(&Query::new("post", post_with_threads()))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FetchError::DepthExceeded { ref field, max_depth: 1 } if field == "author"
        ));
    }
}
