//! Blog example: posts with their comments and comment authors
//!
//! Run with `RUST_LOG=graft=debug` to see one fetch per field per level.

use graft::prelude::*;
use tracing_subscriber::EnvFilter;

fn seed() -> Result<(InMemoryRootFetcher, InMemoryRootFetcher, InMemoryRootFetcher)> {
    let users = InMemoryRootFetcher::new("user");
    for (id, username) in [(1, "alice"), (2, "bob"), (3, "carol")] {
        users.insert(Record::new("user").with("id", json!(id)).with("username", username))?;
    }

    let posts = InMemoryRootFetcher::new("post");
    for (id, title) in [(1, "Batching field fetches"), (2, "Nested lists"), (3, "Empty post")] {
        posts.insert(Record::new("post").with("id", json!(id)).with("title", title))?;
    }

    let comments = InMemoryRootFetcher::new("comment");
    for (id, post_id, author_id, approved, body) in [
        (1, 1, 2, true, "One query per level, nice"),
        (2, 1, 3, false, "What about cycles?"),
        (3, 2, 1, true, "Order is preserved"),
    ] {
        comments.insert(
            Record::new("comment")
                .with("id", json!(id))
                .with("post_id", json!(post_id))
                .with("author_id", json!(author_id))
                .with("approved", approved)
                .with("body", body),
        )?;
    }

    Ok((posts, comments, users))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("graft=debug,blog=info")),
        )
        .init();

    let (posts, comments, users) = seed()?;

    let registry = FetcherRegistry::new()
        .register_root("post", "post", posts)
        .register_field(
            "comment",
            "comment",
            "post",
            InMemoryRelation::one_to_many(&comments, "id", "post_id"),
        )
        .register_field(
            "user",
            "user",
            "comment",
            InMemoryRelation::one_to_one(&users, "author_id", "id"),
        );

    for info in registry.describe() {
        tracing::info!(
            kind = ?info.kind,
            variant = %info.variant,
            produces = %info.produces,
            parent_type = info.parent_type.as_deref().unwrap_or("-"),
            fetcher = %info.fetcher,
            "registered fetcher"
        );
    }

    let schema_path = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/blog/schema.yaml");
    let schema = SchemaConfig::from_yaml_file(schema_path)?.build()?;
    let executor = Executor::with_config(registry, ExecutorConfig { max_depth: Some(4) });

    let query = schema.query("post", "post_with_comments")?;
    tracing::info!(query = %query, "fetching");
    let records = executor.fetch(&query).await?;

    println!("{}", serde_json::to_string_pretty(&records)?);

    let filtered = schema
        .query("post", "post_with_comments")?
        .with_param("title", "Nested lists");
    tracing::info!(query = %filtered, "fetching");
    match executor.fetch(&filtered).await {
        Ok(records) => tracing::info!(records = records.len(), "filtered fetch complete"),
        Err(e) => {
            let response = GraftError::from(e).to_response();
            tracing::warn!(code = %response.code, message = %response.message, "fetch failed");
        }
    }

    Ok(())
}
