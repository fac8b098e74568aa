//! Shared test harness for executor testing
//!
//! Provides a small blog domain (posts, comments, users) backed by a
//! `BlogStore`, the fetchers that read it, and wrappers that record every
//! call so tests can assert batching.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! mod harness;
//! use harness::*;
//! ```

#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use graft::prelude::*;

// ---------------------------------------------------------------------------
// BlogStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PostRow {
    pub id: i64,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct CommentRow {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Default)]
struct Tables {
    posts: Vec<PostRow>,
    comments: Vec<CommentRow>,
    users: Vec<UserRow>,
}

/// Relational-style store; ids are assigned in insertion order starting at 1
#[derive(Debug, Clone, Default)]
pub struct BlogStore {
    tables: Arc<RwLock<Tables>>,
}

impl BlogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, username: &str) -> i64 {
        let mut tables = self.tables.write().unwrap();
        let id = tables.users.len() as i64 + 1;
        tables.users.push(UserRow {
            id,
            username: username.to_string(),
        });
        id
    }

    pub fn add_post(&self, title: &str) -> i64 {
        let mut tables = self.tables.write().unwrap();
        let id = tables.posts.len() as i64 + 1;
        tables.posts.push(PostRow {
            id,
            title: title.to_string(),
            body: String::new(),
        });
        id
    }

    pub fn add_comment(
        &self,
        post_id: i64,
        author_id: i64,
        body: &str,
        created_at: DateTime<Utc>,
    ) -> i64 {
        let mut tables = self.tables.write().unwrap();
        let id = tables.comments.len() as i64 + 1;
        tables.comments.push(CommentRow {
            id,
            post_id,
            author_id,
            created_at,
            body: body.to_string(),
        });
        id
    }
}

/// Midnight UTC on the given day
pub fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

// ---------------------------------------------------------------------------
// Blog fetchers
// ---------------------------------------------------------------------------

/// Root fetcher for `post`; honours a `title` equality filter
pub struct PostFetcher {
    store: BlogStore,
}

impl PostFetcher {
    pub fn new(store: &BlogStore) -> Self {
        Self {
            store: store.clone(),
        }
    }
}

#[async_trait]
impl RootFetcher for PostFetcher {
    async fn fetch(&self, query: &Query) -> Result<Vec<Record>> {
        let tables = self
            .store
            .tables
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;
        let title = query.param("title").and_then(|v| v.as_str());

        Ok(tables
            .posts
            .iter()
            .filter(|post| title.is_none_or(|t| post.title == t))
            .map(|post| {
                Record::new("post")
                    .with("id", json!(post.id))
                    .with("title", post.title.as_str())
                    .with("body", post.body.as_str())
            })
            .collect())
    }
}

/// Field fetcher for the comments of posts; honours `created_in_last_days`
pub struct PostCommentFetcher {
    store: BlogStore,
    now: DateTime<Utc>,
}

impl PostCommentFetcher {
    pub fn new(store: &BlogStore, now: DateTime<Utc>) -> Self {
        Self {
            store: store.clone(),
            now,
        }
    }
}

#[async_trait]
impl FieldFetcher for PostCommentFetcher {
    async fn fetch(&self, query: &Query, parents: &[Record]) -> Result<Vec<Value>> {
        let tables = self
            .store
            .tables
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;
        let since = query
            .param("created_in_last_days")
            .and_then(|v| v.as_i64())
            .map(|days| self.now - Duration::days(days));

        let mut by_post: HashMap<i64, Vec<Value>> = HashMap::new();
        for comment in &tables.comments {
            if since.is_some_and(|since| comment.created_at < since) {
                continue;
            }
            by_post.entry(comment.post_id).or_default().push(
                Record::new("comment")
                    .with("id", json!(comment.id))
                    .with("author_id", json!(comment.author_id))
                    .with("created_at", comment.created_at.to_rfc3339())
                    .with("body", comment.body.as_str())
                    .into(),
            );
        }

        parents
            .iter()
            .map(|post| {
                let id = post
                    .scalar("id")
                    .and_then(|v| v.as_i64())
                    .ok_or_else(|| anyhow!("post without id"))?;
                Ok(Value::List(by_post.get(&id).cloned().unwrap_or_default()))
            })
            .collect()
    }
}

/// Field fetcher resolving the author of each comment
pub struct CommentAuthorFetcher {
    store: BlogStore,
}

impl CommentAuthorFetcher {
    pub fn new(store: &BlogStore) -> Self {
        Self {
            store: store.clone(),
        }
    }
}

#[async_trait]
impl FieldFetcher for CommentAuthorFetcher {
    async fn fetch(&self, _query: &Query, parents: &[Record]) -> Result<Vec<Value>> {
        let tables = self
            .store
            .tables
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;
        let users: HashMap<i64, &UserRow> = tables.users.iter().map(|u| (u.id, u)).collect();

        parents
            .iter()
            .map(|comment| {
                let author_id = comment
                    .scalar("author_id")
                    .and_then(|v| v.as_i64())
                    .ok_or_else(|| anyhow!("comment without author_id"))?;
                let user = users
                    .get(&author_id)
                    .ok_or_else(|| anyhow!("unknown user {}", author_id))?;
                Ok(Record::new("user").with("username", user.username.as_str()).into())
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

pub fn post_with_comments() -> Arc<ResultType> {
    ResultType::builder("post_with_comments", "post")
        .field("comments", Query::new("comment", ResultType::core("comment")))
        .build()
        .unwrap()
}

pub fn post_with_recent_comments() -> Arc<ResultType> {
    ResultType::builder("post_with_recent_comments", "post")
        .field(
            "recent_comments",
            Query::new("comment", ResultType::core("comment")).with_param("created_in_last_days", 1),
        )
        .build()
        .unwrap()
}

pub fn comment_with_author() -> Arc<ResultType> {
    ResultType::builder("comment_with_author", "comment")
        .field("author", Query::new("user", ResultType::core("user")))
        .build()
        .unwrap()
}

pub fn post_with_commented_authors() -> Arc<ResultType> {
    ResultType::builder("post_with_comments", "post")
        .field("comments", Query::new("comment", comment_with_author()))
        .build()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Instrumentation
// ---------------------------------------------------------------------------

/// Batch sizes seen by a fetcher, one entry per call
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<usize>>>,
}

impl CallLog {
    pub fn record(&self, batch_size: usize) {
        self.calls.lock().unwrap().push(batch_size);
    }

    pub fn calls(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

/// Wraps a fetcher and records every call in a shared [`CallLog`]
pub struct Counting<F> {
    inner: F,
    log: CallLog,
}

impl<F> Counting<F> {
    pub fn new(inner: F) -> (Self, CallLog) {
        let log = CallLog::default();
        (
            Self {
                inner,
                log: log.clone(),
            },
            log,
        )
    }
}

#[async_trait]
impl<F: RootFetcher> RootFetcher for Counting<F> {
    async fn fetch(&self, query: &Query) -> Result<Vec<Record>> {
        let records = self.inner.fetch(query).await?;
        self.log.record(records.len());
        Ok(records)
    }
}

#[async_trait]
impl<F: FieldFetcher> FieldFetcher for Counting<F> {
    async fn fetch(&self, query: &Query, parents: &[Record]) -> Result<Vec<Value>> {
        self.log.record(parents.len());
        self.inner.fetch(query, parents).await
    }
}

/// Field fetcher built from a closure
pub struct FnFieldFetcher<F>(F);

impl<F> FnFieldFetcher<F>
where
    F: Fn(&Query, &[Record]) -> Result<Vec<Value>> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> FieldFetcher for FnFieldFetcher<F>
where
    F: Fn(&Query, &[Record]) -> Result<Vec<Value>> + Send + Sync,
{
    async fn fetch(&self, query: &Query, parents: &[Record]) -> Result<Vec<Value>> {
        (self.0)(query, parents)
    }
}

/// Root fetcher returning the same records on every call
pub struct FixedRoot(pub Vec<Record>);

#[async_trait]
impl RootFetcher for FixedRoot {
    async fn fetch(&self, _query: &Query) -> Result<Vec<Record>> {
        Ok(self.0.clone())
    }
}

// ---------------------------------------------------------------------------
// Assertions
// ---------------------------------------------------------------------------

/// Scalar attribute as a string, panicking with context when missing
pub fn text<'a>(record: &'a Record, name: &str) -> &'a str {
    record
        .scalar(name)
        .and_then(|v| v.as_str())
        .unwrap_or_else(|| panic!("{} has no string attribute '{}'", record.type_name(), name))
}

/// Records of a list-valued attribute
pub fn records<'a>(record: &'a Record, name: &str) -> Vec<&'a Record> {
    record
        .get(name)
        .and_then(Value::as_list)
        .unwrap_or_else(|| panic!("{} has no list attribute '{}'", record.type_name(), name))
        .iter()
        .map(|v| v.as_record().expect("list item should be a record"))
        .collect()
}

/// Record of a record-valued attribute
pub fn record<'a>(record: &'a Record, name: &str) -> &'a Record {
    record
        .get(name)
        .and_then(Value::as_record)
        .unwrap_or_else(|| panic!("{} has no record attribute '{}'", record.type_name(), name))
}
