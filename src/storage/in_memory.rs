//! In-memory fetchers for testing and development

use crate::core::fetcher::{FieldFetcher, RootFetcher};
use crate::core::query::Query;
use crate::core::value::{Record, Value};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::Value as Json;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// In-memory table of core records
///
/// Useful for testing and development. Uses RwLock for thread-safe access.
/// Query parameters are applied as equality filters on scalar attributes.
#[derive(Clone)]
pub struct InMemoryRootFetcher {
    type_name: String,
    records: Arc<RwLock<Vec<Record>>>,
}

impl InMemoryRootFetcher {
    /// Create an empty table of `type_name` records
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Create a table holding `records`, in order
    pub fn with_records(type_name: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            type_name: type_name.into(),
            records: Arc::new(RwLock::new(records)),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Append a record; its type must match the table
    pub fn insert(&self, record: Record) -> Result<()> {
        if record.type_name() != self.type_name {
            return Err(anyhow!(
                "Cannot insert '{}' record into '{}' table",
                record.type_name(),
                self.type_name
            ));
        }

        let mut records = self
            .records
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        records.push(record);
        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        let records = self
            .records
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(records.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl RootFetcher for InMemoryRootFetcher {
    async fn fetch(&self, query: &Query) -> Result<Vec<Record>> {
        let records = self
            .records
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(records
            .iter()
            .filter(|record| matches_params(record, query))
            .cloned()
            .collect())
    }

    fn name(&self) -> &str {
        "InMemoryRootFetcher"
    }
}

/// How many children a parent owns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Every matching child, as a list (empty when none match)
    Many,
    /// The first matching child, or `null` when none match
    One,
}

/// Field fetcher joining parents to the records of a table
///
/// A child belongs to a parent when `child[child_key] == parent[parent_key]`.
/// Each call builds one index over the table for the whole batch.
#[derive(Clone)]
pub struct InMemoryRelation {
    children: InMemoryRootFetcher,
    parent_key: String,
    child_key: String,
    cardinality: Cardinality,
}

impl InMemoryRelation {
    pub fn new(
        children: &InMemoryRootFetcher,
        parent_key: impl Into<String>,
        child_key: impl Into<String>,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            children: children.clone(),
            parent_key: parent_key.into(),
            child_key: child_key.into(),
            cardinality,
        }
    }

    /// Parent owns every child whose `child_key` equals its `parent_key`
    pub fn one_to_many(
        children: &InMemoryRootFetcher,
        parent_key: impl Into<String>,
        child_key: impl Into<String>,
    ) -> Self {
        Self::new(children, parent_key, child_key, Cardinality::Many)
    }

    /// Parent points at the child whose `child_key` equals its `parent_key`
    pub fn one_to_one(
        children: &InMemoryRootFetcher,
        parent_key: impl Into<String>,
        child_key: impl Into<String>,
    ) -> Self {
        Self::new(children, parent_key, child_key, Cardinality::One)
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }
}

#[async_trait]
impl FieldFetcher for InMemoryRelation {
    async fn fetch(&self, query: &Query, parents: &[Record]) -> Result<Vec<Value>> {
        let records = self
            .children
            .records
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let mut index: HashMap<String, Vec<&Record>> = HashMap::new();
        for child in records.iter().filter(|child| matches_params(child, query)) {
            if let Some(key) = child.scalar(&self.child_key) {
                index.entry(key.to_string()).or_default().push(child);
            }
        }

        Ok(parents
            .iter()
            .map(|parent| {
                let matched = parent
                    .scalar(&self.parent_key)
                    .filter(|key| !key.is_null())
                    .and_then(|key| index.get(&key.to_string()))
                    .map(Vec::as_slice)
                    .unwrap_or_default();

                match self.cardinality {
                    Cardinality::Many => {
                        Value::List(matched.iter().map(|&child| Value::Record(child.clone())).collect())
                    }
                    Cardinality::One => matched
                        .first()
                        .map(|&child| Value::Record(child.clone()))
                        .unwrap_or_else(Value::null),
                }
            })
            .collect())
    }

    fn name(&self) -> &str {
        "InMemoryRelation"
    }
}

fn matches_params(record: &Record, query: &Query) -> bool {
    query
        .params()
        .iter()
        .all(|(key, expected)| record.scalar(key).unwrap_or(&Json::Null) == expected)
}
