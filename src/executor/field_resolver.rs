//! Batched, recursive resolution of declared fields

use futures::future::{BoxFuture, FutureExt};
use indexmap::IndexMap;
use serde_json::Value as Json;

use super::core::{Executor, check_core_type};
use crate::core::error::FetchError;
use crate::core::query::{FieldDecl, ResultType};
use crate::core::shape;
use crate::core::value::{Record, Value};

impl Executor {
    /// Resolve every declared field of `result_type` for a batch of parents
    /// and compose the output records
    ///
    /// Field values are collected per parent first and merged only once every
    /// field is resolved, so each field fetcher sees the bare parents.
    pub(super) async fn add_fields(
        &self,
        parents: Vec<Record>,
        result_type: &ResultType,
        parent_type: &str,
    ) -> Result<Vec<Record>, FetchError> {
        let mut extras: Vec<IndexMap<String, Value>> =
            parents.iter().map(|_| IndexMap::new()).collect();

        for field in result_type.fields() {
            let values = self
                .resolve_field(field, parent_type, &parents)
                .await?;

            for (accumulator, value) in extras.iter_mut().zip(values) {
                accumulator.insert(field.name().to_string(), value);
            }
        }

        parents
            .into_iter()
            .zip(extras)
            .map(|(core, fields)| compose(core, fields))
            .collect()
    }

    /// Resolve one declared field for the whole batch
    fn resolve_field<'a>(
        &'a self,
        field: &'a FieldDecl,
        parent_type: &'a str,
        parents: &'a [Record],
    ) -> BoxFuture<'a, Result<Vec<Value>, FetchError>> {
        async move { self.resolve_field_impl(field, parent_type, parents).await }.boxed()
    }

    /// Implementation of resolve_field
    async fn resolve_field_impl(
        &self,
        field: &FieldDecl,
        parent_type: &str,
        parents: &[Record],
    ) -> Result<Vec<Value>, FetchError> {
        let query = field.query();
        let found = self.registry.find_field(query, parent_type)?;
        let result_type = query.result_type();
        check_core_type(result_type, found.field_type)?;

        if parents.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(
            field = field.name(),
            variant = %query.variant(),
            parent_type,
            batch_size = parents.len(),
            fetcher = found.fetcher.name(),
            "dispatching field fetch"
        );

        let raw = found
            .fetcher
            .fetch(query, parents)
            .await
            .map_err(FetchError::Fetcher)?;

        if raw.len() != parents.len() {
            tracing::warn!(
                field = field.name(),
                parent_type,
                expected = parents.len(),
                actual = raw.len(),
                "field fetcher returned a misaligned batch"
            );
            return Err(FetchError::MisalignedBatch {
                field: field.name().to_string(),
                parent_type: parent_type.to_string(),
                expected: parents.len(),
                actual: raw.len(),
            });
        }

        // Nothing to attach below this level; the shape round trip is the identity.
        if !result_type.has_fields() {
            return Ok(raw);
        }

        let (shapes, leaves) = shape::flatten(raw);

        tracing::debug!(
            field = field.name(),
            leaves = leaves.len(),
            "resolving nested fields on flattened batch"
        );

        // Absent values (null) stay in place; only records get nested fields.
        let mut slots: Vec<Option<Value>> = Vec::with_capacity(leaves.len());
        let mut children = Vec::new();
        for leaf in leaves {
            match leaf {
                Value::Record(record) => {
                    children.push(record);
                    slots.push(None);
                }
                Value::Scalar(Json::Null) => slots.push(Some(Value::null())),
                other => {
                    return Err(FetchError::NotARecord {
                        field: field.name().to_string(),
                        value_type: other.kind().to_string(),
                    });
                }
            }
        }

        let expected = children.len();
        let mut resolved = self
            .add_fields(children, result_type, found.field_type)
            .await?
            .into_iter();

        let flat = slots
            .into_iter()
            .map(|slot| match slot {
                Some(absent) => Ok(absent),
                None => resolved.next().map(Value::Record).ok_or(FetchError::ShapeMismatch {
                    expected,
                    actual: 0,
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        shape::unflatten(&shapes, flat)
    }
}

/// Append declared field values to a core record, in declaration order
fn compose(mut core: Record, fields: IndexMap<String, Value>) -> Result<Record, FetchError> {
    for (name, value) in fields {
        if core.contains(&name) {
            return Err(FetchError::FieldConflict {
                type_name: core.type_name().to_string(),
                field: name,
            });
        }
        core.insert(name, value);
    }

    Ok(core)
}
