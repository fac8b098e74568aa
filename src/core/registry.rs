//! Fetcher registry
//!
//! Holds root and field fetchers in registration order and resolves a query
//! to the fetcher that handles it. Lookup is a linear scan: the first
//! compatible registration wins and later duplicates are unreachable.

use std::fmt;
use std::sync::Arc;

use crate::core::error::FetchError;
use crate::core::fetcher::{FieldFetcher, RootFetcher};
use crate::core::query::{Query, QueryVariant};

/// Kind of fetcher registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetcherKind {
    /// Query -> core records
    Root,
    /// (Query, parent type) -> field values
    Field,
}

#[derive(Clone)]
struct RootRegistration {
    accepts: QueryVariant,
    core_type: String,
    fetcher: Arc<dyn RootFetcher>,
}

#[derive(Clone)]
struct FieldRegistration {
    accepts: QueryVariant,
    field_type: String,
    parent_type: String,
    fetcher: Arc<dyn FieldFetcher>,
}

/// Result of a root lookup
pub struct RootMatch<'a> {
    /// Core type produced by the fetcher
    pub core_type: &'a str,
    pub fetcher: &'a dyn RootFetcher,
}

/// Result of a field lookup
pub struct FieldMatch<'a> {
    /// Type of the values produced by the fetcher; parent type of the next level
    pub field_type: &'a str,
    pub fetcher: &'a dyn FieldFetcher,
}

/// Ordered registry of root and field fetchers
///
/// Registrations are made once, before any fetch, and are read-only while
/// the executor runs.
#[derive(Default, Clone)]
pub struct FetcherRegistry {
    roots: Vec<RootRegistration>,
    fields: Vec<FieldRegistration>,
}

impl FetcherRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a root fetcher producing `core_type` for queries of `variant`
    pub fn register_root(
        mut self,
        variant: impl Into<QueryVariant>,
        core_type: impl Into<String>,
        fetcher: impl RootFetcher + 'static,
    ) -> Self {
        self.add_root(variant, core_type, Arc::new(fetcher));
        self
    }

    /// Register a field fetcher producing `field_type` values for parents of `parent_type`
    pub fn register_field(
        mut self,
        variant: impl Into<QueryVariant>,
        field_type: impl Into<String>,
        parent_type: impl Into<String>,
        fetcher: impl FieldFetcher + 'static,
    ) -> Self {
        self.add_field(variant, field_type, parent_type, Arc::new(fetcher));
        self
    }

    /// Append a shared root fetcher
    pub fn add_root(
        &mut self,
        variant: impl Into<QueryVariant>,
        core_type: impl Into<String>,
        fetcher: Arc<dyn RootFetcher>,
    ) {
        self.roots.push(RootRegistration {
            accepts: variant.into(),
            core_type: core_type.into(),
            fetcher,
        });
    }

    /// Append a shared field fetcher
    pub fn add_field(
        &mut self,
        variant: impl Into<QueryVariant>,
        field_type: impl Into<String>,
        parent_type: impl Into<String>,
        fetcher: Arc<dyn FieldFetcher>,
    ) {
        self.fields.push(FieldRegistration {
            accepts: variant.into(),
            field_type: field_type.into(),
            parent_type: parent_type.into(),
            fetcher,
        });
    }

    /// Find the first root fetcher accepting the query's variant
    pub fn find_root(&self, query: &Query) -> Result<RootMatch<'_>, FetchError> {
        self.roots
            .iter()
            .find(|reg| &reg.accepts == query.variant())
            .map(|reg| RootMatch {
                core_type: &reg.core_type,
                fetcher: reg.fetcher.as_ref(),
            })
            .ok_or_else(|| FetchError::NoRootFetcherFound {
                query: query.clone(),
            })
    }

    /// Find the first field fetcher accepting the query's variant on `parent_type`
    pub fn find_field(&self, query: &Query, parent_type: &str) -> Result<FieldMatch<'_>, FetchError> {
        self.fields
            .iter()
            .find(|reg| &reg.accepts == query.variant() && reg.parent_type == parent_type)
            .map(|reg| FieldMatch {
                field_type: &reg.field_type,
                fetcher: reg.fetcher.as_ref(),
            })
            .ok_or_else(|| FetchError::NoFieldFetcherFound {
                query: query.clone(),
                parent_type: parent_type.to_string(),
            })
    }

    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// List every registration in lookup order
    pub fn describe(&self) -> Vec<RegistrationInfo> {
        let roots = self.roots.iter().map(|reg| RegistrationInfo {
            kind: FetcherKind::Root,
            variant: reg.accepts.clone(),
            produces: reg.core_type.clone(),
            parent_type: None,
            fetcher: reg.fetcher.name().to_string(),
        });
        let fields = self.fields.iter().map(|reg| RegistrationInfo {
            kind: FetcherKind::Field,
            variant: reg.accepts.clone(),
            produces: reg.field_type.clone(),
            parent_type: Some(reg.parent_type.clone()),
            fetcher: reg.fetcher.name().to_string(),
        });

        roots.chain(fields).collect()
    }
}

impl fmt::Debug for FetcherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetcherRegistry")
            .field("registrations", &self.describe())
            .finish()
    }
}

/// Information about one registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationInfo {
    pub kind: FetcherKind,

    /// The query variant accepted
    pub variant: QueryVariant,

    /// The type produced (core type for roots, field type for fields)
    pub produces: String,

    /// Parent type, for field registrations
    pub parent_type: Option<String>,

    /// Fetcher name as reported by the fetcher
    pub fetcher: String,
}
