//! Configuration loading and management
//!
//! Two documents can be loaded from YAML:
//! - [`ExecutorConfig`]: runtime limits for the executor
//! - [`SchemaConfig`]: declarative result type descriptors, built into a [`Schema`]
//!
//! # Example
//!
//! ```yaml
//! core_types: [post, comment, user]
//!
//! result_types:
//!   - name: comment_with_author
//!     core: comment
//!     fields:
//!       - name: author
//!         query:
//!           variant: user
//!           result_type: user
//!   - name: post_with_comments
//!     core: post
//!     fields:
//!       - name: comments
//!         query:
//!           variant: comment
//!           result_type: comment_with_author
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::path::Path;
use std::sync::Arc;

use crate::core::error::{ConfigError, SchemaError};
use crate::core::query::{Query, QueryVariant, ResultType};

/// Runtime settings for the executor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Maximum number of nested field levels; `None` means unbounded
    #[serde(default)]
    pub max_depth: Option<usize>,
}

impl ExecutorConfig {
    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = read_config(path.as_ref())?;
        serde_yaml::from_str(&content).map_err(|e| parse_error(path.as_ref(), e))
    }
}

/// A query as written in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Variant used to match a fetcher
    pub variant: String,

    /// Name of a result type or core type
    pub result_type: String,

    /// Filter parameters handed to the fetcher
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub params: IndexMap<String, Json>,
}

/// A declared field as written in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    pub query: QueryConfig,
}

/// A result type as written in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTypeConfig {
    /// Result type name, referenced by queries
    pub name: String,

    /// Core type this result type extends
    pub core: String,

    /// Declared fields, in order
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

/// Complete declarative schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Core types produced by fetchers
    #[serde(default)]
    pub core_types: Vec<String>,

    /// Result type definitions
    #[serde(default)]
    pub result_types: Vec<ResultTypeConfig>,
}

impl SchemaConfig {
    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = read_config(path.as_ref())?;
        serde_yaml::from_str(&content).map_err(|e| parse_error(path.as_ref(), e))
    }

    /// Merge several configurations into one
    ///
    /// Core types are unioned in order of first appearance. A result type
    /// defined again in a later config replaces the earlier definition but
    /// keeps its original position.
    pub fn merge(configs: Vec<SchemaConfig>) -> Self {
        let mut core_types: Vec<String> = Vec::new();
        let mut result_types: IndexMap<String, ResultTypeConfig> = IndexMap::new();

        for config in configs {
            for core in config.core_types {
                if !core_types.contains(&core) {
                    core_types.push(core);
                }
            }
            for result_type in config.result_types {
                result_types.insert(result_type.name.clone(), result_type);
            }
        }

        Self {
            core_types,
            result_types: result_types.into_values().collect(),
        }
    }

    /// Resolve every definition into shared descriptors
    ///
    /// Fails on duplicate definitions, unknown names, duplicate fields and
    /// cyclic declarations.
    pub fn build(&self) -> Result<Schema, SchemaError> {
        let mut definitions: IndexMap<&str, &ResultTypeConfig> = IndexMap::new();
        for def in &self.result_types {
            if definitions.insert(def.name.as_str(), def).is_some() {
                return Err(SchemaError::DuplicateResultType {
                    name: def.name.clone(),
                });
            }
        }

        let mut builder = SchemaBuilder {
            config: self,
            definitions,
            built: IndexMap::new(),
            visiting: Vec::new(),
        };

        for core in &self.core_types {
            builder.resolve(core, "core_types")?;
        }
        for def in &self.result_types {
            builder.resolve(&def.name, "result_types")?;
        }

        Ok(Schema {
            result_types: builder.built,
        })
    }
}

struct SchemaBuilder<'a> {
    config: &'a SchemaConfig,
    definitions: IndexMap<&'a str, &'a ResultTypeConfig>,
    built: IndexMap<String, Arc<ResultType>>,
    visiting: Vec<String>,
}

impl SchemaBuilder<'_> {
    /// Build `name` and everything it references, depth first
    fn resolve(&mut self, name: &str, referenced_by: &str) -> Result<Arc<ResultType>, SchemaError> {
        if let Some(built) = self.built.get(name) {
            return Ok(Arc::clone(built));
        }

        if let Some(start) = self.visiting.iter().position(|n| n == name) {
            let mut path = self.visiting[start..].to_vec();
            path.push(name.to_string());
            return Err(SchemaError::Cycle { path });
        }

        let Some(&def) = self.definitions.get(name) else {
            if self.config.core_types.iter().any(|c| c == name) {
                let core = ResultType::core(name);
                self.built.insert(name.to_string(), Arc::clone(&core));
                return Ok(core);
            }
            return Err(SchemaError::UnknownResultType {
                name: name.to_string(),
                referenced_by: referenced_by.to_string(),
            });
        };

        if !self.config.core_types.contains(&def.core) {
            return Err(SchemaError::UnknownCoreType {
                result_type: def.name.clone(),
                core: def.core.clone(),
            });
        }

        self.visiting.push(def.name.clone());

        let mut result_type = ResultType::builder(&def.name, &def.core);
        for field in &def.fields {
            let target = self.resolve(&field.query.result_type, &def.name)?;
            let query = field
                .query
                .params
                .iter()
                .fold(
                    Query::new(QueryVariant::new(&field.query.variant), target),
                    |query, (key, value)| query.with_param(key.clone(), value.clone()),
                );
            result_type = result_type.field(&field.name, query);
        }

        self.visiting.pop();

        let result_type = result_type.build()?;
        self.built
            .insert(def.name.clone(), Arc::clone(&result_type));
        Ok(result_type)
    }
}

/// Named result type descriptors, built once
#[derive(Debug, Clone, Default)]
pub struct Schema {
    result_types: IndexMap<String, Arc<ResultType>>,
}

impl Schema {
    /// Get a descriptor by name
    pub fn get(&self, name: &str) -> Option<Arc<ResultType>> {
        self.result_types.get(name).cloned()
    }

    /// Build a query of `variant` for the named result type
    pub fn query(&self, variant: impl Into<QueryVariant>, result_type: &str) -> Result<Query, SchemaError> {
        self.get(result_type)
            .map(|rt| Query::new(variant, rt))
            .ok_or_else(|| SchemaError::UnknownResultType {
                name: result_type.to_string(),
                referenced_by: "query".to_string(),
            })
    }

    /// Names of every descriptor, in definition order
    pub fn names(&self) -> Vec<&str> {
        self.result_types.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.result_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.result_types.is_empty()
    }
}

fn read_config(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => ConfigError::from(e),
    })
}

fn parse_error(path: &Path, err: serde_yaml::Error) -> ConfigError {
    ConfigError::ParseError {
        file: Some(path.display().to_string()),
        message: err.to_string(),
    }
}
