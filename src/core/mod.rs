//! Core module containing fundamental traits and types for the executor

pub mod error;
pub mod fetcher;
pub mod query;
pub mod registry;
pub mod shape;
pub mod value;

pub use error::{ConfigError, ErrorResponse, FetchError, GraftError, GraftResult, SchemaError};
pub use fetcher::{FieldFetcher, RootFetcher};
pub use query::{FieldDecl, Query, QueryVariant, ResultType, ResultTypeBuilder};
pub use registry::{FetcherKind, FetcherRegistry, RegistrationInfo};
pub use shape::Shape;
pub use value::{Record, Value};
