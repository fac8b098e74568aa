//! Storage-backed fetcher implementations

pub mod in_memory;

pub use in_memory::{Cardinality, InMemoryRelation, InMemoryRootFetcher};
