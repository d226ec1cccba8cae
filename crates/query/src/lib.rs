//! Indexed query engine for historical blockchain state.
//!
//! chainview serves blocks, transaction traces, action traces and versioned
//! contract state from an ordered embedded key-value store. This crate
//! holds the core:
//!
//! - `key_codec`: scalar encodings whose byte order matches natural order
//! - `keyspace`: the tagged layout multiplexing all relations into one
//!   ordered namespace
//! - `registry`: schema type names resolved to encode/pad/size capabilities
//! - `catalog`: schema descriptions prepared into immutable table and query
//!   descriptors
//! - `engine`: named-query execution with as-of versioning and joins
//! - `ingest`: the fill pipeline's output key layout, for tools and tests
//! - `truncate`: fork revert by block-range erase

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
mod engine;
mod error;
pub mod ingest;
pub mod key_codec;
pub mod keyspace;
pub mod registry;
mod truncate;

pub use catalog::{Catalog, SchemaDef};
pub use engine::QuerySession;
pub use error::{Error, Result};
pub use ingest::BlockWriter;
pub use truncate::truncate_from;
