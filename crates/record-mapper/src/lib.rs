//! Mapping between the benchmark harness's records and stored documents.
//!
//! A record is a plain field/value map. The store's `_id`/`_rev` metadata is
//! injected on write and, depending on `MetadataProjection`, stripped on
//! read.

mod error;
mod mapper;

pub use error::MapperError;
pub use mapper::{FieldSet, MetadataProjection, Record, RecordMapper};
