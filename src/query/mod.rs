//! Query engine: filter options, in-list chunking, response classification
//! and the pull-based pagination state machine.

pub mod chunk;
pub mod classify;
pub mod link;
pub mod options;
pub mod pagination;

/// One dataset row. The schema is not known ahead of time.
pub type Record = serde_json::Map<String, serde_json::Value>;

pub use options::{in_list, QueryOptions};
pub use pagination::{PageRequest, PaginationScheme, RecordStream};
