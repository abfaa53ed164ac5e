//! Storage traits and errors shared by pluggable backends

pub mod errors;
pub mod traits;

pub use errors::{StorageError, StorageResult};
pub use traits::{AnalysisStore, CacheStore, Storage};
