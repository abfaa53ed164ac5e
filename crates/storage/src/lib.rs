//! Auditor Storage
//!
//! Pluggable cache and job-record storage for the site auditor.

pub mod memory_store;
pub mod traits;

pub use memory_store::MemoryStore;
pub use traits::{AnalysisStore, CacheStore, Storage, StorageError, StorageResult};
