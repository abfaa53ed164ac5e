//! Storage traits for pluggable storage implementations

// Re-export the storage traits from the types crate
pub use auditor_types::storage::{AnalysisStore, CacheStore, Storage, StorageError, StorageResult};
