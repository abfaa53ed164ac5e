//! Error types for storage operations

use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage error type.
///
/// Storage failures are infrastructure errors: the orchestrator degrades
/// cache-read failures to misses and treats cache-write failures as
/// best-effort, so none of these may fail a job that has valid engine
/// results.
#[derive(Debug, Error)]
pub enum StorageError {
	#[error("item not found: {id}")]
	NotFound { id: String },
	#[error("connection error: {message}")]
	Connection { message: String },
	#[error("serialization error: {message}")]
	Serialization { message: String },
	#[error("storage operation failed: {message}")]
	Operation { message: String },
}
