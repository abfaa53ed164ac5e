//! Auditor Types
//!
//! Shared models and traits for the site auditor. This crate contains all
//! domain models organized by business entity.

pub mod analyses;
pub mod engines;
pub mod models;
pub mod storage;

// Re-export chrono and serde_json for convenience
pub use chrono;
pub use serde_json;

// Re-export commonly used types for convenience
pub use analyses::{
	AggregateResult, Analysis, AnalysisError, AnalysisRequest, AnalysisResult, AnalysisStatus,
	ValidationError,
};

pub use engines::{
	AnalysisEngine, EngineError, EngineName, EngineOutcome, EngineReport, EngineResult,
	EngineRuntimeConfig, OutcomeStatus, Priority, Recommendation,
};

pub use models::NormalizedUrl;

pub use storage::{AnalysisStore, CacheStore, Storage, StorageError, StorageResult};
