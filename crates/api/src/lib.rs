//! Auditor API
//!
//! Axum-based API with routes and middleware for the site auditor.

pub mod handlers;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::AppState;
