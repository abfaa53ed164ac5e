//! Shared domain models

mod normalized_url;

pub use normalized_url::NormalizedUrl;
