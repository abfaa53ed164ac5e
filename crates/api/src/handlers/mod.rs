//! HTTP request handlers

pub mod analyses;
pub mod common;
pub mod engines;
pub mod health;

pub use analyses::{delete_analysis, get_analyses, get_analysis, post_analyses};
pub use engines::get_engines;
pub use health::{health, ready};
