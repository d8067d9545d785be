//! Configuration parsing and validation
//!
//! This module handles parsing of baton.yml pipeline files
//! and validation of their references.

pub mod parse;
pub mod schema;
pub mod types;

// Re-export main types
pub use parse::*;
pub use schema::*;
pub use types::*;
