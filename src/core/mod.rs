//! Core types, identifiers, and error handling.

pub mod error;
pub mod types;
