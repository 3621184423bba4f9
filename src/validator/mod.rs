//! Validator contract and registration.

pub mod contract;
pub mod registry;
