//! Stage tree model and arena storage.

pub mod arena;
pub mod stage;
