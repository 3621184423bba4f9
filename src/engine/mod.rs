//! Orchestration engine: modification pass, lifecycle phases, aggregation.

pub mod lifecycle;
pub mod modify;
pub mod orchestrator;
pub mod report;
