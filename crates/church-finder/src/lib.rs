//! Church directory evaluation pipeline.
//!
//! Crawled website content is deduplicated, turned into a doctrinal profile by an
//! extraction model, scored against the fixed core-doctrine checklist, and persisted
//! as an append-only evaluation history for the directory.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
