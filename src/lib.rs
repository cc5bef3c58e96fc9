//! perf-audit library exports

pub mod analyzer;
pub mod client;
pub mod config;
pub mod error;
pub mod findings;
pub mod models;
pub mod passes;
pub mod report;
