pub mod config;
pub mod error;
pub mod precedents;
pub mod telemetry;
pub mod verdict;
