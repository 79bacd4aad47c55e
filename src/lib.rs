pub mod config;
pub mod dedup;
pub mod export;
pub mod matching;
pub mod metrics;
pub mod models;
pub mod normalize;
pub mod sources;

pub mod cli;
pub mod error;
pub mod logging;
pub mod orchestrator;
