pub mod cache;
pub mod config;
pub mod error;
pub mod fleet;
pub mod metrics;
pub mod output;
pub mod parser;
pub mod report;
pub mod repository;
pub mod scoring;
