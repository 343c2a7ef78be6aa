pub mod config;
pub mod documents;
pub mod error;
pub mod store;
pub mod telemetry;
