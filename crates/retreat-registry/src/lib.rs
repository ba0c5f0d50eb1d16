pub mod config;
pub mod error;
pub mod registrations;
pub mod telemetry;
