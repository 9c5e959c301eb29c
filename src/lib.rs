pub mod authentication;
pub mod client;
pub mod configuration;
pub mod runner;
pub mod stories;
pub mod telemetry;
