//! Demo driver wiring factories, warehouses and trucks into one simulated network.

pub mod config;
pub mod report;
pub mod scenario;

pub use config::SimConfig;
pub use scenario::{Network, SimOutcome};

#[cfg(test)]
mod integration_tests;
