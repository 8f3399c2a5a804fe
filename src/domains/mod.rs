pub mod algorithm;
pub mod metrics;
