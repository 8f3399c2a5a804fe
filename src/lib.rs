pub mod config;
pub mod domains;
pub mod error;
pub mod interfaces;
pub mod providers;
pub mod services;
pub mod stats;
pub mod wire;

pub use crate::config::BenchConfig;
pub use crate::error::{PqcBenchError, Result};
pub use crate::providers::pqc::PqcProvider;
pub use crate::services::receiver::{ReceiverEngine, ReceiverSettings};
pub use crate::services::sender::{RunReport, SenderEngine, SenderSettings};
pub use crate::stats::StatsWindow;
pub use crate::wire::AuthEnvelope;
