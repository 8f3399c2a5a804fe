use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::domains::algorithm::{default_plan, AlgorithmRun, SignatureAlgorithm};
use crate::error::{PqcBenchError, Result};
use crate::services::receiver::ReceiverSettings;
use crate::services::sender::SenderSettings;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5222;
pub const DEFAULT_SENDER_JID: &str = "emisor@localhost/bench";
pub const DEFAULT_RECEIVER_JID: &str = "receptor@localhost/bench";
pub const DEFAULT_SENDER_CSV: &str = "artifacts/csv/sender_metrics.csv";
pub const DEFAULT_RECEIVER_CSV: &str = "artifacts/csv/receiver_metrics.csv";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TransportConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SenderConfig {
    pub jid: Option<String>,
    pub recipient: Option<String>,
    pub ack_timeout_ms: Option<u64>,
    pub pacing_ms: Option<u64>,
    pub settle_ms: Option<u64>,
    pub csv_path: Option<String>,
    pub algorithms: Option<Vec<AlgorithmRun>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReceiverConfig {
    pub jid: Option<String>,
    pub csv_path: Option<String>,
    pub window: Option<usize>,
    pub summary_every_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BenchConfig {
    pub transport: Option<TransportConfig>,
    pub sender: Option<SenderConfig>,
    pub receiver: Option<ReceiverConfig>,
}

impl BenchConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| PqcBenchError::Config(e.to_string()))?;
        let config: BenchConfig =
            serde_json::from_str(&content).map_err(|e| PqcBenchError::Config(e.to_string()))?;
        Ok(config)
    }

    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) if !path.trim().is_empty() => Self::from_file(path),
            _ => Ok(Self::default()),
        }
    }

    pub fn host(&self) -> String {
        self.transport
            .as_ref()
            .and_then(|t| t.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string())
    }

    pub fn port(&self) -> u16 {
        self.transport
            .as_ref()
            .and_then(|t| t.port)
            .unwrap_or(DEFAULT_PORT)
    }

    pub fn sender_jid(&self) -> String {
        self.sender
            .as_ref()
            .and_then(|s| s.jid.clone())
            .unwrap_or_else(|| DEFAULT_SENDER_JID.to_string())
    }

    pub fn sender_csv_path(&self) -> String {
        self.sender
            .as_ref()
            .and_then(|s| s.csv_path.clone())
            .unwrap_or_else(|| DEFAULT_SENDER_CSV.to_string())
    }

    pub fn sender_settings(&self) -> SenderSettings {
        let defaults = SenderSettings::default();
        let Some(sender) = &self.sender else {
            return defaults;
        };
        SenderSettings {
            recipient: sender.recipient.clone().unwrap_or(defaults.recipient),
            ack_timeout: sender
                .ack_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.ack_timeout),
            pacing: sender
                .pacing_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.pacing),
            settle: sender
                .settle_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.settle),
        }
    }

    pub fn plan(&self) -> Result<Vec<AlgorithmRun>> {
        let plan = self
            .sender
            .as_ref()
            .and_then(|s| s.algorithms.clone())
            .unwrap_or_else(default_plan);
        if plan.is_empty() {
            return Err(PqcBenchError::Config("algorithm plan is empty".to_string()));
        }
        for run in &plan {
            run.name
                .parse::<SignatureAlgorithm>()
                .map_err(|e| PqcBenchError::Config(e.to_string()))?;
            if run.messages == 0 {
                return Err(PqcBenchError::Config(format!(
                    "{} has a message count of zero",
                    run.name
                )));
            }
        }
        Ok(plan)
    }

    pub fn receiver_jid(&self) -> String {
        self.receiver
            .as_ref()
            .and_then(|r| r.jid.clone())
            .unwrap_or_else(|| DEFAULT_RECEIVER_JID.to_string())
    }

    pub fn receiver_csv_path(&self) -> String {
        self.receiver
            .as_ref()
            .and_then(|r| r.csv_path.clone())
            .unwrap_or_else(|| DEFAULT_RECEIVER_CSV.to_string())
    }

    pub fn receiver_settings(&self) -> ReceiverSettings {
        let defaults = ReceiverSettings::default();
        let Some(receiver) = &self.receiver else {
            return defaults;
        };
        ReceiverSettings {
            window: receiver.window.unwrap_or(defaults.window),
            summary_every: receiver
                .summary_every_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.summary_every),
        }
    }
}
