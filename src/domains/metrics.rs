use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::interfaces::sink::MetricsRow;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SenderRow {
    pub ts_unix: f64,
    pub alg_family: String,
    pub alg_name: String,
    pub seq: u32,
    pub msg_id: String,
    pub body_bytes: usize,
    pub stanza_bytes: usize,
    pub pk_b64_bytes: usize,
    pub sig_b64_bytes: usize,
    pub sign_time_ms: f64,
    pub rtt_ms: f64,
    pub receipt_ok: u8,
}

impl MetricsRow for SenderRow {
    const HEADER: &'static [&'static str] = &[
        "ts_unix",
        "alg_family",
        "alg_name",
        "seq",
        "msg_id",
        "body_bytes",
        "stanza_bytes",
        "pk_b64_bytes",
        "sig_b64_bytes",
        "sign_time_ms",
        "rtt_ms",
        "receipt_ok",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiverRow {
    pub ts_unix: f64,
    pub from: String,
    pub msg_id: String,
    pub alg: String,
    pub stanza_bytes: usize,
    pub body_bytes: usize,
    pub pk_b64_bytes: usize,
    pub sig_b64_bytes: usize,
    pub verify_time_ms: f64,
    pub verify_ok: u8,
}

impl MetricsRow for ReceiverRow {
    const HEADER: &'static [&'static str] = &[
        "ts_unix",
        "from",
        "msg_id",
        "alg",
        "stanza_bytes",
        "body_bytes",
        "pk_b64_bytes",
        "sig_b64_bytes",
        "verify_time_ms",
        "verify_ok",
    ];
}

pub fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}
