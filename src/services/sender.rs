use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domains::algorithm::AlgorithmRun;
use crate::domains::metrics::{unix_now, SenderRow};
use crate::error::{PqcBenchError, Result};
use crate::interfaces::providers::SignatureProvider;
use crate::interfaces::sink::MetricsSink;
use crate::interfaces::transport::{ChatTransport, TransportEvent};
use crate::services::correlation::{Outcome, PendingSend, PendingSends};
use crate::stats::{Sample, StatsWindow, DEFAULT_WINDOW};
use crate::wire::{AuthEnvelope, ChatMessage, Stanza};

pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_PACING: Duration = Duration::from_millis(50);
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub struct SenderSettings {
    pub recipient: String,
    pub ack_timeout: Duration,
    pub pacing: Duration,
    pub settle: Duration,
}

impl Default for SenderSettings {
    fn default() -> Self {
        Self {
            recipient: "receptor@localhost".to_string(),
            ack_timeout: DEFAULT_ACK_TIMEOUT,
            pacing: DEFAULT_PACING,
            settle: DEFAULT_SETTLE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlgorithmReport {
    pub name: String,
    pub family: String,
    pub attempted: u32,
    pub acked: u32,
    pub timed_out: u32,
    pub send_failed: u32,
    pub sign_failed: u32,
}

impl fmt::Display for AlgorithmReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): attempted={} acked={} timed_out={} send_failed={} sign_failed={}",
            self.name,
            self.family,
            self.attempted,
            self.acked,
            self.timed_out,
            self.send_failed,
            self.sign_failed
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub algorithms: Vec<AlgorithmReport>,
}

impl RunReport {
    pub fn total_acked(&self) -> u32 {
        self.algorithms.iter().map(|a| a.acked).sum()
    }

    pub fn total_attempted(&self) -> u32 {
        self.algorithms.iter().map(|a| a.attempted).sum()
    }
}

enum Attempt {
    Acked,
    TimedOut,
    SendFailed,
    SignFailed,
}

pub struct SenderEngine {
    transport: Arc<dyn ChatTransport>,
    events: mpsc::UnboundedReceiver<TransportEvent>,
    provider: Arc<dyn SignatureProvider>,
    sink: Box<dyn MetricsSink<SenderRow>>,
    settings: SenderSettings,
    pending: PendingSends,
    closed: bool,
}

impl SenderEngine {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        events: mpsc::UnboundedReceiver<TransportEvent>,
        provider: Arc<dyn SignatureProvider>,
        sink: Box<dyn MetricsSink<SenderRow>>,
        settings: SenderSettings,
    ) -> Self {
        Self {
            transport,
            events,
            provider,
            sink,
            settings,
            pending: PendingSends::new(),
            closed: false,
        }
    }

    pub fn pending(&self) -> &PendingSends {
        &self.pending
    }

    pub async fn wait_for_session(&mut self) -> Result<()> {
        loop {
            match self.events.recv().await {
                Some(TransportEvent::SessionStarted) => break,
                Some(TransportEvent::Closed) | None => {
                    return Err(PqcBenchError::Transport(
                        "session closed before it started".to_string(),
                    ));
                }
                Some(other) => self.handle_event(other),
            }
        }
        self.pause(self.settings.settle).await;
        Ok(())
    }

    pub async fn run_benchmark(&mut self, plan: &[AlgorithmRun]) -> Result<RunReport> {
        let mut report = RunReport::default();

        for run in plan {
            info!(
                family = run.family(),
                alg = %run.name,
                messages = run.messages,
                "starting benchmark"
            );
            let mut summary = AlgorithmReport {
                name: run.name.clone(),
                family: run.family().to_string(),
                ..AlgorithmReport::default()
            };
            let mut window = StatsWindow::new(DEFAULT_WINDOW);

            for seq in 1..=run.messages {
                summary.attempted += 1;
                match self.send_one(run, seq, &mut window).await {
                    Attempt::Acked => summary.acked += 1,
                    Attempt::TimedOut => summary.timed_out += 1,
                    Attempt::SendFailed => summary.send_failed += 1,
                    Attempt::SignFailed => summary.sign_failed += 1,
                }
                if self.closed {
                    return Err(PqcBenchError::Transport(format!(
                        "session closed during {} after {} messages",
                        run.name, seq
                    )));
                }
                self.pause(self.settings.pacing).await;
            }

            info!(alg = %run.name, "[{}] | {}", run.name, window.summarize());
            report.algorithms.push(summary);
        }

        Ok(report)
    }

    async fn send_one(
        &mut self,
        run: &AlgorithmRun,
        seq: u32,
        window: &mut StatsWindow,
    ) -> Attempt {
        let body = format!("[{} #{}] PQC benchmark message", run.family(), seq);
        let msg_id = Uuid::new_v4().to_string();
        let mut row = SenderRow {
            ts_unix: unix_now(),
            alg_family: run.family().to_string(),
            alg_name: run.name.clone(),
            seq,
            msg_id: msg_id.clone(),
            body_bytes: body.len(),
            stanza_bytes: 0,
            pk_b64_bytes: 0,
            sig_b64_bytes: 0,
            sign_time_ms: f64::NAN,
            rtt_ms: f64::NAN,
            receipt_ok: 0,
        };

        let signed = match self.provider.sign(&run.name, body.as_bytes()) {
            Ok(signed) => signed,
            Err(err) => {
                warn!(msg_id = %msg_id, alg = %run.name, seq, error = %err, "signing failed, message not sent");
                window.add(Sample {
                    rtt_ms: Some(f64::NAN),
                    sign_ms: Some(f64::NAN),
                    ..Sample::default()
                });
                self.record(&row);
                return Attempt::SignFailed;
            }
        };
        let envelope = AuthEnvelope::new(&run.name, &signed.sig_b64, &signed.pk_b64);
        row.sign_time_ms = signed.sign_time_ms;
        row.pk_b64_bytes = envelope.public_key_b64_len();
        row.sig_b64_bytes = envelope.signature_b64_len();

        let message = ChatMessage::chat(
            &msg_id,
            self.transport.local_jid(),
            &self.settings.recipient,
            &body,
        )
        .with_receipt_request()
        .with_extension(envelope.to_element());
        row.stanza_bytes = match Stanza::Message(message.clone()).to_xml() {
            Ok(xml) => xml.len(),
            Err(err) => {
                warn!(msg_id = %msg_id, alg = %run.name, seq, error = %err, "could not size stanza");
                0
            }
        };

        let pending = self.pending.register(&msg_id, Instant::now());
        let attempt = match self.transport.send_message(message) {
            Ok(stanza_bytes) => {
                row.stanza_bytes = stanza_bytes;
                match self.await_outcome(&pending).await {
                    Outcome::Acked { .. } => Attempt::Acked,
                    Outcome::TimedOut => {
                        warn!(msg_id = %msg_id, alg = %run.name, seq, "no receipt before timeout");
                        Attempt::TimedOut
                    }
                }
            }
            Err(err) => {
                self.pending.expire(&msg_id);
                warn!(msg_id = %msg_id, alg = %run.name, seq, error = %err, "send failed");
                Attempt::SendFailed
            }
        };

        row.rtt_ms = pending.rtt_ms();
        row.receipt_ok = u8::from(matches!(attempt, Attempt::Acked));
        window.add(Sample {
            rtt_ms: Some(row.rtt_ms),
            sign_ms: Some(row.sign_time_ms),
            ..Sample::default()
        });
        row.ts_unix = unix_now();
        self.record(&row);
        attempt
    }

    fn record(&mut self, row: &SenderRow) {
        if let Err(err) = self.sink.record(row) {
            warn!(msg_id = %row.msg_id, alg = %row.alg_name, seq = row.seq, error = %err, "failed to record metrics row");
        }
    }

    async fn await_outcome(&mut self, pending: &PendingSend) -> Outcome {
        let deadline = Instant::now() + self.settings.ack_timeout;
        loop {
            if let Some(outcome) = pending.slot.outcome() {
                return outcome;
            }
            if self.closed {
                self.pending.expire(&pending.correlation_id);
                continue;
            }
            tokio::select! {
                biased;
                event = self.events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => self.closed = true,
                },
                _ = tokio::time::sleep_until(deadline) => {
                    self.pending.expire(&pending.correlation_id);
                }
            }
        }
    }

    async fn pause(&mut self, duration: Duration) {
        let deadline = Instant::now() + duration;
        while !self.closed {
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => self.closed = true,
                },
                _ = tokio::time::sleep_until(deadline) => break,
            }
        }
    }

    fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Receipt { from, received_id } => {
                if self.pending.acknowledge(&received_id, Instant::now()) {
                    debug!(msg_id = %received_id, from = %from, "receipt matched");
                } else {
                    debug!(msg_id = %received_id, from = %from, "late or unknown receipt discarded");
                }
            }
            TransportEvent::Closed => self.closed = true,
            TransportEvent::Presence { from } => debug!(from = %from, "presence"),
            TransportEvent::Message(inbound) => {
                debug!(msg_id = %inbound.message.id, "ignoring inbound message on sender")
            }
            TransportEvent::SessionStarted => {}
        }
    }
}
