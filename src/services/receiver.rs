use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domains::metrics::{unix_now, ReceiverRow};
use crate::interfaces::providers::{SignatureProvider, VerifyResult};
use crate::interfaces::sink::MetricsSink;
use crate::interfaces::transport::{ChatTransport, InboundMessage, TransportEvent};
use crate::stats::{Sample, StatsWindow, SummaryThrottle, DEFAULT_SUMMARY_EVERY, DEFAULT_WINDOW};
use crate::wire::AuthEnvelope;

#[derive(Debug, Clone)]
pub struct ReceiverSettings {
    pub window: usize,
    pub summary_every: Duration,
}

impl Default for ReceiverSettings {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            summary_every: DEFAULT_SUMMARY_EVERY,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceiveOutcome {
    pub row: Option<ReceiverRow>,
    pub receipt_sent: bool,
    pub summary: Option<String>,
}

pub struct ReceiverEngine {
    transport: Arc<dyn ChatTransport>,
    provider: Arc<dyn SignatureProvider>,
    sink: Box<dyn MetricsSink<ReceiverRow>>,
    stats: StatsWindow,
    throttle: SummaryThrottle,
}

impl ReceiverEngine {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        provider: Arc<dyn SignatureProvider>,
        sink: Box<dyn MetricsSink<ReceiverRow>>,
        settings: ReceiverSettings,
    ) -> Self {
        Self {
            transport,
            provider,
            sink,
            stats: StatsWindow::new(settings.window),
            throttle: SummaryThrottle::new(settings.summary_every, Instant::now()),
        }
    }

    pub fn stats(&self) -> &StatsWindow {
        &self.stats
    }

    pub fn attach(&mut self, transport: Arc<dyn ChatTransport>) {
        self.transport = transport;
    }

    pub async fn run<F>(&mut self, events: &mut mpsc::UnboundedReceiver<TransportEvent>, mut on_summary: F)
    where
        F: FnMut(&str),
    {
        while let Some(event) = events.recv().await {
            match event {
                TransportEvent::Message(inbound) => {
                    if let Some(line) = self.on_message(&inbound).summary {
                        on_summary(&line);
                    }
                }
                TransportEvent::SessionStarted => info!("receiver session started"),
                TransportEvent::Presence { from } => info!(from = %from, "peer online"),
                TransportEvent::Receipt { received_id, .. } => {
                    debug!(msg_id = %received_id, "ignoring receipt on receiver")
                }
                TransportEvent::Closed => break,
            }
        }
    }

    pub fn on_message(&mut self, inbound: &InboundMessage) -> ReceiveOutcome {
        self.on_message_at(inbound, Instant::now())
    }

    pub fn on_message_at(&mut self, inbound: &InboundMessage, now: Instant) -> ReceiveOutcome {
        let message = &inbound.message;
        if !message.kind.is_conversational() {
            debug!(msg_id = %message.id, kind = message.kind.as_str(), "ignoring non-chat message");
            return ReceiveOutcome::default();
        }

        let Some(envelope) = AuthEnvelope::from_element(message.extension()) else {
            debug!(msg_id = %message.id, from = %message.from, "message without pqc_auth");
            return ReceiveOutcome {
                receipt_sent: self.send_receipt_if_requested(inbound),
                ..ReceiveOutcome::default()
            };
        };

        let verified = self.verify(&envelope, message.body.as_bytes());
        if !verified.ok {
            warn!(msg_id = %message.id, alg = %envelope.algorithm, "signature did not verify");
        }

        let row = ReceiverRow {
            ts_unix: unix_now(),
            from: message.from.clone(),
            msg_id: message.id.clone(),
            alg: envelope.algorithm.clone(),
            stanza_bytes: inbound.wire_bytes,
            body_bytes: message.body_bytes(),
            pk_b64_bytes: envelope.public_key_b64_len(),
            sig_b64_bytes: envelope.signature_b64_len(),
            verify_time_ms: verified.verify_time_ms,
            verify_ok: u8::from(verified.ok),
        };
        if let Err(err) = self.sink.record(&row) {
            warn!(msg_id = %message.id, alg = %envelope.algorithm, error = %err, "failed to record metrics row");
        }

        self.stats.add(Sample {
            verify_ms: Some(verified.verify_time_ms),
            stanza_bytes: Some(inbound.wire_bytes),
            ..Sample::default()
        });
        let summary = self
            .throttle
            .ready(now)
            .then(|| format!("[{}] | {}", envelope.algorithm, self.stats.summarize()));

        ReceiveOutcome {
            row: Some(row),
            receipt_sent: self.send_receipt_if_requested(inbound),
            summary,
        }
    }

    fn verify(&self, envelope: &AuthEnvelope, body: &[u8]) -> VerifyResult {
        let provider = self.provider.clone();
        catch_unwind(AssertUnwindSafe(|| {
            provider.verify(
                &envelope.algorithm,
                body,
                &envelope.signature_b64,
                &envelope.public_key_b64,
            )
        }))
        .unwrap_or_else(|_| {
            warn!(alg = %envelope.algorithm, "verify provider panicked");
            VerifyResult::failed()
        })
    }

    fn send_receipt_if_requested(&self, inbound: &InboundMessage) -> bool {
        let message = &inbound.message;
        if !message.request_receipt {
            return false;
        }
        match self.transport.send_receipt(&message.from, &message.id) {
            Ok(()) => true,
            Err(err) => {
                warn!(msg_id = %message.id, error = %err, "failed to send receipt");
                false
            }
        }
    }
}
