#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tokio::sync::mpsc;

use pqc_chat_bench::domains::metrics::SenderRow;
use pqc_chat_bench::error::{PqcBenchError, Result};
use pqc_chat_bench::interfaces::providers::{SignResult, SignatureProvider, VerifyResult};
use pqc_chat_bench::interfaces::sink::MetricsSink;
use pqc_chat_bench::interfaces::transport::{ChatTransport, InboundMessage, TransportEvent};
use pqc_chat_bench::wire::{AuthEnvelope, ChatMessage, Stanza};

pub struct ScriptedProvider {
    pub fail_sign: bool,
    pub verify_ok: bool,
    pub panic_on_verify: bool,
    pub sign_time_ms: f64,
    pub verify_time_ms: f64,
    verify_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            fail_sign: false,
            verify_ok: true,
            panic_on_verify: false,
            sign_time_ms: 1.5,
            verify_time_ms: 0.25,
            verify_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_sign() -> Self {
        Self {
            fail_sign: true,
            ..Self::new()
        }
    }

    pub fn rejecting() -> Self {
        Self {
            verify_ok: false,
            ..Self::new()
        }
    }

    pub fn panicking() -> Self {
        Self {
            panic_on_verify: true,
            ..Self::new()
        }
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

impl SignatureProvider for ScriptedProvider {
    fn sign(&self, algorithm: &str, message: &[u8]) -> Result<SignResult> {
        if self.fail_sign {
            return Err(PqcBenchError::Crypto(format!("{algorithm} keygen failed")));
        }
        Ok(SignResult {
            pk_b64: BASE64.encode(format!("pk-{algorithm}")),
            sig_b64: BASE64.encode(message),
            sign_time_ms: self.sign_time_ms,
        })
    }

    fn verify(
        &self,
        _algorithm: &str,
        _message: &[u8],
        _sig_b64: &str,
        _pk_b64: &str,
    ) -> VerifyResult {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        if self.panic_on_verify {
            panic!("verifier blew up");
        }
        VerifyResult {
            ok: self.verify_ok,
            verify_time_ms: self.verify_time_ms,
        }
    }
}

pub struct RecordingTransport {
    jid: String,
    events: Option<mpsc::UnboundedSender<TransportEvent>>,
    auto_ack: bool,
    late_ack: bool,
    fail_sends: bool,
    fail_receipts: bool,
    sent: Mutex<Vec<ChatMessage>>,
    receipts: Mutex<Vec<(String, String)>>,
}

impl RecordingTransport {
    pub fn new(jid: &str) -> Self {
        Self {
            jid: jid.to_string(),
            events: None,
            auto_ack: false,
            late_ack: false,
            fail_sends: false,
            fail_receipts: false,
            sent: Mutex::new(Vec::new()),
            receipts: Mutex::new(Vec::new()),
        }
    }

    /// Keeps the engine's event stream open; with `auto_ack` every sent
    /// message is answered with a receipt straight away.
    pub fn with_events(mut self, events: mpsc::UnboundedSender<TransportEvent>, auto_ack: bool) -> Self {
        self.events = Some(events);
        self.auto_ack = auto_ack;
        self
    }

    /// Acknowledges each message only once the next one goes out.
    pub fn late_acks(mut self) -> Self {
        self.late_ack = true;
        self
    }

    pub fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    pub fn failing_receipts(mut self) -> Self {
        self.fail_receipts = true;
        self
    }

    pub fn sent(&self) -> Vec<ChatMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn receipts(&self) -> Vec<(String, String)> {
        self.receipts.lock().unwrap().clone()
    }
}

impl ChatTransport for RecordingTransport {
    fn local_jid(&self) -> &str {
        &self.jid
    }

    fn send_message(&self, message: ChatMessage) -> Result<usize> {
        if self.fail_sends {
            return Err(PqcBenchError::Transport("socket closed".to_string()));
        }
        let size = Stanza::Message(message.clone()).to_xml()?.len();
        let mut sent = self.sent.lock().unwrap();
        if let Some(events) = &self.events {
            let acked = if self.late_ack {
                sent.last().map(|previous| previous.id.clone())
            } else if self.auto_ack {
                Some(message.id.clone())
            } else {
                None
            };
            if let Some(received_id) = acked {
                let _ = events.send(TransportEvent::Receipt {
                    from: message.to.clone(),
                    received_id,
                });
            }
        }
        sent.push(message);
        Ok(size)
    }

    fn send_receipt(&self, to: &str, received_id: &str) -> Result<()> {
        if self.fail_receipts {
            return Err(PqcBenchError::Transport("receipt refused".to_string()));
        }
        self.receipts
            .lock()
            .unwrap()
            .push((to.to_string(), received_id.to_string()));
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct FailingOnceSink {
    failed: Arc<Mutex<bool>>,
    rows: Arc<Mutex<Vec<SenderRow>>>,
}

impl FailingOnceSink {
    pub fn rows(&self) -> Vec<SenderRow> {
        self.rows.lock().unwrap().clone()
    }
}

impl MetricsSink<SenderRow> for FailingOnceSink {
    fn record(&mut self, row: &SenderRow) -> Result<()> {
        let mut failed = self.failed.lock().unwrap();
        if !*failed {
            *failed = true;
            return Err(PqcBenchError::Io("disk full".to_string()));
        }
        self.rows.lock().unwrap().push(row.clone());
        Ok(())
    }
}

pub fn inbound(message: ChatMessage) -> InboundMessage {
    let wire_bytes = Stanza::Message(message.clone()).to_xml().unwrap().len();
    InboundMessage {
        message,
        wire_bytes,
    }
}

pub fn signed_message(id: &str, algorithm: &str) -> ChatMessage {
    let envelope = AuthEnvelope::from_raw(algorithm, b"signature-bytes", b"public-key-bytes");
    ChatMessage::chat(id, "emisor@localhost/bench", "receptor@localhost/bench", "hello")
        .with_receipt_request()
        .with_extension(envelope.to_element())
}
