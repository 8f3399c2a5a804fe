mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{inbound, signed_message, RecordingTransport, ScriptedProvider};
use pqc_chat_bench::domains::metrics::ReceiverRow;
use pqc_chat_bench::interfaces::providers::SignatureProvider;
use pqc_chat_bench::interfaces::transport::TransportEvent;
use pqc_chat_bench::providers::csv_sink::MemorySink;
use pqc_chat_bench::providers::pqc::PqcProvider;
use pqc_chat_bench::services::receiver::{ReceiverEngine, ReceiverSettings};
use pqc_chat_bench::stats::Metric;
use pqc_chat_bench::wire::{AuthEnvelope, ChatMessage, MessageKind};
use tokio::sync::mpsc;

fn engine_with(
    transport: Arc<RecordingTransport>,
    provider: Arc<dyn SignatureProvider>,
    summary_every: Duration,
) -> (ReceiverEngine, MemorySink<ReceiverRow>) {
    let sink = MemorySink::<ReceiverRow>::new();
    let engine = ReceiverEngine::new(
        transport,
        provider,
        Box::new(sink.clone()),
        ReceiverSettings {
            window: 50,
            summary_every,
        },
    );
    (engine, sink)
}

#[test]
fn signed_message_is_verified_recorded_and_acknowledged() {
    let transport = Arc::new(RecordingTransport::new("receptor@localhost/bench"));
    let provider = Arc::new(ScriptedProvider::new());
    let (mut engine, sink) = engine_with(transport.clone(), provider.clone(), Duration::from_secs(2));

    let incoming = inbound(signed_message("m-1", "ML-DSA-65"));
    let outcome = engine.on_message(&incoming);

    let row = outcome.row.unwrap();
    assert_eq!(row.msg_id, "m-1");
    assert_eq!(row.from, "emisor@localhost/bench");
    assert_eq!(row.alg, "ML-DSA-65");
    assert_eq!(row.verify_ok, 1);
    assert_eq!(row.verify_time_ms, 0.25);
    assert_eq!(row.stanza_bytes, incoming.wire_bytes);
    assert_eq!(row.body_bytes, "hello".len());
    assert!(outcome.receipt_sent);
    assert_eq!(provider.verify_calls(), 1);
    assert_eq!(sink.rows().len(), 1);
    assert_eq!(
        transport.receipts(),
        vec![("emisor@localhost/bench".to_string(), "m-1".to_string())]
    );
    assert_eq!(engine.stats().len(Metric::Verify), 1);
    assert_eq!(engine.stats().len(Metric::Stanza), 1);
}

#[test]
fn unsigned_message_is_acknowledged_without_a_row() {
    let transport = Arc::new(RecordingTransport::new("receptor@localhost/bench"));
    let provider = Arc::new(ScriptedProvider::new());
    let (mut engine, sink) = engine_with(transport.clone(), provider.clone(), Duration::from_secs(2));

    let message = ChatMessage::chat("plain-1", "emisor@localhost/bench", "receptor@localhost", "hi")
        .with_receipt_request();
    let outcome = engine.on_message(&inbound(message));

    assert!(outcome.row.is_none());
    assert!(outcome.receipt_sent);
    assert_eq!(transport.receipts().len(), 1);
    assert_eq!(provider.verify_calls(), 0);
    assert!(sink.rows().is_empty());
}

#[test]
fn incomplete_envelope_counts_as_unsigned() {
    let transport = Arc::new(RecordingTransport::new("receptor@localhost/bench"));
    let (mut engine, sink) = engine_with(
        transport.clone(),
        Arc::new(ScriptedProvider::new()),
        Duration::from_secs(2),
    );

    let mut partial = AuthEnvelope::new("ML-DSA-65", "c2ln", "cGs=").to_element();
    partial.set_attr("alg", "");
    let message = ChatMessage::chat("m-2", "emisor@localhost/bench", "receptor@localhost", "hi")
        .with_receipt_request()
        .with_extension(partial);
    let outcome = engine.on_message(&inbound(message));

    assert!(outcome.row.is_none());
    assert!(outcome.receipt_sent);
    assert!(sink.rows().is_empty());
}

#[test]
fn invalid_signature_is_recorded_and_still_acknowledged_once() {
    let transport = Arc::new(RecordingTransport::new("receptor@localhost/bench"));
    let (mut engine, sink) = engine_with(
        transport.clone(),
        Arc::new(ScriptedProvider::rejecting()),
        Duration::from_secs(2),
    );

    let outcome = engine.on_message(&inbound(signed_message("bad-1", "ML-DSA-65")));

    assert_eq!(outcome.row.unwrap().verify_ok, 0);
    assert_eq!(transport.receipts().len(), 1);
    assert_eq!(sink.rows().len(), 1);
}

#[test]
fn panicking_verifier_yields_a_failed_row() {
    let transport = Arc::new(RecordingTransport::new("receptor@localhost/bench"));
    let (mut engine, sink) = engine_with(
        transport.clone(),
        Arc::new(ScriptedProvider::panicking()),
        Duration::from_secs(2),
    );

    let outcome = engine.on_message(&inbound(signed_message("boom-1", "ML-DSA-65")));

    let row = outcome.row.unwrap();
    assert_eq!(row.verify_ok, 0);
    assert!(row.verify_time_ms.is_nan());
    assert!(outcome.receipt_sent);
    assert_eq!(sink.rows().len(), 1);
    assert_eq!(engine.stats().len(Metric::Verify), 1);
    assert!(engine.stats().values(Metric::Verify)[0].is_nan());
    assert_eq!(engine.stats().len(Metric::Stanza), 1);
}

#[test]
fn non_chat_messages_are_ignored() {
    let transport = Arc::new(RecordingTransport::new("receptor@localhost/bench"));
    let provider = Arc::new(ScriptedProvider::new());
    let (mut engine, sink) = engine_with(transport.clone(), provider.clone(), Duration::from_secs(2));

    for kind in [MessageKind::Groupchat, MessageKind::Headline, MessageKind::Error] {
        let mut message = signed_message("skip", "ML-DSA-65");
        message.kind = kind;
        let outcome = engine.on_message(&inbound(message));
        assert!(outcome.row.is_none());
        assert!(!outcome.receipt_sent);
    }

    let mut normal = signed_message("normal-1", "ML-DSA-65");
    normal.kind = MessageKind::Normal;
    assert!(engine.on_message(&inbound(normal)).row.is_some());

    assert_eq!(provider.verify_calls(), 1);
    assert_eq!(sink.rows().len(), 1);
    assert_eq!(transport.receipts().len(), 1);
}

#[test]
fn receipt_is_only_sent_when_requested() {
    let transport = Arc::new(RecordingTransport::new("receptor@localhost/bench"));
    let (mut engine, _sink) = engine_with(
        transport.clone(),
        Arc::new(ScriptedProvider::new()),
        Duration::from_secs(2),
    );

    let mut message = signed_message("quiet-1", "ML-DSA-65");
    message.request_receipt = false;
    let outcome = engine.on_message(&inbound(message));

    assert!(outcome.row.is_some());
    assert!(!outcome.receipt_sent);
    assert!(transport.receipts().is_empty());
}

#[test]
fn receipt_failure_is_swallowed() {
    let transport = Arc::new(RecordingTransport::new("receptor@localhost/bench").failing_receipts());
    let (mut engine, sink) = engine_with(
        transport.clone(),
        Arc::new(ScriptedProvider::new()),
        Duration::from_secs(2),
    );

    let outcome = engine.on_message(&inbound(signed_message("m-3", "ML-DSA-65")));

    assert!(!outcome.receipt_sent);
    assert_eq!(outcome.row.unwrap().verify_ok, 1);
    assert_eq!(sink.rows().len(), 1);
}

#[test]
fn summaries_are_rate_limited() {
    let transport = Arc::new(RecordingTransport::new("receptor@localhost/bench"));
    let (mut engine, _sink) = engine_with(
        transport,
        Arc::new(ScriptedProvider::new()),
        Duration::from_secs(2),
    );
    let start = Instant::now();

    let early = engine.on_message_at(&inbound(signed_message("s-1", "ML-DSA-65")), start);
    assert!(early.summary.is_none());

    let due = engine.on_message_at(
        &inbound(signed_message("s-2", "ML-DSA-65")),
        start + Duration::from_secs(3),
    );
    let line = due.summary.unwrap();
    assert!(line.starts_with("[ML-DSA-65] | "));
    assert!(line.contains("VERIFY(ms): n=2"));
    assert!(line.contains("RTT(ms): n/a"));

    let too_soon = engine.on_message_at(
        &inbound(signed_message("s-3", "ML-DSA-65")),
        start + Duration::from_secs(4),
    );
    assert!(too_soon.summary.is_none());

    let again = engine.on_message_at(
        &inbound(signed_message("s-4", "ML-DSA-65")),
        start + Duration::from_secs(5),
    );
    assert!(again.summary.is_some());
}

#[test]
fn real_signature_round_trip_verifies() {
    let provider = PqcProvider::new();
    let body = "[ML-DSA #1] PQC benchmark message";
    let signed = provider.sign("ML-DSA-44", body.as_bytes()).unwrap();
    let envelope = AuthEnvelope::new("ML-DSA-44", &signed.sig_b64, &signed.pk_b64);
    let message = ChatMessage::chat("real-1", "emisor@localhost/bench", "receptor@localhost", body)
        .with_receipt_request()
        .with_extension(envelope.to_element());

    let transport = Arc::new(RecordingTransport::new("receptor@localhost/bench"));
    let (mut engine, _sink) = engine_with(transport, Arc::new(provider), Duration::from_secs(2));
    let row = engine.on_message(&inbound(message.clone())).row.unwrap();
    assert_eq!(row.verify_ok, 1);
    assert!(row.verify_time_ms.is_finite());

    let mut tampered = message;
    tampered.body.push('!');
    let row = engine.on_message(&inbound(tampered)).row.unwrap();
    assert_eq!(row.verify_ok, 0);
}

#[tokio::test]
async fn run_processes_events_until_the_session_closes() {
    let transport = Arc::new(RecordingTransport::new("receptor@localhost/bench"));
    let (mut engine, sink) = engine_with(
        transport.clone(),
        Arc::new(ScriptedProvider::new()),
        Duration::ZERO,
    );
    let (tx, mut rx) = mpsc::unbounded_channel();
    tx.send(TransportEvent::SessionStarted).unwrap();
    tx.send(TransportEvent::Message(inbound(signed_message("r-1", "ML-DSA-65"))))
        .unwrap();
    tx.send(TransportEvent::Receipt {
        from: "someone".to_string(),
        received_id: "x".to_string(),
    })
    .unwrap();
    tx.send(TransportEvent::Message(inbound(signed_message("r-2", "ML-DSA-65"))))
        .unwrap();
    tx.send(TransportEvent::Closed).unwrap();

    let mut summaries = Vec::new();
    engine.run(&mut rx, |line| summaries.push(line.to_string())).await;

    assert_eq!(sink.rows().len(), 2);
    assert_eq!(transport.receipts().len(), 2);
    assert_eq!(summaries.len(), 2);
}
