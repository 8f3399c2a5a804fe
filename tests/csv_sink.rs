use std::fs;

use pqc_chat_bench::domains::metrics::{ReceiverRow, SenderRow};
use pqc_chat_bench::interfaces::sink::MetricsSink;
use pqc_chat_bench::providers::csv_sink::CsvSink;
use tempfile::tempdir;

#[test]
fn header_is_written_before_any_row() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested/csv/receiver_metrics.csv");

    let _sink = CsvSink::<ReceiverRow>::create(&path).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(
        content,
        "ts_unix,from,msg_id,alg,stanza_bytes,body_bytes,pk_b64_bytes,sig_b64_bytes,verify_time_ms,verify_ok\n"
    );
}

#[test]
fn rows_are_flushed_as_they_are_recorded() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sender_metrics.csv");
    let mut sink = CsvSink::<SenderRow>::create(&path).unwrap();

    sink.record(&SenderRow {
        ts_unix: 1700000000.5,
        alg_family: "ML-DSA".to_string(),
        alg_name: "ML-DSA-65".to_string(),
        seq: 1,
        msg_id: "a1".to_string(),
        body_bytes: 33,
        stanza_bytes: 6100,
        pk_b64_bytes: 2624,
        sig_b64_bytes: 4412,
        sign_time_ms: 0.75,
        rtt_ms: 3.5,
        receipt_ok: 1,
    })
    .unwrap();
    sink.record(&SenderRow {
        ts_unix: 1700000001.0,
        alg_family: "ML-DSA".to_string(),
        alg_name: "ML-DSA-65".to_string(),
        seq: 2,
        msg_id: "a2".to_string(),
        body_bytes: 33,
        stanza_bytes: 0,
        pk_b64_bytes: 2624,
        sig_b64_bytes: 4412,
        sign_time_ms: 0.75,
        rtt_ms: f64::NAN,
        receipt_ok: 0,
    })
    .unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("ts_unix,alg_family,alg_name,seq,msg_id"));
    assert_eq!(
        lines[1],
        "1700000000.5,ML-DSA,ML-DSA-65,1,a1,33,6100,2624,4412,0.75,3.5,1"
    );
    assert!(lines[2].ends_with(",0.75,NaN,0"));
}

#[test]
fn create_truncates_an_existing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("receiver_metrics.csv");
    fs::write(&path, "stale\ncontent\n").unwrap();

    let _sink = CsvSink::<ReceiverRow>::create(&path).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 1);
    assert!(content.starts_with("ts_unix,from"));
}
