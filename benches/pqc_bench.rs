use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pqc_chat_bench::domains::algorithm::SignatureAlgorithm;
use pqc_chat_bench::interfaces::providers::SignatureProvider;
use pqc_chat_bench::providers::pqc::PqcProvider;
use pqc_chat_bench::wire::{AuthEnvelope, ChatMessage, Stanza};

const BODY: &[u8] = b"[ML-DSA #1] PQC benchmark message";

fn bench_algorithms() -> Vec<SignatureAlgorithm> {
    match std::env::var("PQC_BENCH_ALGS") {
        Ok(list) => list
            .split(',')
            .filter_map(|name| name.parse::<SignatureAlgorithm>().ok())
            .collect(),
        Err(_) => vec![SignatureAlgorithm::MlDsa44, SignatureAlgorithm::MlDsa65],
    }
}

fn bench_sign_verify(c: &mut Criterion) {
    let provider = PqcProvider::new();

    let mut group = c.benchmark_group("pqc_provider");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    for alg in bench_algorithms() {
        group.bench_function(format!("sign/{}", alg.id()), |b| {
            b.iter(|| provider.sign(alg.id(), black_box(BODY)).unwrap())
        });

        let signed = provider.sign(alg.id(), BODY).unwrap();
        group.bench_function(format!("verify/{}", alg.id()), |b| {
            b.iter(|| {
                provider.verify(
                    alg.id(),
                    black_box(BODY),
                    &signed.sig_b64,
                    &signed.pk_b64,
                )
            })
        });
    }

    group.finish();
}

fn bench_envelope_codec(c: &mut Criterion) {
    let provider = PqcProvider::new();
    let signed = provider.sign("ML-DSA-65", BODY).unwrap();
    let envelope = AuthEnvelope::new("ML-DSA-65", &signed.sig_b64, &signed.pk_b64);
    let message = ChatMessage::chat("bench-1", "emisor@localhost", "receptor@localhost", "body")
        .with_receipt_request()
        .with_extension(envelope.to_element());
    let xml = Stanza::Message(message.clone()).to_xml().unwrap();

    let mut group = c.benchmark_group("envelope_codec");
    group.bench_function("encode_stanza", |b| {
        b.iter(|| Stanza::Message(black_box(message.clone())).to_xml().unwrap())
    });
    group.bench_function("decode_stanza", |b| {
        b.iter(|| match Stanza::parse(black_box(&xml)).unwrap() {
            Stanza::Message(parsed) => AuthEnvelope::from_element(parsed.extension()),
            _ => None,
        })
    });
    group.finish();
}

criterion_group!(benches, bench_sign_verify, bench_envelope_codec);
criterion_main!(benches);
