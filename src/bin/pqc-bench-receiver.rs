use std::sync::Arc;

use clap::Parser;
use pqc_chat_bench::config::BenchConfig;
use pqc_chat_bench::error::Result;
use pqc_chat_bench::providers::csv_sink::CsvSink;
use pqc_chat_bench::providers::pqc::PqcProvider;
use pqc_chat_bench::services::receiver::ReceiverEngine;
use pqc_chat_bench::services::session::SessionHandle;
use pqc_chat_bench::services::transport::LocalListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pqc-bench-receiver")]
#[command(about = "Verifies PQC-signed chat messages and acknowledges delivery")]
struct Cli {
    #[arg(long, env = "PQC_BENCH_CONFIG")]
    config: Option<String>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    #[arg(long)]
    jid: Option<String>,

    #[arg(long)]
    csv: Option<String>,

    #[arg(long)]
    window: Option<usize>,

    #[arg(long)]
    summary_every_ms: Option<u64>,
}

impl Cli {
    fn apply(&self, config: &mut BenchConfig) {
        let transport = config.transport.get_or_insert_with(Default::default);
        if let Some(host) = &self.host {
            transport.host = Some(host.clone());
        }
        if let Some(port) = self.port {
            transport.port = Some(port);
        }

        let receiver = config.receiver.get_or_insert_with(Default::default);
        if let Some(jid) = &self.jid {
            receiver.jid = Some(jid.clone());
        }
        if let Some(csv) = &self.csv {
            receiver.csv_path = Some(csv.clone());
        }
        if let Some(window) = self.window {
            receiver.window = Some(window);
        }
        if let Some(every) = self.summary_every_ms {
            receiver.summary_every_ms = Some(every);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pqc_chat_bench=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let cli = Cli::parse();

    let mut config = BenchConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    let jid = config.receiver_jid();
    let csv_path = config.receiver_csv_path();
    let sink = CsvSink::create(&csv_path)?;
    let listener = LocalListener::bind(&config.host(), config.port()).await?;
    println!(
        "[pqc-bench-receiver] listening on {}, writing {csv_path}",
        listener.local_addr()?
    );

    let (stream, mut peer) = listener.accept().await?;
    let (session, mut events) = SessionHandle::start(stream, &jid);
    let mut engine = ReceiverEngine::new(
        Arc::new(session),
        Arc::new(PqcProvider::new()),
        Box::new(sink),
        config.receiver_settings(),
    );

    loop {
        info!(peer = %peer, "sender connected");
        engine.run(&mut events, |line| println!("{line}")).await;
        info!(peer = %peer, "sender disconnected");

        let (stream, next_peer) = listener.accept().await?;
        let (session, next_events) = SessionHandle::start(stream, &jid);
        engine.attach(Arc::new(session));
        events = next_events;
        peer = next_peer;
    }
}
