use std::sync::Arc;

use clap::Parser;
use pqc_chat_bench::config::BenchConfig;
use pqc_chat_bench::domains::algorithm::{default_plan, AlgorithmRun};
use pqc_chat_bench::error::Result;
use pqc_chat_bench::interfaces::transport::Transport;
use pqc_chat_bench::providers::csv_sink::CsvSink;
use pqc_chat_bench::providers::pqc::PqcProvider;
use pqc_chat_bench::services::sender::SenderEngine;
use pqc_chat_bench::services::session::SessionHandle;
use pqc_chat_bench::services::transport::LocalTransport;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pqc-bench-sender")]
#[command(about = "Sends PQC-signed chat messages and measures receipt round trips")]
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
    recipient: Option<String>,

    #[arg(long)]
    csv: Option<String>,

    #[arg(long = "alg", help = "Algorithm id, repeatable (e.g. ML-DSA-65)")]
    algorithms: Vec<String>,

    #[arg(long, help = "Messages per algorithm")]
    messages: Option<u32>,

    #[arg(long)]
    ack_timeout_ms: Option<u64>,

    #[arg(long)]
    pacing_ms: Option<u64>,
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

        let sender = config.sender.get_or_insert_with(Default::default);
        if let Some(jid) = &self.jid {
            sender.jid = Some(jid.clone());
        }
        if let Some(recipient) = &self.recipient {
            sender.recipient = Some(recipient.clone());
        }
        if let Some(csv) = &self.csv {
            sender.csv_path = Some(csv.clone());
        }
        if let Some(timeout) = self.ack_timeout_ms {
            sender.ack_timeout_ms = Some(timeout);
        }
        if let Some(pacing) = self.pacing_ms {
            sender.pacing_ms = Some(pacing);
        }
        if !self.algorithms.is_empty() {
            let messages = self.messages.unwrap_or(100);
            sender.algorithms = Some(
                self.algorithms
                    .iter()
                    .map(|name| AlgorithmRun::new(name, messages))
                    .collect(),
            );
        } else if let Some(messages) = self.messages {
            let plan = sender.algorithms.get_or_insert_with(default_plan);
            plan.iter_mut().for_each(|run| run.messages = messages);
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
    let plan = config.plan()?;

    let host = config.host();
    let port = config.port();
    let csv_path = config.sender_csv_path();
    let stream = LocalTransport.connect(&host, port).await?;
    let (session, events) = SessionHandle::start(stream, &config.sender_jid());

    let mut engine = SenderEngine::new(
        Arc::new(session),
        events,
        Arc::new(PqcProvider::new()),
        Box::new(CsvSink::create(&csv_path)?),
        config.sender_settings(),
    );
    engine.wait_for_session().await?;
    println!("[pqc-bench-sender] connected to {host}:{port}, writing {csv_path}");

    let report = engine.run_benchmark(&plan).await?;
    for algorithm in &report.algorithms {
        println!("{algorithm}");
    }
    println!(
        "[pqc-bench-sender] {}/{} messages acknowledged",
        report.total_acked(),
        report.total_attempted()
    );
    Ok(())
}
