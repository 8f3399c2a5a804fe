use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{PqcBenchError, Result};
use crate::interfaces::transport::{BoxedStream, ChatTransport, InboundMessage, TransportEvent};
use crate::wire::{ChatMessage, Stanza};

const DUPLEX_BUFFER: usize = 256 * 1024;

#[derive(Clone)]
pub struct SessionHandle {
    jid: String,
    outbound: mpsc::UnboundedSender<String>,
}

impl SessionHandle {
    pub fn start(stream: BoxedStream, jid: &str) -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let (read_half, mut write_half) = tokio::io::split(stream);
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
        let (event_tx, event_rx) = mpsc::unbounded_channel::<TransportEvent>();

        tokio::spawn(async move {
            while let Some(line) = out_rx.recv().await {
                let written = async {
                    write_half.write_all(line.as_bytes()).await?;
                    write_half.write_all(b"\n").await?;
                    write_half.flush().await
                }
                .await;
                if let Err(err) = written {
                    warn!(error = %err, "stanza writer stopped");
                    break;
                }
            }
            let _ = write_half.shutdown().await;
        });

        let reader_events = event_tx.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(read_half).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        match Stanza::parse(&line) {
                            Ok(stanza) => {
                                if let Some(event) = event_for(stanza, line.len()) {
                                    if reader_events.send(event).is_err() {
                                        break;
                                    }
                                }
                            }
                            Err(err) => warn!(error = %err, "dropping unparseable stanza"),
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        warn!(error = %err, "stanza reader stopped");
                        break;
                    }
                }
            }
            let _ = reader_events.send(TransportEvent::Closed);
        });

        let handle = Self {
            jid: jid.to_string(),
            outbound: out_tx,
        };
        if let Err(err) = handle.enqueue(&Stanza::Presence {
            from: jid.to_string(),
        }) {
            warn!(error = %err, "failed to announce presence");
        }
        let _ = event_tx.send(TransportEvent::SessionStarted);
        (handle, event_rx)
    }

    fn enqueue(&self, stanza: &Stanza) -> Result<usize> {
        let xml = stanza.to_xml()?;
        let size = xml.len();
        self.outbound
            .send(xml)
            .map_err(|_| PqcBenchError::Transport("session closed".to_string()))?;
        Ok(size)
    }
}

fn event_for(stanza: Stanza, wire_bytes: usize) -> Option<TransportEvent> {
    match stanza {
        Stanza::Message(message) => Some(TransportEvent::Message(InboundMessage {
            message,
            wire_bytes,
        })),
        Stanza::Receipt {
            from, received_id, ..
        } => Some(TransportEvent::Receipt { from, received_id }),
        Stanza::Presence { from } => Some(TransportEvent::Presence { from }),
        Stanza::Other(name) => {
            debug!(element = %name, "ignoring unsupported stanza");
            None
        }
    }
}

impl ChatTransport for SessionHandle {
    fn local_jid(&self) -> &str {
        &self.jid
    }

    fn send_message(&self, message: ChatMessage) -> Result<usize> {
        self.enqueue(&Stanza::Message(message))
    }

    fn send_receipt(&self, to: &str, received_id: &str) -> Result<()> {
        self.enqueue(&Stanza::Receipt {
            from: self.jid.clone(),
            to: to.to_string(),
            received_id: received_id.to_string(),
        })
        .map(|_| ())
    }
}

pub type SessionEnd = (SessionHandle, mpsc::UnboundedReceiver<TransportEvent>);

pub fn session_pair(left_jid: &str, right_jid: &str) -> (SessionEnd, SessionEnd) {
    let (left, right) = tokio::io::duplex(DUPLEX_BUFFER);
    (
        SessionHandle::start(Box::new(left), left_jid),
        SessionHandle::start(Box::new(right), right_jid),
    )
}
