use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;
use crate::wire::ChatMessage;

pub trait AsyncReadWrite: AsyncRead + AsyncWrite {}

impl<T> AsyncReadWrite for T where T: AsyncRead + AsyncWrite {}

pub type BoxedStream = Box<dyn AsyncReadWrite + Unpin + Send>;

#[async_trait]
pub trait Transport: Send + Sync {
    async fn connect(&self, host: &str, port: u16) -> Result<BoxedStream>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub message: ChatMessage,
    pub wire_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    SessionStarted,
    Message(InboundMessage),
    Receipt { from: String, received_id: String },
    Presence { from: String },
    Closed,
}

pub trait ChatTransport: Send + Sync {
    fn local_jid(&self) -> &str;

    /// Returns the serialized stanza size in bytes.
    fn send_message(&self, message: ChatMessage) -> Result<usize>;

    fn send_receipt(&self, to: &str, received_id: &str) -> Result<()>;
}
