use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::net::{TcpListener, TcpStream};

use crate::error::{PqcBenchError, Result};
use crate::interfaces::transport::{BoxedStream, Transport};

pub struct LocalTransport;

#[async_trait]
impl Transport for LocalTransport {
    async fn connect(&self, host: &str, port: u16) -> Result<BoxedStream> {
        let addr = format!("{host}:{port}");
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| PqcBenchError::Transport(e.to_string()))?;
        stream
            .set_nodelay(true)
            .map_err(|e| PqcBenchError::Transport(e.to_string()))?;
        Ok(Box::new(stream))
    }
}

pub struct LocalListener {
    listener: TcpListener,
}

impl LocalListener {
    pub async fn bind(host: &str, port: u16) -> Result<Self> {
        let listener = TcpListener::bind(format!("{host}:{port}"))
            .await
            .map_err(|e| PqcBenchError::Transport(e.to_string()))?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| PqcBenchError::Transport(e.to_string()))
    }

    pub async fn accept(&self) -> Result<(BoxedStream, SocketAddr)> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(|e| PqcBenchError::Transport(e.to_string()))?;
        stream
            .set_nodelay(true)
            .map_err(|e| PqcBenchError::Transport(e.to_string()))?;
        Ok((Box::new(stream), peer))
    }
}
