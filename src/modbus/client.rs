use async_trait::async_trait;
use log::{debug, error, info};
use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::utils::error::TransportError;

pub const DEFAULT_PORT: u16 = 502;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const RESPONSE_BUFFER_SIZE: usize = 1024;

/// One request frame out, one response back.
///
/// Implementations open and release whatever resource they need inside a
/// single call; nothing is shared between calls.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    async fn exchange(&self, frame: &[u8]) -> Result<Vec<u8>, TransportError>;

    /// Checks that the board accepts connections, without sending anything.
    async fn probe(&self) -> Result<(), TransportError>;

    fn peer(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct TcpExchange {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpExchange {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_timeout(host, port, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }
}

#[async_trait]
impl RelayTransport for TcpExchange {
    async fn exchange(&self, frame: &[u8]) -> Result<Vec<u8>, TransportError> {
        exchange(&self.host, self.port, frame, self.timeout).await
    }

    async fn probe(&self) -> Result<(), TransportError> {
        let stream = within(&self.host, self.port, self.timeout, connect(&self.host, self.port)).await?;
        drop(stream);
        info!("🔌 {}:{} is reachable", self.host, self.port);
        Ok(())
    }

    fn peer(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

async fn connect(address: &str, port: u16) -> Result<TcpStream, TransportError> {
    TcpStream::connect((address, port)).await.map_err(|e| {
        let addr = format!("{}:{}", address, port);
        error!("❌ Failed to connect to {}: {}", addr, e);
        TransportError::ConnectFailed { addr, source: e }
    })
}

async fn within<T, F>(address: &str, port: u16, timeout: Duration, attempt: F) -> Result<T, TransportError>
where
    F: Future<Output = Result<T, TransportError>>,
{
    match tokio::time::timeout(timeout, attempt).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout {
            addr: format!("{}:{}", address, port),
            after: timeout,
        }),
    }
}

/// Opens a fresh connection, writes `frame`, performs a single read of up to
/// 1024 bytes and closes the connection again.
///
/// `timeout` bounds the whole call, connect included. The stream is owned by
/// this call, so it is closed on every exit path, including when the returned
/// future is dropped before completion.
pub async fn exchange(
    address: &str,
    port: u16,
    frame: &[u8],
    timeout: Duration,
) -> Result<Vec<u8>, TransportError> {
    let attempt = async {
        let mut stream = connect(address, port).await?;
        debug!("📤 {}:{} <- {}", address, port, hex::encode(frame));

        stream.write_all(frame).await?;
        let mut buffer = [0u8; RESPONSE_BUFFER_SIZE];
        let n = stream.read(&mut buffer).await?;
        Ok::<_, TransportError>(buffer[..n].to_vec())
    };

    let response = within(address, port, timeout, attempt).await?;
    debug!("📥 {}:{} -> {} ({} bytes)", address, port, hex::encode(&response), response.len());
    Ok(response)
}
