//! Test helpers: an in-process fake relay board and a scripted transport.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::modbus::RelayTransport;
use crate::utils::error::TransportError;

/// Find a local port nothing is listening on
pub fn unused_local_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to port 0")
        .local_addr()
        .expect("Failed to get local address")
        .port()
}

#[derive(Debug, Clone)]
pub enum FakeReply {
    Bytes(Vec<u8>),
    /// Close the connection without answering.
    Close,
    /// Keep the connection open and never answer.
    Silent,
}

pub struct FakeDevice {
    pub port: u16,
    requests: Arc<tokio::sync::Mutex<Vec<Vec<u8>>>>,
    connections: Arc<tokio::sync::Mutex<usize>>,
}

impl FakeDevice {
    pub async fn requests(&self) -> Vec<Vec<u8>> {
        self.requests.lock().await.clone()
    }

    pub async fn connections(&self) -> usize {
        *self.connections.lock().await
    }
}

/// Serves one scripted reply per accepted connection, in order.
pub async fn spawn_fake_device(replies: Vec<FakeReply>) -> FakeDevice {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake device");
    let port = listener.local_addr().expect("Failed to get local address").port();

    let requests = Arc::new(tokio::sync::Mutex::new(Vec::new()));
    let connections = Arc::new(tokio::sync::Mutex::new(0));
    let recorded = Arc::clone(&requests);
    let accepted = Arc::clone(&connections);

    tokio::spawn(async move {
        for reply in replies {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            *accepted.lock().await += 1;

            let mut buffer = [0u8; 64];
            if let Ok(n) = stream.read(&mut buffer).await {
                if n > 0 {
                    recorded.lock().await.push(buffer[..n].to_vec());
                }
            }

            match reply {
                FakeReply::Bytes(bytes) => {
                    let _ = stream.write_all(&bytes).await;
                }
                FakeReply::Close => {}
                FakeReply::Silent => {
                    tokio::spawn(async move {
                        tokio::time::sleep(Duration::from_secs(30)).await;
                        drop(stream);
                    });
                }
            }
        }
    });

    FakeDevice {
        port,
        requests,
        connections,
    }
}

/// Transport that records every frame and hands back scripted responses.
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<Vec<u8>, TransportError>>>,
    sent: Mutex<Vec<Vec<u8>>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<Result<Vec<u8>, TransportError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(responses: Vec<Vec<u8>>) -> Self {
        Self::new(responses.into_iter().map(Ok).collect())
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl RelayTransport for ScriptedTransport {
    async fn exchange(&self, frame: &[u8]) -> Result<Vec<u8>, TransportError> {
        self.sent.lock().unwrap().push(frame.to_vec());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::IoError(std::io::ErrorKind::UnexpectedEof.into())))
    }

    async fn probe(&self) -> Result<(), TransportError> {
        Ok(())
    }

    fn peer(&self) -> String {
        "scripted".to_string()
    }
}

/// A well-formed response frame carrying `data` after the byte-count field.
pub fn data_response(function_code: u8, data: &[u8]) -> Vec<u8> {
    let mut frame = vec![0x00, 0x01, 0x00, 0x00, 0x00, 3 + data.len() as u8, 0x01, function_code, data.len() as u8];
    frame.extend_from_slice(data);
    frame
}

pub fn exception_response(function_code: u8, code: u8) -> Vec<u8> {
    vec![0x00, 0x01, 0x00, 0x00, 0x00, 0x03, 0x01, function_code | 0x80, code]
}

pub fn timeout_error() -> TransportError {
    TransportError::Timeout {
        addr: "scripted".to_string(),
        after: Duration::from_secs(5),
    }
}
