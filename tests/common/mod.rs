//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use deposit_rotator::blockchain::BlockchainClient;
use deposit_rotator::config::RotatorConfig;
use deposit_rotator::connectors::ConfiguredProbe;
use deposit_rotator::http::HttpServer;
use deposit_rotator::lifecycle::Shutdown;
use deposit_rotator::status::StatusLookup;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

pub const IDENTITY: &str = "0xABCDEF0123456789abcdef0123456789ABCDEF01";

/// Config for the reference scenario: 5-minute buckets.
pub fn test_config() -> RotatorConfig {
    let mut config = RotatorConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.rotation.operator_identity = IDENTITY.to_string();
    config.rotation.interval_minutes = 5;
    config
}

/// A server running on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub config_updates: mpsc::UnboundedSender<RotatorConfig>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a server with the disabled status backend and no connectors.
pub async fn start_server(config: RotatorConfig) -> TestServer {
    let status: Arc<dyn StatusLookup> = Arc::new(deposit_rotator::status::DisabledStatusLookup);
    start_server_with(config, status, None).await
}

pub async fn start_server_with(
    config: RotatorConfig,
    status: Arc<dyn StatusLookup>,
    rpc: Option<BlockchainClient>,
) -> TestServer {
    let probe = ConfiguredProbe::new(config.blockchain.chain_id, rpc.clone(), None);
    let mut server = HttpServer::with_collaborators(config, status, Arc::new(probe)).unwrap();
    if let Some(client) = rpc {
        server = server.with_rpc_client(client);
    }

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let (config_updates, updates_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let _ = server.run(listener, updates_rx, server_shutdown).await;
    });

    // Wait for the accept loop to come up.
    tokio::time::sleep(Duration::from_millis(100)).await;

    TestServer {
        addr,
        shutdown,
        config_updates,
    }
}

/// Start a programmable HTTP backend. `f` receives the request body and
/// returns a status code and response body.
pub async fn start_programmable_backend<F>(f: F) -> SocketAddr
where
    F: Fn(String) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let Some(body) = read_request_body(&mut socket).await else {
                    return;
                };
                let (status, body) = f(body);
                let status_text = match status {
                    200 => "200 OK",
                    429 => "429 Too Many Requests",
                    500 => "500 Internal Server Error",
                    503 => "503 Service Unavailable",
                    _ => "200 OK",
                };

                let response = format!(
                    concat!(
                        "HTTP/1.1 {}\r\n",
                        "Content-Type: application/json\r\n",
                        "Content-Length: {}\r\n",
                        "Connection: close\r\n\r\n{}"
                    ),
                    status_text,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

async fn read_request_body(socket: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Some(String::from_utf8_lossy(&buf[header_end..]).into_owned())
}

/// Scripted chain state served by [`start_mock_node`].
#[derive(Debug, Clone, Copy)]
pub struct MockChain {
    pub chain_id: u64,
    pub latest_block: u64,
    /// Block at which the deposit landed, if any.
    pub deposit_block: Option<u64>,
    pub deposit_wei: u64,
}

impl MockChain {
    fn balance_at(&self, block: u64) -> u64 {
        match self.deposit_block {
            Some(landed) if block >= landed => self.deposit_wei,
            _ => 0,
        }
    }

    fn answer(&self, request: &Value) -> Value {
        let id = request.get("id").cloned().unwrap_or(Value::Null);
        let result = match request["method"].as_str().unwrap_or_default() {
            "eth_chainId" => json!(format!("0x{:x}", self.chain_id)),
            "eth_blockNumber" => json!(format!("0x{:x}", self.latest_block)),
            "eth_getBalance" => {
                let block = request["params"][1]
                    .as_str()
                    .and_then(|tag| u64::from_str_radix(tag.trim_start_matches("0x"), 16).ok())
                    .unwrap_or(self.latest_block);
                json!(format!("0x{:x}", self.balance_at(block)))
            }
            other => {
                return json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": { "code": -32601, "message": format!("method {} not found", other) },
                })
            }
        };
        json!({ "jsonrpc": "2.0", "id": id, "result": result })
    }
}

/// Start a minimal JSON-RPC node answering from `chain`.
pub async fn start_mock_node(chain: MockChain) -> SocketAddr {
    start_programmable_backend(move |body| {
        let Ok(request) = serde_json::from_str::<Value>(&body) else {
            return (500, "{}".to_string());
        };
        let response = match request {
            Value::Array(batch) => Value::Array(batch.iter().map(|r| chain.answer(r)).collect()),
            single => chain.answer(&single),
        };
        (200, response.to_string())
    })
    .await
}

/// An address with nothing listening on it.
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}
