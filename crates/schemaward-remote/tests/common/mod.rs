//! Shared test doubles: an in-memory transport and a loopback HTTP stub.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use schemaward_remote::client::Result;
use schemaward_remote::{CollectionUpdate, Credential, RemoteError, SchemaAggregate, SchemaTransport};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

// ── In-memory transport ──────────────────────────────────────────

/// Holds the "remote" aggregate in memory and records every call.
#[derive(Default)]
pub struct MemoryTransport {
    state: Mutex<SchemaAggregate>,
    writes: Mutex<Vec<CollectionUpdate>>,
    tokens: Mutex<Vec<String>>,
    fetches: AtomicUsize,
    fail_fetch: AtomicBool,
    fail_write: AtomicBool,
    fetch_delay: Mutex<Option<Duration>>,
    write_delay: Mutex<Option<Duration>>,
}

impl MemoryTransport {
    pub fn with_state(state: SchemaAggregate) -> Self {
        Self {
            state: Mutex::new(state),
            ..Default::default()
        }
    }

    pub fn state(&self) -> SchemaAggregate {
        self.state.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<CollectionUpdate> {
        self.writes.lock().unwrap().clone()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn fail_fetches(&self) {
        self.fail_fetch.store(true, Ordering::SeqCst);
    }

    pub fn fail_writes(&self) {
        self.fail_write.store(true, Ordering::SeqCst);
    }

    pub fn delay_fetches(&self, delay: Duration) {
        *self.fetch_delay.lock().unwrap() = Some(delay);
    }

    pub fn delay_writes(&self, delay: Duration) {
        *self.write_delay.lock().unwrap() = Some(delay);
    }
}

#[async_trait]
impl SchemaTransport for MemoryTransport {
    async fn fetch_schema(&self, credential: &Credential) -> Result<SchemaAggregate> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.tokens
            .lock()
            .unwrap()
            .push(credential.access_token().to_string());

        let delay = *self.fetch_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("connection refused".to_string()));
        }
        Ok(self.state())
    }

    async fn replace_collection(
        &self,
        credential: &Credential,
        update: &CollectionUpdate,
    ) -> Result<()> {
        self.tokens
            .lock()
            .unwrap()
            .push(credential.access_token().to_string());

        let delay = *self.write_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_write.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("connection reset".to_string()));
        }
        self.writes.lock().unwrap().push(update.clone());
        update.clone().apply_to(&mut self.state.lock().unwrap());
        Ok(())
    }
}

// ── Loopback HTTP stub ───────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct StubRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl StubRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

type Handler = dyn Fn(&StubRequest, &str) -> (u16, String) + Send + Sync;

/// A one-route-table HTTP/1.1 server on 127.0.0.1.
pub struct StubServer {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<StubRequest>>>,
}

impl StubServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn requests(&self) -> Vec<StubRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }
}

/// Start a stub. The handler gets each request and the server's base URL.
pub async fn serve<F>(handler: F) -> StubServer
where
    F: Fn(&StubRequest, &str) -> (u16, String) + Send + Sync + 'static,
{
    serve_slow(Duration::ZERO, handler).await
}

/// Like [`serve`], but every response is held back by `delay`.
pub async fn serve_slow<F>(delay: Duration, handler: F) -> StubServer
where
    F: Fn(&StubRequest, &str) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base = format!("http://{addr}");
    let requests = Arc::new(Mutex::new(Vec::new()));
    let handler: Arc<Handler> = Arc::new(handler);

    let log = requests.clone();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let handler = handler.clone();
            let log = log.clone();
            let base = base.clone();
            tokio::spawn(async move {
                let _ = respond(stream, &handler, &base, &log, delay).await;
            });
        }
    });

    StubServer { addr, requests }
}

async fn respond(
    mut stream: TcpStream,
    handler: &Arc<Handler>,
    base: &str,
    log: &Arc<Mutex<Vec<StubRequest>>>,
    delay: Duration,
) -> Option<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();

    let req = StubRequest {
        method,
        path,
        headers,
        body,
    };
    log.lock().unwrap().push(req.clone());

    let (status, body) = handler(&req, base);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    let response = format!(
        "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await.ok()?;
    stream.shutdown().await.ok()?;
    Some(())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
