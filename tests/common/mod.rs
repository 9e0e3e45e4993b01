#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Canned answer of a [`TestServer`].
#[derive(Debug, Clone)]
pub struct Canned {
    pub status: u16,
    pub delay: Duration,
    pub location: Option<String>,
}

impl Canned {
    pub fn status(status: u16) -> Self {
        Self {
            status,
            delay: Duration::ZERO,
            location: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn redirect_to(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }
}

/// Minimal HTTP/1.1 server on loopback answering every request the same way.
pub struct TestServer {
    pub addr: SocketAddr,
    pub hits: Arc<AtomicUsize>,
    /// Raw request heads, in arrival order.
    pub heads: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    pub async fn start(canned: Canned) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let heads = Arc::new(Mutex::new(Vec::new()));

        let counter = hits.clone();
        let seen = heads.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let canned = canned.clone();
                let counter = counter.clone();
                let seen = seen.clone();
                tokio::spawn(async move {
                    let _ = answer(stream, &canned, &counter, &seen).await;
                });
            }
        });

        Self { addr, hits, heads }
    }

    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// `User-Agent` value of every request received so far.
    pub fn user_agents(&self) -> Vec<String> {
        self.heads
            .lock()
            .unwrap()
            .iter()
            .filter_map(|head| {
                head.lines().find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("user-agent")
                        .then(|| value.trim().to_string())
                })
            })
            .collect()
    }
}

async fn answer(
    mut stream: TcpStream,
    canned: &Canned,
    hits: &AtomicUsize,
    heads: &Mutex<Vec<String>>,
) -> std::io::Result<()> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    heads
        .lock()
        .unwrap()
        .push(String::from_utf8_lossy(&buf).into_owned());
    hits.fetch_add(1, Ordering::SeqCst);

    tokio::time::sleep(canned.delay).await;

    let mut response = format!(
        "HTTP/1.1 {} Canned\r\nContent-Length: 0\r\nConnection: close\r\n",
        canned.status
    );
    if let Some(location) = &canned.location {
        response.push_str(&format!("Location: {}\r\n", location));
    }
    response.push_str("\r\n");
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

/// An address nothing listens on.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/", port)
}
