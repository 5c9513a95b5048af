//! Test-only in-process stub of the upstream chat-completion endpoint.
//!
//! Serves canned HTTP/1.1 responses over a raw `TcpListener` and counts
//! complete requests, so retry/timeout behavior is assertable without any
//! real network dependency.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub struct StubUpstream {
    pub url: String,
    hits: Arc<AtomicUsize>,
}

impl StubUpstream {
    /// Responds 200 with the given JSON body to every request.
    pub async fn json_ok(body: &str) -> Self {
        Self::start(Some(http_response(200, body))).await
    }

    /// Responds with the given status and body to every request.
    pub async fn with_status(status: u16, body: &str) -> Self {
        Self::start(Some(http_response(status, body))).await
    }

    /// Reads each request but never responds, forcing client-side timeouts.
    pub async fn silent() -> Self {
        Self::start(None).await
    }

    /// Number of complete requests received so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    async fn start(response: Option<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let addr = listener.local_addr().expect("stub local addr");
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_clone = Arc::clone(&hits);
        tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    break;
                };
                let hits = Arc::clone(&hits_clone);
                let response = response.clone();
                tokio::spawn(handle_connection(socket, hits, response));
            }
        });

        Self {
            url: format!("http://{addr}/v1/chat/completions"),
            hits,
        }
    }
}

async fn handle_connection(
    mut socket: TcpStream,
    hits: Arc<AtomicUsize>,
    response: Option<String>,
) {
    let mut data = Vec::with_capacity(8192);
    let mut buf = [0u8; 4096];

    loop {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => {
                data.extend_from_slice(&buf[..n]);
                if request_complete(&data) {
                    break;
                }
            }
        }
    }

    hits.fetch_add(1, Ordering::SeqCst);

    match response {
        Some(resp) => {
            let _ = socket.write_all(resp.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
        // Hold the socket open without answering until the client gives up.
        None => tokio::time::sleep(Duration::from_secs(60)).await,
    }
}

/// A request is complete once the header block has arrived along with
/// `Content-Length` bytes of body.
fn request_complete(data: &[u8]) -> bool {
    let Some(header_end) = data
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|p| p + 4)
    else {
        return false;
    };

    let headers = String::from_utf8_lossy(&data[..header_end]);
    let content_length = headers
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())?
        })
        .unwrap_or(0);

    data.len() >= header_end + content_length
}

fn http_response(status: u16, body: &str) -> String {
    let reason = match status {
        200 => "OK",
        400 => "Bad Request",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    };
    format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}
