//! Transaction broadcast through a walrus server
//!
//! A walrus server relays transaction sets to the network. The finished
//! transaction is posted as a one-element JSON array to `<server>/broadcast`.

use crate::core::Transaction;
use std::time::Duration;
use thiserror::Error;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Broadcast errors
#[derive(Error, Debug)]
pub enum BroadcastError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Server rejected transaction ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Client for a walrus server
#[derive(Debug, Clone)]
pub struct WalrusClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl WalrusClient {
    /// Create a client for the server at `base_url`
    pub fn new(base_url: &str) -> Result<Self, BroadcastError> {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    /// Full URL of an endpoint
    pub fn endpoint(&self, route: &str) -> String {
        let base = if self.base_url.contains("://") {
            self.base_url.clone()
        } else {
            format!("http://{}", self.base_url)
        };
        format!("{}{}", base, route)
    }

    /// Submit a transaction set
    pub async fn broadcast(&self, txns: &[Transaction]) -> Result<(), BroadcastError> {
        let url = self.endpoint("/broadcast");
        log::debug!("Posting {} transaction(s) to {}", txns.len(), url);

        let response = self.http_client.post(&url).json(txns).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            log::warn!("Broadcast rejected with status {}", status);
            return Err(BroadcastError::Rejected {
                status: status.as_u16(),
                message: message.trim().to_string(),
            });
        }

        log::info!("Broadcast {} transaction(s) via {}", txns.len(), self.base_url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Accept one HTTP request, answer with `reply`, and return the raw request
    async fn serve_once(listener: TcpListener, reply: &'static str) -> String {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        if name.eq_ignore_ascii_case("content-length") {
                            value.trim().parse::<usize>().ok()
                        } else {
                            None
                        }
                    })
                    .unwrap_or(0);
                if request.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        socket.write_all(reply.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        String::from_utf8(request).unwrap()
    }

    #[test]
    fn test_endpoint() {
        let client = WalrusClient::new("http://localhost:9380/").unwrap();
        assert_eq!(client.endpoint("/broadcast"), "http://localhost:9380/broadcast");
        let client = WalrusClient::new("localhost:9380").unwrap();
        assert_eq!(client.endpoint("/broadcast"), "http://localhost:9380/broadcast");
    }

    #[tokio::test]
    async fn test_broadcast_posts_transaction_set() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve_once(
            listener,
            "HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n",
        ));

        let client = WalrusClient::new(&format!("http://{}", addr)).unwrap();
        client.broadcast(&[Transaction::default()]).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /broadcast HTTP/1.1"));
        let body = request.split("\r\n\r\n").nth(1).unwrap();
        let sent: Vec<Transaction> = serde_json::from_str(body).unwrap();
        assert_eq!(sent, vec![Transaction::default()]);
    }

    #[tokio::test]
    async fn test_broadcast_rejected() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve_once(
            listener,
            "HTTP/1.1 400 Bad Request\r\nContent-Length: 12\r\nConnection: close\r\n\r\ndouble spend",
        ));

        let client = WalrusClient::new(&addr.to_string()).unwrap();
        let err = client.broadcast(&[Transaction::default()]).await.unwrap_err();
        server.await.unwrap();
        match err {
            BroadcastError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "double spend");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
