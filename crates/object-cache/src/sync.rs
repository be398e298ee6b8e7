use crate::error::Result;
use async_trait::async_trait;
use grepplus_protocol::{CodeLine, DeleteRequest, StatusResponse, UpdateRequest};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

/// Default base URL of the indexing service.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8002";

/// A hung remote must not stall event processing forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of one best-effort notification. Local cache state is never
/// rolled back on failure; callers log and move on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    Failed(String),
}

impl Delivery {
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Push side of the remote indexing protocol.
///
/// Both calls are single-shot, synchronous within the event handler, and
/// non-retrying: local indexing must never block or fail because the
/// remote service is down.
#[async_trait]
pub trait SyncClient: Send + Sync {
    /// `POST /update` with the file's tokenized lines.
    async fn notify_updated(&self, dir: &Path, path: &Path, lines: Vec<CodeLine>) -> Delivery;

    /// `POST /delete` for a file that left the index.
    async fn notify_deleted(&self, dir: &Path, path: &Path) -> Delivery;
}

/// HTTP implementation of [`SyncClient`].
pub struct HttpSyncClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpSyncClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.into(),
            http,
        })
    }

    async fn post<T: Serialize + Sync>(&self, endpoint: &str, body: &T) -> Delivery {
        let url = format!("{}/{endpoint}", self.base_url.trim_end_matches('/'));
        let response = match self.http.post(&url).json(body).send().await {
            Ok(response) => response,
            Err(e) => return Delivery::Failed(format!("request error: {e}")),
        };

        let status = response.status();
        if !status.is_success() {
            return Delivery::Failed(format!("server answered {status}"));
        }

        // Tolerate a missing or unexpected body on 200; only an explicit
        // non-success status field counts as a failure.
        match response.json::<StatusResponse>().await {
            Ok(body) if !body.is_success() => {
                Delivery::Failed(format!("server status: {}", body.status))
            }
            _ => Delivery::Delivered,
        }
    }
}

#[async_trait]
impl SyncClient for HttpSyncClient {
    async fn notify_updated(&self, dir: &Path, path: &Path, lines: Vec<CodeLine>) -> Delivery {
        let request = UpdateRequest {
            dir: dir.to_string_lossy().to_string(),
            path: path.to_string_lossy().to_string(),
            lines,
        };
        self.post("update", &request).await
    }

    async fn notify_deleted(&self, dir: &Path, path: &Path) -> Delivery {
        let request = DeleteRequest {
            dir: dir.to_string_lossy().to_string(),
            path: path.to_string_lossy().to_string(),
        };
        self.post("delete", &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_predicate() {
        assert!(Delivery::Delivered.is_delivered());
        assert!(!Delivery::Failed("connection refused".to_string()).is_delivered());
    }

    #[tokio::test]
    async fn unreachable_server_fails_without_error() {
        // port 1 is closed on loopback; the connect fails fast
        let client = HttpSyncClient::new("http://127.0.0.1:1").unwrap();
        let outcome = client
            .notify_deleted(Path::new("/project"), Path::new("/project/a.py"))
            .await;
        assert!(!outcome.is_delivered());
    }
}
