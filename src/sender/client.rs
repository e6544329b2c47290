use super::remote::{RemoteSender, SendError};
use crate::domain::RemoteEvent;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, ClientBuilder};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    pub timeout: Duration,
    pub connection_timeout: Duration,
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            timeout: Duration::from_secs(10),
            connection_timeout: Duration::from_secs(5),
            user_agent: format!("rask-log-fanout/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SenderStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub average_response_time: Duration,
}

#[derive(Debug)]
pub struct ClientStats {
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
    total_response_time: AtomicU64,
}

impl ClientStats {
    fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            successful_requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            total_response_time: AtomicU64::new(0),
        }
    }

    pub fn record_request(&self, success: bool, response_time: Duration) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_response_time
            .fetch_add(response_time.as_millis() as u64, Ordering::Relaxed);

        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Posts each event as a JSON document to the configured endpoint.
///
/// Any 2xx response counts as acceptance. Other statuses, transport errors
/// and timeouts are reported as failures for the retry queue to handle.
#[derive(Debug, Clone)]
pub struct HttpEventSender {
    client: Client,
    config: ClientConfig,
    endpoint_url: Url,
    stats: Arc<ClientStats>,
}

impl HttpEventSender {
    pub fn new(config: ClientConfig) -> Result<Self, SendError> {
        let endpoint_url: Url = config
            .endpoint
            .parse()
            .map_err(|e| SendError::InvalidConfiguration(format!("Invalid endpoint URL: {e}")))?;

        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .connect_timeout(config.connection_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                SendError::InvalidConfiguration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            config,
            endpoint_url,
            stats: Arc::new(ClientStats::new()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    pub fn stats(&self) -> SenderStats {
        let total_requests = self.stats.total_requests.load(Ordering::Relaxed);
        let total_response_time = self.stats.total_response_time.load(Ordering::Relaxed);

        let average_response_time = if total_requests > 0 {
            Duration::from_millis(total_response_time / total_requests)
        } else {
            Duration::ZERO
        };

        SenderStats {
            total_requests,
            successful_requests: self.stats.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.stats.failed_requests.load(Ordering::Relaxed),
            average_response_time,
        }
    }

    async fn post_event(&self, event: &RemoteEvent) -> Result<(), SendError> {
        let body = serde_json::to_vec(event)?;
        let start = Instant::now();

        let result = self
            .client
            .post(self.endpoint_url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                self.stats.record_request(false, start.elapsed());
                return Err(SendError::NetworkError(e));
            }
        };

        let status = response.status();
        self.stats.record_request(status.is_success(), start.elapsed());

        if status.is_success() {
            debug!("Delivered event {} (HTTP {})", event.event_id, status.as_u16());
            Ok(())
        } else {
            Err(SendError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}

impl RemoteSender for HttpEventSender {
    async fn send(&self, event: &RemoteEvent) -> Result<(), SendError> {
        self.post_event(event).await
    }
}
