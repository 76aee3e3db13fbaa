//! # Remote Order Service
//!
//! Client side of the remote order service: reads an order by id and
//! creates draft orders.
//!
//! ## Endpoints
//! ```text
//! GET  {base_url}/orders/{id}     → RemoteOrder
//! POST {base_url}/orders/draft    ← CreateDraftRequest
//!                                 → CreateDraftResponse { id }
//! ```
//!
//! Timeouts and retries belong here, not in the order engine. The
//! synchronizer logs every failure and carries on.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::{RemoteSettings, SyncConfig};
use crate::error::{SyncError, SyncResult};
use tavola_core::{CreateDraftRequest, CreateDraftResponse, OrderId, RemoteOrder};

/// Header carrying the terminal id on every request.
pub const TERMINAL_ID_HEADER: &str = "x-terminal-id";

/// Operations the synchronizer needs from the remote order service.
#[async_trait]
pub trait RemoteOrderService: Send + Sync {
    /// Reads a persisted order.
    async fn fetch_order(&self, order_id: &OrderId) -> SyncResult<RemoteOrder>;

    /// Creates a draft order; the response carries its durable id.
    async fn create_draft(&self, request: &CreateDraftRequest) -> SyncResult<CreateDraftResponse>;
}

// =============================================================================
// HTTP
// =============================================================================

/// reqwest-backed order service client.
#[derive(Debug, Clone)]
pub struct HttpOrderService {
    client: Client,
    base_url: Url,
    token: Option<String>,
    terminal_id: Option<String>,
}

impl HttpOrderService {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> SyncResult<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(SyncError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            token,
            terminal_id: None,
        })
    }

    /// Builds the client from config; `None` when no base URL is set.
    pub fn from_config(config: &SyncConfig) -> SyncResult<Option<Self>> {
        let RemoteSettings { base_url, token, .. } = &config.remote;
        match base_url {
            Some(url) => Ok(Some(
                Self::new(url, token.clone(), config.remote.timeout())?
                    .with_terminal_id(config.terminal_id()),
            )),
            None => Ok(None),
        }
    }

    pub fn with_terminal_id(mut self, terminal_id: impl Into<String>) -> Self {
        self.terminal_id = Some(terminal_id.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base_url}/{segments...}`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> SyncResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SyncError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, mut req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        if let Some(terminal_id) = &self.terminal_id {
            req = req.header(TERMINAL_ID_HEADER, terminal_id);
        }
        req
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        what: &str,
    ) -> SyncResult<T> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SyncError::Unauthorized,
                StatusCode::NOT_FOUND => SyncError::NotFound(what.to_string()),
                _ => SyncError::Rejected {
                    status: status.as_u16(),
                    message: text,
                },
            });
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| SyncError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl RemoteOrderService for HttpOrderService {
    async fn fetch_order(&self, order_id: &OrderId) -> SyncResult<RemoteOrder> {
        let url = self.endpoint(&["orders", order_id.as_str()])?;
        debug!(order_id = %order_id, %url, "Fetching remote order");

        let response = self.authorize(self.client.get(url)).send().await?;
        self.handle_response(response, order_id.as_str()).await
    }

    async fn create_draft(&self, request: &CreateDraftRequest) -> SyncResult<CreateDraftResponse> {
        let url = self.endpoint(&["orders", "draft"])?;
        debug!(items = request.items.len(), %url, "Creating remote draft");

        let response = self
            .authorize(self.client.post(url).json(request))
            .send()
            .await?;
        self.handle_response(response, "draft").await
    }
}

// =============================================================================
// Offline
// =============================================================================

/// Stand-in used when no remote URL is configured: every call fails with
/// [`SyncError::RemoteDisabled`], so drafts stay under their local keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineOrderService;

#[async_trait]
impl RemoteOrderService for OfflineOrderService {
    async fn fetch_order(&self, _order_id: &OrderId) -> SyncResult<RemoteOrder> {
        Err(SyncError::RemoteDisabled)
    }

    async fn create_draft(&self, _request: &CreateDraftRequest) -> SyncResult<CreateDraftResponse> {
        Err(SyncError::RemoteDisabled)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn service(base: &str) -> HttpOrderService {
        HttpOrderService::new(base, None, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let svc = service("https://orders.example.com/api");
        assert_eq!(
            svc.endpoint(&["orders", "1842"]).unwrap().as_str(),
            "https://orders.example.com/api/orders/1842"
        );
    }

    #[test]
    fn test_endpoint_ignores_trailing_slash() {
        let svc = service("https://orders.example.com/api/");
        assert_eq!(
            svc.endpoint(&["orders", "draft"]).unwrap().as_str(),
            "https://orders.example.com/api/orders/draft"
        );
    }

    #[test]
    fn test_endpoint_escapes_order_id() {
        let svc = service("http://10.0.0.5:8080");
        let url = svc.endpoint(&["orders", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.5:8080/orders/a%2Fb%20c");
    }

    #[test]
    fn test_rejects_non_base_url() {
        let err = HttpOrderService::new("mailto:orders@example.com", None, Duration::from_secs(5))
            .unwrap_err();
        assert!(matches!(err, SyncError::InvalidUrl(_)));
    }

    #[test]
    fn test_from_config() {
        let mut config = SyncConfig::default();
        assert!(HttpOrderService::from_config(&config).unwrap().is_none());

        config.remote.base_url = Some("https://orders.example.com".into());
        let svc = HttpOrderService::from_config(&config).unwrap().unwrap();
        assert_eq!(svc.base_url().host_str(), Some("orders.example.com"));
        assert_eq!(svc.terminal_id.as_deref(), Some(config.terminal_id()));
    }

    #[tokio::test]
    async fn test_offline_service_always_fails() {
        let svc = OfflineOrderService;
        let err = svc.fetch_order(&OrderId::parse("1")).await.unwrap_err();
        assert!(matches!(err, SyncError::RemoteDisabled));
        assert!(!err.is_retryable());
    }
}
