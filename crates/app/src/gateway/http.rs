//! HTTP order gateway.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use verdant::order::{OrderId, OrderRequest};

use super::{GatewayError, OrderGateway};

/// Header carrying the per-attempt idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Configuration for connecting to the order service.
#[derive(Clone)]
pub struct HttpGatewayConfig {
    /// Base URL of the order service, e.g. `"https://orders.internal"`.
    pub base_url: String,

    /// Bearer token, if the service requires one.
    pub token: Option<String>,
}

impl std::fmt::Debug for HttpGatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGatewayConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Posts orders as JSON to `{base_url}/orders`.
#[derive(Debug, Clone)]
pub struct HttpOrderGateway {
    config: HttpGatewayConfig,
    http: Client,
}

impl HttpOrderGateway {
    /// Create a new gateway from the given configuration.
    #[must_use]
    pub fn new(config: HttpGatewayConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    fn orders_url(&self) -> String {
        format!("{}/orders", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl OrderGateway for HttpOrderGateway {
    async fn submit(&self, request: &OrderRequest) -> Result<OrderId, GatewayError> {
        let url = self.orders_url();

        debug!(%url, idempotency_key = %request.idempotency_key, "posting order");

        let mut builder = self
            .http
            .post(&url)
            .header(IDEMPOTENCY_KEY_HEADER, request.idempotency_key.to_string())
            .json(request);

        if let Some(token) = &self.config.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();

            return Err(match serde_json::from_str::<ErrorResponse>(&text) {
                Ok(body) => GatewayError::Rejected {
                    status: status.as_u16(),
                    message: body.message,
                },
                Err(_) => GatewayError::UnexpectedResponse(format!(
                    "order request failed with status {status}: {text}"
                )),
            });
        }

        let parsed: OrderCreatedResponse = response.json().await?;

        Ok(parsed.order_id)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderCreatedResponse {
    order_id: OrderId,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}
