//! Order submission gateway.
//!
//! The external boundary that persists a finalized order and hands back its
//! identifier. Checkout only ever talks to it through [`OrderGateway`].

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

use verdant::order::{OrderId, OrderRequest};

mod http;

pub use http::{HttpGatewayConfig, HttpOrderGateway, IDEMPOTENCY_KEY_HEADER};

/// Errors raised by an order gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway refused the order.
    #[error("order rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status code
        status: u16,

        /// Reason given by the gateway
        message: String,
    },

    /// The gateway returned a non-2xx response or unexpected body.
    #[error("unexpected response from order gateway: {0}")]
    UnexpectedResponse(String),
}

/// Persists finalized orders.
#[automock]
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Persist `request` and return the identifier assigned to the order.
    async fn submit(&self, request: &OrderRequest) -> Result<OrderId, GatewayError>;
}
