use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;

pub mod model;

pub use model::{Customer, LineItem, PaymentSession, SessionRequest};
use model::{Callbacks, SnapResponse, SnapTransaction, TransactionDetails};

const SNAP_SANDBOX_BASE: &str = "https://app.sandbox.midtrans.com/snap/";
const SNAP_PRODUCTION_BASE: &str = "https://app.midtrans.com/snap/";

/// Gateway failures. All of them are worth retrying from the visitor's side.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to reach payment gateway: {0}")]
    Transport(String),
    #[error("payment gateway error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("payment gateway returned no session token")]
    MissingToken,
    #[error("invalid payment gateway response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_session(&self, request: &SessionRequest)
        -> Result<PaymentSession, GatewayError>;
}

#[derive(Clone)]
pub struct SnapClient {
    http: Client,
    base_url: Url,
    server_key: String,
}

impl fmt::Debug for SnapClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SnapClient {
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let base = match &cfg.gateway.base_url {
            Some(url) => url.as_str(),
            None if cfg.gateway.is_production => SNAP_PRODUCTION_BASE,
            None => SNAP_SANDBOX_BASE,
        };
        let base_url = Url::parse(base).context("invalid gateway base URL")?;
        Self::with_base_url(
            cfg.gateway.server_key.clone(),
            base_url,
            Duration::from_secs(cfg.gateway.timeout_secs),
        )
    }

    pub fn with_base_url(
        server_key: String,
        base_url: Url,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent("lonergarden/0.1")
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url,
            server_key,
        })
    }

    pub fn build_request(&self, request: &SessionRequest) -> Result<reqwest::Request, GatewayError> {
        let endpoint = self
            .base_url
            .join("v1/transactions")
            .map_err(|e| GatewayError::Transport(format!("invalid gateway URL: {e}")))?;
        self.http
            .post(endpoint)
            .basic_auth(&self.server_key, Some(""))
            .header("Accept", "application/json")
            .json(&build_transaction(request))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))
    }
}

#[async_trait]
impl PaymentGateway for SnapClient {
    async fn create_session(
        &self,
        request: &SessionRequest,
    ) -> Result<PaymentSession, GatewayError> {
        let http_request = self.build_request(request)?;
        info!(url = %http_request.url(), order_id = %request.order_id, "creating payment session");

        let res = self
            .http
            .execute(http_request)
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        debug!(%status, body = %body, "payment gateway response");

        if !status.is_success() {
            warn!(%status, order_id = %request.order_id, "payment gateway rejected session");
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }

        parse_session(&body)
    }
}

/// Snap transaction body for a session request.
pub fn build_transaction(request: &SessionRequest) -> SnapTransaction<'_> {
    SnapTransaction {
        transaction_details: TransactionDetails {
            order_id: &request.order_id,
            gross_amount: request.gross_amount,
        },
        customer_details: &request.customer,
        item_details: [&request.item],
        custom_field1: format!("Arrival: {}", request.arrival),
        custom_field2: format!("Departure: {}", request.departure),
        custom_field3: format!(
            "Notes: {}",
            request
                .notes
                .as_deref()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or("-")
        ),
        callbacks: Callbacks {
            finish: &request.finish_url,
        },
    }
}

fn parse_session(body: &str) -> Result<PaymentSession, GatewayError> {
    let payload: SnapResponse = serde_json::from_str(body)
        .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
    match payload.token.filter(|t| !t.is_empty()) {
        Some(token) => Ok(PaymentSession {
            token,
            redirect_url: payload.redirect_url,
        }),
        None if !payload.error_messages.is_empty() => Err(GatewayError::InvalidResponse(
            payload.error_messages.join("; "),
        )),
        None => Err(GatewayError::MissingToken),
    }
}
