//! Checkout gateway integration.
//!
//! The service core talks to an external payment provider through the
//! [`PaymentGateway`] trait: one call to open a checkout transaction and one
//! call to verify its outcome. Two implementations exist, a reqwest-backed
//! HTTP client for a live gateway and an in-process sandbox that approves
//! everything, selected from configuration at startup.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use campus_config::BillingConfig;

mod http;
mod sandbox;

pub use http::HttpGateway;
pub use sandbox::SandboxGateway;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("gateway rejected the transaction: {0}")]
    Rejected(String),
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("gateway returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// Buyer details forwarded to the gateway when opening a checkout.
#[derive(Debug, Clone, Serialize)]
pub struct BuyerInfo {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub district: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseContext {
    pub id: i64,
    pub title: String,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutRequest {
    pub amount: f64,
    pub currency: String,
    pub buyer: BuyerInfo,
    pub course: CourseContext,
}

/// An open transaction at the gateway. The token and payment URL are opaque
/// hand-offs for the client to complete the checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub transaction_id: String,
    pub payment_url: String,
    pub token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStatus {
    Completed,
    Failed,
}

/// The gateway's answer to a verification call. `Failed` means the gateway
/// responded and declined; transport problems surface as [`BillingError`].
#[derive(Debug, Clone)]
pub struct Verification {
    pub status: VerificationStatus,
}

impl Verification {
    pub fn is_completed(&self) -> bool {
        self.status == VerificationStatus::Completed
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_transaction(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, BillingError>;

    async fn verify_transaction(&self, transaction_id: &str) -> Result<Verification, BillingError>;
}

/// Build the gateway described by the configuration. A live HTTP gateway
/// needs both a base URL and an API key; anything less falls back to the
/// sandbox.
pub fn from_config(config: &BillingConfig) -> Result<Arc<dyn PaymentGateway>, BillingError> {
    match (config.base_url.as_deref(), config.api_key.as_deref()) {
        (Some(base_url), Some(api_key)) => {
            let gateway = HttpGateway::new(base_url, api_key, config.request_timeout_seconds)?;
            info!(base_url, "checkout gateway ready");
            Ok(Arc::new(gateway))
        }
        _ => {
            info!("no gateway credentials configured, using sandbox gateway");
            Ok(Arc::new(SandboxGateway::default()))
        }
    }
}
