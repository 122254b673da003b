use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    BillingError, CheckoutRequest, CheckoutSession, PaymentGateway, Verification,
    VerificationStatus,
};

/// Client for a checkout-style gateway API: `POST /checkouts` opens a
/// transaction and `POST /checkouts/{id}/verify` reports its outcome.
pub struct HttpGateway {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpGateway {
    pub fn new(
        base_url: &str,
        api_key: &str,
        request_timeout_seconds: u64,
    ) -> Result<Self, BillingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(request_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[derive(Deserialize)]
struct CreateResponse {
    status: String,
    transaction_id: Option<String>,
    payment_url: Option<String>,
    token: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct VerifyResponse {
    status: String,
    payment_status: Option<String>,
}

#[async_trait]
impl PaymentGateway for HttpGateway {
    async fn create_transaction(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, BillingError> {
        let url = format!("{}/checkouts", self.base_url);

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?
            .error_for_status()?;

        let parsed: CreateResponse = response.json().await?;
        if parsed.status != "success" {
            let reason = parsed
                .error_message
                .unwrap_or_else(|| format!("gateway status {}", parsed.status));
            return Err(BillingError::Rejected(reason));
        }

        let session = CheckoutSession {
            transaction_id: parsed
                .transaction_id
                .ok_or_else(|| BillingError::InvalidResponse("missing transaction_id".into()))?,
            payment_url: parsed
                .payment_url
                .ok_or_else(|| BillingError::InvalidResponse("missing payment_url".into()))?,
            token: parsed
                .token
                .ok_or_else(|| BillingError::InvalidResponse("missing token".into()))?,
        };

        debug!(transaction_id = %session.transaction_id, "checkout transaction opened");
        Ok(session)
    }

    async fn verify_transaction(&self, transaction_id: &str) -> Result<Verification, BillingError> {
        let url = format!("{}/checkouts/{}/verify", self.base_url, transaction_id);

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .send()
            .await?
            .error_for_status()?;

        let parsed: VerifyResponse = response.json().await?;

        let status = if parsed.status == "success"
            && parsed.payment_status.as_deref() == Some("completed")
        {
            VerificationStatus::Completed
        } else {
            VerificationStatus::Failed
        };

        debug!(transaction_id, ?status, "checkout transaction verified");
        Ok(Verification { status })
    }
}
