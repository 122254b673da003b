use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    BillingError, CheckoutRequest, CheckoutSession, PaymentGateway, Verification,
    VerificationStatus,
};

const SANDBOX_PAYMENT_URL: &str = "https://sandbox-api.iyzipay.com/payment/form";

/// Deterministic in-process gateway for development and tests. Every
/// checkout is approved and every verification reports completion.
#[derive(Debug, Default, Clone)]
pub struct SandboxGateway;

#[async_trait]
impl PaymentGateway for SandboxGateway {
    async fn create_transaction(
        &self,
        _request: &CheckoutRequest,
    ) -> Result<CheckoutSession, BillingError> {
        Ok(CheckoutSession {
            transaction_id: Uuid::new_v4().to_string(),
            payment_url: SANDBOX_PAYMENT_URL.to_string(),
            token: Uuid::new_v4().to_string(),
        })
    }

    async fn verify_transaction(
        &self,
        _transaction_id: &str,
    ) -> Result<Verification, BillingError> {
        Ok(Verification {
            status: VerificationStatus::Completed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BuyerInfo, CourseContext};

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            amount: 80.0,
            currency: "TRY".to_string(),
            buyer: BuyerInfo {
                id: 1,
                name: "Ayse Yilmaz".to_string(),
                email: "ayse@example.com".to_string(),
                phone: "+905551112233".to_string(),
                city: "Istanbul".to_string(),
                district: "Kadikoy".to_string(),
            },
            course: CourseContext {
                id: 7,
                title: "Baglama for Beginners".to_string(),
                price: 80.0,
            },
        }
    }

    #[tokio::test]
    async fn sandbox_issues_unique_transaction_ids() {
        let gateway = SandboxGateway;

        let first = gateway.create_transaction(&request()).await.unwrap();
        let second = gateway.create_transaction(&request()).await.unwrap();

        assert_ne!(first.transaction_id, second.transaction_id);
        assert!(!first.token.is_empty());
    }

    #[tokio::test]
    async fn sandbox_always_verifies_completed() {
        let gateway = SandboxGateway;

        let verification = gateway.verify_transaction("any-id").await.unwrap();
        assert!(verification.is_completed());
    }
}
