//! iPay deposit-payment vendor adapter.

mod client;
mod config;
mod signature;

pub use client::IpayClient;
pub use config::{DEFAULT_API_URL, IpayConfig};
pub use signature::{sign_fields, verify_fields};

use std::collections::BTreeMap;

use crate::BoxFuture;
use crate::error::ProviderResult;
use crate::payment::{PaymentIntent, PaymentProvider, PaymentRequest, PaymentStatus};

impl PaymentProvider for IpayClient {
    fn name(&self) -> &str {
        "ipay"
    }

    fn is_configured(&self) -> bool {
        self.config().has_credentials()
    }

    fn create_payment(
        &self,
        request: &PaymentRequest,
    ) -> BoxFuture<'_, ProviderResult<PaymentIntent>> {
        let request = request.clone();
        Box::pin(async move { self.create(&request).await })
    }

    fn payment_status(
        &self,
        transaction_id: &str,
    ) -> BoxFuture<'_, ProviderResult<PaymentStatus>> {
        let transaction_id = transaction_id.to_string();
        Box::pin(async move { self.status(&transaction_id).await })
    }

    fn refund(
        &self,
        transaction_id: &str,
        amount_minor: Option<i64>,
    ) -> BoxFuture<'_, ProviderResult<bool>> {
        let transaction_id = transaction_id.to_string();
        Box::pin(async move { self.refund_transaction(&transaction_id, amount_minor).await })
    }

    fn verify_signature(&self, fields: &BTreeMap<String, String>, signature: &str) -> bool {
        verify_fields(&self.config().secret_key, fields, signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_when_credentials_present() {
        let client = IpayClient::new(IpayConfig::new("m", "s")).unwrap();
        assert!(client.is_configured());
        assert_eq!(PaymentProvider::name(&client), "ipay");
    }

    #[test]
    fn unconfigured_when_credentials_blank() {
        let client = IpayClient::new(IpayConfig::new("", "")).unwrap();
        assert!(!client.is_configured());
    }

    #[test]
    fn trait_signature_verification_uses_config_secret() {
        let client = IpayClient::new(IpayConfig::new("m", "trait-secret")).unwrap();
        let fields: BTreeMap<String, String> =
            [("status".to_string(), "success".to_string())].into();
        let sig = sign_fields("trait-secret", &fields);
        assert!(client.verify_signature(&fields, &sig));
        assert!(!client.verify_signature(&fields, "WRONG"));
    }
}
