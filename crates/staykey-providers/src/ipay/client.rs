//! HTTP client for the iPay merchant API.
//!
//! Requests are form-encoded with a detached HMAC signature field; business
//! failures come back as `status != "success"` in a 200 response. Amounts
//! are minor units on the wire.

use std::collections::BTreeMap;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::error::{ProviderError, ProviderResult};
use crate::payment::{PaymentIntent, PaymentRequest, PaymentState, PaymentStatus};

use super::config::IpayConfig;
use super::signature::{sign_fields, verify_fields};

#[derive(Debug, Deserialize)]
struct CreateResponse {
    status: String,
    message: Option<String>,
    transaction_id: Option<String>,
    payment_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    transaction_id: String,
    order_id: String,
    amount: i64,
    currency: String,
    status: String,
    result_code: Option<String>,
    result_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefundResponse {
    status: String,
}

/// Client for the iPay merchant API.
pub struct IpayClient {
    http: Client,
    config: IpayConfig,
}

impl IpayClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: IpayConfig) -> ProviderResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ProviderError::internal(format!("failed to create HTTP client: {e}"))
                    .with_vendor("ipay")
            })?;
        Ok(Self { http, config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &IpayConfig {
        &self.config
    }

    pub(super) async fn create(&self, request: &PaymentRequest) -> ProviderResult<PaymentIntent> {
        let mut fields = BTreeMap::new();
        fields.insert("merchant_id".to_string(), self.config.merchant_id.clone());
        fields.insert("order_id".to_string(), request.order_id.clone());
        fields.insert("amount".to_string(), request.amount_minor.to_string());
        fields.insert("currency".to_string(), request.currency.clone());
        fields.insert("description".to_string(), request.description.clone());
        fields.insert("language".to_string(), request.language.clone());
        if let Some(ref callback) = self.config.callback_url {
            fields.insert("callback_url".to_string(), callback.clone());
        }
        fields.insert("preauth".to_string(), "0".to_string());

        let body: CreateResponse = self.post_signed("/order/create", fields).await?;
        if body.status != "success" {
            let message = body
                .message
                .unwrap_or_else(|| "payment creation failed".to_string());
            return Err(ProviderError::vendor(message).with_vendor("ipay"));
        }

        match (body.transaction_id, body.payment_url) {
            (Some(transaction_id), Some(payment_url)) => {
                debug!(transaction_id = %transaction_id, "payment opened");
                Ok(PaymentIntent {
                    transaction_id,
                    payment_url,
                })
            }
            _ => Err(ProviderError::invalid_response(
                "success response missing transaction_id or payment_url",
            )
            .with_vendor("ipay")),
        }
    }

    pub(super) async fn status(&self, transaction_id: &str) -> ProviderResult<PaymentStatus> {
        let mut fields = BTreeMap::new();
        fields.insert("merchant_id".to_string(), self.config.merchant_id.clone());
        fields.insert("transaction_id".to_string(), transaction_id.to_string());

        let body: StatusResponse = self.post_signed("/order/status", fields).await?;
        Ok(PaymentStatus {
            transaction_id: body.transaction_id,
            order_id: body.order_id,
            amount_minor: body.amount,
            currency: body.currency,
            state: map_state(&body.status),
            result_code: body.result_code,
            result_message: body.result_message,
        })
    }

    pub(super) async fn refund_transaction(
        &self,
        transaction_id: &str,
        amount_minor: Option<i64>,
    ) -> ProviderResult<bool> {
        let mut fields = BTreeMap::new();
        fields.insert("merchant_id".to_string(), self.config.merchant_id.clone());
        fields.insert("transaction_id".to_string(), transaction_id.to_string());
        if let Some(amount) = amount_minor {
            fields.insert("amount".to_string(), amount.to_string());
        }

        let body: RefundResponse = self.post_signed("/order/refund", fields).await?;
        Ok(body.status == "success")
    }

    /// Verifies and decodes a vendor callback.
    ///
    /// The `signature` field is removed from the payload before verification,
    /// matching how the vendor signs it. An invalid or missing signature is
    /// an authentication failure; nothing of the payload is trusted before
    /// that check passes.
    pub fn process_callback(
        &self,
        mut fields: BTreeMap<String, String>,
    ) -> ProviderResult<PaymentStatus> {
        let signature = fields.remove("signature").ok_or_else(|| {
            ProviderError::bad_request("callback is missing the signature field")
                .with_vendor("ipay")
        })?;

        if !verify_fields(&self.config.secret_key, &fields, &signature) {
            return Err(
                ProviderError::authentication("callback signature does not verify")
                    .with_vendor("ipay"),
            );
        }

        let take = |key: &str| {
            fields.get(key).cloned().ok_or_else(|| {
                ProviderError::invalid_response(format!("callback is missing {key}"))
                    .with_vendor("ipay")
            })
        };

        let amount_minor = take("amount")?.parse::<i64>().map_err(|_| {
            ProviderError::invalid_response("callback amount is not an integer").with_vendor("ipay")
        })?;

        Ok(PaymentStatus {
            transaction_id: take("transaction_id")?,
            order_id: take("order_id")?,
            amount_minor,
            currency: take("currency")?,
            state: map_state(&take("status")?),
            result_code: fields.get("result_code").cloned(),
            result_message: fields.get("result_message").cloned(),
        })
    }

    async fn post_signed<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        mut fields: BTreeMap<String, String>,
    ) -> ProviderResult<T> {
        let signature = sign_fields(&self.config.secret_key, &fields);
        fields.insert("signature".to_string(), signature);

        let url = format!("{}{}", self.config.api_url, path);
        trace!(url = %url, "ipay POST");

        let response = self
            .http
            .post(&url)
            .form(&fields)
            .send()
            .await
            .map_err(|e| {
                let message = if e.is_timeout() {
                    format!("request timed out: {e}")
                } else {
                    format!("request failed: {e}")
                };
                ProviderError::network(message).with_vendor("ipay")
            })?;

        let status = response.status();
        if status.is_server_error() {
            return Err(ProviderError::server(format!("vendor returned {status}"))
                .with_vendor("ipay"));
        }
        if !status.is_success() {
            return Err(
                ProviderError::invalid_response(format!("unexpected status {status}"))
                    .with_vendor("ipay"),
            );
        }

        response.json::<T>().await.map_err(|e| {
            ProviderError::invalid_response(format!("failed to decode response: {e}"))
                .with_vendor("ipay")
        })
    }
}

/// Maps a vendor status string onto [`PaymentState`].
pub(super) fn map_state(vendor_status: &str) -> PaymentState {
    match vendor_status.to_ascii_lowercase().as_str() {
        "success" | "completed" => PaymentState::Success,
        "failed" | "declined" | "error" => PaymentState::Failed,
        "refunded" => PaymentState::Refunded,
        _ => PaymentState::Pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> IpayClient {
        IpayClient::new(IpayConfig::new("merchant-1", "merchant-secret")).unwrap()
    }

    fn callback_fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn state_mapping() {
        assert_eq!(map_state("success"), PaymentState::Success);
        assert_eq!(map_state("COMPLETED"), PaymentState::Success);
        assert_eq!(map_state("declined"), PaymentState::Failed);
        assert_eq!(map_state("refunded"), PaymentState::Refunded);
        assert_eq!(map_state("created"), PaymentState::Pending);
        assert_eq!(map_state(""), PaymentState::Pending);
    }

    #[test]
    fn callback_roundtrip() {
        let client = client();
        let mut fields = callback_fields(&[
            ("transaction_id", "tx-42"),
            ("order_id", "DEP-9"),
            ("amount", "15000"),
            ("currency", "GEL"),
            ("status", "success"),
            ("result_code", "0"),
        ]);
        let signature = sign_fields("merchant-secret", &fields);
        fields.insert("signature".to_string(), signature);

        let status = client.process_callback(fields).unwrap();
        assert_eq!(status.transaction_id, "tx-42");
        assert_eq!(status.amount_minor, 15_000);
        assert_eq!(status.state, PaymentState::Success);
        assert_eq!(status.result_code.as_deref(), Some("0"));
    }

    #[test]
    fn callback_with_bad_signature_is_rejected() {
        let client = client();
        let mut fields = callback_fields(&[
            ("transaction_id", "tx-42"),
            ("order_id", "DEP-9"),
            ("amount", "15000"),
            ("currency", "GEL"),
            ("status", "success"),
        ]);
        fields.insert("signature".to_string(), "F00D".repeat(16));

        let err = client.process_callback(fields).unwrap_err();
        assert_eq!(
            err.code(),
            crate::ProviderErrorCode::AuthenticationFailed
        );
    }

    #[test]
    fn callback_without_signature_is_rejected() {
        let client = client();
        let fields = callback_fields(&[("transaction_id", "tx-42")]);
        let err = client.process_callback(fields).unwrap_err();
        assert_eq!(err.code(), crate::ProviderErrorCode::BadRequest);
    }

    #[test]
    fn tampered_callback_amount_is_rejected() {
        let client = client();
        let mut fields = callback_fields(&[
            ("transaction_id", "tx-42"),
            ("order_id", "DEP-9"),
            ("amount", "15000"),
            ("currency", "GEL"),
            ("status", "success"),
        ]);
        let signature = sign_fields("merchant-secret", &fields);
        fields.insert("signature".to_string(), signature);
        fields.insert("amount".to_string(), "1".to_string());

        assert!(client.process_callback(fields).is_err());
    }

    #[test]
    fn response_decoding() {
        let body: CreateResponse = serde_json::from_str(
            r#"{"status":"success","transaction_id":"tx-1","payment_url":"https://ipay.ge/pay/tx-1"}"#,
        )
        .unwrap();
        assert_eq!(body.status, "success");
        assert_eq!(body.transaction_id.as_deref(), Some("tx-1"));

        let failure: CreateResponse =
            serde_json::from_str(r#"{"status":"error","message":"bad merchant"}"#).unwrap();
        assert_eq!(failure.status, "error");
        assert!(failure.payment_url.is_none());
    }
}
