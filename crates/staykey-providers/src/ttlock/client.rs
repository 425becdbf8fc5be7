//! HTTP client for the TTLock cloud API.
//!
//! The vendor API takes every argument as a query parameter, even on POST,
//! and reports business failures inside a 200 response through an `errcode`
//! envelope. Epoch milliseconds everywhere.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, trace};
use url::Url;

use crate::error::{ProviderError, ProviderResult};
use crate::lock::{LockHealth, PasscodeSpec};

use super::config::TtlockConfig;

/// Tokens returned by the vendor's OAuth endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct TtlockTokens {
    /// Bearer token for API calls, stored per owner.
    pub access_token: String,
    /// Token used to refresh the access token.
    pub refresh_token: String,
    /// Access-token lifetime in seconds.
    pub expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddPasscodeResponse {
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
    keyboard_pwd_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LockDetailResponse {
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
    electric_quantity: Option<i64>,
    #[serde(default)]
    has_gateway: i64,
}

/// Client for the TTLock cloud API.
pub struct TtlockClient {
    http: Client,
    config: TtlockConfig,
}

impl TtlockClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: TtlockConfig) -> ProviderResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ProviderError::internal(format!("failed to create HTTP client: {e}"))
                    .with_vendor("ttlock")
            })?;
        Ok(Self { http, config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &TtlockConfig {
        &self.config
    }

    /// Returns the vendor authorization URL for the owner OAuth flow.
    pub fn authorize_url(&self, state: &str) -> ProviderResult<String> {
        let redirect_uri = self.redirect_uri()?;
        let mut url = Url::parse(&self.config.api_url).map_err(|e| {
            ProviderError::configuration(format!("invalid API URL: {e}")).with_vendor("ttlock")
        })?;
        url.set_path("/oauth2/authorize");
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("state", state);
        Ok(url.to_string())
    }

    /// Exchanges an authorization code for owner tokens.
    pub async fn exchange_code(&self, code: &str) -> ProviderResult<TtlockTokens> {
        let redirect_uri = self.redirect_uri()?.to_string();
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri.as_str()),
        ];
        self.post_json("/oauth2/token", &params).await
    }

    /// Refreshes owner tokens.
    pub async fn refresh_tokens(&self, refresh_token: &str) -> ProviderResult<TtlockTokens> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];
        self.post_json("/oauth2/token", &params).await
    }

    pub(super) async fn add_passcode(
        &self,
        access_token: &str,
        lock_id: &str,
        spec: &PasscodeSpec,
    ) -> ProviderResult<String> {
        let params = [
            ("clientId", self.config.client_id.clone()),
            ("accessToken", access_token.to_string()),
            ("lockId", lock_id.to_string()),
            ("keyboardPwd", spec.code.clone()),
            ("keyboardPwdName", spec.label.clone()),
            ("startDate", millis(spec.valid_from)),
            ("endDate", millis(spec.valid_until)),
            // addType 2: a caller-chosen passcode rather than a generated one
            ("addType", "2".to_string()),
            ("date", millis(Utc::now())),
        ];

        let body: AddPasscodeResponse = self.post_json("/v3/keyboardPwd/add", &params).await?;
        if body.errcode != 0 {
            return Err(vendor_error("passcode creation", body.errcode, &body.errmsg));
        }
        body.keyboard_pwd_id
            .map(|id| id.to_string())
            .ok_or_else(|| {
                ProviderError::invalid_response("response missing keyboardPwdId")
                    .with_vendor("ttlock")
            })
    }

    pub(super) async fn remove_passcode(
        &self,
        access_token: &str,
        lock_id: &str,
        passcode_id: &str,
    ) -> ProviderResult<()> {
        let params = [
            ("clientId", self.config.client_id.clone()),
            ("accessToken", access_token.to_string()),
            ("lockId", lock_id.to_string()),
            ("keyboardPwdId", passcode_id.to_string()),
            // deleteType 2: delete via gateway
            ("deleteType", "2".to_string()),
            ("date", millis(Utc::now())),
        ];

        let body: Envelope = self.post_json("/v3/keyboardPwd/delete", &params).await?;
        if body.errcode != 0 {
            return Err(vendor_error("passcode deletion", body.errcode, &body.errmsg));
        }
        Ok(())
    }

    pub(super) async fn remote_unlock(
        &self,
        access_token: &str,
        lock_id: &str,
    ) -> ProviderResult<()> {
        let params = [
            ("clientId", self.config.client_id.clone()),
            ("accessToken", access_token.to_string()),
            ("lockId", lock_id.to_string()),
            ("date", millis(Utc::now())),
        ];

        let body: Envelope = self.post_json("/v3/lock/unlock", &params).await?;
        if body.errcode != 0 {
            return Err(vendor_error("remote unlock", body.errcode, &body.errmsg));
        }
        debug!(lock_id = %lock_id, "remote unlock accepted");
        Ok(())
    }

    pub(super) async fn detail(
        &self,
        access_token: &str,
        lock_id: &str,
    ) -> ProviderResult<LockHealth> {
        let params = [
            ("clientId", self.config.client_id.clone()),
            ("accessToken", access_token.to_string()),
            ("lockId", lock_id.to_string()),
            ("date", millis(Utc::now())),
        ];

        let body: LockDetailResponse = self.get_json("/v3/lock/detail", &params).await?;
        if body.errcode != 0 {
            return Err(vendor_error("lock detail", body.errcode, &body.errmsg));
        }
        Ok(LockHealth {
            battery_percent: body.electric_quantity.unwrap_or(0),
            has_gateway: body.has_gateway != 0,
        })
    }

    fn redirect_uri(&self) -> ProviderResult<&str> {
        self.config.redirect_uri.as_deref().ok_or_else(|| {
            ProviderError::configuration("redirect URI is required for the OAuth flow")
                .with_vendor("ttlock")
        })
    }

    async fn post_json<T, P>(&self, path: &str, params: &P) -> ProviderResult<T>
    where
        T: serde::de::DeserializeOwned,
        P: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.config.api_url, path);
        trace!(url = %url, "ttlock POST");
        let response = self
            .http
            .post(&url)
            .query(params)
            .send()
            .await
            .map_err(map_send_error)?;
        decode_response(response).await
    }

    async fn get_json<T, P>(&self, path: &str, params: &P) -> ProviderResult<T>
    where
        T: serde::de::DeserializeOwned,
        P: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.config.api_url, path);
        trace!(url = %url, "ttlock GET");
        let response = self
            .http
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(map_send_error)?;
        decode_response(response).await
    }
}

fn millis(dt: DateTime<Utc>) -> String {
    dt.timestamp_millis().to_string()
}

fn vendor_error(operation: &str, errcode: i64, errmsg: &str) -> ProviderError {
    ProviderError::vendor(format!("{operation} failed: errcode {errcode} ({errmsg})"))
        .with_vendor("ttlock")
}

fn map_send_error(e: reqwest::Error) -> ProviderError {
    let message = if e.is_timeout() {
        format!("request timed out: {e}")
    } else {
        format!("request failed: {e}")
    };
    ProviderError::network(message).with_vendor("ttlock")
}

async fn decode_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> ProviderResult<T> {
    let status = response.status();
    if status.is_server_error() {
        return Err(ProviderError::server(format!("vendor returned {status}"))
            .with_vendor("ttlock"));
    }
    if !status.is_success() {
        return Err(
            ProviderError::invalid_response(format!("unexpected status {status}"))
                .with_vendor("ttlock"),
        );
    }
    response.json::<T>().await.map_err(|e| {
        ProviderError::invalid_response(format!("failed to decode response: {e}"))
            .with_vendor("ttlock")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> TtlockClient {
        TtlockClient::new(
            TtlockConfig::new("client-1", "secret-1")
                .with_redirect_uri("https://app.example.com/locks/callback"),
        )
        .unwrap()
    }

    #[test]
    fn authorize_url_carries_oauth_params() {
        let url = client().authorize_url("state-xyz").unwrap();
        assert!(url.starts_with("https://euapi.ttlock.com/oauth2/authorize?"));
        assert!(url.contains("client_id=client-1"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("state=state-xyz"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fapp.example.com%2Flocks%2Fcallback"));
    }

    #[test]
    fn authorize_url_requires_redirect_uri() {
        let client = TtlockClient::new(TtlockConfig::new("id", "secret")).unwrap();
        let err = client.authorize_url("s").unwrap_err();
        assert_eq!(err.code(), crate::ProviderErrorCode::ConfigurationError);
    }

    #[test]
    fn envelope_decoding() {
        let body: AddPasscodeResponse =
            serde_json::from_str(r#"{"errcode":0,"errmsg":"","keyboardPwdId":991}"#).unwrap();
        assert_eq!(body.errcode, 0);
        assert_eq!(body.keyboard_pwd_id, Some(991));

        let failure: AddPasscodeResponse =
            serde_json::from_str(r#"{"errcode":10003,"errmsg":"invalid token"}"#).unwrap();
        assert_eq!(failure.errcode, 10003);
        assert!(failure.keyboard_pwd_id.is_none());
    }

    #[test]
    fn lock_detail_decoding() {
        let body: LockDetailResponse = serde_json::from_str(
            r#"{"errcode":0,"errmsg":"","electricQuantity":84,"hasGateway":1}"#,
        )
        .unwrap();
        assert_eq!(body.electric_quantity, Some(84));
        assert_eq!(body.has_gateway, 1);
    }

    #[test]
    fn tokens_decoding() {
        let tokens: TtlockTokens = serde_json::from_str(
            r#"{"access_token":"at","refresh_token":"rt","expires_in":7776000}"#,
        )
        .unwrap();
        assert_eq!(tokens.access_token, "at");
        assert_eq!(tokens.expires_in, 7_776_000);
    }
}
