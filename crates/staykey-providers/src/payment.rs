//! Deposit-payment provider abstraction.
//!
//! The guest flow needs to open a payment, poll its status, refund it, and
//! verify signed callbacks from the vendor. Amounts travel in minor units
//! (tetri for GEL) end to end; no floats.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::BoxFuture;
use crate::error::{ProviderError, ProviderResult};

/// A request to open a deposit payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Merchant-side order id, unique per deposit.
    pub order_id: String,
    /// Amount in minor units.
    pub amount_minor: i64,
    /// ISO currency code.
    pub currency: String,
    /// Human-readable purpose shown on the payment page.
    pub description: String,
    /// Payment page language code.
    pub language: String,
}

impl PaymentRequest {
    /// Creates a request with the defaults the deposit flow uses.
    pub fn new(order_id: impl Into<String>, amount_minor: i64) -> Self {
        Self {
            order_id: order_id.into(),
            amount_minor,
            currency: "GEL".to_string(),
            description: "Deposit payment".to_string(),
            language: "ka".to_string(),
        }
    }

    /// Builder: set the currency.
    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Builder: set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder: set the language.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

/// A successfully opened payment: where to send the guest, and the vendor's
/// transaction handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Vendor transaction id, recorded against the deposit.
    pub transaction_id: String,
    /// Redirect target for the guest's browser.
    pub payment_url: String,
}

/// Vendor-agnostic payment state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Pending,
    Success,
    Failed,
    Refunded,
}

impl PaymentState {
    /// Returns the state identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A payment's current status as reported by the vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatus {
    /// Vendor transaction id.
    pub transaction_id: String,
    /// Merchant-side order id.
    pub order_id: String,
    /// Amount in minor units.
    pub amount_minor: i64,
    /// ISO currency code.
    pub currency: String,
    /// Mapped state.
    pub state: PaymentState,
    /// Vendor result code, when provided.
    pub result_code: Option<String>,
    /// Vendor result message, when provided.
    pub result_message: Option<String>,
}

/// The abstraction over a deposit-payment vendor.
pub trait PaymentProvider: Send + Sync {
    /// Returns the vendor name (e.g. "ipay").
    fn name(&self) -> &str;

    /// Returns true when credentials are present and payments can be opened.
    fn is_configured(&self) -> bool;

    /// Opens a payment and returns the redirect target.
    fn create_payment(
        &self,
        request: &PaymentRequest,
    ) -> BoxFuture<'_, ProviderResult<PaymentIntent>>;

    /// Queries the status of a payment.
    fn payment_status(
        &self,
        transaction_id: &str,
    ) -> BoxFuture<'_, ProviderResult<PaymentStatus>>;

    /// Refunds a payment, fully or partially.
    ///
    /// Returns true when the vendor accepted the refund.
    fn refund(
        &self,
        transaction_id: &str,
        amount_minor: Option<i64>,
    ) -> BoxFuture<'_, ProviderResult<bool>>;

    /// Verifies a detached callback signature over the given fields.
    ///
    /// Fields are signed sorted lexicographically by key; the map's ordering
    /// already guarantees that.
    fn verify_signature(&self, fields: &BTreeMap<String, String>, signature: &str) -> bool;
}

/// A payment provider with no credentials.
///
/// Reports unconfigured so the deposit flow can take its gated mock path;
/// any real call fails with a configuration error, and no signature ever
/// verifies.
#[derive(Debug, Default)]
pub struct UnconfiguredPayment;

impl UnconfiguredPayment {
    fn error() -> ProviderError {
        ProviderError::configuration("payment provider is not configured")
    }
}

impl PaymentProvider for UnconfiguredPayment {
    fn name(&self) -> &str {
        "unconfigured"
    }

    fn is_configured(&self) -> bool {
        false
    }

    fn create_payment(
        &self,
        _request: &PaymentRequest,
    ) -> BoxFuture<'_, ProviderResult<PaymentIntent>> {
        Box::pin(async { Err(Self::error()) })
    }

    fn payment_status(
        &self,
        _transaction_id: &str,
    ) -> BoxFuture<'_, ProviderResult<PaymentStatus>> {
        Box::pin(async { Err(Self::error()) })
    }

    fn refund(
        &self,
        _transaction_id: &str,
        _amount_minor: Option<i64>,
    ) -> BoxFuture<'_, ProviderResult<bool>> {
        Box::pin(async { Err(Self::error()) })
    }

    fn verify_signature(&self, _fields: &BTreeMap<String, String>, _signature: &str) -> bool {
        false
    }
}
