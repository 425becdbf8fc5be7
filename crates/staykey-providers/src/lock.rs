//! Smart-lock provider abstraction.
//!
//! The check-in flow needs three things from a lock vendor: register a
//! time-bounded passcode, trigger a remote unlock, and report device health.
//! Vendor access is always on behalf of an owner, authenticated by an access
//! token obtained through the vendor's OAuth flow and stored per owner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::BoxFuture;
use crate::error::{ProviderError, ProviderResult};

/// A passcode to register on a lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasscodeSpec {
    /// The code digits the guest will type.
    pub code: String,
    /// Start of the validity window.
    pub valid_from: DateTime<Utc>,
    /// End of the validity window.
    pub valid_until: DateTime<Utc>,
    /// Label shown in the vendor app (e.g. "Guest: Jane Doe").
    pub label: String,
}

/// Health snapshot of a lock device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockHealth {
    /// Remaining battery, 0–100.
    pub battery_percent: i64,
    /// Whether the lock is reachable through a gateway (required for remote
    /// unlock).
    pub has_gateway: bool,
}

/// The abstraction over a physical-lock vendor.
pub trait LockProvider: Send + Sync {
    /// Returns the vendor name (e.g. "ttlock").
    fn name(&self) -> &str;

    /// Returns true when credentials are present and vendor calls may be
    /// attempted.
    fn is_configured(&self) -> bool;

    /// Registers a time-bounded passcode on a lock.
    ///
    /// Returns the vendor-assigned passcode id.
    fn create_passcode(
        &self,
        access_token: &str,
        lock_id: &str,
        spec: PasscodeSpec,
    ) -> BoxFuture<'_, ProviderResult<String>>;

    /// Removes a previously registered passcode.
    fn delete_passcode(
        &self,
        access_token: &str,
        lock_id: &str,
        passcode_id: &str,
    ) -> BoxFuture<'_, ProviderResult<()>>;

    /// Triggers a remote unlock. Requires a gateway on the vendor side.
    fn unlock(&self, access_token: &str, lock_id: &str) -> BoxFuture<'_, ProviderResult<()>>;

    /// Queries battery and gateway state.
    fn lock_health(
        &self,
        access_token: &str,
        lock_id: &str,
    ) -> BoxFuture<'_, ProviderResult<LockHealth>>;
}

/// A lock provider with no credentials.
///
/// Stands in when the deployment has no lock vendor configured: reports
/// unconfigured, and fails every call with a configuration error. The
/// check-in flow treats that the same as a vendor outage on its
/// best-effort paths.
#[derive(Debug, Default)]
pub struct UnconfiguredLock;

impl UnconfiguredLock {
    fn error() -> ProviderError {
        ProviderError::configuration("lock provider is not configured")
    }
}

impl LockProvider for UnconfiguredLock {
    fn name(&self) -> &str {
        "unconfigured"
    }

    fn is_configured(&self) -> bool {
        false
    }

    fn create_passcode(
        &self,
        _access_token: &str,
        _lock_id: &str,
        _spec: PasscodeSpec,
    ) -> BoxFuture<'_, ProviderResult<String>> {
        Box::pin(async { Err(Self::error()) })
    }

    fn delete_passcode(
        &self,
        _access_token: &str,
        _lock_id: &str,
        _passcode_id: &str,
    ) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(async { Err(Self::error()) })
    }

    fn unlock(&self, _access_token: &str, _lock_id: &str) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(async { Err(Self::error()) })
    }

    fn lock_health(
        &self,
        _access_token: &str,
        _lock_id: &str,
    ) -> BoxFuture<'_, ProviderResult<LockHealth>> {
        Box::pin(async { Err(Self::error()) })
    }
}
