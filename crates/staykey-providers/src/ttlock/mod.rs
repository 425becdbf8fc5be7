//! TTLock smart-lock vendor adapter.

mod client;
mod config;

pub use client::{TtlockClient, TtlockTokens};
pub use config::{DEFAULT_API_URL, TtlockConfig};

use crate::BoxFuture;
use crate::error::ProviderResult;
use crate::lock::{LockHealth, LockProvider, PasscodeSpec};

impl LockProvider for TtlockClient {
    fn name(&self) -> &str {
        "ttlock"
    }

    fn is_configured(&self) -> bool {
        self.config().has_credentials()
    }

    fn create_passcode(
        &self,
        access_token: &str,
        lock_id: &str,
        spec: PasscodeSpec,
    ) -> BoxFuture<'_, ProviderResult<String>> {
        let access_token = access_token.to_string();
        let lock_id = lock_id.to_string();
        Box::pin(async move { self.add_passcode(&access_token, &lock_id, &spec).await })
    }

    fn delete_passcode(
        &self,
        access_token: &str,
        lock_id: &str,
        passcode_id: &str,
    ) -> BoxFuture<'_, ProviderResult<()>> {
        let access_token = access_token.to_string();
        let lock_id = lock_id.to_string();
        let passcode_id = passcode_id.to_string();
        Box::pin(async move {
            self.remove_passcode(&access_token, &lock_id, &passcode_id)
                .await
        })
    }

    fn unlock(&self, access_token: &str, lock_id: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let access_token = access_token.to_string();
        let lock_id = lock_id.to_string();
        Box::pin(async move { self.remote_unlock(&access_token, &lock_id).await })
    }

    fn lock_health(
        &self,
        access_token: &str,
        lock_id: &str,
    ) -> BoxFuture<'_, ProviderResult<LockHealth>> {
        let access_token = access_token.to_string();
        let lock_id = lock_id.to_string();
        Box::pin(async move { self.detail(&access_token, &lock_id).await })
    }
}
