//! Adapters for the system's external collaborators.
//!
//! Three things live outside the process boundary and are reached only
//! through the traits in this crate:
//!
//! - [`FeedSource`]: retrieves a booking channel's calendar document
//! - [`LockProvider`]: registers passcodes on and unlocks physical locks
//! - [`PaymentProvider`]: opens, tracks, and refunds deposit payments
//!
//! Each trait has a production HTTP implementation ([`HttpFeedSource`],
//! [`ttlock::TtlockClient`], [`ipay::IpayClient`]) built from an explicit
//! configuration struct, plus an unconfigured stand-in for deployments
//! without that vendor. All calls carry bounded timeouts and fail through
//! [`ProviderError`], whose code tells the caller whether to surface,
//! retry, or deliberately swallow the failure.

use std::future::Future;
use std::pin::Pin;

pub mod error;
pub mod feed;
pub mod ipay;
pub mod lock;
pub mod payment;
pub mod ttlock;

/// A boxed future for object-safe async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use feed::{FeedFetcherConfig, FeedSource, HttpFeedSource, StaticFeedSource};
pub use lock::{LockHealth, LockProvider, PasscodeSpec, UnconfiguredLock};
pub use payment::{
    PaymentIntent, PaymentProvider, PaymentRequest, PaymentState, PaymentStatus,
    UnconfiguredPayment,
};
