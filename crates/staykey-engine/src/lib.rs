//! The staykey engine: persisted model, reconciliation, availability, and
//! the guest check-in workflow.
//!
//! # Architecture
//!
//! ```text
//!  channel feeds ──► FeedSource ──► ReconcileEngine ──► Store
//!                                        │                ▲
//!                                        ▼                │
//!                                  ExternalEvent     Reservation
//!                                                         ▲
//!  owner dashboard ──► ReservationService ── Availability ┘
//!
//!  guest client ──► CheckinService ──► Store (guest / deposit / code)
//!                        │
//!                        ├──► LockProvider     (best-effort)
//!                        ├──► PaymentProvider  (failures surface)
//!                        └──► Notifier
//! ```
//!
//! Every external request is one short-lived unit of work against these
//! services; there is no in-process scheduler. Periodic reconciliation is
//! an external invoker hitting [`ReconcileEngine::sync_all_guarded`].

pub mod availability;
pub mod checkin;
pub mod error;
pub mod memory;
pub mod model;
pub mod notify;
pub mod reconcile;
pub mod reservations;
pub mod store;
pub mod token;

pub use availability::{Availability, AvailabilityReport};
pub use checkin::{
    CheckinOptions, CheckinService, CheckinStatus, CompletedCheckin, DepositPayment, DepositView,
    DocumentUpload, ReviewDecision, UnlockOutcome, UploadOutcome,
};
pub use error::{EngineError, EngineResult, PreconditionKind};
pub use memory::MemoryStore;
pub use model::{
    AccessCode, Apartment, BookingConflict, Deposit, ExternalEvent, FeedRef, FeedSet, FeedSlot,
    GuestRecord, LockToken, MANUAL_LOCK_ID, Reservation,
};
pub use notify::{DepositPaid, Notifier, PassportUploaded, TracingNotifier};
pub use reconcile::{
    ApartmentSyncReport, FeedOutcome, ReconcileConfig, ReconcileEngine, SyncSummary,
};
pub use reservations::{NewReservation, ReservationService};
pub use store::{EventWrite, Store, StoreError, StoreResult};
pub use token::{CHECKIN_TOKEN_LEN, new_access_code, new_checkin_token};
