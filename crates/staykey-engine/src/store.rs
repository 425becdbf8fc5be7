//! The persistence boundary.
//!
//! The engine never talks to a database directly; it calls the operations
//! on [`Store`]. Each operation is one atomic unit: implementations must
//! serialize them so that "create event if absent else update" or "insert
//! reservation unless it overlaps" cannot interleave with each other.
//!
//! The overlap check inside [`Store::insert_reservation`] is the
//! enforcement mechanism for the no-double-booking invariant. The
//! availability oracle's pre-check only exists to produce a better error
//! earlier; losing that race must still fail here.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use staykey_core::{PassportStatus, ReservationStatus, StayRange};

use crate::model::{
    AccessCode, Apartment, BookingConflict, Deposit, ExternalEvent, FeedSlot, GuestRecord,
    LockToken, Reservation,
};

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed record does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The reservation's dates overlap an existing non-cancelled
    /// reservation for the same apartment.
    #[error("reservation dates overlap an existing booking")]
    ReservationOverlap(BookingConflict),

    /// A uniqueness constraint was violated.
    #[error("duplicate {0}")]
    Duplicate(&'static str),
}

/// A specialized Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result of [`Store::record_event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventWrite {
    /// First sight of the uid; a new row was inserted.
    Created(ExternalEvent),
    /// The uid was known; summary and dates were rewritten in place.
    Updated(ExternalEvent),
}

impl EventWrite {
    /// Returns the written event, either way.
    pub fn event(&self) -> &ExternalEvent {
        match self {
            Self::Created(event) | Self::Updated(event) => event,
        }
    }
}

/// The transactional record store.
///
/// Object-safe and synchronous; implementations provide their own
/// serialization (a database transaction, or a process-wide lock for the
/// in-memory store).
pub trait Store: Send + Sync {
    // --- Apartments -----------------------------------------------------

    /// Inserts an apartment and returns it.
    fn insert_apartment(&self, apartment: Apartment) -> StoreResult<Apartment>;

    /// Fetches an apartment by id.
    fn apartment(&self, id: Uuid) -> StoreResult<Apartment>;

    /// Lists active apartments with at least one configured feed.
    fn active_apartments_with_feeds(&self) -> StoreResult<Vec<Apartment>>;

    /// Advances last-sync stamps for the given slots, in one write.
    ///
    /// Slots that failed to sync are simply absent from `synced`.
    fn mark_feeds_synced(
        &self,
        apartment_id: Uuid,
        synced: &[(FeedSlot, DateTime<Utc>)],
    ) -> StoreResult<()>;

    // --- External events ------------------------------------------------

    /// Creates the event under its `(apartment_id, uid)` natural key, or
    /// updates summary and dates in place when the key is already known.
    fn record_event(
        &self,
        apartment_id: Uuid,
        uid: &str,
        summary: Option<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<EventWrite>;

    /// Lists all events mirrored for an apartment.
    fn events_for_apartment(&self, apartment_id: Uuid) -> StoreResult<Vec<ExternalEvent>>;

    /// Returns one event overlapping the range, if any exists.
    fn first_event_overlapping(
        &self,
        apartment_id: Uuid,
        range: StayRange,
    ) -> StoreResult<Option<ExternalEvent>>;

    // --- Reservations ---------------------------------------------------

    /// Inserts a reservation after re-checking, under the store's own
    /// serialization, that no non-cancelled reservation for the same
    /// apartment overlaps its stay.
    fn insert_reservation(&self, reservation: Reservation) -> StoreResult<Reservation>;

    /// Fetches a reservation by id.
    fn reservation(&self, id: Uuid) -> StoreResult<Reservation>;

    /// Fetches a reservation by its check-in token.
    fn reservation_by_token(&self, token: &str) -> StoreResult<Reservation>;

    /// Returns a reservation with exactly these stay instants, if any.
    ///
    /// Guards feed materialization against re-creating a reservation whose
    /// originating event row went missing.
    fn reservation_with_exact_dates(
        &self,
        apartment_id: Uuid,
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
    ) -> StoreResult<Option<Reservation>>;

    /// Returns one non-cancelled reservation overlapping the range, if any,
    /// skipping `exclude`.
    fn first_reservation_overlapping(
        &self,
        apartment_id: Uuid,
        range: StayRange,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<Reservation>>;

    /// Rewrites a reservation's status.
    fn set_reservation_status(
        &self,
        id: Uuid,
        status: ReservationStatus,
    ) -> StoreResult<Reservation>;

    // --- Guests ---------------------------------------------------------

    /// Fetches the guest record for a reservation, if one exists.
    fn guest_for_reservation(&self, reservation_id: Uuid) -> StoreResult<Option<GuestRecord>>;

    /// Appends documents to the guest record, creating it on first upload,
    /// and resets the passport status to pending. One atomic unit.
    fn append_guest_documents(
        &self,
        reservation_id: Uuid,
        documents: &[String],
    ) -> StoreResult<GuestRecord>;

    /// Records consent. The first timestamp wins; later calls are no-ops.
    fn record_consent(&self, reservation_id: Uuid, at: DateTime<Utc>) -> StoreResult<GuestRecord>;

    /// Sets the passport review outcome. Approval clears any stored
    /// rejection reason.
    fn set_passport_review(
        &self,
        reservation_id: Uuid,
        status: PassportStatus,
        rejection_reason: Option<String>,
    ) -> StoreResult<GuestRecord>;

    /// Stamps the guest's check-in completion time.
    fn record_checkin(&self, reservation_id: Uuid, at: DateTime<Utc>) -> StoreResult<GuestRecord>;

    // --- Deposits -------------------------------------------------------

    /// Fetches the deposit for a reservation, if one exists.
    fn deposit_for_reservation(&self, reservation_id: Uuid) -> StoreResult<Option<Deposit>>;

    /// Fetches a deposit by id.
    fn deposit(&self, id: Uuid) -> StoreResult<Deposit>;

    /// Fetches a deposit by its vendor transaction id, if any matches.
    fn deposit_by_transaction(&self, transaction_id: &str) -> StoreResult<Option<Deposit>>;

    /// Creates a pending deposit for the reservation unless one already
    /// exists; returns the existing one otherwise. One atomic unit.
    fn create_deposit_if_missing(
        &self,
        reservation_id: Uuid,
        amount_minor: i64,
        currency: &str,
    ) -> StoreResult<Deposit>;

    /// Records the vendor transaction id against the deposit.
    fn set_deposit_transaction(&self, id: Uuid, transaction_id: &str) -> StoreResult<Deposit>;

    /// Marks the deposit paid.
    fn mark_deposit_paid(
        &self,
        id: Uuid,
        transaction_id: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<Deposit>;

    /// Marks the deposit refunded.
    fn mark_deposit_refunded(&self, id: Uuid) -> StoreResult<Deposit>;

    /// Sets the owner-confirmation flag and timestamp.
    fn confirm_deposit(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<Deposit>;

    // --- Access codes ---------------------------------------------------

    /// Fetches the access code for a reservation, if one exists.
    fn access_code_for_reservation(&self, reservation_id: Uuid)
    -> StoreResult<Option<AccessCode>>;

    /// Inserts the access code unless the reservation already has one, in
    /// which case the existing code is returned untouched. This is what
    /// makes retried completion calls idempotent.
    fn insert_access_code_if_absent(&self, code: AccessCode) -> StoreResult<AccessCode>;

    // --- Lock tokens ----------------------------------------------------

    /// Fetches the lock-vendor token for an owner, if one is stored.
    fn lock_token_for_owner(&self, owner_id: Uuid) -> StoreResult<Option<LockToken>>;

    /// Stores (or replaces) an owner's lock-vendor token.
    fn put_lock_token(&self, token: LockToken) -> StoreResult<()>;
}
