//! Persisted domain entities.
//!
//! These are the records the [`Store`](crate::store::Store) holds. They are
//! plain data; every mutation goes through a store operation, never through
//! direct field writes from another component.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use staykey_core::{
    DepositStatus, PassportStatus, ReservationSource, ReservationStatus, StayRange,
};

/// Lock id recorded on an access code when no smart lock is attached.
pub const MANUAL_LOCK_ID: &str = "manual";

/// The three independent calendar-feed positions an apartment can configure.
///
/// Any subset may be present; each carries its own last-sync stamp and is
/// synced in isolation from the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedSlot {
    Airbnb,
    Booking,
    /// The original single-feed position, kept for apartments configured
    /// before per-channel feeds existed.
    Legacy,
}

impl FeedSlot {
    /// All slots, in sync order.
    pub const ALL: [FeedSlot; 3] = [FeedSlot::Airbnb, FeedSlot::Booking, FeedSlot::Legacy];

    /// Returns the slot identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Airbnb => "airbnb",
            Self::Booking => "booking",
            Self::Legacy => "legacy",
        }
    }
}

impl std::fmt::Display for FeedSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One configured calendar feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedRef {
    /// The feed URL.
    pub url: String,
    /// When this feed last synced successfully.
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl FeedRef {
    /// Creates a feed reference that has never synced.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            last_synced_at: None,
        }
    }
}

/// An apartment's calendar feeds, one optional entry per slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSet {
    pub airbnb: Option<FeedRef>,
    pub booking: Option<FeedRef>,
    pub legacy: Option<FeedRef>,
}

impl FeedSet {
    /// Returns the feed in the given slot.
    pub fn get(&self, slot: FeedSlot) -> Option<&FeedRef> {
        match slot {
            FeedSlot::Airbnb => self.airbnb.as_ref(),
            FeedSlot::Booking => self.booking.as_ref(),
            FeedSlot::Legacy => self.legacy.as_ref(),
        }
    }

    fn get_mut(&mut self, slot: FeedSlot) -> Option<&mut FeedRef> {
        match slot {
            FeedSlot::Airbnb => self.airbnb.as_mut(),
            FeedSlot::Booking => self.booking.as_mut(),
            FeedSlot::Legacy => self.legacy.as_mut(),
        }
    }

    /// Configures a feed URL in the given slot, resetting its sync stamp.
    pub fn set_url(&mut self, slot: FeedSlot, url: impl Into<String>) {
        let entry = Some(FeedRef::new(url));
        match slot {
            FeedSlot::Airbnb => self.airbnb = entry,
            FeedSlot::Booking => self.booking = entry,
            FeedSlot::Legacy => self.legacy = entry,
        }
    }

    /// Lists the configured slots with their URLs, in sync order.
    pub fn configured(&self) -> Vec<(FeedSlot, String)> {
        FeedSlot::ALL
            .iter()
            .filter_map(|slot| self.get(*slot).map(|feed| (*slot, feed.url.clone())))
            .collect()
    }

    /// Returns true when at least one feed is configured.
    pub fn has_any(&self) -> bool {
        self.airbnb.is_some() || self.booking.is_some() || self.legacy.is_some()
    }

    /// Advances a slot's last-sync stamp. No-op when the slot is unset.
    pub fn mark_synced(&mut self, slot: FeedSlot, at: DateTime<Utc>) {
        if let Some(feed) = self.get_mut(slot) {
            feed.last_synced_at = Some(at);
        }
    }
}

/// A rentable apartment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Apartment {
    pub id: Uuid,
    /// The owner the apartment belongs to; owner accounts are managed
    /// outside this crate.
    pub owner_id: Uuid,
    pub name: String,
    pub address: String,
    /// Inactive apartments are skipped by bulk reconciliation.
    pub is_active: bool,
    pub feeds: FeedSet,
    /// Vendor id of the attached smart lock, if any.
    pub lock_id: Option<String>,
}

impl Apartment {
    /// Creates an active apartment with no feeds and no lock.
    pub fn new(owner_id: Uuid, name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: name.into(),
            address: address.into(),
            is_active: true,
            feeds: FeedSet::default(),
            lock_id: None,
        }
    }

    /// Builder: configure a feed URL.
    #[must_use]
    pub fn with_feed(mut self, slot: FeedSlot, url: impl Into<String>) -> Self {
        self.feeds.set_url(slot, url);
        self
    }

    /// Builder: attach a smart lock.
    #[must_use]
    pub fn with_lock(mut self, lock_id: impl Into<String>) -> Self {
        self.lock_id = Some(lock_id.into());
        self
    }
}

/// An event mirrored from an external calendar feed.
///
/// `(apartment_id, uid)` is the natural key. Created on first sight of a
/// uid, updated in place on every later sight, never deleted by
/// reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalEvent {
    pub id: Uuid,
    pub apartment_id: Uuid,
    /// The feed-assigned identifier.
    pub uid: String,
    pub summary: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A booked stay in one apartment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub apartment_id: Uuid,
    pub guest_name: String,
    pub guest_phone: String,
    pub guest_email: Option<String>,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    pub status: ReservationStatus,
    pub source: ReservationSource,
    /// Uid of the external event this reservation was materialized from.
    pub external_uid: Option<String>,
    /// High-entropy token; the sole authentication for the guest flow.
    pub checkin_token: String,
    pub deposit_required: bool,
    /// Deposit amount in minor units, when a deposit is required.
    pub deposit_amount_minor: Option<i64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// Returns the stay interval.
    ///
    /// Check-in is validated to precede check-out at creation.
    pub fn stay(&self) -> StayRange {
        StayRange::new(self.check_in, self.check_out)
    }
}

/// A guest's verification record, one-to-one with a reservation.
///
/// Created on first document upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestRecord {
    pub id: Uuid,
    pub reservation_id: Uuid,
    /// Storage references of uploaded identity documents, in upload order.
    /// Re-uploads append, they never replace.
    pub documents: Vec<String>,
    pub passport_status: PassportStatus,
    pub rejection_reason: Option<String>,
    pub consent_given: bool,
    pub consent_at: Option<DateTime<Utc>>,
    pub checked_in_at: Option<DateTime<Utc>>,
}

/// A deposit attached to a reservation, present only when required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub id: Uuid,
    pub reservation_id: Uuid,
    /// Amount in minor units.
    pub amount_minor: i64,
    pub currency: String,
    pub status: DepositStatus,
    /// Vendor transaction id once a payment was opened or completed.
    pub transaction_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    /// Manual owner acknowledgment, orthogonal to payment status.
    pub owner_confirmed: bool,
    pub owner_confirmed_at: Option<DateTime<Utc>>,
}

/// The access code issued when check-in completes.
///
/// Created exactly once per reservation and immutable afterwards apart from
/// the active flag. Its existence is the terminal marker of the check-in
/// workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessCode {
    pub id: Uuid,
    pub reservation_id: Uuid,
    /// Vendor lock id, or [`MANUAL_LOCK_ID`] when no lock is attached.
    pub lock_id: String,
    pub code: String,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl AccessCode {
    /// Creates an active access code valid over the given window.
    pub fn new(
        reservation_id: Uuid,
        lock_id: impl Into<String>,
        code: impl Into<String>,
        valid_from: DateTime<Utc>,
        valid_until: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            reservation_id,
            lock_id: lock_id.into(),
            code: code.into(),
            valid_from,
            valid_until,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Returns true when the code may open the door at `now`.
    ///
    /// Both window bounds are usable instants.
    pub fn usable_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.valid_from <= now && now <= self.valid_until
    }
}

/// A lock-vendor access token, stored per owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockToken {
    pub owner_id: Uuid,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// What a candidate stay collided with.
///
/// Reservation conflicts take priority over external blocks when both
/// exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BookingConflict {
    /// An existing non-cancelled reservation.
    Reservation {
        reservation_id: Uuid,
        guest_name: String,
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
        source: ReservationSource,
    },
    /// A block mirrored from an external calendar.
    ExternalBlock {
        summary: Option<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl BookingConflict {
    /// Builds a conflict from the colliding reservation.
    pub fn from_reservation(reservation: &Reservation) -> Self {
        Self::Reservation {
            reservation_id: reservation.id,
            guest_name: reservation.guest_name.clone(),
            check_in: reservation.check_in,
            check_out: reservation.check_out,
            source: reservation.source,
        }
    }

    /// Builds a conflict from the colliding external event.
    pub fn from_event(event: &ExternalEvent) -> Self {
        Self::ExternalBlock {
            summary: event.summary.clone(),
            start: event.start,
            end: event.end,
        }
    }
}
