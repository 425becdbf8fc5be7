//! In-memory store.
//!
//! Reference implementation of [`Store`]: plain maps behind one mutex, so
//! every trait operation is trivially atomic with respect to the others.
//! Backs the tests and the CLI's dry-run mode; a durable implementation
//! would put the same operations behind database transactions.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use staykey_core::{PassportStatus, ReservationStatus, StayRange};

use crate::model::{
    AccessCode, Apartment, BookingConflict, Deposit, ExternalEvent, FeedSlot, GuestRecord,
    LockToken, Reservation,
};
use crate::store::{EventWrite, Store, StoreError, StoreResult};

#[derive(Default)]
struct Inner {
    apartments: HashMap<Uuid, Apartment>,
    events: HashMap<Uuid, ExternalEvent>,
    /// `(apartment_id, uid)` natural key over `events`.
    event_index: HashMap<(Uuid, String), Uuid>,
    reservations: HashMap<Uuid, Reservation>,
    /// Check-in token index over `reservations`.
    token_index: HashMap<String, Uuid>,
    /// Guest records, keyed by reservation id (one-to-one).
    guests: HashMap<Uuid, GuestRecord>,
    deposits: HashMap<Uuid, Deposit>,
    /// Reservation id to deposit id (zero-or-one).
    deposit_index: HashMap<Uuid, Uuid>,
    /// Access codes, keyed by reservation id (zero-or-one).
    access_codes: HashMap<Uuid, AccessCode>,
    lock_tokens: HashMap<Uuid, LockToken>,
}

/// Map-backed [`Store`] with process-wide serialization.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("store mutex poisoned")
    }
}

fn overlapping_reservation<'a>(
    inner: &'a Inner,
    apartment_id: Uuid,
    range: StayRange,
    exclude: Option<Uuid>,
) -> Option<&'a Reservation> {
    inner
        .reservations
        .values()
        .filter(|r| r.apartment_id == apartment_id)
        .filter(|r| r.status.is_active())
        .filter(|r| Some(r.id) != exclude)
        .find(|r| r.check_in < range.end && r.check_out > range.start)
}

impl Store for MemoryStore {
    fn insert_apartment(&self, apartment: Apartment) -> StoreResult<Apartment> {
        let mut inner = self.lock();
        inner.apartments.insert(apartment.id, apartment.clone());
        Ok(apartment)
    }

    fn apartment(&self, id: Uuid) -> StoreResult<Apartment> {
        self.lock()
            .apartments
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound("apartment"))
    }

    fn active_apartments_with_feeds(&self) -> StoreResult<Vec<Apartment>> {
        let inner = self.lock();
        let mut apartments: Vec<_> = inner
            .apartments
            .values()
            .filter(|a| a.is_active && a.feeds.has_any())
            .cloned()
            .collect();
        apartments.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(apartments)
    }

    fn mark_feeds_synced(
        &self,
        apartment_id: Uuid,
        synced: &[(FeedSlot, DateTime<Utc>)],
    ) -> StoreResult<()> {
        let mut inner = self.lock();
        let apartment = inner
            .apartments
            .get_mut(&apartment_id)
            .ok_or(StoreError::NotFound("apartment"))?;
        for (slot, at) in synced {
            apartment.feeds.mark_synced(*slot, *at);
        }
        Ok(())
    }

    fn record_event(
        &self,
        apartment_id: Uuid,
        uid: &str,
        summary: Option<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<EventWrite> {
        let mut inner = self.lock();
        let key = (apartment_id, uid.to_string());
        let now = Utc::now();

        if let Some(event_id) = inner.event_index.get(&key).copied() {
            let event = inner
                .events
                .get_mut(&event_id)
                .ok_or(StoreError::NotFound("external event"))?;
            event.summary = summary;
            event.start = start;
            event.end = end;
            event.updated_at = now;
            return Ok(EventWrite::Updated(event.clone()));
        }

        let event = ExternalEvent {
            id: Uuid::new_v4(),
            apartment_id,
            uid: uid.to_string(),
            summary,
            start,
            end,
            created_at: now,
            updated_at: now,
        };
        inner.event_index.insert(key, event.id);
        inner.events.insert(event.id, event.clone());
        Ok(EventWrite::Created(event))
    }

    fn events_for_apartment(&self, apartment_id: Uuid) -> StoreResult<Vec<ExternalEvent>> {
        let inner = self.lock();
        let mut events: Vec<_> = inner
            .events
            .values()
            .filter(|e| e.apartment_id == apartment_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.start);
        Ok(events)
    }

    fn first_event_overlapping(
        &self,
        apartment_id: Uuid,
        range: StayRange,
    ) -> StoreResult<Option<ExternalEvent>> {
        let inner = self.lock();
        let mut events: Vec<_> = inner
            .events
            .values()
            .filter(|e| e.apartment_id == apartment_id)
            .filter(|e| e.start < range.end && e.end > range.start)
            .collect();
        events.sort_by_key(|e| e.start);
        Ok(events.first().map(|e| (*e).clone()))
    }

    fn insert_reservation(&self, reservation: Reservation) -> StoreResult<Reservation> {
        let mut inner = self.lock();

        if inner.token_index.contains_key(&reservation.checkin_token) {
            return Err(StoreError::Duplicate("check-in token"));
        }

        if reservation.status.is_active()
            && let Some(existing) = overlapping_reservation(
                &inner,
                reservation.apartment_id,
                reservation.stay(),
                Some(reservation.id),
            )
        {
            return Err(StoreError::ReservationOverlap(
                BookingConflict::from_reservation(existing),
            ));
        }

        inner
            .token_index
            .insert(reservation.checkin_token.clone(), reservation.id);
        inner.reservations.insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    fn reservation(&self, id: Uuid) -> StoreResult<Reservation> {
        self.lock()
            .reservations
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound("reservation"))
    }

    fn reservation_by_token(&self, token: &str) -> StoreResult<Reservation> {
        let inner = self.lock();
        inner
            .token_index
            .get(token)
            .and_then(|id| inner.reservations.get(id))
            .cloned()
            .ok_or(StoreError::NotFound("reservation"))
    }

    fn reservation_with_exact_dates(
        &self,
        apartment_id: Uuid,
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
    ) -> StoreResult<Option<Reservation>> {
        let inner = self.lock();
        Ok(inner
            .reservations
            .values()
            .find(|r| {
                r.apartment_id == apartment_id
                    && r.check_in == check_in
                    && r.check_out == check_out
            })
            .cloned())
    }

    fn first_reservation_overlapping(
        &self,
        apartment_id: Uuid,
        range: StayRange,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<Reservation>> {
        let inner = self.lock();
        Ok(overlapping_reservation(&inner, apartment_id, range, exclude).cloned())
    }

    fn set_reservation_status(
        &self,
        id: Uuid,
        status: ReservationStatus,
    ) -> StoreResult<Reservation> {
        let mut inner = self.lock();
        let reservation = inner
            .reservations
            .get_mut(&id)
            .ok_or(StoreError::NotFound("reservation"))?;
        reservation.status = status;
        Ok(reservation.clone())
    }

    fn guest_for_reservation(&self, reservation_id: Uuid) -> StoreResult<Option<GuestRecord>> {
        Ok(self.lock().guests.get(&reservation_id).cloned())
    }

    fn append_guest_documents(
        &self,
        reservation_id: Uuid,
        documents: &[String],
    ) -> StoreResult<GuestRecord> {
        let mut inner = self.lock();
        if !inner.reservations.contains_key(&reservation_id) {
            return Err(StoreError::NotFound("reservation"));
        }

        let guest = inner
            .guests
            .entry(reservation_id)
            .or_insert_with(|| GuestRecord {
                id: Uuid::new_v4(),
                reservation_id,
                documents: Vec::new(),
                passport_status: PassportStatus::Pending,
                rejection_reason: None,
                consent_given: false,
                consent_at: None,
                checked_in_at: None,
            });

        guest.documents.extend(documents.iter().cloned());
        guest.passport_status = PassportStatus::Pending;
        Ok(guest.clone())
    }

    fn record_consent(&self, reservation_id: Uuid, at: DateTime<Utc>) -> StoreResult<GuestRecord> {
        let mut inner = self.lock();
        let guest = inner
            .guests
            .get_mut(&reservation_id)
            .ok_or(StoreError::NotFound("guest"))?;
        if !guest.consent_given {
            guest.consent_given = true;
            guest.consent_at = Some(at);
        }
        Ok(guest.clone())
    }

    fn set_passport_review(
        &self,
        reservation_id: Uuid,
        status: PassportStatus,
        rejection_reason: Option<String>,
    ) -> StoreResult<GuestRecord> {
        let mut inner = self.lock();
        let guest = inner
            .guests
            .get_mut(&reservation_id)
            .ok_or(StoreError::NotFound("guest"))?;
        guest.passport_status = status;
        guest.rejection_reason = rejection_reason;
        Ok(guest.clone())
    }

    fn record_checkin(&self, reservation_id: Uuid, at: DateTime<Utc>) -> StoreResult<GuestRecord> {
        let mut inner = self.lock();
        let guest = inner
            .guests
            .get_mut(&reservation_id)
            .ok_or(StoreError::NotFound("guest"))?;
        guest.checked_in_at = Some(at);
        Ok(guest.clone())
    }

    fn deposit_for_reservation(&self, reservation_id: Uuid) -> StoreResult<Option<Deposit>> {
        let inner = self.lock();
        Ok(inner
            .deposit_index
            .get(&reservation_id)
            .and_then(|id| inner.deposits.get(id))
            .cloned())
    }

    fn deposit(&self, id: Uuid) -> StoreResult<Deposit> {
        self.lock()
            .deposits
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound("deposit"))
    }

    fn deposit_by_transaction(&self, transaction_id: &str) -> StoreResult<Option<Deposit>> {
        let inner = self.lock();
        Ok(inner
            .deposits
            .values()
            .find(|d| d.transaction_id.as_deref() == Some(transaction_id))
            .cloned())
    }

    fn create_deposit_if_missing(
        &self,
        reservation_id: Uuid,
        amount_minor: i64,
        currency: &str,
    ) -> StoreResult<Deposit> {
        let mut inner = self.lock();
        if !inner.reservations.contains_key(&reservation_id) {
            return Err(StoreError::NotFound("reservation"));
        }

        if let Some(deposit) = inner
            .deposit_index
            .get(&reservation_id)
            .and_then(|id| inner.deposits.get(id))
        {
            return Ok(deposit.clone());
        }

        let deposit = Deposit {
            id: Uuid::new_v4(),
            reservation_id,
            amount_minor,
            currency: currency.to_string(),
            status: staykey_core::DepositStatus::Pending,
            transaction_id: None,
            paid_at: None,
            owner_confirmed: false,
            owner_confirmed_at: None,
        };
        inner.deposit_index.insert(reservation_id, deposit.id);
        inner.deposits.insert(deposit.id, deposit.clone());
        Ok(deposit)
    }

    fn set_deposit_transaction(&self, id: Uuid, transaction_id: &str) -> StoreResult<Deposit> {
        let mut inner = self.lock();
        let deposit = inner
            .deposits
            .get_mut(&id)
            .ok_or(StoreError::NotFound("deposit"))?;
        deposit.transaction_id = Some(transaction_id.to_string());
        Ok(deposit.clone())
    }

    fn mark_deposit_paid(
        &self,
        id: Uuid,
        transaction_id: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<Deposit> {
        let mut inner = self.lock();
        let deposit = inner
            .deposits
            .get_mut(&id)
            .ok_or(StoreError::NotFound("deposit"))?;
        deposit.status = staykey_core::DepositStatus::Paid;
        deposit.transaction_id = Some(transaction_id.to_string());
        deposit.paid_at = Some(at);
        Ok(deposit.clone())
    }

    fn mark_deposit_refunded(&self, id: Uuid) -> StoreResult<Deposit> {
        let mut inner = self.lock();
        let deposit = inner
            .deposits
            .get_mut(&id)
            .ok_or(StoreError::NotFound("deposit"))?;
        deposit.status = staykey_core::DepositStatus::Refunded;
        Ok(deposit.clone())
    }

    fn confirm_deposit(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<Deposit> {
        let mut inner = self.lock();
        let deposit = inner
            .deposits
            .get_mut(&id)
            .ok_or(StoreError::NotFound("deposit"))?;
        deposit.owner_confirmed = true;
        deposit.owner_confirmed_at = Some(at);
        Ok(deposit.clone())
    }

    fn access_code_for_reservation(
        &self,
        reservation_id: Uuid,
    ) -> StoreResult<Option<AccessCode>> {
        Ok(self.lock().access_codes.get(&reservation_id).cloned())
    }

    fn insert_access_code_if_absent(&self, code: AccessCode) -> StoreResult<AccessCode> {
        let mut inner = self.lock();
        if let Some(existing) = inner.access_codes.get(&code.reservation_id) {
            return Ok(existing.clone());
        }
        inner.access_codes.insert(code.reservation_id, code.clone());
        Ok(code)
    }

    fn lock_token_for_owner(&self, owner_id: Uuid) -> StoreResult<Option<LockToken>> {
        Ok(self.lock().lock_tokens.get(&owner_id).cloned())
    }

    fn put_lock_token(&self, token: LockToken) -> StoreResult<()> {
        self.lock().lock_tokens.insert(token.owner_id, token);
        Ok(())
    }
}
