//! The availability oracle.
//!
//! Answers one question: is this apartment free over this range? Two
//! independent sources can say no: an existing non-cancelled reservation,
//! or a block mirrored from an external calendar. The oracle is consulted
//! at reservation-creation time only; once created, a reservation is
//! authoritative even if a feed later drifts into conflict with it.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use staykey_core::StayRange;

use crate::error::EngineResult;
use crate::model::BookingConflict;
use crate::store::Store;

/// The oracle's verdict.
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityReport {
    /// Whether the range is free.
    pub available: bool,
    /// What the range collided with, when it is not.
    pub conflict: Option<BookingConflict>,
}

impl AvailabilityReport {
    fn free() -> Self {
        Self {
            available: true,
            conflict: None,
        }
    }

    fn blocked(conflict: BookingConflict) -> Self {
        Self {
            available: false,
            conflict: Some(conflict),
        }
    }
}

/// Pure query over persisted reservations and external events.
pub struct Availability {
    store: Arc<dyn Store>,
}

impl Availability {
    /// Creates an oracle over the given store.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Checks whether `range` is free for the apartment.
    ///
    /// `exclude` skips one reservation, for re-checks while editing an
    /// existing booking. When both a reservation and an external block
    /// collide, the reservation wins the reported conflict detail.
    pub fn check(
        &self,
        apartment_id: Uuid,
        range: StayRange,
        exclude: Option<Uuid>,
    ) -> EngineResult<AvailabilityReport> {
        if let Some(reservation) =
            self.store
                .first_reservation_overlapping(apartment_id, range, exclude)?
        {
            return Ok(AvailabilityReport::blocked(
                BookingConflict::from_reservation(&reservation),
            ));
        }

        if let Some(event) = self.store.first_event_overlapping(apartment_id, range)? {
            return Ok(AvailabilityReport::blocked(BookingConflict::from_event(
                &event,
            )));
        }

        Ok(AvailabilityReport::free())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::model::Reservation;
    use crate::token::new_checkin_token;
    use chrono::{DateTime, TimeZone, Utc};
    use staykey_core::{ReservationSource, ReservationStatus};

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn reservation(
        apartment_id: Uuid,
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
    ) -> Reservation {
        Reservation {
            id: Uuid::new_v4(),
            apartment_id,
            guest_name: "Jane Doe".to_string(),
            guest_phone: "+995555123456".to_string(),
            guest_email: None,
            check_in,
            check_out,
            status: ReservationStatus::Pending,
            source: ReservationSource::Manual,
            external_uid: None,
            checkin_token: new_checkin_token(),
            deposit_required: false,
            deposit_amount_minor: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    fn oracle_with_store() -> (Availability, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (Availability::new(store.clone()), store)
    }

    #[test]
    fn empty_apartment_is_available() {
        let (oracle, _store) = oracle_with_store();
        let report = oracle
            .check(
                Uuid::new_v4(),
                StayRange::new(utc(2024, 7, 1), utc(2024, 7, 5)),
                None,
            )
            .unwrap();
        assert!(report.available);
        assert!(report.conflict.is_none());
    }

    #[test]
    fn overlapping_reservation_blocks_with_detail() {
        let (oracle, store) = oracle_with_store();
        let apartment_id = Uuid::new_v4();
        store
            .insert_reservation(reservation(apartment_id, utc(2024, 7, 1), utc(2024, 7, 5)))
            .unwrap();

        let report = oracle
            .check(
                apartment_id,
                StayRange::new(utc(2024, 7, 4), utc(2024, 7, 8)),
                None,
            )
            .unwrap();
        assert!(!report.available);
        match report.conflict.unwrap() {
            BookingConflict::Reservation {
                guest_name,
                check_in,
                check_out,
                ..
            } => {
                assert_eq!(guest_name, "Jane Doe");
                assert_eq!(check_in, utc(2024, 7, 1));
                assert_eq!(check_out, utc(2024, 7, 5));
            }
            other => panic!("expected reservation conflict, got {other:?}"),
        }
    }

    #[test]
    fn external_block_blocks() {
        let (oracle, store) = oracle_with_store();
        let apartment_id = Uuid::new_v4();
        store
            .record_event(
                apartment_id,
                "uid-1",
                Some("Blocked".to_string()),
                utc(2024, 7, 2),
                utc(2024, 7, 6),
            )
            .unwrap();

        let report = oracle
            .check(
                apartment_id,
                StayRange::new(utc(2024, 7, 4), utc(2024, 7, 8)),
                None,
            )
            .unwrap();
        assert!(!report.available);
        assert!(matches!(
            report.conflict,
            Some(BookingConflict::ExternalBlock { .. })
        ));
    }

    #[test]
    fn reservation_conflict_outranks_external_block() {
        let (oracle, store) = oracle_with_store();
        let apartment_id = Uuid::new_v4();
        store
            .insert_reservation(reservation(apartment_id, utc(2024, 7, 1), utc(2024, 7, 5)))
            .unwrap();
        store
            .record_event(apartment_id, "uid-1", None, utc(2024, 7, 2), utc(2024, 7, 6))
            .unwrap();

        let report = oracle
            .check(
                apartment_id,
                StayRange::new(utc(2024, 7, 4), utc(2024, 7, 8)),
                None,
            )
            .unwrap();
        assert!(matches!(
            report.conflict,
            Some(BookingConflict::Reservation { .. })
        ));
    }

    #[test]
    fn exclusion_skips_the_named_reservation() {
        let (oracle, store) = oracle_with_store();
        let apartment_id = Uuid::new_v4();
        let existing = store
            .insert_reservation(reservation(apartment_id, utc(2024, 7, 1), utc(2024, 7, 5)))
            .unwrap();

        let report = oracle
            .check(
                apartment_id,
                StayRange::new(utc(2024, 7, 2), utc(2024, 7, 6)),
                Some(existing.id),
            )
            .unwrap();
        assert!(report.available);
    }

    #[test]
    fn checkout_on_checkin_day_is_available() {
        let (oracle, store) = oracle_with_store();
        let apartment_id = Uuid::new_v4();
        store
            .insert_reservation(reservation(apartment_id, utc(2024, 7, 1), utc(2024, 7, 5)))
            .unwrap();

        let report = oracle
            .check(
                apartment_id,
                StayRange::new(utc(2024, 7, 5), utc(2024, 7, 9)),
                None,
            )
            .unwrap();
        assert!(report.available);
    }
}
