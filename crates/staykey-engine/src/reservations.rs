//! Owner-side reservation management.
//!
//! Manual reservations come from the dashboard: validate the input, ask the
//! availability oracle for a friendly conflict first, then insert through
//! the store, whose own overlap check is the real enforcement.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use staykey_core::{
    ReservationSource, ReservationStatus, StayRange, is_valid_email, is_valid_phone,
};

use crate::availability::Availability;
use crate::error::{EngineError, EngineResult};
use crate::model::Reservation;
use crate::store::Store;
use crate::token::new_checkin_token;

/// Input for a manual reservation.
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub apartment_id: Uuid,
    pub guest_name: String,
    pub guest_phone: String,
    pub guest_email: Option<String>,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    pub notes: Option<String>,
    pub deposit_required: bool,
    /// Deposit amount in minor units; required when `deposit_required`.
    pub deposit_amount_minor: Option<i64>,
}

/// Creates and cancels reservations on behalf of owners.
pub struct ReservationService {
    store: Arc<dyn Store>,
    availability: Availability,
}

impl ReservationService {
    /// Creates a service over the given store.
    pub fn new(store: Arc<dyn Store>) -> Self {
        let availability = Availability::new(store.clone());
        Self {
            store,
            availability,
        }
    }

    /// Returns the availability oracle.
    pub fn availability(&self) -> &Availability {
        &self.availability
    }

    /// Creates a manual reservation.
    ///
    /// Validates the input, consults the oracle for a structured conflict,
    /// then inserts. The store re-checks the overlap under its own
    /// serialization, so a concurrent creation racing past the oracle still
    /// fails with a conflict.
    pub fn create_manual(&self, new: NewReservation) -> EngineResult<Reservation> {
        let apartment = self.store.apartment(new.apartment_id)?;

        if new.guest_name.trim().is_empty() {
            return Err(EngineError::Validation("guest name is required".into()));
        }
        if new.guest_phone.trim().is_empty() {
            return Err(EngineError::Validation("guest phone is required".into()));
        }
        if !is_valid_phone(&new.guest_phone) {
            return Err(EngineError::Validation(
                "guest phone is not a valid phone number".into(),
            ));
        }
        if let Some(ref email) = new.guest_email
            && !is_valid_email(email)
        {
            return Err(EngineError::Validation(
                "guest email is not a valid address".into(),
            ));
        }

        let range = StayRange::try_new(new.check_in, new.check_out)
            .filter(|r| r.start < r.end)
            .ok_or_else(|| {
                EngineError::Validation("check-in must be before check-out".into())
            })?;

        if new.deposit_required {
            match new.deposit_amount_minor {
                Some(amount) if amount > 0 => {}
                _ => {
                    return Err(EngineError::Validation(
                        "a positive deposit amount is required when a deposit is enabled".into(),
                    ));
                }
            }
        }

        let report = self.availability.check(apartment.id, range, None)?;
        if let Some(conflict) = report.conflict {
            return Err(EngineError::Conflict(conflict));
        }

        let reservation = Reservation {
            id: Uuid::new_v4(),
            apartment_id: apartment.id,
            guest_name: new.guest_name.trim().to_string(),
            guest_phone: new.guest_phone,
            guest_email: new.guest_email,
            check_in: new.check_in,
            check_out: new.check_out,
            status: ReservationStatus::Pending,
            source: ReservationSource::Manual,
            external_uid: None,
            checkin_token: new_checkin_token(),
            deposit_required: new.deposit_required,
            deposit_amount_minor: if new.deposit_required {
                new.deposit_amount_minor
            } else {
                None
            },
            notes: new.notes,
            created_at: Utc::now(),
        };

        let reservation = self.store.insert_reservation(reservation)?;
        info!(
            reservation_id = %reservation.id,
            apartment = %apartment.name,
            guest = %reservation.guest_name,
            "manual reservation created"
        );
        Ok(reservation)
    }

    /// Fetches a reservation by id.
    pub fn get(&self, id: Uuid) -> EngineResult<Reservation> {
        Ok(self.store.reservation(id)?)
    }

    /// Cancels a reservation, freeing its dates.
    ///
    /// Cancelling an already-cancelled reservation is a no-op.
    pub fn cancel(&self, id: Uuid) -> EngineResult<Reservation> {
        let reservation = self.store.reservation(id)?;
        if reservation.status == ReservationStatus::Cancelled {
            return Ok(reservation);
        }
        let reservation = self
            .store
            .set_reservation_status(id, ReservationStatus::Cancelled)?;
        info!(reservation_id = %id, "reservation cancelled");
        Ok(reservation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::model::{Apartment, BookingConflict};
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn service_with_apartment() -> (ReservationService, Apartment) {
        let store = Arc::new(MemoryStore::new());
        let apartment = store
            .insert_apartment(Apartment::new(
                Uuid::new_v4(),
                "Cozy Studio",
                "Rustaveli Ave 42",
            ))
            .unwrap();
        (ReservationService::new(store), apartment)
    }

    fn valid_input(apartment_id: Uuid) -> NewReservation {
        NewReservation {
            apartment_id,
            guest_name: "John Smith".to_string(),
            guest_phone: "+995555123456".to_string(),
            guest_email: Some("john@example.com".to_string()),
            check_in: utc(2024, 7, 1),
            check_out: utc(2024, 7, 5),
            notes: None,
            deposit_required: false,
            deposit_amount_minor: None,
        }
    }

    #[test]
    fn creates_a_pending_manual_reservation() {
        let (service, apartment) = service_with_apartment();
        let reservation = service.create_manual(valid_input(apartment.id)).unwrap();

        assert_eq!(reservation.status, ReservationStatus::Pending);
        assert_eq!(reservation.source, ReservationSource::Manual);
        assert_eq!(reservation.checkin_token.len(), 32);
        assert!(reservation.external_uid.is_none());
    }

    #[test]
    fn unknown_apartment_is_not_found() {
        let (service, _apartment) = service_with_apartment();
        let err = service.create_manual(valid_input(Uuid::new_v4())).unwrap_err();
        assert!(matches!(err, EngineError::NotFound { entity: "apartment" }));
    }

    #[test]
    fn missing_fields_are_rejected() {
        let (service, apartment) = service_with_apartment();

        let mut input = valid_input(apartment.id);
        input.guest_name = "  ".to_string();
        assert!(matches!(
            service.create_manual(input),
            Err(EngineError::Validation(_))
        ));

        let mut input = valid_input(apartment.id);
        input.guest_phone = String::new();
        assert!(matches!(
            service.create_manual(input),
            Err(EngineError::Validation(_))
        ));

        let mut input = valid_input(apartment.id);
        input.guest_email = Some("not-an-email".to_string());
        assert!(matches!(
            service.create_manual(input),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn inverted_dates_are_rejected() {
        let (service, apartment) = service_with_apartment();
        let mut input = valid_input(apartment.id);
        input.check_in = utc(2024, 7, 5);
        input.check_out = utc(2024, 7, 1);
        assert!(matches!(
            service.create_manual(input),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn deposit_requires_positive_amount() {
        let (service, apartment) = service_with_apartment();

        let mut input = valid_input(apartment.id);
        input.deposit_required = true;
        input.deposit_amount_minor = None;
        assert!(matches!(
            service.create_manual(input),
            Err(EngineError::Validation(_))
        ));

        let mut input = valid_input(apartment.id);
        input.deposit_required = true;
        input.deposit_amount_minor = Some(0);
        assert!(matches!(
            service.create_manual(input),
            Err(EngineError::Validation(_))
        ));

        let mut input = valid_input(apartment.id);
        input.deposit_required = true;
        input.deposit_amount_minor = Some(15_000);
        let reservation = service.create_manual(input).unwrap();
        assert_eq!(reservation.deposit_amount_minor, Some(15_000));
    }

    #[test]
    fn deposit_amount_dropped_when_not_required() {
        let (service, apartment) = service_with_apartment();
        let mut input = valid_input(apartment.id);
        input.deposit_required = false;
        input.deposit_amount_minor = Some(15_000);
        let reservation = service.create_manual(input).unwrap();
        assert!(reservation.deposit_amount_minor.is_none());
    }

    #[test]
    fn overlap_is_reported_with_the_colliding_guest() {
        let (service, apartment) = service_with_apartment();
        service.create_manual(valid_input(apartment.id)).unwrap();

        let mut input = valid_input(apartment.id);
        input.guest_name = "Second Guest".to_string();
        input.check_in = utc(2024, 7, 4);
        input.check_out = utc(2024, 7, 8);

        match service.create_manual(input).unwrap_err() {
            EngineError::Conflict(BookingConflict::Reservation {
                guest_name,
                check_in,
                check_out,
                ..
            }) => {
                assert_eq!(guest_name, "John Smith");
                assert_eq!(check_in, utc(2024, 7, 1));
                assert_eq!(check_out, utc(2024, 7, 5));
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn external_block_also_conflicts() {
        let store = Arc::new(MemoryStore::new());
        let apartment = store
            .insert_apartment(Apartment::new(Uuid::new_v4(), "Studio", "Addr"))
            .unwrap();
        store
            .record_event(
                apartment.id,
                "uid-1",
                Some("Blocked".to_string()),
                utc(2024, 7, 2),
                utc(2024, 7, 6),
            )
            .unwrap();
        let service = ReservationService::new(store);

        match service.create_manual(valid_input(apartment.id)).unwrap_err() {
            EngineError::Conflict(BookingConflict::ExternalBlock { summary, .. }) => {
                assert_eq!(summary.as_deref(), Some("Blocked"));
            }
            other => panic!("expected external block conflict, got {other:?}"),
        }
    }

    #[test]
    fn cancel_frees_the_dates() {
        let (service, apartment) = service_with_apartment();
        let first = service.create_manual(valid_input(apartment.id)).unwrap();
        service.cancel(first.id).unwrap();

        let mut input = valid_input(apartment.id);
        input.guest_name = "Replacement Guest".to_string();
        assert!(service.create_manual(input).is_ok());
    }

    #[test]
    fn cancel_twice_is_a_noop() {
        let (service, apartment) = service_with_apartment();
        let reservation = service.create_manual(valid_input(apartment.id)).unwrap();
        service.cancel(reservation.id).unwrap();
        let again = service.cancel(reservation.id).unwrap();
        assert_eq!(again.status, ReservationStatus::Cancelled);
    }
}
