//! Owner notifications.
//!
//! The check-in flow raises two events the owner cares about: a guest
//! uploaded identity documents, and a deposit was paid. Delivery (push,
//! messaging, dashboard badges) lives outside this crate; the engine only
//! calls the trait and moves on. Notification failures must never fail the
//! guest's operation, so the trait is fire-and-forget.

use uuid::Uuid;

/// A guest uploaded identity documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassportUploaded {
    pub owner_id: Uuid,
    pub reservation_id: Uuid,
    pub guest_name: String,
    pub apartment_name: String,
    pub document_count: usize,
}

/// A deposit was paid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositPaid {
    pub owner_id: Uuid,
    pub reservation_id: Uuid,
    pub guest_name: String,
    pub apartment_name: String,
    pub amount_minor: i64,
    pub currency: String,
}

/// Receives owner-facing events from the check-in flow.
pub trait Notifier: Send + Sync {
    /// A guest uploaded identity documents.
    fn passport_uploaded(&self, event: &PassportUploaded);

    /// A deposit was paid.
    fn deposit_paid(&self, event: &DepositPaid);
}

/// Default notifier: emits structured log lines and nothing else.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn passport_uploaded(&self, event: &PassportUploaded) {
        tracing::info!(
            owner_id = %event.owner_id,
            reservation_id = %event.reservation_id,
            guest = %event.guest_name,
            apartment = %event.apartment_name,
            documents = event.document_count,
            "passport uploaded"
        );
    }

    fn deposit_paid(&self, event: &DepositPaid) {
        tracing::info!(
            owner_id = %event.owner_id,
            reservation_id = %event.reservation_id,
            guest = %event.guest_name,
            apartment = %event.apartment_name,
            amount_minor = event.amount_minor,
            currency = %event.currency,
            "deposit paid"
        );
    }
}
