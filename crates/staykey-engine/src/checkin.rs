//! The guest check-in workflow.
//!
//! One reservation moves from "nothing uploaded" to "door opens" through
//! the operations here. The current position is never stored; it is derived
//! from persisted facts on every read ([`staykey_core::derive_stage`]), so
//! guests can poll and retry freely.
//!
//! Provider failures are handled asymmetrically, on purpose:
//!
//! - the **payment** path surfaces them, since a guest cannot proceed
//!   without a working payment;
//! - **lock registration** during completion and the **unlock** call
//!   inspect the error, log it, and deliberately discard it. The access
//!   code stays usable manually, and the stay must not be blocked by a lock
//!   vendor outage.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use staykey_core::{
    CheckinStage, DepositStatus, PassportStatus, ReservationStatus, StageSnapshot, derive_stage,
};
use staykey_providers::{
    LockProvider, PasscodeSpec, PaymentProvider, PaymentRequest, PaymentState, PaymentStatus,
    ProviderError,
};

use crate::error::{EngineError, EngineResult, PreconditionKind};
use crate::model::{
    AccessCode, Apartment, Deposit, GuestRecord, MANUAL_LOCK_ID, Reservation,
};
use crate::notify::{DepositPaid, Notifier, PassportUploaded};
use crate::store::Store;
use crate::token::new_access_code;

/// Behavior knobs for the check-in service.
#[derive(Debug, Clone)]
pub struct CheckinOptions {
    /// When true, repeated consent and re-decided passport reviews are
    /// refused instead of tolerated.
    pub strict_repeat_guards: bool,
    /// Whether the synchronous mock payment path may run when no payment
    /// provider is configured. It can never run when one is.
    pub allow_mock_payments: bool,
    /// Accepted document content types, lowercase.
    pub accepted_document_types: Vec<String>,
}

impl Default for CheckinOptions {
    fn default() -> Self {
        Self {
            strict_repeat_guards: false,
            allow_mock_payments: true,
            accepted_document_types: vec![
                "image/jpeg".to_string(),
                "image/jpg".to_string(),
                "image/png".to_string(),
                "application/pdf".to_string(),
            ],
        }
    }
}

/// One uploaded file, already persisted by the storage layer.
///
/// The engine never sees bytes; it records the opaque storage reference and
/// judges the declared content type.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub file_name: String,
    pub content_type: String,
    pub storage_ref: String,
}

/// Result of a document upload.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// Files accepted and recorded.
    pub accepted: usize,
    /// Files refused for their content type.
    pub rejected: usize,
    /// Storage refs of the accepted files.
    pub documents: Vec<String>,
}

/// An owner's passport decision.
#[derive(Debug, Clone)]
pub enum ReviewDecision {
    Approve,
    Reject { reason: String },
}

/// How a deposit payment proceeded.
#[derive(Debug, Clone)]
pub enum DepositPayment {
    /// A real payment was opened; send the guest to `payment_url`.
    Redirect {
        transaction_id: String,
        payment_url: String,
    },
    /// The gated development path marked the deposit paid synchronously.
    MockPaid { transaction_id: String },
}

/// Result of completing check-in.
#[derive(Debug, Clone)]
pub struct CompletedCheckin {
    pub access_code: AccessCode,
    /// Whether the code was registered with the lock vendor on this call.
    pub lock_registered: bool,
}

/// Result of an unlock request.
#[derive(Debug, Clone)]
pub struct UnlockOutcome {
    /// Whether the vendor actually actuated the lock.
    pub via_lock: bool,
    pub message: String,
}

/// A deposit, as the guest flow shows it.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DepositView {
    pub amount_minor: i64,
    pub currency: String,
    pub status: DepositStatus,
}

/// Everything the guest flow needs to render the current state.
#[derive(Debug, Clone)]
pub struct CheckinStatus {
    pub reservation_id: Uuid,
    pub guest_name: String,
    pub apartment_name: String,
    pub apartment_address: String,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    pub reservation_status: ReservationStatus,
    pub stage: CheckinStage,
    pub documents_uploaded: usize,
    pub passport_status: PassportStatus,
    pub rejection_reason: Option<String>,
    pub consent_given: bool,
    pub deposit_required: bool,
    pub deposit_amount_minor: Option<i64>,
    pub deposit: Option<DepositView>,
    pub access_code: Option<AccessCode>,
}

/// Drives one reservation's guest workflow.
pub struct CheckinService {
    store: Arc<dyn Store>,
    lock: Arc<dyn LockProvider>,
    payment: Arc<dyn PaymentProvider>,
    notifier: Arc<dyn Notifier>,
    options: CheckinOptions,
}

impl CheckinService {
    /// Creates a service with default options.
    pub fn new(
        store: Arc<dyn Store>,
        lock: Arc<dyn LockProvider>,
        payment: Arc<dyn PaymentProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            lock,
            payment,
            notifier,
            options: CheckinOptions::default(),
        }
    }

    /// Builder: override the options.
    #[must_use]
    pub fn with_options(mut self, options: CheckinOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the current state of the workflow for polling clients.
    ///
    /// Reading never has side effects; the stage is derived fresh from
    /// persisted facts each call.
    pub fn status(&self, token: &str) -> EngineResult<CheckinStatus> {
        self.status_at(token, Utc::now())
    }

    /// [`Self::status`] against an explicit clock.
    pub fn status_at(&self, token: &str, now: DateTime<Utc>) -> EngineResult<CheckinStatus> {
        let reservation = self.store.reservation_by_token(token)?;

        if reservation.status == ReservationStatus::Cancelled {
            return Err(EngineError::ReservationClosed {
                reason: "reservation is cancelled".into(),
            });
        }
        if now > reservation.check_out {
            return Err(EngineError::ReservationClosed {
                reason: "reservation has expired".into(),
            });
        }

        let apartment = self.store.apartment(reservation.apartment_id)?;
        let guest = self.store.guest_for_reservation(reservation.id)?;
        let deposit = self.store.deposit_for_reservation(reservation.id)?;
        let access_code = self.store.access_code_for_reservation(reservation.id)?;

        let stage = derive_stage(&snapshot(&reservation, guest.as_ref(), deposit.as_ref(), access_code.as_ref()));

        Ok(CheckinStatus {
            reservation_id: reservation.id,
            guest_name: reservation.guest_name.clone(),
            apartment_name: apartment.name,
            apartment_address: apartment.address,
            check_in: reservation.check_in,
            check_out: reservation.check_out,
            reservation_status: reservation.status,
            stage,
            documents_uploaded: guest.as_ref().map_or(0, |g| g.documents.len()),
            passport_status: guest
                .as_ref()
                .map_or(PassportStatus::Pending, |g| g.passport_status),
            rejection_reason: guest.as_ref().and_then(|g| g.rejection_reason.clone()),
            consent_given: guest.as_ref().is_some_and(|g| g.consent_given),
            deposit_required: reservation.deposit_required,
            deposit_amount_minor: reservation.deposit_amount_minor,
            deposit: deposit.map(|d| DepositView {
                amount_minor: d.amount_minor,
                currency: d.currency,
                status: d.status,
            }),
            access_code,
        })
    }

    /// Records identity documents for the guest.
    ///
    /// Acceptance is judged per file, so a request may partially succeed;
    /// it fails only when nothing was acceptable. Any successful upload
    /// resets the passport review to pending and notifies the owner.
    pub fn upload_documents(
        &self,
        token: &str,
        files: &[DocumentUpload],
    ) -> EngineResult<UploadOutcome> {
        let reservation = self.store.reservation_by_token(token)?;

        if files.is_empty() {
            return Err(EngineError::Validation("no files uploaded".into()));
        }

        let accepted: Vec<String> = files
            .iter()
            .filter(|f| {
                let ok = self
                    .options
                    .accepted_document_types
                    .iter()
                    .any(|t| t == &f.content_type.to_ascii_lowercase());
                if !ok {
                    debug!(file = %f.file_name, content_type = %f.content_type, "rejecting unsupported document type");
                }
                ok
            })
            .map(|f| f.storage_ref.clone())
            .collect();

        if accepted.is_empty() {
            return Err(EngineError::Validation(
                "no files of a supported type were uploaded".into(),
            ));
        }

        let guest = self
            .store
            .append_guest_documents(reservation.id, &accepted)?;

        let apartment = self.store.apartment(reservation.apartment_id)?;
        self.notifier.passport_uploaded(&PassportUploaded {
            owner_id: apartment.owner_id,
            reservation_id: reservation.id,
            guest_name: reservation.guest_name.clone(),
            apartment_name: apartment.name,
            document_count: accepted.len(),
        });

        info!(
            reservation_id = %reservation.id,
            accepted = accepted.len(),
            total = guest.documents.len(),
            "identity documents uploaded"
        );

        Ok(UploadOutcome {
            accepted: accepted.len(),
            rejected: files.len() - accepted.len(),
            documents: accepted,
        })
    }

    /// Records the guest's consent to the house terms.
    ///
    /// Requires at least one uploaded document. Repeat calls keep the first
    /// timestamp; in strict mode they are refused instead.
    pub fn give_consent(&self, token: &str) -> EngineResult<GuestRecord> {
        self.give_consent_at(token, Utc::now())
    }

    /// [`Self::give_consent`] against an explicit clock.
    pub fn give_consent_at(&self, token: &str, now: DateTime<Utc>) -> EngineResult<GuestRecord> {
        let reservation = self.store.reservation_by_token(token)?;
        let guest = self.store.guest_for_reservation(reservation.id)?;

        let Some(guest) = guest.filter(|g| !g.documents.is_empty()) else {
            return Err(EngineError::precondition(
                PreconditionKind::DocumentsMissing,
                "please upload identity documents first",
            ));
        };

        if guest.consent_given {
            if self.options.strict_repeat_guards {
                return Err(EngineError::precondition(
                    PreconditionKind::AlreadyConsented,
                    "consent was already given",
                ));
            }
            return Ok(guest);
        }

        let guest = self.store.record_consent(reservation.id, now)?;
        info!(reservation_id = %reservation.id, "consent recorded");
        Ok(guest)
    }

    /// Applies the owner's passport decision.
    ///
    /// Rejection demands a non-empty reason, which is stored and surfaced
    /// to the guest. Owner tooling is trusted; re-deciding an
    /// already-decided guest is only refused in strict mode.
    pub fn review_passport(
        &self,
        reservation_id: Uuid,
        decision: ReviewDecision,
    ) -> EngineResult<GuestRecord> {
        let guest = self
            .store
            .guest_for_reservation(reservation_id)?
            .ok_or(EngineError::NotFound { entity: "guest" })?;

        if self.options.strict_repeat_guards && guest.passport_status != PassportStatus::Pending {
            return Err(EngineError::precondition(
                PreconditionKind::AlreadyReviewed,
                "passport was already reviewed",
            ));
        }

        let guest = match decision {
            ReviewDecision::Approve => {
                self.store
                    .set_passport_review(reservation_id, PassportStatus::Approved, None)?
            }
            ReviewDecision::Reject { reason } => {
                let reason = reason.trim().to_string();
                if reason.is_empty() {
                    return Err(EngineError::Validation(
                        "a rejection reason is required".into(),
                    ));
                }
                self.store.set_passport_review(
                    reservation_id,
                    PassportStatus::Rejected,
                    Some(reason),
                )?
            }
        };

        info!(
            reservation_id = %reservation_id,
            status = %guest.passport_status,
            "passport reviewed"
        );
        Ok(guest)
    }

    /// Opens (or mock-settles) the deposit payment.
    ///
    /// With a configured provider this returns a redirect and records the
    /// vendor transaction id; provider failures surface to the caller,
    /// because the guest cannot proceed without a working payment path.
    /// Without one, and only when mock payments are allowed, the deposit is
    /// marked paid synchronously with a synthetic transaction id.
    pub async fn pay_deposit(
        &self,
        token: &str,
        card_hint: Option<&str>,
    ) -> EngineResult<DepositPayment> {
        self.pay_deposit_at(token, card_hint, Utc::now()).await
    }

    /// [`Self::pay_deposit`] against an explicit clock.
    pub async fn pay_deposit_at(
        &self,
        token: &str,
        card_hint: Option<&str>,
        now: DateTime<Utc>,
    ) -> EngineResult<DepositPayment> {
        let reservation = self.store.reservation_by_token(token)?;

        if !reservation.deposit_required {
            return Err(EngineError::precondition(
                PreconditionKind::DepositNotRequired,
                "this reservation does not take a deposit",
            ));
        }
        let amount_minor = reservation.deposit_amount_minor.ok_or_else(|| {
            EngineError::Validation("reservation has no deposit amount configured".into())
        })?;

        let deposit = self
            .store
            .create_deposit_if_missing(reservation.id, amount_minor, "GEL")?;

        if deposit.status == DepositStatus::Paid {
            return Err(EngineError::precondition(
                PreconditionKind::DepositAlreadyPaid,
                "deposit was already paid",
            ));
        }

        if self.payment.is_configured() {
            let apartment = self.store.apartment(reservation.apartment_id)?;
            let request = PaymentRequest::new(format!("DEP-{}", reservation.id), deposit.amount_minor)
                .with_currency(&deposit.currency)
                .with_description(format!("Deposit for {}", apartment.name));

            let intent = self.payment.create_payment(&request).await?;
            self.store
                .set_deposit_transaction(deposit.id, &intent.transaction_id)?;

            info!(
                reservation_id = %reservation.id,
                transaction_id = %intent.transaction_id,
                "deposit payment opened"
            );
            return Ok(DepositPayment::Redirect {
                transaction_id: intent.transaction_id,
                payment_url: intent.payment_url,
            });
        }

        if !self.options.allow_mock_payments {
            return Err(EngineError::Provider(ProviderError::configuration(
                "payment provider is not configured",
            )));
        }

        // Development fallback. Unreachable with real credentials present:
        // a configured provider always takes the branch above.
        let transaction_id = format!(
            "MOCK-{}-{}",
            now.timestamp_millis(),
            card_hint.unwrap_or("****")
        );
        self.store
            .mark_deposit_paid(deposit.id, &transaction_id, now)?;

        let apartment = self.store.apartment(reservation.apartment_id)?;
        self.notifier.deposit_paid(&DepositPaid {
            owner_id: apartment.owner_id,
            reservation_id: reservation.id,
            guest_name: reservation.guest_name.clone(),
            apartment_name: apartment.name,
            amount_minor: deposit.amount_minor,
            currency: deposit.currency.clone(),
        });

        info!(
            reservation_id = %reservation.id,
            transaction_id = %transaction_id,
            "deposit mock-paid (no payment provider configured)"
        );
        Ok(DepositPayment::MockPaid { transaction_id })
    }

    /// Applies a verified payment-status update to the matching deposit.
    ///
    /// The caller verifies the callback signature first (the vendor client
    /// refuses unverified payloads); this only moves the deposit.
    pub fn apply_payment_status(&self, status: &PaymentStatus) -> EngineResult<Deposit> {
        let deposit = self
            .store
            .deposit_by_transaction(&status.transaction_id)?
            .ok_or(EngineError::NotFound { entity: "deposit" })?;

        let deposit = match status.state {
            PaymentState::Success => {
                if deposit.status == DepositStatus::Paid {
                    deposit
                } else {
                    let paid = self.store.mark_deposit_paid(
                        deposit.id,
                        &status.transaction_id,
                        Utc::now(),
                    )?;
                    let reservation = self.store.reservation(paid.reservation_id)?;
                    let apartment = self.store.apartment(reservation.apartment_id)?;
                    self.notifier.deposit_paid(&DepositPaid {
                        owner_id: apartment.owner_id,
                        reservation_id: reservation.id,
                        guest_name: reservation.guest_name.clone(),
                        apartment_name: apartment.name,
                        amount_minor: paid.amount_minor,
                        currency: paid.currency.clone(),
                    });
                    paid
                }
            }
            PaymentState::Refunded => self.store.mark_deposit_refunded(deposit.id)?,
            PaymentState::Pending | PaymentState::Failed => deposit,
        };

        debug!(
            transaction_id = %status.transaction_id,
            state = %status.state,
            "payment status applied"
        );
        Ok(deposit)
    }

    /// Records the owner's manual confirmation of a paid deposit.
    ///
    /// Bookkeeping only; has no effect on the guest's progression.
    pub fn confirm_deposit(&self, deposit_id: Uuid) -> EngineResult<Deposit> {
        let deposit = self.store.deposit(deposit_id)?;
        if deposit.status != DepositStatus::Paid {
            return Err(EngineError::precondition(
                PreconditionKind::DepositNotPaid,
                "only paid deposits can be confirmed",
            ));
        }
        Ok(self.store.confirm_deposit(deposit_id, Utc::now())?)
    }

    /// Completes check-in and issues the access code.
    ///
    /// Guards: at least one document, passport approved, deposit satisfied
    /// when required. Retried calls return the already-issued code
    /// untouched. Lock-vendor registration is best-effort: its failure is
    /// logged and swallowed, and the code stays usable manually.
    pub async fn complete(&self, token: &str) -> EngineResult<CompletedCheckin> {
        self.complete_at(token, Utc::now()).await
    }

    /// [`Self::complete`] against an explicit clock.
    pub async fn complete_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<CompletedCheckin> {
        let reservation = self.store.reservation_by_token(token)?;

        let guest = self
            .store
            .guest_for_reservation(reservation.id)?
            .filter(|g| !g.documents.is_empty())
            .ok_or_else(|| {
                EngineError::precondition(
                    PreconditionKind::DocumentsMissing,
                    "please upload identity documents first",
                )
            })?;

        match guest.passport_status {
            PassportStatus::Approved => {}
            PassportStatus::Pending => {
                return Err(EngineError::precondition(
                    PreconditionKind::PassportPending,
                    "identity documents are pending review",
                ));
            }
            PassportStatus::Rejected => {
                return Err(EngineError::precondition_with_detail(
                    PreconditionKind::PassportRejected,
                    "identity documents were rejected, please re-upload",
                    guest.rejection_reason.clone(),
                ));
            }
        }

        if reservation.deposit_required {
            let paid = self
                .store
                .deposit_for_reservation(reservation.id)?
                .is_some_and(|d| d.status == DepositStatus::Paid);
            if !paid {
                return Err(EngineError::precondition(
                    PreconditionKind::DepositUnpaid,
                    "the deposit has not been paid",
                ));
            }
        }

        // Retried completion: hand back the code that already exists.
        if let Some(existing) = self.store.access_code_for_reservation(reservation.id)? {
            return Ok(CompletedCheckin {
                access_code: existing,
                lock_registered: false,
            });
        }

        let apartment = self.store.apartment(reservation.apartment_id)?;
        let code = new_access_code();
        let lock_registered = self
            .register_passcode(&apartment, &reservation, &code)
            .await;

        let access_code = AccessCode::new(
            reservation.id,
            apartment.lock_id.as_deref().unwrap_or(MANUAL_LOCK_ID),
            code,
            reservation.check_in,
            reservation.check_out,
        );
        let access_code = self.store.insert_access_code_if_absent(access_code)?;
        self.store.record_checkin(reservation.id, now)?;
        self.store
            .set_reservation_status(reservation.id, ReservationStatus::CheckedIn)?;

        info!(
            reservation_id = %reservation.id,
            lock_registered,
            "check-in completed, access code issued"
        );
        Ok(CompletedCheckin {
            access_code,
            lock_registered,
        })
    }

    /// Registers the code with the lock vendor, best-effort.
    ///
    /// Returns whether registration happened. Every failure mode here is
    /// deliberate non-fatal: the code remains usable on the keypad.
    async fn register_passcode(
        &self,
        apartment: &Apartment,
        reservation: &Reservation,
        code: &str,
    ) -> bool {
        let Some(ref lock_id) = apartment.lock_id else {
            return false;
        };
        if !self.lock.is_configured() {
            return false;
        }
        let lock_token = match self.store.lock_token_for_owner(apartment.owner_id) {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!(owner_id = %apartment.owner_id, "no lock token stored; skipping vendor registration");
                return false;
            }
            Err(error) => {
                warn!(error = %error, "lock token lookup failed; skipping vendor registration");
                return false;
            }
        };

        let spec = PasscodeSpec {
            code: code.to_string(),
            valid_from: reservation.check_in,
            valid_until: reservation.check_out,
            label: format!("Guest: {}", reservation.guest_name),
        };
        match self
            .lock
            .create_passcode(&lock_token.access_token, lock_id, spec)
            .await
        {
            Ok(passcode_id) => {
                debug!(passcode_id = %passcode_id, "passcode registered with lock vendor");
                true
            }
            Err(error) => {
                // Swallowed: the code still works when typed on the keypad.
                warn!(error = %error, "lock vendor registration failed; code stays usable manually");
                false
            }
        }
    }

    /// Opens the door for a checked-in guest.
    ///
    /// Valid only while the reservation is checked in and the current time
    /// falls within the code's validity window. The vendor call is
    /// best-effort: when it is absent or fails, the caller still gets a
    /// degraded success so the guest is not stranded at the door.
    pub async fn unlock(&self, token: &str) -> EngineResult<UnlockOutcome> {
        self.unlock_at(token, Utc::now()).await
    }

    /// [`Self::unlock`] against an explicit clock.
    pub async fn unlock_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<UnlockOutcome> {
        let reservation = self.store.reservation_by_token(token)?;

        if reservation.status != ReservationStatus::CheckedIn {
            return Err(EngineError::precondition(
                PreconditionKind::NotCheckedIn,
                "check-in is not completed",
            ));
        }

        let code = self
            .store
            .access_code_for_reservation(reservation.id)?
            .ok_or_else(|| {
                EngineError::precondition(
                    PreconditionKind::AccessCodeMissing,
                    "no access code found",
                )
            })?;

        if !code.usable_at(now) {
            return Err(EngineError::precondition(
                PreconditionKind::OutsideAccessWindow,
                "access code is not valid at this time",
            ));
        }

        info!(reservation_id = %reservation.id, at = %now, "door unlock requested");

        let apartment = self.store.apartment(reservation.apartment_id)?;
        if let Some(ref lock_id) = apartment.lock_id
            && self.lock.is_configured()
            && let Some(lock_token) = self.store.lock_token_for_owner(apartment.owner_id)?
        {
            match self.lock.unlock(&lock_token.access_token, lock_id).await {
                Ok(()) => {
                    return Ok(UnlockOutcome {
                        via_lock: true,
                        message: "door unlocked via smart lock".into(),
                    });
                }
                Err(error) => {
                    // Swallowed: degraded success keeps the guest moving.
                    warn!(error = %error, "vendor unlock failed; reporting demo-mode success");
                }
            }
        }

        Ok(UnlockOutcome {
            via_lock: false,
            message: "unlock command sent (demo mode)".into(),
        })
    }
}

fn snapshot(
    reservation: &Reservation,
    guest: Option<&GuestRecord>,
    deposit: Option<&Deposit>,
    access_code: Option<&AccessCode>,
) -> StageSnapshot {
    StageSnapshot {
        document_count: guest.map_or(0, |g| g.documents.len()),
        consent_given: guest.is_some_and(|g| g.consent_given),
        passport_status: guest.map_or(PassportStatus::Pending, |g| g.passport_status),
        deposit_required: reservation.deposit_required,
        deposit_paid: deposit.is_some_and(|d| d.status == DepositStatus::Paid),
        access_code_issued: access_code.is_some(),
    }
}
