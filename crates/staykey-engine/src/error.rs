//! Engine error taxonomy.
//!
//! Five things can go wrong with an operation: the target is missing, a
//! state-machine guard refused it, the dates collide, an upstream provider
//! failed, or the input was malformed. Each is a distinct variant so call
//! sites and API layers can react without string matching. Nothing here is
//! process-fatal; every error is scoped to one operation.

use std::fmt;

use thiserror::Error;

use staykey_providers::ProviderError;

use crate::model::BookingConflict;
use crate::store::StoreError;

/// Which state-machine guard refused an operation.
///
/// `PassportPending` ("please wait"), `PassportRejected` ("re-upload"), and
/// everything else are deliberately distinct: the guest flow renders them as
/// different screens, not one generic failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreconditionKind {
    /// No identity documents uploaded yet.
    DocumentsMissing,
    /// Documents are waiting for the owner's review.
    PassportPending,
    /// Documents were rejected; the guest must re-upload.
    PassportRejected,
    /// A required deposit has not been paid.
    DepositUnpaid,
    /// The reservation does not take a deposit.
    DepositNotRequired,
    /// The deposit was already paid.
    DepositAlreadyPaid,
    /// Only paid deposits can be confirmed.
    DepositNotPaid,
    /// Consent was already recorded (strict mode only).
    AlreadyConsented,
    /// The passport was already decided (strict mode only).
    AlreadyReviewed,
    /// The reservation has not completed check-in.
    NotCheckedIn,
    /// No access code exists for the reservation.
    AccessCodeMissing,
    /// The current time is outside the access code's validity window.
    OutsideAccessWindow,
}

impl PreconditionKind {
    /// Returns the snake_case name of this guard.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocumentsMissing => "documents_missing",
            Self::PassportPending => "passport_pending",
            Self::PassportRejected => "passport_rejected",
            Self::DepositUnpaid => "deposit_unpaid",
            Self::DepositNotRequired => "deposit_not_required",
            Self::DepositAlreadyPaid => "deposit_already_paid",
            Self::DepositNotPaid => "deposit_not_paid",
            Self::AlreadyConsented => "already_consented",
            Self::AlreadyReviewed => "already_reviewed",
            Self::NotCheckedIn => "not_checked_in",
            Self::AccessCodeMissing => "access_code_missing",
            Self::OutsideAccessWindow => "outside_access_window",
        }
    }
}

impl fmt::Display for PreconditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error from an engine operation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The addressed record does not exist (or the token is unknown).
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// The reservation can no longer be acted on.
    #[error("reservation is closed: {reason}")]
    ReservationClosed { reason: String },

    /// A state-machine guard refused the operation.
    #[error("{message}")]
    Precondition {
        kind: PreconditionKind,
        message: String,
        /// Extra context for the guest, e.g. a rejection reason.
        detail: Option<String>,
    },

    /// The candidate dates collide with an existing booking.
    #[error("dates conflict with an existing booking")]
    Conflict(BookingConflict),

    /// The caller failed the entry point's credential check.
    #[error("unauthorized")]
    Unauthorized,

    /// Malformed input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An upstream provider call failed and the operation could not
    /// proceed without it.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The persistence layer failed in a way the operation cannot express.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl EngineError {
    /// Creates a precondition error.
    pub fn precondition(kind: PreconditionKind, message: impl Into<String>) -> Self {
        Self::Precondition {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    /// Creates a precondition error carrying extra context.
    pub fn precondition_with_detail(
        kind: PreconditionKind,
        message: impl Into<String>,
        detail: Option<String>,
    ) -> Self {
        Self::Precondition {
            kind,
            message: message.into(),
            detail,
        }
    }

    /// Returns the precondition kind, when this is a guard refusal.
    pub fn precondition_kind(&self) -> Option<PreconditionKind> {
        match self {
            Self::Precondition { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => Self::NotFound { entity },
            StoreError::ReservationOverlap(conflict) => Self::Conflict(conflict),
            StoreError::Duplicate(what) => Self::Storage(format!("duplicate {what}")),
        }
    }
}

/// A specialized Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
