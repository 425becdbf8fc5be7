//! Status enums for reservations, passports, and deposits.
//!
//! Every status the system persists is a closed variant set, matched
//! exhaustively at each consumption site. Serde representation is the
//! snake_case string form the dashboards and stores exchange.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// Created, guest not yet checked in.
    Pending,
    /// Guest completed the check-in workflow.
    CheckedIn,
    /// Stay finished; housekeeping status, never set by the check-in flow.
    Completed,
    /// Reservation withdrawn; frees the dates.
    Cancelled,
}

impl ReservationStatus {
    /// Returns the status identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::CheckedIn => "checked_in",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns true unless the reservation was cancelled.
    ///
    /// Active reservations participate in overlap checks.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Review status of a guest's uploaded identity documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassportStatus {
    /// Waiting for the owner's decision. Re-uploads reset to this.
    Pending,
    /// Owner approved the documents.
    Approved,
    /// Owner rejected the documents; a reason accompanies this state.
    Rejected,
}

impl PassportStatus {
    /// Returns the status identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for PassportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment status of a deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositStatus {
    /// Created but not paid.
    Pending,
    /// Payment confirmed by the provider or the mock path.
    Paid,
    /// Returned to the guest.
    Refunded,
    /// Reserved for pre-authorization support; no operation produces it yet.
    Held,
}

impl DepositStatus {
    /// Returns the status identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Refunded => "refunded",
            Self::Held => "held",
        }
    }
}

impl fmt::Display for DepositStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derives the display status of a reservation from the clock.
///
/// Cancelled and completed are sticky; otherwise the stay window decides:
/// pending before check-in, checked-in during the stay, completed after
/// checkout. Dashboards use this view; the stored status is not rewritten.
pub fn effective_reservation_status(
    status: ReservationStatus,
    check_in: DateTime<Utc>,
    check_out: DateTime<Utc>,
    now: DateTime<Utc>,
) -> ReservationStatus {
    match status {
        ReservationStatus::Cancelled | ReservationStatus::Completed => status,
        _ => {
            if now < check_in {
                ReservationStatus::Pending
            } else if now <= check_out {
                ReservationStatus::CheckedIn
            } else {
                ReservationStatus::Completed
            }
        }
    }
}
