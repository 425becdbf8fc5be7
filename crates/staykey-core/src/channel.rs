//! Booking-channel identity.
//!
//! A feed URL tells us which platform a calendar came from. Detection is
//! data-driven: a table of host substrings maps to channels, and anything
//! unrecognized lands in the generic bucket. New channels only need a table
//! entry, never a call-site change.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A known booking platform, or the generic bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingChannel {
    Airbnb,
    Booking,
    Other,
}

impl BookingChannel {
    /// Returns the channel's identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Airbnb => "airbnb",
            Self::Booking => "booking",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for BookingChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Host substrings that identify a channel, checked in order.
const CHANNEL_HOSTS: &[(&str, BookingChannel)] = &[
    ("airbnb.com", BookingChannel::Airbnb),
    ("abnb.me", BookingChannel::Airbnb),
    ("admin.booking.com", BookingChannel::Booking),
    ("booking.com", BookingChannel::Booking),
];

/// Infers the booking channel from a feed URL.
pub fn classify_feed_url(url: &str) -> BookingChannel {
    let lower = url.to_ascii_lowercase();
    CHANNEL_HOSTS
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, channel)| *channel)
        .unwrap_or(BookingChannel::Other)
}

/// Where a reservation came from.
///
/// Either created by hand on the dashboard, or materialized from an external
/// calendar feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationSource {
    Manual,
    Airbnb,
    Booking,
    Other,
}

impl ReservationSource {
    /// Returns the source's identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Airbnb => "airbnb",
            Self::Booking => "booking",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ReservationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<BookingChannel> for ReservationSource {
    fn from(channel: BookingChannel) -> Self {
        match channel {
            BookingChannel::Airbnb => Self::Airbnb,
            BookingChannel::Booking => Self::Booking,
            BookingChannel::Other => Self::Other,
        }
    }
}
