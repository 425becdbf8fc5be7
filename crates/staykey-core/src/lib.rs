//! Core types: stay ranges, feed decoding, channels, statuses, check-in stages

pub mod channel;
pub mod guest;
pub mod ical;
pub mod stage;
pub mod status;
pub mod time;
pub mod tracing;

pub use channel::{BookingChannel, ReservationSource, classify_feed_url};
pub use guest::{GENERIC_GUEST_NAME, GuestInfo, extract_guest_info, is_valid_email, is_valid_phone};
pub use ical::{FeedEvent, decode_feed, filter_active};
pub use stage::{CheckinStage, StageSnapshot, derive_stage};
pub use status::{
    DepositStatus, PassportStatus, ReservationStatus, effective_reservation_status,
};
pub use time::{StayRange, local_instant, local_midnight};
pub use crate::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
