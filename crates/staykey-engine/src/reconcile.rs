//! Calendar reconciliation.
//!
//! Pulls each configured feed, decodes it, and mirrors the events into the
//! store under their `(apartment, uid)` natural key, idempotently: re-running
//! against an unchanged feed only rewrites what is already there. New events
//! may additionally materialize a pending reservation, but only on the
//! creation path and only when the event names a real guest.
//!
//! Feeds fail independently: one broken URL never aborts the apartment's
//! other feeds, it just leaves that feed's last-sync stamp where it was.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use staykey_core::{
    FeedEvent, ReservationSource, ReservationStatus, classify_feed_url, decode_feed,
    extract_guest_info, filter_active,
};
use staykey_providers::FeedSource;

use crate::error::{EngineError, EngineResult};
use crate::model::{Apartment, FeedSlot, Reservation};
use crate::store::{EventWrite, Store, StoreError};
use crate::token::new_checkin_token;

/// Configuration for the reconciliation engine.
#[derive(Debug, Clone, Default)]
pub struct ReconcileConfig {
    /// Shared secret guarding the scheduled bulk entry point. When unset,
    /// the guarded entry point refuses every caller.
    pub sync_secret: Option<String>,
}

impl ReconcileConfig {
    /// Builder: set the sync secret.
    #[must_use]
    pub fn with_sync_secret(mut self, secret: impl Into<String>) -> Self {
        self.sync_secret = Some(secret.into());
        self
    }
}

/// What one feed's sync produced.
#[derive(Debug, Clone, Serialize)]
pub struct FeedOutcome {
    pub slot: FeedSlot,
    /// Events decoded and still relevant (ongoing or future).
    pub events_seen: usize,
    /// Events inserted for the first time.
    pub created: usize,
    /// Known events rewritten in place.
    pub updated: usize,
    /// Reservations materialized from newly created events.
    pub reservations_created: usize,
}

/// One apartment's sync result.
#[derive(Debug, Clone, Serialize)]
pub struct ApartmentSyncReport {
    pub apartment_id: Uuid,
    pub apartment_name: String,
    /// True when at least one configured feed synced.
    pub success: bool,
    /// Active events seen across all feeds that synced.
    pub events: usize,
    pub created: usize,
    pub updated: usize,
    pub error: Option<String>,
    pub feeds: Vec<FeedOutcome>,
}

/// The bulk sync result.
#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    /// Apartments that synced at least one feed.
    pub synced: usize,
    /// Apartments attempted.
    pub total: usize,
    /// Active events seen across all apartments.
    pub total_events: usize,
    pub reports: Vec<ApartmentSyncReport>,
}

/// Merges external calendar feeds into the store.
pub struct ReconcileEngine {
    store: Arc<dyn Store>,
    feeds: Arc<dyn FeedSource>,
    config: ReconcileConfig,
}

impl ReconcileEngine {
    /// Creates an engine over the given store and feed source.
    pub fn new(store: Arc<dyn Store>, feeds: Arc<dyn FeedSource>, config: ReconcileConfig) -> Self {
        Self {
            store,
            feeds,
            config,
        }
    }

    /// Syncs one apartment's configured feeds now.
    pub async fn sync_apartment(&self, apartment_id: Uuid) -> EngineResult<ApartmentSyncReport> {
        self.sync_apartment_at(apartment_id, Utc::now()).await
    }

    /// Syncs one apartment's configured feeds, judging event relevance
    /// against the given instant.
    pub async fn sync_apartment_at(
        &self,
        apartment_id: Uuid,
        now: DateTime<Utc>,
    ) -> EngineResult<ApartmentSyncReport> {
        let apartment = self.store.apartment(apartment_id)?;
        let configured = apartment.feeds.configured();
        if configured.is_empty() {
            return Err(EngineError::Validation(
                "no calendar feed is configured for this apartment".into(),
            ));
        }
        Ok(self.sync_feeds(&apartment, &configured, now).await)
    }

    /// Syncs every active apartment with at least one configured feed.
    pub async fn sync_all(&self) -> EngineResult<SyncSummary> {
        self.sync_all_at(Utc::now()).await
    }

    /// Bulk sync against the given instant.
    pub async fn sync_all_at(&self, now: DateTime<Utc>) -> EngineResult<SyncSummary> {
        let apartments = self.store.active_apartments_with_feeds()?;
        info!(apartments = apartments.len(), "starting bulk calendar sync");

        let mut reports = Vec::with_capacity(apartments.len());
        for apartment in &apartments {
            let configured = apartment.feeds.configured();
            let report = self.sync_feeds(apartment, &configured, now).await;
            info!(
                apartment = %report.apartment_name,
                success = report.success,
                events = report.events,
                "apartment sync finished"
            );
            reports.push(report);
        }

        let synced = reports.iter().filter(|r| r.success).count();
        let total_events = reports.iter().map(|r| r.events).sum();
        info!(
            synced,
            total = reports.len(),
            total_events,
            "bulk calendar sync completed"
        );

        Ok(SyncSummary {
            synced,
            total: reports.len(),
            total_events,
            reports,
        })
    }

    /// Bulk sync behind the scheduler's bearer-token guard.
    ///
    /// `authorization` is the raw Authorization header value. With no
    /// secret configured, every caller is refused.
    pub async fn sync_all_guarded(
        &self,
        authorization: Option<&str>,
    ) -> EngineResult<SyncSummary> {
        let Some(ref secret) = self.config.sync_secret else {
            return Err(EngineError::Unauthorized);
        };
        let expected = format!("Bearer {secret}");
        if authorization != Some(expected.as_str()) {
            return Err(EngineError::Unauthorized);
        }
        self.sync_all().await
    }

    async fn sync_feeds(
        &self,
        apartment: &Apartment,
        configured: &[(FeedSlot, String)],
        now: DateTime<Utc>,
    ) -> ApartmentSyncReport {
        let mut outcomes = Vec::new();
        let mut synced_slots = Vec::new();

        for (slot, url) in configured {
            match self.sync_feed(apartment, *slot, url, now).await {
                Ok(outcome) => {
                    synced_slots.push((*slot, Utc::now()));
                    outcomes.push(outcome);
                }
                Err(error) => {
                    // The slot's last-sync stamp is simply not advanced.
                    warn!(
                        apartment = %apartment.name,
                        slot = %slot,
                        error = %error,
                        "feed sync failed"
                    );
                }
            }
        }

        if !synced_slots.is_empty()
            && let Err(error) = self.store.mark_feeds_synced(apartment.id, &synced_slots)
        {
            warn!(
                apartment = %apartment.name,
                error = %error,
                "failed to persist last-sync stamps"
            );
        }

        let success = !outcomes.is_empty();
        ApartmentSyncReport {
            apartment_id: apartment.id,
            apartment_name: apartment.name.clone(),
            success,
            events: outcomes.iter().map(|o| o.events_seen).sum(),
            created: outcomes.iter().map(|o| o.created).sum(),
            updated: outcomes.iter().map(|o| o.updated).sum(),
            error: (!success).then(|| "all configured feeds failed".to_string()),
            feeds: outcomes,
        }
    }

    async fn sync_feed(
        &self,
        apartment: &Apartment,
        slot: FeedSlot,
        url: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<FeedOutcome> {
        let body = self.feeds.fetch(url).await?;
        let events = filter_active(decode_feed(&body), now, true);
        let source = slot_source(slot, url);

        let mut outcome = FeedOutcome {
            slot,
            events_seen: events.len(),
            created: 0,
            updated: 0,
            reservations_created: 0,
        };

        for event in &events {
            match self.store.record_event(
                apartment.id,
                &event.uid,
                event.summary.clone(),
                event.start,
                event.end,
            )? {
                EventWrite::Updated(_) => outcome.updated += 1,
                EventWrite::Created(_) => {
                    outcome.created += 1;
                    if self.materialize_reservation(apartment, event, source)? {
                        outcome.reservations_created += 1;
                    }
                }
            }
        }

        debug!(
            apartment = %apartment.name,
            slot = %slot,
            events = outcome.events_seen,
            created = outcome.created,
            updated = outcome.updated,
            "feed synced"
        );
        Ok(outcome)
    }

    /// Turns a newly created event into a pending reservation, unless the
    /// event is placeholder-named or the exact stay already exists.
    fn materialize_reservation(
        &self,
        apartment: &Apartment,
        event: &FeedEvent,
        source: ReservationSource,
    ) -> EngineResult<bool> {
        // An inverted block cannot be a stay; it is mirrored as an event but
        // never becomes a reservation.
        if event.start >= event.end {
            return Ok(false);
        }

        let info = extract_guest_info(event.summary.as_deref(), event.description.as_deref());
        if info.is_placeholder() {
            return Ok(false);
        }

        // Guards against re-materializing a stay that was already converted
        // in an earlier sync, even if its event row were missing.
        if self
            .store
            .reservation_with_exact_dates(apartment.id, event.start, event.end)?
            .is_some()
        {
            return Ok(false);
        }

        let reservation = Reservation {
            id: Uuid::new_v4(),
            apartment_id: apartment.id,
            guest_name: info.name,
            guest_phone: info.phone.unwrap_or_default(),
            guest_email: None,
            check_in: event.start,
            check_out: event.end,
            status: ReservationStatus::Pending,
            source,
            external_uid: Some(event.uid.clone()),
            checkin_token: new_checkin_token(),
            deposit_required: false,
            deposit_amount_minor: None,
            notes: None,
            created_at: Utc::now(),
        };

        match self.store.insert_reservation(reservation) {
            Ok(created) => {
                info!(
                    reservation_id = %created.id,
                    apartment = %apartment.name,
                    guest = %created.guest_name,
                    uid = %event.uid,
                    "reservation materialized from feed event"
                );
                Ok(true)
            }
            Err(StoreError::ReservationOverlap(_)) => {
                // The event still blocks availability; only the reservation
                // is skipped.
                warn!(
                    apartment = %apartment.name,
                    uid = %event.uid,
                    "feed event overlaps an existing reservation; not materialized"
                );
                Ok(false)
            }
            Err(other) => Err(other.into()),
        }
    }
}

/// Attributes a reservation source to a feed slot.
///
/// The channel slots speak for themselves; the legacy slot falls back to
/// classifying its URL.
fn slot_source(slot: FeedSlot, url: &str) -> ReservationSource {
    match slot {
        FeedSlot::Airbnb => ReservationSource::Airbnb,
        FeedSlot::Booking => ReservationSource::Booking,
        FeedSlot::Legacy => ReservationSource::from(classify_feed_url(url)),
    }
}
