use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, Timelike, Utc};
use tokio::sync::broadcast;

use crate::db::RecordStore;
use crate::errors::BookingError;
use crate::models::{Booking, BookingEvent, BookingEventKind, BookingStatus, NewBooking};

use super::bounded;
use super::conflict::ConflictChecker;
use super::directory::CourtDirectory;
use super::events;
use super::locks::SlotLocks;

/// Sole writer of booking rows. Admits new bookings after a conflict check
/// and drives every later status change.
pub struct BookingManager {
    store: Arc<dyn RecordStore>,
    directory: Arc<CourtDirectory>,
    checker: ConflictChecker,
    locks: SlotLocks,
    timeout: Duration,
    events: broadcast::Sender<BookingEvent>,
}

impl BookingManager {
    pub fn new(
        store: Arc<dyn RecordStore>,
        directory: Arc<CourtDirectory>,
        timeout: Duration,
        events: broadcast::Sender<BookingEvent>,
    ) -> Self {
        Self {
            checker: ConflictChecker::new(Arc::clone(&store), timeout),
            store,
            directory,
            locks: SlotLocks::new(),
            timeout,
            events,
        }
    }

    pub fn checker(&self) -> &ConflictChecker {
        &self.checker
    }

    pub async fn create_booking(&self, req: NewBooking) -> Result<Booking, BookingError> {
        let guard = self.locks.acquire(req.court_id, req.date).await;

        let court = self.directory.require_court(req.court_id).await?;
        if !court.is_available {
            return Err(BookingError::CourtUnavailable(court.id));
        }

        let conflicts = self
            .checker
            .find_conflicts(req.court_id, req.date, req.slot)
            .await?;
        if !conflicts.is_empty() {
            tracing::info!(
                court_id = req.court_id,
                date = %req.date,
                slot = %req.slot,
                conflicts = conflicts.len(),
                "rejected overlapping booking"
            );
            return Err(BookingError::SlotConflict { conflicts });
        }

        let now = store_timestamp();
        let booking = Booking {
            id: uuid::Uuid::new_v4().to_string(),
            court_id: req.court_id,
            user_email: req.user_email,
            user_name: req.user_name,
            date: req.date,
            start_time: req.slot.start,
            end_time: req.slot.end,
            status: BookingStatus::Pending,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        };
        bounded(self.timeout, self.store.insert_booking(booking.clone())).await?;
        drop(guard);

        tracing::info!(
            booking_id = %booking.id,
            court_id = booking.court_id,
            date = %booking.date,
            slot = %booking.slot(),
            minutes = booking.slot().duration_minutes(),
            "booking created"
        );
        events::publish(&self.events, BookingEventKind::Created, &booking);
        Ok(booking)
    }

    pub async fn confirm_booking(&self, id: &str) -> Result<Booking, BookingError> {
        self.transition(id, BookingStatus::Confirmed, None).await
    }

    pub async fn activate_booking(&self, id: &str) -> Result<Booking, BookingError> {
        self.transition(id, BookingStatus::Active, None).await
    }

    pub async fn complete_booking(&self, id: &str) -> Result<Booking, BookingError> {
        self.transition(id, BookingStatus::Completed, None).await
    }

    /// Cancel with a non-empty reason. The slot is free for new bookings as
    /// soon as this returns.
    pub async fn cancel_booking(&self, id: &str, reason: &str) -> Result<Booking, BookingError> {
        self.transition(id, BookingStatus::Cancelled, Some(reason.trim()))
            .await
    }

    pub async fn get_booking(&self, id: &str) -> Result<Booking, BookingError> {
        bounded(self.timeout, self.store.get_booking(id))
            .await?
            .ok_or_else(|| BookingError::booking_not_found(id))
    }

    pub async fn list_by_user(&self, user_email: &str) -> Result<Vec<Booking>, BookingError> {
        bounded(self.timeout, self.store.bookings_for_user(user_email)).await
    }

    /// All bookings on a court for a date, cancelled ones included so callers
    /// can show what happened to a slot.
    pub async fn list_by_court_and_date(
        &self,
        court_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, BookingError> {
        self.directory.require_court(court_id).await?;
        bounded(self.timeout, self.store.bookings_for_court_on(court_id, date)).await
    }

    async fn transition(
        &self,
        id: &str,
        next: BookingStatus,
        reason: Option<&str>,
    ) -> Result<Booking, BookingError> {
        // Court and date never change, so the first read is enough to find
        // the lock; the state itself is re-read under it.
        let located = self.get_booking(id).await?;
        if next == BookingStatus::Cancelled && reason.map_or(true, str::is_empty) {
            return Err(BookingError::MissingReason);
        }

        let guard = self.locks.acquire(located.court_id, located.date).await;
        let mut booking = self.get_booking(id).await?;

        if !booking.status.can_transition_to(next) {
            tracing::warn!(
                booking_id = %id,
                from = %booking.status,
                to = %next,
                "rejected invalid booking transition"
            );
            return Err(BookingError::InvalidTransition {
                from: booking.status,
                to: next,
            });
        }

        let now = store_timestamp();
        let reason = reason.map(str::to_string);
        let updated = bounded(
            self.timeout,
            self.store
                .update_booking_status(id, booking.status, next, reason.clone(), now),
        )
        .await?;
        if !updated {
            // Someone wrote the row without going through this manager.
            let current = self.get_booking(id).await?;
            tracing::warn!(booking_id = %id, status = %current.status, "booking changed underneath transition");
            return Err(BookingError::InvalidTransition {
                from: current.status,
                to: next,
            });
        }
        drop(guard);

        booking.status = next;
        booking.cancellation_reason = reason;
        booking.updated_at = now;

        tracing::info!(booking_id = %id, status = %next, "booking status changed");
        events::publish(&self.events, event_kind(next), &booking);
        Ok(booking)
    }
}

/// Current UTC time at the precision the store keeps.
fn store_timestamp() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}

fn event_kind(status: BookingStatus) -> BookingEventKind {
    match status {
        BookingStatus::Pending => BookingEventKind::Created,
        BookingStatus::Confirmed => BookingEventKind::Confirmed,
        BookingStatus::Active => BookingEventKind::Activated,
        BookingStatus::Completed => BookingEventKind::Completed,
        BookingStatus::Cancelled => BookingEventKind::Cancelled,
    }
}
