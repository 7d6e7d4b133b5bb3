use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use crate::db::RecordStore;
use crate::errors::BookingError;
use crate::models::{Booking, Slot};

use super::bounded;

/// Answers whether a candidate slot collides with a live booking. Reads the
/// store on every call and never writes.
pub struct ConflictChecker {
    store: Arc<dyn RecordStore>,
    timeout: Duration,
}

impl ConflictChecker {
    pub fn new(store: Arc<dyn RecordStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub async fn has_conflict(
        &self,
        court_id: i64,
        date: NaiveDate,
        slot: Slot,
    ) -> Result<bool, BookingError> {
        Ok(!self.find_conflicts(court_id, date, slot).await?.is_empty())
    }

    /// The live slots on (court, date) that overlap `slot`, earliest first.
    pub async fn find_conflicts(
        &self,
        court_id: i64,
        date: NaiveDate,
        slot: Slot,
    ) -> Result<Vec<Slot>, BookingError> {
        let existing = bounded(self.timeout, self.store.bookings_for_court_on(court_id, date)).await?;
        Ok(overlapping(&existing, slot))
    }
}

/// Slots of non-cancelled bookings that overlap `candidate` under the
/// half-open test. Touching endpoints are not a conflict.
pub fn overlapping(existing: &[Booking], candidate: Slot) -> Vec<Slot> {
    existing
        .iter()
        .filter(|b| b.holds_slot())
        .map(Booking::slot)
        .filter(|s| s.overlaps(&candidate))
        .collect()
}
