use std::sync::Arc;
use std::time::Duration;

use crate::db::RecordStore;
use crate::errors::BookingError;
use crate::models::{Court, NewCourt};

use super::bounded;

/// Read-mostly view of registered courts.
pub struct CourtDirectory {
    store: Arc<dyn RecordStore>,
    timeout: Duration,
}

impl CourtDirectory {
    pub fn new(store: Arc<dyn RecordStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub async fn get_court(&self, id: i64) -> Result<Option<Court>, BookingError> {
        bounded(self.timeout, self.store.get_court(id)).await
    }

    /// Like [`get_court`](Self::get_court) but a missing court is an error.
    pub async fn require_court(&self, id: i64) -> Result<Court, BookingError> {
        self.get_court(id)
            .await?
            .ok_or_else(|| BookingError::court_not_found(id))
    }

    pub async fn list_courts(&self) -> Result<Vec<Court>, BookingError> {
        bounded(self.timeout, self.store.list_courts()).await
    }

    pub async fn register_court(&self, court: NewCourt) -> Result<Court, BookingError> {
        let court = bounded(self.timeout, self.store.insert_court(court)).await?;
        tracing::info!(court_id = court.id, owner = %court.owner_email, "registered court");
        Ok(court)
    }
}
