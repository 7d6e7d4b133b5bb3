use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;

use super::queries;
use crate::models::{Booking, BookingStatus, Court, NewCourt};

/// Durable rows for courts and bookings. The booking engine only talks to
/// storage through this trait.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get_court(&self, id: i64) -> anyhow::Result<Option<Court>>;

    async fn list_courts(&self) -> anyhow::Result<Vec<Court>>;

    async fn insert_court(&self, court: NewCourt) -> anyhow::Result<Court>;

    async fn insert_booking(&self, booking: Booking) -> anyhow::Result<()>;

    async fn get_booking(&self, id: &str) -> anyhow::Result<Option<Booking>>;

    async fn bookings_for_court_on(
        &self,
        court_id: i64,
        date: NaiveDate,
    ) -> anyhow::Result<Vec<Booking>>;

    async fn bookings_for_user(&self, user_email: &str) -> anyhow::Result<Vec<Booking>>;

    /// Compare-and-set status write. Returns false if the booking is not in
    /// `expected` any more.
    async fn update_booking_status(
        &self,
        id: &str,
        expected: BookingStatus,
        next: BookingStatus,
        cancellation_reason: Option<String>,
        updated_at: NaiveDateTime,
    ) -> anyhow::Result<bool>;
}

/// SQLite-backed store. Queries run on the blocking pool so a slow disk never
/// stalls the async workers.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    pub fn open(path: &str) -> anyhow::Result<Self> {
        Ok(Self::new(super::init_db(path)?))
    }

    async fn run<T, F>(&self, f: F) -> anyhow::Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> anyhow::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| anyhow::anyhow!("database connection mutex poisoned"))?;
            f(&conn)
        })
        .await?
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn get_court(&self, id: i64) -> anyhow::Result<Option<Court>> {
        self.run(move |conn| queries::get_court(conn, id)).await
    }

    async fn list_courts(&self) -> anyhow::Result<Vec<Court>> {
        self.run(queries::list_courts).await
    }

    async fn insert_court(&self, court: NewCourt) -> anyhow::Result<Court> {
        self.run(move |conn| queries::insert_court(conn, &court)).await
    }

    async fn insert_booking(&self, booking: Booking) -> anyhow::Result<()> {
        self.run(move |conn| queries::create_booking(conn, &booking))
            .await
    }

    async fn get_booking(&self, id: &str) -> anyhow::Result<Option<Booking>> {
        let id = id.to_string();
        self.run(move |conn| queries::get_booking_by_id(conn, &id))
            .await
    }

    async fn bookings_for_court_on(
        &self,
        court_id: i64,
        date: NaiveDate,
    ) -> anyhow::Result<Vec<Booking>> {
        self.run(move |conn| queries::get_bookings_for_court_on(conn, court_id, date))
            .await
    }

    async fn bookings_for_user(&self, user_email: &str) -> anyhow::Result<Vec<Booking>> {
        let user_email = user_email.to_string();
        self.run(move |conn| queries::get_bookings_for_user(conn, &user_email))
            .await
    }

    async fn update_booking_status(
        &self,
        id: &str,
        expected: BookingStatus,
        next: BookingStatus,
        cancellation_reason: Option<String>,
        updated_at: NaiveDateTime,
    ) -> anyhow::Result<bool> {
        let id = id.to_string();
        self.run(move |conn| {
            queries::update_booking_status(
                conn,
                &id,
                expected,
                next,
                cancellation_reason.as_deref(),
                &updated_at,
            )
        })
        .await
    }
}
