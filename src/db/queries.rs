use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::slot::{format_time, DATE_FORMAT, TIME_FORMAT};
use crate::models::{Booking, BookingStatus, Court, NewCourt};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const BOOKING_COLUMNS: &str = "id, court_id, user_email, user_name, date, start_time, end_time, \
     status, cancellation_reason, created_at, updated_at";

const COURT_COLUMNS: &str =
    "id, owner_email, name, location, hourly_price, sport_type, is_available, created_at";

// ── Courts ──

pub fn insert_court(conn: &Connection, court: &NewCourt) -> anyhow::Result<Court> {
    let created_at = Utc::now().naive_utc();
    conn.execute(
        "INSERT INTO courts (owner_email, name, location, hourly_price, sport_type, is_available, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            court.owner_email,
            court.name,
            court.location,
            court.hourly_price,
            court.sport_type,
            court.is_available as i32,
            created_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;

    Ok(Court {
        id: conn.last_insert_rowid(),
        owner_email: court.owner_email.clone(),
        name: court.name.clone(),
        location: court.location.clone(),
        hourly_price: court.hourly_price,
        sport_type: court.sport_type.clone(),
        is_available: court.is_available,
        created_at: parse_timestamp(&created_at.format(TIMESTAMP_FORMAT).to_string())?,
    })
}

pub fn get_court(conn: &Connection, id: i64) -> anyhow::Result<Option<Court>> {
    let court = conn
        .query_row(
            &format!("SELECT {COURT_COLUMNS} FROM courts WHERE id = ?1"),
            params![id],
            |row| Ok(parse_court_row(row)),
        )
        .optional()?;

    court.transpose()
}

pub fn list_courts(conn: &Connection) -> anyhow::Result<Vec<Court>> {
    let mut stmt = conn.prepare(&format!("SELECT {COURT_COLUMNS} FROM courts ORDER BY id ASC"))?;
    let rows = stmt.query_map([], |row| Ok(parse_court_row(row)))?;

    let mut courts = vec![];
    for row in rows {
        courts.push(row??);
    }
    Ok(courts)
}

fn parse_court_row(row: &rusqlite::Row) -> anyhow::Result<Court> {
    let created_at_str: String = row.get(7)?;

    Ok(Court {
        id: row.get(0)?,
        owner_email: row.get(1)?,
        name: row.get(2)?,
        location: row.get(3)?,
        hourly_price: row.get(4)?,
        sport_type: row.get(5)?,
        is_available: row.get::<_, i32>(6)? != 0,
        created_at: parse_timestamp(&created_at_str)?,
    })
}

// ── Bookings ──

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
        ),
        params![
            booking.id,
            booking.court_id,
            booking.user_email,
            booking.user_name,
            booking.date.format(DATE_FORMAT).to_string(),
            format_time(&booking.start_time),
            format_time(&booking.end_time),
            booking.status.as_str(),
            booking.cancellation_reason,
            booking.created_at.format(TIMESTAMP_FORMAT).to_string(),
            booking.updated_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )
    .with_context(|| format!("failed to insert booking {}", booking.id))?;
    Ok(())
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let booking = conn
        .query_row(
            &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
            params![id],
            |row| Ok(parse_booking_row(row)),
        )
        .optional()?;

    booking.transpose()
}

/// Every booking for a court on a date, cancelled ones included, earliest
/// start first.
pub fn get_bookings_for_court_on(
    conn: &Connection,
    court_id: i64,
    date: NaiveDate,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE court_id = ?1 AND date = ?2
         ORDER BY start_time ASC, created_at ASC"
    ))?;

    let rows = stmt.query_map(
        params![court_id, date.format(DATE_FORMAT).to_string()],
        |row| Ok(parse_booking_row(row)),
    )?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

/// Every booking a user ever made, newest date first.
pub fn get_bookings_for_user(conn: &Connection, user_email: &str) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE user_email = ?1
         ORDER BY date DESC, start_time ASC"
    ))?;

    let rows = stmt.query_map(params![user_email], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

/// Move a booking from `expected` to `next`. Returns false when the row is
/// missing or no longer in `expected`.
pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    expected: BookingStatus,
    next: BookingStatus,
    cancellation_reason: Option<&str>,
    updated_at: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, cancellation_reason = ?2, updated_at = ?3
         WHERE id = ?4 AND status = ?5",
        params![
            next.as_str(),
            cancellation_reason,
            updated_at.format(TIMESTAMP_FORMAT).to_string(),
            id,
            expected.as_str(),
        ],
    )?;
    Ok(count > 0)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let id: String = row.get(0)?;
    let date_str: String = row.get(4)?;
    let start_str: String = row.get(5)?;
    let end_str: String = row.get(6)?;
    let status_str: String = row.get(7)?;
    let created_at_str: String = row.get(9)?;
    let updated_at_str: String = row.get(10)?;

    let status = BookingStatus::parse(&status_str)
        .with_context(|| format!("booking {id} has unknown status {status_str:?}"))?;

    Ok(Booking {
        court_id: row.get(1)?,
        user_email: row.get(2)?,
        user_name: row.get(3)?,
        date: NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
            .with_context(|| format!("booking {id} has bad date {date_str:?}"))?,
        start_time: NaiveTime::parse_from_str(&start_str, TIME_FORMAT)
            .with_context(|| format!("booking {id} has bad start time {start_str:?}"))?,
        end_time: NaiveTime::parse_from_str(&end_str, TIME_FORMAT)
            .with_context(|| format!("booking {id} has bad end time {end_str:?}"))?,
        status,
        cancellation_reason: row.get(8)?,
        created_at: parse_timestamp(&created_at_str)?,
        updated_at: parse_timestamp(&updated_at_str)?,
        id,
    })
}

fn parse_timestamp(s: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .with_context(|| format!("bad timestamp {s:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn court(conn: &Connection) -> Court {
        insert_court(
            conn,
            &NewCourt {
                owner_email: "owner@example.com".to_string(),
                name: "Center Court".to_string(),
                location: "Riverside".to_string(),
                hourly_price: 25.0,
                sport_type: "tennis".to_string(),
                is_available: true,
            },
        )
        .unwrap()
    }

    fn booking(id: &str, court_id: i64, email: &str, date: &str, start: &str, end: &str) -> Booking {
        let now = Utc::now().naive_utc();
        Booking {
            id: id.to_string(),
            court_id,
            user_email: email.to_string(),
            user_name: None,
            date: NaiveDate::parse_from_str(date, DATE_FORMAT).unwrap(),
            start_time: NaiveTime::parse_from_str(start, TIME_FORMAT).unwrap(),
            end_time: NaiveTime::parse_from_str(end, TIME_FORMAT).unwrap(),
            status: BookingStatus::Pending,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_court_insert_and_lookup() {
        let conn = setup_db();
        let created = court(&conn);

        let loaded = get_court(&conn, created.id).unwrap().unwrap();
        assert_eq!(loaded.name, "Center Court");
        assert!(loaded.is_available);
        assert_eq!(list_courts(&conn).unwrap().len(), 1);
        assert!(get_court(&conn, created.id + 100).unwrap().is_none());
    }

    #[test]
    fn test_booking_round_trip_through_row() {
        let conn = setup_db();
        let court = court(&conn);
        create_booking(&conn, &booking("b1", court.id, "a@example.com", "2025-06-01", "09:00", "10:00")).unwrap();

        let loaded = get_booking_by_id(&conn, "b1").unwrap().unwrap();
        assert_eq!(loaded.court_id, court.id);
        assert_eq!(format_time(&loaded.start_time), "09:00");
        assert_eq!(loaded.status, BookingStatus::Pending);
        assert!(get_booking_by_id(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_user_bookings_ordered_newest_date_first() {
        let conn = setup_db();
        let court = court(&conn);
        create_booking(&conn, &booking("old", court.id, "a@example.com", "2025-06-01", "09:00", "10:00")).unwrap();
        create_booking(&conn, &booking("new-late", court.id, "a@example.com", "2025-06-03", "15:00", "16:00")).unwrap();
        create_booking(&conn, &booking("new-early", court.id, "a@example.com", "2025-06-03", "08:00", "09:00")).unwrap();
        create_booking(&conn, &booking("other", court.id, "b@example.com", "2025-06-02", "09:00", "10:00")).unwrap();

        let ids: Vec<String> = get_bookings_for_user(&conn, "a@example.com")
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, ["new-early", "new-late", "old"]);
    }

    #[test]
    fn test_status_update_is_compare_and_set() {
        let conn = setup_db();
        let court = court(&conn);
        create_booking(&conn, &booking("b1", court.id, "a@example.com", "2025-06-01", "09:00", "10:00")).unwrap();
        let now = Utc::now().naive_utc();

        assert!(update_booking_status(&conn, "b1", BookingStatus::Pending, BookingStatus::Cancelled, Some("rain"), &now).unwrap());
        // Already moved on; a second writer expecting Pending loses.
        assert!(!update_booking_status(&conn, "b1", BookingStatus::Pending, BookingStatus::Confirmed, None, &now).unwrap());

        let loaded = get_booking_by_id(&conn, "b1").unwrap().unwrap();
        assert_eq!(loaded.status, BookingStatus::Cancelled);
        assert_eq!(loaded.cancellation_reason.as_deref(), Some("rain"));
    }

    #[test]
    fn test_court_date_listing_includes_cancelled() {
        let conn = setup_db();
        let court = court(&conn);
        create_booking(&conn, &booking("b1", court.id, "a@example.com", "2025-06-01", "10:00", "11:00")).unwrap();
        let now = Utc::now().naive_utc();
        update_booking_status(&conn, "b1", BookingStatus::Pending, BookingStatus::Cancelled, Some("rain"), &now).unwrap();
        create_booking(&conn, &booking("b2", court.id, "b@example.com", "2025-06-01", "10:00", "11:00")).unwrap();
        create_booking(&conn, &booking("b3", court.id, "b@example.com", "2025-06-02", "10:00", "11:00")).unwrap();

        let day = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let bookings = get_bookings_for_court_on(&conn, court.id, day).unwrap();
        assert_eq!(bookings.len(), 2);
        assert!(bookings.iter().any(|b| b.status == BookingStatus::Cancelled));
    }
}
