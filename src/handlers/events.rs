use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;
use serde::Deserialize;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::{BroadcastStream, IntervalStream};
use tokio_stream::StreamExt;

use crate::errors::{AppError, BookingError};
use crate::models::slot::parse_date;
use crate::models::{Booking, BookingEvent};
use crate::state::AppState;

const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
pub struct EventsQuery {
    pub token: Option<String>,
    pub court_id: Option<String>,
    pub date: Option<String>,
}

// GET /api/events
//
// Lifecycle events as SSE. Narrowed by `court_id` and `date` when given; with
// both, the current bookings for that court and day are sent first.
pub async fn events_stream(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventsQuery>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, Response> {
    // EventSource can't set headers, so the token rides in the query string.
    let token = query.token.as_deref().unwrap_or("");
    if token.is_empty() || token != state.config.admin_token {
        return Err(AppError::Unauthorized.into_response());
    }

    let (court_id, date) = filters(&query).map_err(IntoResponse::into_response)?;

    // Subscribe before reading the snapshot so nothing committed in between is lost.
    let rx = state.events_tx.subscribe();

    let snapshot = match (court_id, date) {
        (Some(court_id), Some(date)) => {
            match state.api.manager().list_by_court_and_date(court_id, date).await {
                Ok(bookings) => bookings,
                Err(e) => {
                    tracing::warn!(court_id, %date, error = %e, "no snapshot for event stream");
                    Vec::new()
                }
            }
        }
        _ => Vec::new(),
    };

    let snapshot_stream = tokio_stream::iter(snapshot.into_iter().map(|booking: Booking| {
        let data = serde_json::to_string(&booking).unwrap_or_default();
        Ok::<_, Infallible>(Event::default().data(data).event("snapshot"))
    }));

    let live_stream = BroadcastStream::new(rx).filter_map(move |result| match result {
        Ok(event) if in_scope(&event, court_id, date) => {
            let data = serde_json::to_string(&event).unwrap_or_default();
            Some(Ok(Event::default().data(data).event("booking_event")))
        }
        Ok(_) => None,
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "event stream subscriber lagged");
            None
        }
    });

    let keepalive_stream = IntervalStream::new(tokio::time::interval(KEEPALIVE_INTERVAL))
        .map(|_| Ok(Event::default().comment("keepalive")));

    let combined = snapshot_stream.chain(live_stream);
    Ok(Sse::new(combined.merge(keepalive_stream)))
}

/// A filter that is present must parse; it is never silently widened.
fn filters(query: &EventsQuery) -> Result<(Option<i64>, Option<NaiveDate>), BookingError> {
    let court_id = match query.court_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse().map_err(|_| BookingError::court_not_found(raw))?),
    };
    let date = match query.date.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_date(raw).ok_or_else(|| BookingError::InvalidDate(raw.to_string()))?),
    };
    Ok((court_id, date))
}

fn in_scope(event: &BookingEvent, court_id: Option<i64>, date: Option<NaiveDate>) -> bool {
    court_id.map_or(true, |id| event.booking.court_id == id)
        && date.map_or(true, |d| event.booking.date == d)
}
