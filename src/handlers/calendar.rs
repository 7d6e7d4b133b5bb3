use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::errors::BookingError;
use crate::services::calendar::generate_ics;
use crate::state::AppState;

pub async fn download_ics(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Response {
    let booking_id = raw_id.strip_suffix(".ics").unwrap_or(&raw_id);

    let booking = match state.api.manager().get_booking(booking_id).await {
        Ok(b) => b,
        Err(BookingError::NotFound { .. }) => {
            return (StatusCode::NOT_FOUND, "Booking not found").into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, booking_id, "failed to load booking for .ics");
            return (e.status_code(), "Internal error").into_response();
        }
    };

    let court_name = state
        .api
        .directory()
        .get_court(booking.court_id)
        .await
        .ok()
        .flatten()
        .map(|c| c.name)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("Court {}", booking.court_id));

    let ics = generate_ics(&booking, &court_name);
    let filename = format!("booking-{booking_id}.ics");

    (
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                &format!("attachment; filename=\"{filename}\""),
            ),
        ],
        ics,
    )
        .into_response()
}
