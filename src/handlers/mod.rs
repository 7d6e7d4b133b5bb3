pub mod admin;
pub mod bookings;
pub mod calendar;
pub mod courts;
pub mod dispatch;
pub mod events;
pub mod health;

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::errors::{ApiResult, BookingError};
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let cors = if state.config.cors_allow_any {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/health", get(health::health))
        .route("/api/dispatch", post(dispatch::dispatch))
        .route(
            "/api/bookings",
            get(bookings::list_user_bookings).post(bookings::create_booking),
        )
        .route("/api/bookings/:id", get(bookings::get_booking))
        .route("/api/bookings/:id/confirm", post(bookings::confirm_booking))
        .route("/api/bookings/:id/activate", post(bookings::activate_booking))
        .route("/api/bookings/:id/complete", post(bookings::complete_booking))
        .route("/api/bookings/:id/cancel", post(bookings::cancel_booking))
        .route("/api/courts", get(courts::list_courts))
        .route("/api/courts/:id", get(courts::get_court))
        .route("/api/courts/:id/bookings", get(courts::court_bookings))
        .route("/api/admin/courts", post(admin::register_court))
        .route("/api/events", get(events::events_stream))
        .route("/calendar/:booking_id", get(calendar::download_ics))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// A body axum could not parse, reported in the same shape as every other
/// booking failure.
pub(crate) fn malformed<T>(rejection: JsonRejection) -> ApiResult<T> {
    Err::<T, _>(BookingError::MalformedRequest(rejection.body_text())).into()
}
