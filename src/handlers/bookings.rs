use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use super::malformed;
use crate::errors::ApiResult;
use crate::models::Booking;
use crate::services::reservation::{
    BookingIdRequest, CancelBookingRequest, CancelConfirmation, CreateBookingRequest,
    UserBookingsRequest,
};
use crate::state::AppState;

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> ApiResult<Booking> {
    match payload {
        Ok(Json(req)) => state.api.create_booking(req).await,
        Err(rejection) => malformed(rejection),
    }
}

// GET /api/bookings?user_email=
pub async fn list_user_bookings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserBookingsRequest>,
) -> ApiResult<Vec<Booking>> {
    state.api.user_bookings(query).await
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Booking> {
    state.api.booking(&id).await
}

// POST /api/bookings/:id/confirm
pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Booking> {
    state.api.confirm_booking(by_id(id)).await
}

// POST /api/bookings/:id/activate
pub async fn activate_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Booking> {
    state.api.activate_booking(by_id(id)).await
}

// POST /api/bookings/:id/complete
pub async fn complete_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Booking> {
    state.api.complete_booking(by_id(id)).await
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelBody {
    pub reason: Option<String>,
}

// POST /api/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Option<Json<CancelBody>>,
) -> ApiResult<CancelConfirmation> {
    let reason = body.and_then(|Json(b)| b.reason);
    state
        .api
        .cancel_booking(CancelBookingRequest {
            booking_id: Some(id),
            reason,
        })
        .await
}

fn by_id(id: String) -> BookingIdRequest {
    BookingIdRequest {
        booking_id: Some(id),
    }
}
