use std::sync::Arc;

use axum::extract::{Path, Query, State};
use serde::Deserialize;

use crate::errors::ApiResult;
use crate::models::{Booking, Court};
use crate::services::reservation::{CourtBookingsRequest, CourtRequest};
use crate::state::AppState;

// GET /api/courts
pub async fn list_courts(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Court>> {
    state.api.courts().await
}

// GET /api/courts/:id
pub async fn get_court(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Court> {
    state
        .api
        .court(CourtRequest {
            court_id: Some(id),
        })
        .await
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

// GET /api/courts/:id/bookings?date=
pub async fn court_bookings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Vec<Booking>> {
    state
        .api
        .court_bookings_by_date(CourtBookingsRequest {
            court_id: Some(id),
            date: query.date,
        })
        .await
}
