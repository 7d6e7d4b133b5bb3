use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::models::{BookingStatus, Slot};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("unauthorized")]
    Unauthorized,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

/// Every way a reservation request can fail. Returned as a value all the way
/// to the API boundary.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid time {0:?}, expected HH:MM or h:MM AM/PM")]
    InvalidTime(String),

    #[error("start time {start} must be before end time {end}")]
    InvalidInterval { start: String, end: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("court {0} is not accepting bookings")]
    CourtUnavailable(i64),

    #[error("requested slot overlaps {} existing booking(s); pick a different time", .conflicts.len())]
    SlotConflict { conflicts: Vec<Slot> },

    #[error("cannot move booking from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("a cancellation reason is required")]
    MissingReason,

    #[error("record store did not respond within {0:?}")]
    Timeout(Duration),

    #[error("record store failure: {0}")]
    StoreFailure(String),

    #[error("unknown operation: {0}")]
    UnknownOperation(String),
}

impl BookingError {
    pub fn court_not_found(id: impl ToString) -> Self {
        BookingError::NotFound {
            entity: "court",
            id: id.to_string(),
        }
    }

    pub fn booking_not_found(id: impl ToString) -> Self {
        BookingError::NotFound {
            entity: "booking",
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BookingError::MissingField(_) => "MissingField",
            BookingError::MalformedRequest(_) => "MalformedRequest",
            BookingError::InvalidDate(_) => "InvalidDate",
            BookingError::InvalidTime(_) => "InvalidTime",
            BookingError::InvalidInterval { .. } => "InvalidInterval",
            BookingError::NotFound { .. } => "NotFound",
            BookingError::CourtUnavailable(_) => "CourtUnavailable",
            BookingError::SlotConflict { .. } => "SlotConflict",
            BookingError::InvalidTransition { .. } => "InvalidTransition",
            BookingError::MissingReason => "MissingReason",
            BookingError::Timeout(_) => "Timeout",
            BookingError::StoreFailure(_) => "StoreFailure",
            BookingError::UnknownOperation(_) => "UnknownOperation",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            BookingError::MissingField(_)
            | BookingError::MalformedRequest(_)
            | BookingError::InvalidDate(_)
            | BookingError::InvalidTime(_)
            | BookingError::InvalidInterval { .. }
            | BookingError::MissingReason
            | BookingError::UnknownOperation(_) => StatusCode::BAD_REQUEST,
            BookingError::NotFound { .. } => StatusCode::NOT_FOUND,
            BookingError::CourtUnavailable(_)
            | BookingError::SlotConflict { .. }
            | BookingError::InvalidTransition { .. } => StatusCode::CONFLICT,
            BookingError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            BookingError::StoreFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Worth retrying the same request later, possibly with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BookingError::Timeout(_) | BookingError::StoreFailure(_)
        )
    }
}

/// Error half of [`ApiResult`] as it goes over the wire.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub kind: &'static str,
    pub message: String,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<Slot>,
    #[serde(skip)]
    pub status: StatusCode,
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        let message = err.to_string();
        let kind = err.kind();
        let status = err.status_code();
        let retryable = err.is_retryable();
        let conflicts = match err {
            BookingError::SlotConflict { conflicts } => conflicts,
            _ => Vec::new(),
        };
        ApiError {
            kind,
            message,
            retryable,
            conflicts,
            status,
        }
    }
}

/// Tagged outcome of a reservation operation: `{"success": data}` or
/// `{"error": {...}}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiResult<T> {
    Success(T),
    Error(ApiError),
}

impl<T> ApiResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ApiResult::Success(_))
    }

    /// Transform the success payload; a failing transform becomes the error.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Result<U, BookingError>) -> ApiResult<U> {
        match self {
            ApiResult::Success(data) => f(data).into(),
            ApiResult::Error(err) => ApiResult::Error(err),
        }
    }
}

impl<T> From<Result<T, BookingError>> for ApiResult<T> {
    fn from(result: Result<T, BookingError>) -> Self {
        match result {
            Ok(data) => ApiResult::Success(data),
            Err(err) => ApiResult::Error(err.into()),
        }
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        ApiResult::<()>::Error(self.into()).into_response()
    }
}

impl<T: Serialize> IntoResponse for ApiResult<T> {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiResult::Success(_) => StatusCode::OK,
            ApiResult::Error(err) => err.status,
        };
        (status, axum::Json(self)).into_response()
    }
}
