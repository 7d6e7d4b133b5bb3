use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::config::AppConfig;
use crate::db::RecordStore;
use crate::errors::{ApiResult, BookingError};
use crate::models::slot::{format_time, normalize_time, parse_date};
use crate::models::{Booking, BookingEvent, Court, NewBooking, NewCourt, Slot};

use super::directory::CourtDirectory;
use super::lifecycle::BookingManager;

// ── Request shapes ──
//
// Field names follow the envelope contract (`CourtId`, `UserEmail`, ...) and
// also accept camelCase and snake_case spellings. Ids may arrive as numbers or
// strings.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateBookingRequest {
    #[serde(rename = "CourtId", alias = "courtId", alias = "court_id", deserialize_with = "loose_string")]
    pub court_id: Option<String>,
    #[serde(rename = "UserEmail", alias = "userEmail", alias = "user_email")]
    pub user_email: Option<String>,
    #[serde(rename = "UserName", alias = "userName", alias = "user_name")]
    pub user_name: Option<String>,
    #[serde(rename = "Date", alias = "date")]
    pub date: Option<String>,
    #[serde(rename = "StartTime", alias = "startTime", alias = "start_time")]
    pub start_time: Option<String>,
    #[serde(rename = "EndTime", alias = "endTime", alias = "end_time")]
    pub end_time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserBookingsRequest {
    #[serde(rename = "UserEmail", alias = "userEmail", alias = "user_email")]
    pub user_email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CourtBookingsRequest {
    #[serde(rename = "CourtId", alias = "courtId", alias = "court_id", deserialize_with = "loose_string")]
    pub court_id: Option<String>,
    #[serde(rename = "Date", alias = "date")]
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BookingIdRequest {
    #[serde(rename = "bookingId", alias = "BookingId", alias = "booking_id", deserialize_with = "loose_string")]
    pub booking_id: Option<String>,
}

/// Cancellation is keyed by booking id only. A stray `CourtId` in the payload
/// is ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CancelBookingRequest {
    #[serde(rename = "bookingId", alias = "BookingId", alias = "booking_id", deserialize_with = "loose_string")]
    pub booking_id: Option<String>,
    #[serde(alias = "Reason")]
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CourtRequest {
    #[serde(rename = "CourtId", alias = "courtId", alias = "court_id", deserialize_with = "loose_string")]
    pub court_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterCourtRequest {
    pub name: Option<String>,
    pub owner_email: Option<String>,
    pub location: Option<String>,
    pub hourly_price: Option<f64>,
    pub sport_type: Option<String>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct CancelConfirmation {
    pub message: String,
    pub booking: Booking,
}

// ── Envelope ──

#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(rename = "subType", default)]
    pub sub_type: String,
    #[serde(default)]
    pub data: Value,
    #[serde(rename = "reqId", default)]
    pub req_id: Value,
}

#[derive(Debug, Serialize)]
pub struct EnvelopeReply {
    #[serde(rename = "reqId")]
    pub req_id: Value,
    #[serde(flatten)]
    pub result: ApiResult<Value>,
}

/// Request/response surface for reservations. Validates and normalizes input,
/// then hands off to the lifecycle manager. Failures come back as values.
pub struct ReservationApi {
    manager: Arc<BookingManager>,
    directory: Arc<CourtDirectory>,
    owner_email: String,
}

impl ReservationApi {
    pub fn new(
        store: Arc<dyn RecordStore>,
        config: &AppConfig,
        events: broadcast::Sender<BookingEvent>,
    ) -> Self {
        let directory = Arc::new(CourtDirectory::new(Arc::clone(&store), config.store_timeout));
        let manager = Arc::new(BookingManager::new(
            store,
            Arc::clone(&directory),
            config.store_timeout,
            events,
        ));
        Self {
            manager,
            directory,
            owner_email: config.owner_email.clone(),
        }
    }

    pub fn manager(&self) -> &BookingManager {
        &self.manager
    }

    pub fn directory(&self) -> &CourtDirectory {
        &self.directory
    }

    pub async fn create_booking(&self, req: CreateBookingRequest) -> ApiResult<Booking> {
        self.try_create_booking(req).await.into()
    }

    pub async fn user_bookings(&self, req: UserBookingsRequest) -> ApiResult<Vec<Booking>> {
        let result = async {
            let email = required(req.user_email, "UserEmail")?;
            self.manager.list_by_user(&email).await
        };
        result.await.into()
    }

    pub async fn court_bookings_by_date(&self, req: CourtBookingsRequest) -> ApiResult<Vec<Booking>> {
        let result = async {
            let court_id = court_id(required(req.court_id, "CourtId")?)?;
            let date = date(required(req.date, "Date")?)?;
            self.manager.list_by_court_and_date(court_id, date).await
        };
        result.await.into()
    }

    pub async fn cancel_booking(&self, req: CancelBookingRequest) -> ApiResult<CancelConfirmation> {
        let result = async {
            let id = required(req.booking_id, "bookingId")?;
            let reason = req.reason.unwrap_or_default();
            let booking = self.manager.cancel_booking(&id, &reason).await?;
            Ok(CancelConfirmation {
                message: format!(
                    "booking {} on {} {} cancelled",
                    booking.id,
                    booking.date,
                    booking.slot()
                ),
                booking,
            })
        };
        result.await.into()
    }

    pub async fn confirm_booking(&self, req: BookingIdRequest) -> ApiResult<Booking> {
        let result = async {
            let id = required(req.booking_id, "bookingId")?;
            self.manager.confirm_booking(&id).await
        };
        result.await.into()
    }

    pub async fn activate_booking(&self, req: BookingIdRequest) -> ApiResult<Booking> {
        let result = async {
            let id = required(req.booking_id, "bookingId")?;
            self.manager.activate_booking(&id).await
        };
        result.await.into()
    }

    pub async fn complete_booking(&self, req: BookingIdRequest) -> ApiResult<Booking> {
        let result = async {
            let id = required(req.booking_id, "bookingId")?;
            self.manager.complete_booking(&id).await
        };
        result.await.into()
    }

    pub async fn booking(&self, id: &str) -> ApiResult<Booking> {
        self.manager.get_booking(id).await.into()
    }

    pub async fn courts(&self) -> ApiResult<Vec<Court>> {
        self.directory.list_courts().await.into()
    }

    pub async fn court(&self, req: CourtRequest) -> ApiResult<Court> {
        let result = async {
            let id = court_id(required(req.court_id, "CourtId")?)?;
            self.directory.require_court(id).await
        };
        result.await.into()
    }

    pub async fn register_court(&self, req: RegisterCourtRequest) -> ApiResult<Court> {
        let result = async {
            let name = required(req.name, "name")?;
            let owner_email = req
                .owner_email
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| self.owner_email.clone());
            if owner_email.is_empty() {
                return Err(BookingError::MissingField("owner_email"));
            }
            self.directory
                .register_court(NewCourt {
                    owner_email,
                    name,
                    location: req.location.unwrap_or_default().trim().to_string(),
                    hourly_price: req.hourly_price.unwrap_or(0.0),
                    sport_type: req.sport_type.unwrap_or_default().trim().to_string(),
                    is_available: req.is_available.unwrap_or(true),
                })
                .await
        };
        result.await.into()
    }

    /// Route a message envelope to the matching operation.
    pub async fn dispatch(&self, envelope: Envelope) -> EnvelopeReply {
        let Envelope {
            kind,
            sub_type,
            data,
            req_id,
        } = envelope;
        tracing::debug!(kind = %kind, sub_type = %sub_type, "dispatching envelope");

        let result = match (kind.as_str(), sub_type.as_str()) {
            ("booking", "createBooking") => self.run(data, |r| self.create_booking(r)).await,
            ("booking", "getUserBookings") => self.run(data, |r| self.user_bookings(r)).await,
            ("booking", "getCourtBookingsByDate") => {
                self.run(data, |r| self.court_bookings_by_date(r)).await
            }
            ("booking", "cancelBooking") => self.run(data, |r| self.cancel_booking(r)).await,
            ("booking", "confirmBooking") => self.run(data, |r| self.confirm_booking(r)).await,
            ("booking", "activateBooking") => self.run(data, |r| self.activate_booking(r)).await,
            ("booking", "completeBooking") => self.run(data, |r| self.complete_booking(r)).await,
            ("court", "getCourts") => to_value(self.courts().await),
            ("court", "getCourt") => self.run(data, |r| self.court(r)).await,
            _ => Err::<Value, _>(BookingError::UnknownOperation(format!("{kind}/{sub_type}"))).into(),
        };

        tracing::debug!(
            kind = %kind,
            sub_type = %sub_type,
            success = result.is_success(),
            "envelope handled"
        );
        EnvelopeReply { req_id, result }
    }

    async fn run<Req, Res, F, Fut>(&self, data: Value, op: F) -> ApiResult<Value>
    where
        Req: DeserializeOwned,
        Res: Serialize,
        F: FnOnce(Req) -> Fut,
        Fut: std::future::Future<Output = ApiResult<Res>>,
    {
        let data = if data.is_null() {
            Value::Object(Default::default())
        } else {
            data
        };
        match serde_json::from_value::<Req>(data) {
            Ok(req) => to_value(op(req).await),
            Err(e) => Err::<Value, _>(BookingError::MalformedRequest(e.to_string())).into(),
        }
    }

    async fn try_create_booking(&self, req: CreateBookingRequest) -> Result<Booking, BookingError> {
        let court_raw = required(req.court_id, "CourtId")?;
        let user_email = required(req.user_email, "UserEmail")?;
        let date_raw = required(req.date, "Date")?;
        let start_raw = required(req.start_time, "StartTime")?;
        let end_raw = required(req.end_time, "EndTime")?;
        let user_email = plain_text(user_email, "UserEmail")?;
        let user_name = req
            .user_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .map(|n| plain_text(n, "UserName"))
            .transpose()?;

        let court_id = court_id(court_raw)?;
        let date = date(date_raw)?;
        let start = time(&start_raw)?;
        let end = time(&end_raw)?;
        let slot = Slot::new(start, end).ok_or_else(|| BookingError::InvalidInterval {
            start: format_time(&start),
            end: format_time(&end),
        })?;

        self.manager
            .create_booking(NewBooking {
                court_id,
                user_email,
                user_name,
                date,
                slot,
            })
            .await
    }
}

fn to_value<T: Serialize>(result: ApiResult<T>) -> ApiResult<Value> {
    result.and_then(|data| {
        serde_json::to_value(data)
            .map_err(|e| BookingError::StoreFailure(format!("failed to encode response: {e}")))
    })
}

fn required(value: Option<String>, field: &'static str) -> Result<String, BookingError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(BookingError::MissingField(field))
}

/// Free text that ends up in exported calendars must stay on one line.
fn plain_text(value: String, field: &'static str) -> Result<String, BookingError> {
    if value.chars().any(char::is_control) {
        return Err(BookingError::MalformedRequest(format!(
            "{field} must not contain control characters"
        )));
    }
    Ok(value)
}

fn court_id(raw: String) -> Result<i64, BookingError> {
    raw.parse()
        .map_err(|_| BookingError::court_not_found(raw))
}

fn date(raw: String) -> Result<NaiveDate, BookingError> {
    parse_date(&raw).ok_or(BookingError::InvalidDate(raw))
}

fn time(raw: &str) -> Result<NaiveTime, BookingError> {
    normalize_time(raw).ok_or_else(|| BookingError::InvalidTime(raw.to_string()))
}

fn loose_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}
