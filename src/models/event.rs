use serde::Serialize;

use super::Booking;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingEventKind {
    Created,
    Confirmed,
    Activated,
    Completed,
    Cancelled,
}

/// Published after every committed booking write.
#[derive(Clone, Debug, Serialize)]
pub struct BookingEvent {
    pub kind: BookingEventKind,
    pub booking: Booking,
}
