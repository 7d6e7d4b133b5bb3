use tokio::sync::broadcast;

use crate::models::{Booking, BookingEvent, BookingEventKind};

pub const EVENT_CHANNEL_CAPACITY: usize = 256;

pub fn channel() -> broadcast::Sender<BookingEvent> {
    broadcast::channel(EVENT_CHANNEL_CAPACITY).0
}

pub fn publish(tx: &broadcast::Sender<BookingEvent>, kind: BookingEventKind, booking: &Booking) {
    let event = BookingEvent {
        kind,
        booking: booking.clone(),
    };
    // No subscribers is the normal case outside a live dashboard.
    let _ = tx.send(event);
}
