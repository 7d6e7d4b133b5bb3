pub mod booking;
pub mod court;
pub mod event;
pub mod slot;

pub use booking::{Booking, BookingStatus, NewBooking};
pub use court::{Court, NewCourt};
pub use event::{BookingEvent, BookingEventKind};
pub use slot::Slot;
