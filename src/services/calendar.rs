use crate::models::Booking;

const ICS_STAMP: &str = "%Y%m%dT%H%M%S";

pub fn generate_ics(booking: &Booking, court_name: &str) -> String {
    let dtstart = booking.date.and_time(booking.start_time).format(ICS_STAMP);
    let dtend = booking.date.and_time(booking.end_time).format(ICS_STAMP);
    let dtstamp = booking.created_at.format(ICS_STAMP);
    let uid = format!("{}@courtbook", booking.id);

    let summary = escape_text(&format!("{court_name} reservation"));
    let description = escape_text(&match booking.user_name.as_deref() {
        Some(name) => format!("Booked by {name} ({}), status {}", booking.user_email, booking.status),
        None => format!("Booked by {}, status {}", booking.user_email, booking.status),
    });

    format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Courtbook//Reservations//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{dtstamp}\r\n\
         DTSTART:{dtstart}\r\n\
         DTEND:{dtend}\r\n\
         SUMMARY:{summary}\r\n\
         DESCRIPTION:{description}\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n"
    )
}

/// RFC 5545 TEXT escaping. Line breaks become a literal `\n` so a value can
/// never start a new property.
fn escape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("\\n");
            }
            '\n' => out.push_str("\\n"),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}
