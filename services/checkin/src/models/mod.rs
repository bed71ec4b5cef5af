//! Check-in service models

pub mod attendee;
pub mod checkin;
pub mod event;
pub mod session;

// Re-export for convenience
pub use attendee::{Attendee, AttendeeStatus, NewAttendee};
pub use checkin::{CheckIn, DailyCount, ExportRow, RecentCheckIn};
pub use event::{Event, NewEvent};
pub use session::Session;
