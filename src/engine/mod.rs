//! Admission rules for attendance events and leave requests.

pub mod attendance;
pub mod error;
pub mod leave;
pub mod time_window;

pub use attendance::{AttendanceEngine, CheckInOutcome, CheckOutOutcome};
pub use error::{EngineError, Rejection};
pub use leave::{LeaveApplication, LeaveEngine};
