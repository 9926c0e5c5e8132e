use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use utoipa::ToSchema;

use crate::engine::time_window::Elapsed;
use crate::model::employee::IdentitySnapshot;

/// One employee's attendance for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "John Doe")]
    pub employee_name: String,
    #[schema(example = "Engineering")]
    pub department_name: String,
    #[schema(example = "Software Engineer")]
    pub designation_name: String,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "January")]
    pub month: String,
    #[schema(example = "09:30:00", format = "time", value_type = String)]
    pub check_in: NaiveTime,
    #[schema(example = "18:00:00", format = "time", value_type = String, nullable = true)]
    pub check_out: Option<NaiveTime>,
    #[schema(example = "00:30:00", value_type = String)]
    pub late_duration: Elapsed,
    #[schema(example = "01:00:00", value_type = String, nullable = true)]
    pub overtime_duration: Option<Elapsed>,
    #[schema(example = 510, nullable = true)]
    pub duration_minutes: Option<i64>,
}

/// A check-in about to be persisted.
#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub employee_id: u64,
    pub identity: IdentitySnapshot,
    pub date: NaiveDate,
    pub month: String,
    pub check_in: NaiveTime,
    pub late_duration: Elapsed,
}

impl NewAttendance {
    pub fn into_record(self, id: u64) -> AttendanceRecord {
        AttendanceRecord {
            id,
            employee_id: self.employee_id,
            employee_name: self.identity.employee_name,
            department_name: self.identity.department_name,
            designation_name: self.identity.designation_name,
            date: self.date,
            month: self.month,
            check_in: self.check_in,
            check_out: None,
            late_duration: self.late_duration,
            overtime_duration: None,
            duration_minutes: None,
        }
    }
}
