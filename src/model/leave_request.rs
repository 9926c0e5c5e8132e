use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::model::employee::IdentitySnapshot;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

/// Leave category with its total quota per employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveType {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "annual")]
    pub name: String,
    #[schema(example = 20)]
    pub allowed_days: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LeaveRecord {
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
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub from_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub to_date: NaiveDate,
    #[schema(example = 3)]
    pub total_days: i64,
    #[schema(example = 1)]
    pub leave_type_id: u64,
    #[schema(example = "Family event")]
    pub description: String,
    pub status: LeaveStatus,
    #[schema(example = "2025-12-20T10:15:00", format = "date-time", value_type = String)]
    pub created_at: NaiveDateTime,
}

/// A leave request about to be persisted. Always stored as pending.
#[derive(Debug, Clone)]
pub struct NewLeave {
    pub employee_id: u64,
    pub identity: IdentitySnapshot,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub total_days: i64,
    pub leave_type_id: u64,
    pub description: String,
    pub created_at: NaiveDateTime,
}

impl NewLeave {
    pub fn into_record(self, id: u64) -> LeaveRecord {
        LeaveRecord {
            id,
            employee_id: self.employee_id,
            employee_name: self.identity.employee_name,
            department_name: self.identity.department_name,
            designation_name: self.identity.designation_name,
            from_date: self.from_date,
            to_date: self.to_date,
            total_days: self.total_days,
            leave_type_id: self.leave_type_id,
            description: self.description,
            status: LeaveStatus::Pending,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_stored_strings() {
        assert_eq!("approved".parse::<LeaveStatus>().unwrap(), LeaveStatus::Approved);
        assert_eq!("Rejected".parse::<LeaveStatus>().unwrap(), LeaveStatus::Rejected);
        assert!("cancelled".parse::<LeaveStatus>().is_err());
        assert_eq!(LeaveStatus::Pending.as_ref(), "pending");
    }
}
