use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::engine::error::{EngineError, Rejection};
use crate::engine::time_window::{Elapsed, WORK_END, WORK_START, elapsed_since, minutes_between};
use crate::model::attendance::{AttendanceRecord, NewAttendance};
use crate::model::employee::EmployeeProfile;
use crate::store::AttendanceStore;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CheckInOutcome {
    pub attendance: AttendanceRecord,
    #[schema(example = "00:30:00", value_type = String)]
    pub late_duration: Elapsed,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CheckOutOutcome {
    pub attendance: AttendanceRecord,
    #[schema(example = "01:00:00", value_type = String, nullable = true)]
    pub overtime_duration: Option<Elapsed>,
    #[schema(example = 540)]
    pub duration_minutes: i64,
}

/// Daily check-in / check-out for one employee:
/// `NoRecord -> CheckedIn -> CheckedOut`, never backwards.
#[derive(Clone)]
pub struct AttendanceEngine {
    store: Arc<dyn AttendanceStore>,
}

impl AttendanceEngine {
    pub fn new(store: Arc<dyn AttendanceStore>) -> Self {
        Self { store }
    }

    pub async fn check_in(
        &self,
        employee_id: u64,
        profile: &EmployeeProfile,
        now: NaiveDateTime,
    ) -> Result<CheckInOutcome, EngineError> {
        let at = now.time();
        let today = now.date();

        if at > WORK_END {
            return Err(Rejection::OutsideHours { reason: "after 5 PM", at }.into());
        }
        if at < WORK_START {
            return Err(Rejection::OutsideHours { reason: "before 9 AM", at }.into());
        }
        if self.store.find_for_day(employee_id, today).await?.is_some() {
            return Err(Rejection::AlreadyExists { date: today }.into());
        }

        let late_duration = elapsed_since(today.and_time(WORK_START), now);
        let attendance = NewAttendance {
            employee_id,
            identity: profile.snapshot(),
            date: today,
            month: now.format("%B").to_string(),
            check_in: at,
            late_duration,
        };

        // A concurrent check-in may have won between the lookup and the insert.
        let Some(attendance) = self.store.create_if_absent(attendance).await? else {
            return Err(Rejection::AlreadyExists { date: today }.into());
        };

        info!(employee_id, date = %today, late = %late_duration, "Checked in");
        Ok(CheckInOutcome {
            attendance,
            late_duration,
        })
    }

    pub async fn check_out(
        &self,
        employee_id: u64,
        now: NaiveDateTime,
    ) -> Result<CheckOutOutcome, EngineError> {
        let today = now.date();
        let Some(mut attendance) = self.store.find_for_day(employee_id, today).await? else {
            return Err(Rejection::NoCheckIn { date: today }.into());
        };

        let regular_end = attendance.date.and_time(WORK_END);
        let overtime = elapsed_since(regular_end, now);
        let overtime_duration = (now > regular_end).then_some(overtime);

        // Overtime is rewritten before the double check-out test, so a
        // rejected second check-out still updates it.
        self.store.set_overtime(attendance.id, overtime_duration).await?;
        attendance.overtime_duration = overtime_duration;

        if let Some(checked_out_at) = attendance.check_out {
            warn!(
                employee_id,
                date = %today,
                overtime = ?overtime_duration.map(|o| o.to_string()),
                "Repeated check-out rewrote overtime"
            );
            return Err(Rejection::AlreadyCheckedOut {
                date: today,
                checked_out_at,
                overtime: overtime_duration,
            }
            .into());
        }

        let check_out = now.time();
        let duration_minutes = minutes_between(now, attendance.date.and_time(attendance.check_in));

        if !self
            .store
            .complete_check_out(attendance.id, check_out, duration_minutes)
            .await?
        {
            let checked_out_at = self
                .store
                .find_for_day(employee_id, today)
                .await?
                .and_then(|a| a.check_out)
                .unwrap_or(check_out);
            return Err(Rejection::AlreadyCheckedOut {
                date: today,
                checked_out_at,
                overtime: overtime_duration,
            }
            .into());
        }

        attendance.check_out = Some(check_out);
        attendance.duration_minutes = Some(duration_minutes);

        info!(
            employee_id,
            date = %today,
            duration_minutes,
            overtime = ?overtime_duration.map(|o| o.to_string()),
            "Checked out"
        );
        Ok(CheckOutOutcome {
            attendance,
            overtime_duration,
            duration_minutes,
        })
    }

    /// Today's record, if the employee has checked in.
    pub async fn current_day(
        &self,
        employee_id: u64,
        now: NaiveDateTime,
    ) -> Result<Option<AttendanceRecord>, EngineError> {
        Ok(self.store.find_for_day(employee_id, now.date()).await?)
    }
}
