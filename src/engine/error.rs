use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use strum::IntoStaticStr;
use thiserror::Error;

use crate::engine::time_window::Elapsed;
use crate::model::leave_request::LeaveStatus;
use crate::store::StoreError;

/// A business rule said no. The caller has to change its input; retrying
/// the same request yields the same rejection.
#[derive(Debug, Clone, PartialEq, Eq, Error, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Rejection {
    #[error("Check-in is not allowed {reason}")]
    OutsideHours { reason: &'static str, at: NaiveTime },

    #[error("Already checked in on {date}")]
    AlreadyExists { date: NaiveDate },

    #[error("No check-in found for {date}")]
    NoCheckIn { date: NaiveDate },

    #[error("Already checked out on {date} at {checked_out_at}")]
    AlreadyCheckedOut {
        date: NaiveDate,
        checked_out_at: NaiveTime,
        overtime: Option<Elapsed>,
    },

    #[error("Leave start {from_date} is after its end {to_date}")]
    InvalidDateRange { from_date: NaiveDate, to_date: NaiveDate },

    #[error("Leave must start after {today} (requested {from_date})")]
    NotFutureDated { from_date: NaiveDate, today: NaiveDate },

    #[error("Unknown leave type {leave_type_id}")]
    UnknownLeaveType { leave_type_id: u64 },

    #[error(
        "{leave_type} quota exceeded: {consumed} of {allowed} days used, {requested} requested"
    )]
    QuotaExceeded {
        leave_type: String,
        allowed: i64,
        consumed: i64,
        requested: i64,
    },

    #[error("Your first leave request is still pending")]
    FirstLeavePending,

    #[error("Your first leave request is {status}, not approved")]
    FirstLeaveNotApproved { status: LeaveStatus },

    #[error("Previous approved leave runs until {until}")]
    PreviousLeaveOngoing { until: NaiveDate },
}

impl Rejection {
    /// Stable machine-readable name, e.g. `quota_exceeded`.
    pub fn code(&self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ResponseError for EngineError {
    fn status_code(&self) -> StatusCode {
        match self {
            EngineError::Rejected(_) => StatusCode::BAD_REQUEST,
            EngineError::Store(StoreError::Busy(_)) => StatusCode::SERVICE_UNAVAILABLE,
            EngineError::Store(StoreError::EmployeeNotFound(_)) => StatusCode::FORBIDDEN,
            EngineError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        match self {
            EngineError::Rejected(rejection) => HttpResponse::build(status).json(json!({
                "message": rejection.to_string(),
                "code": rejection.code(),
            })),
            EngineError::Store(StoreError::Busy(_)) => HttpResponse::build(status).json(json!({
                "message": "Another request for this employee is in progress, try again"
            })),
            EngineError::Store(StoreError::EmployeeNotFound(_)) => {
                HttpResponse::build(status).json(json!({ "message": "No employee profile" }))
            }
            EngineError::Store(e) => {
                tracing::error!(error = %e, "Store failure");
                HttpResponse::build(status).json(json!({ "message": "Internal Server Error" }))
            }
        }
    }
}
