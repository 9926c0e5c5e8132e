//! Persistence contracts for attendance and leave records.
//!
//! The engines only talk to these traits. `mysql` is the production backend,
//! `memory` backs tests and embedded use.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::engine::time_window::Elapsed;
use crate::model::attendance::{AttendanceRecord, NewAttendance};
use crate::model::leave_request::{LeaveRecord, LeaveStatus, LeaveType, NewLeave};

pub mod memory;
pub mod mysql;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("employee {0} not found")]
    EmployeeNotFound(u64),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("another mutation for employee {0} is in flight")]
    Busy(u64),

    #[error("poisoned lock: {0}")]
    Poisoned(&'static str),
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn find_for_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Atomically inserts unless a record for (employee, date) exists.
    /// Returns `None` when one already did.
    async fn create_if_absent(
        &self,
        attendance: NewAttendance,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Overwrites `overtime_duration`, clearing it on `None`.
    async fn set_overtime(&self, id: u64, overtime: Option<Elapsed>) -> Result<(), StoreError>;

    /// Sets check-out and worked minutes, only if the record is not checked
    /// out yet. Returns whether the write happened.
    async fn complete_check_out(
        &self,
        id: u64,
        check_out: NaiveTime,
        duration_minutes: i64,
    ) -> Result<bool, StoreError>;
}

/// Filter and page for listing leave requests.
#[derive(Debug, Clone)]
pub struct LeaveQuery {
    pub employee_id: Option<u64>,
    pub status: Option<LeaveStatus>,
    /// 1-based.
    pub page: u64,
    pub per_page: u64,
}

impl Default for LeaveQuery {
    fn default() -> Self {
        Self {
            employee_id: None,
            status: None,
            page: 1,
            per_page: 10,
        }
    }
}

impl LeaveQuery {
    /// Saturates instead of overflowing for absurd page numbers.
    pub fn offset(&self) -> u64 {
        (self.page.max(1) - 1).saturating_mul(self.per_page)
    }
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    /// Opens a unit of work for one employee's leave history. At most one is
    /// in flight per employee; dropping it without `commit` discards writes.
    async fn begin(&self, employee_id: u64) -> Result<Box<dyn LeaveTx>, StoreError>;

    async fn find(&self, id: u64) -> Result<Option<LeaveRecord>, StoreError>;

    /// Newest first, with the total number of matches.
    async fn list(&self, query: &LeaveQuery) -> Result<(Vec<LeaveRecord>, i64), StoreError>;

    /// Moves a request from `from` to `to`. Returns false if it was not in `from`.
    async fn transition(
        &self,
        id: u64,
        from: LeaveStatus,
        to: LeaveStatus,
    ) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait LeaveTx: Send {
    async fn leave_type(&mut self, id: u64) -> Result<Option<LeaveType>, StoreError>;

    /// Sum of `total_days` over the employee's approved requests of this type.
    async fn approved_days(
        &mut self,
        employee_id: u64,
        leave_type_id: u64,
    ) -> Result<i64, StoreError>;

    /// Every request of the employee, oldest first.
    async fn history(&mut self, employee_id: u64) -> Result<Vec<LeaveRecord>, StoreError>;

    async fn insert(&mut self, leave: NewLeave) -> Result<LeaveRecord, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
