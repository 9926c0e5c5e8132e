use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::{FromRow, MySql, MySqlPool, Transaction};
use tracing::debug;

use crate::engine::time_window::Elapsed;
use crate::model::attendance::{AttendanceRecord, NewAttendance};
use crate::model::leave_request::{LeaveRecord, LeaveStatus, LeaveType, NewLeave};
use crate::store::{AttendanceStore, LeaveQuery, LeaveStore, LeaveTx, StoreError};

const ATTENDANCE_COLUMNS: &str = r#"
    id, employee_id, employee_name, department_name, designation_name,
    date, month, check_in, check_out, late_seconds, overtime_seconds, duration_minutes
"#;

const LEAVE_COLUMNS: &str = r#"
    id, employee_id, employee_name, department_name, designation_name,
    from_date, to_date, total_days, leave_type_id, description, status, created_at
"#;

fn is_duplicate_key(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000"))
}

fn seconds(value: i64, column: &str) -> Result<Elapsed, StoreError> {
    u64::try_from(value)
        .map(Elapsed::from_seconds)
        .map_err(|_| StoreError::Corrupt(format!("negative {column}: {value}")))
}

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    employee_id: u64,
    employee_name: String,
    department_name: String,
    designation_name: String,
    date: NaiveDate,
    month: String,
    check_in: NaiveTime,
    check_out: Option<NaiveTime>,
    late_seconds: i64,
    overtime_seconds: Option<i64>,
    duration_minutes: Option<i64>,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = StoreError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        Ok(AttendanceRecord {
            id: row.id,
            employee_id: row.employee_id,
            employee_name: row.employee_name,
            department_name: row.department_name,
            designation_name: row.designation_name,
            date: row.date,
            month: row.month,
            check_in: row.check_in,
            check_out: row.check_out,
            late_duration: seconds(row.late_seconds, "late_seconds")?,
            overtime_duration: row
                .overtime_seconds
                .map(|s| seconds(s, "overtime_seconds"))
                .transpose()?,
            duration_minutes: row.duration_minutes,
        })
    }
}

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: u64,
    employee_name: String,
    department_name: String,
    designation_name: String,
    from_date: NaiveDate,
    to_date: NaiveDate,
    total_days: i64,
    leave_type_id: u64,
    description: String,
    status: String,
    created_at: NaiveDateTime,
}

impl TryFrom<LeaveRow> for LeaveRecord {
    type Error = StoreError;

    fn try_from(row: LeaveRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<LeaveStatus>().map_err(|_| {
            StoreError::Corrupt(format!("leave {} has status {:?}", row.id, row.status))
        })?;

        Ok(LeaveRecord {
            id: row.id,
            employee_id: row.employee_id,
            employee_name: row.employee_name,
            department_name: row.department_name,
            designation_name: row.designation_name,
            from_date: row.from_date,
            to_date: row.to_date,
            total_days: row.total_days,
            leave_type_id: row.leave_type_id,
            description: row.description,
            status,
            created_at: row.created_at,
        })
    }
}

fn into_records(rows: Vec<LeaveRow>) -> Result<Vec<LeaveRecord>, StoreError> {
    rows.into_iter().map(LeaveRecord::try_from).collect()
}

#[derive(Clone)]
pub struct MySqlAttendanceStore {
    pool: MySqlPool,
}

impl MySqlAttendanceStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceStore for MySqlAttendanceStore {
    async fn find_for_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE employee_id = ? AND date = ?"
        );
        let row = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;

        row.map(AttendanceRecord::try_from).transpose()
    }

    async fn create_if_absent(
        &self,
        attendance: NewAttendance,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        // uq_attendance_employee_date makes the insert the atomic existence check.
        let result = sqlx::query(
            r#"
            INSERT INTO attendance
                (employee_id, employee_name, department_name, designation_name,
                 date, month, check_in, late_seconds)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(attendance.employee_id)
        .bind(&attendance.identity.employee_name)
        .bind(&attendance.identity.department_name)
        .bind(&attendance.identity.designation_name)
        .bind(attendance.date)
        .bind(&attendance.month)
        .bind(attendance.check_in)
        .bind(attendance.late_duration.as_seconds() as i64)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(Some(attendance.into_record(done.last_insert_id()))),
            Err(e) if is_duplicate_key(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_overtime(&self, id: u64, overtime: Option<Elapsed>) -> Result<(), StoreError> {
        sqlx::query("UPDATE attendance SET overtime_seconds = ? WHERE id = ?")
            .bind(overtime.map(|o| o.as_seconds() as i64))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn complete_check_out(
        &self,
        id: u64,
        check_out: NaiveTime,
        duration_minutes: i64,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_out = ?, duration_minutes = ?
            WHERE id = ?
            AND check_out IS NULL
            "#,
        )
        .bind(check_out)
        .bind(duration_minutes)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

#[derive(Clone)]
pub struct MySqlLeaveStore {
    pool: MySqlPool,
}

impl MySqlLeaveStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaveStore for MySqlLeaveStore {
    async fn begin(&self, employee_id: u64) -> Result<Box<dyn LeaveTx>, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Next-key locks on the employee's rows hold off concurrent inserts
        // for the same employee until this transaction ends.
        sqlx::query("SELECT id FROM leave_requests WHERE employee_id = ? FOR UPDATE")
            .bind(employee_id)
            .fetch_all(&mut *tx)
            .await?;

        Ok(Box::new(MySqlLeaveTx { tx }))
    }

    async fn find(&self, id: u64) -> Result<Option<LeaveRecord>, StoreError> {
        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?");
        let row = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(LeaveRecord::try_from).transpose()
    }

    async fn list(&self, query: &LeaveQuery) -> Result<(Vec<LeaveRecord>, i64), StoreError> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(employee_id) = query.employee_id {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::U64(employee_id));
        }

        if let Some(status) = query.status.as_ref() {
            where_sql.push_str(" AND status = ?");
            args.push(FilterValue::Str(AsRef::<str>::as_ref(status)));
        }

        let count_sql = format!("SELECT COUNT(*) FROM leave_requests{where_sql}");
        debug!(sql = %count_sql, "Counting leave requests");

        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(*v),
                FilterValue::Str(s) => count_q.bind(*s),
            };
        }
        let total = count_q.fetch_one(&self.pool).await?;

        let data_sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests{where_sql} \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        debug!(sql = %data_sql, page = query.page, per_page = query.per_page, "Fetching leave requests");

        let mut data_q = sqlx::query_as::<_, LeaveRow>(&data_sql);
        for arg in args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(v),
                FilterValue::Str(s) => data_q.bind(s),
            };
        }

        let rows = data_q
            .bind(query.per_page)
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((into_records(rows)?, total))
    }

    async fn transition(
        &self,
        id: u64,
        from: LeaveStatus,
        to: LeaveStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?
            WHERE id = ?
            AND status = ?
            "#,
        )
        .bind(to.to_string())
        .bind(id)
        .bind(from.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

struct MySqlLeaveTx {
    tx: Transaction<'static, MySql>,
}

#[async_trait]
impl LeaveTx for MySqlLeaveTx {
    async fn leave_type(&mut self, id: u64) -> Result<Option<LeaveType>, StoreError> {
        let leave_type = sqlx::query_as::<_, LeaveType>(
            "SELECT id, name, allowed_days FROM leave_types WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(leave_type)
    }

    async fn approved_days(
        &mut self,
        employee_id: u64,
        leave_type_id: u64,
    ) -> Result<i64, StoreError> {
        let days = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT CAST(COALESCE(SUM(total_days), 0) AS SIGNED)
            FROM leave_requests
            WHERE employee_id = ?
            AND leave_type_id = ?
            AND status = 'approved'
            "#,
        )
        .bind(employee_id)
        .bind(leave_type_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(days)
    }

    async fn history(&mut self, employee_id: u64) -> Result<Vec<LeaveRecord>, StoreError> {
        let sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE employee_id = ? \
             ORDER BY created_at ASC, id ASC"
        );
        let rows = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(employee_id)
            .fetch_all(&mut *self.tx)
            .await?;

        into_records(rows)
    }

    async fn insert(&mut self, leave: NewLeave) -> Result<LeaveRecord, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, employee_name, department_name, designation_name,
                 from_date, to_date, total_days, leave_type_id, description, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'pending', ?)
            "#,
        )
        .bind(leave.employee_id)
        .bind(&leave.identity.employee_name)
        .bind(&leave.identity.department_name)
        .bind(&leave.identity.designation_name)
        .bind(leave.from_date)
        .bind(leave.to_date)
        .bind(leave.total_days)
        .bind(leave.leave_type_id)
        .bind(&leave.description)
        .bind(leave.created_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(leave.into_record(result.last_insert_id()))
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}
