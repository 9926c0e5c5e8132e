//! In-memory backends. Thread-safe; used by tests and for running the
//! engines without a database.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};

use crate::engine::time_window::Elapsed;
use crate::identity::IdentityProvider;
use crate::model::attendance::{AttendanceRecord, NewAttendance};
use crate::model::employee::EmployeeProfile;
use crate::model::leave_request::{LeaveRecord, LeaveStatus, LeaveType, NewLeave};
use crate::store::{AttendanceStore, LeaveQuery, LeaveStore, LeaveTx, StoreError};

fn lock<'a, T>(m: &'a Mutex<T>, context: &'static str) -> Result<MutexGuard<'a, T>, StoreError> {
    m.lock().map_err(|_| StoreError::Poisoned(context))
}

#[derive(Debug, Default)]
struct AttendanceState {
    next_id: u64,
    by_id: HashMap<u64, AttendanceRecord>,
    by_day: HashMap<(u64, NaiveDate), u64>,
}

#[derive(Debug, Default)]
pub struct MemoryAttendanceStore {
    state: Mutex<AttendanceState>,
}

impl MemoryAttendanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(lock(&self.state, "attendance")?.by_id.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl AttendanceStore for MemoryAttendanceStore {
    async fn find_for_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let state = lock(&self.state, "attendance")?;
        Ok(state
            .by_day
            .get(&(employee_id, date))
            .and_then(|id| state.by_id.get(id))
            .cloned())
    }

    async fn create_if_absent(
        &self,
        attendance: NewAttendance,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let mut state = lock(&self.state, "attendance")?;
        let key = (attendance.employee_id, attendance.date);
        if state.by_day.contains_key(&key) {
            return Ok(None);
        }

        state.next_id += 1;
        let record = attendance.into_record(state.next_id);
        state.by_day.insert(key, record.id);
        state.by_id.insert(record.id, record.clone());
        Ok(Some(record))
    }

    async fn set_overtime(&self, id: u64, overtime: Option<Elapsed>) -> Result<(), StoreError> {
        let mut state = lock(&self.state, "attendance")?;
        if let Some(record) = state.by_id.get_mut(&id) {
            record.overtime_duration = overtime;
        }
        Ok(())
    }

    async fn complete_check_out(
        &self,
        id: u64,
        check_out: NaiveTime,
        duration_minutes: i64,
    ) -> Result<bool, StoreError> {
        let mut state = lock(&self.state, "attendance")?;
        match state.by_id.get_mut(&id) {
            Some(record) if record.check_out.is_none() => {
                record.check_out = Some(check_out);
                record.duration_minutes = Some(duration_minutes);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Debug, Default)]
struct LeaveState {
    next_id: u64,
    types: HashMap<u64, LeaveType>,
    records: Vec<LeaveRecord>,
    in_flight: HashSet<u64>,
}

impl LeaveState {
    fn history(&self, employee_id: u64) -> Vec<LeaveRecord> {
        let mut history: Vec<LeaveRecord> = self
            .records
            .iter()
            .filter(|r| r.employee_id == employee_id)
            .cloned()
            .collect();
        history.sort_by_key(|r| (r.created_at, r.id));
        history
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryLeaveStore {
    state: Arc<Mutex<LeaveState>>,
}

impl MemoryLeaveStore {
    pub fn new(types: impl IntoIterator<Item = LeaveType>) -> Self {
        let state = LeaveState {
            types: types.into_iter().map(|t| (t.id, t)).collect(),
            ..LeaveState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Stores `leave` with the given status, bypassing admission rules.
    /// Used to set up prior history.
    pub fn seed(&self, leave: NewLeave, status: LeaveStatus) -> Result<LeaveRecord, StoreError> {
        let mut state = lock(&self.state, "leave")?;
        state.next_id += 1;
        let mut record = leave.into_record(state.next_id);
        record.status = status;
        state.records.push(record.clone());
        Ok(record)
    }

    pub fn records(&self) -> Result<Vec<LeaveRecord>, StoreError> {
        Ok(lock(&self.state, "leave")?.records.clone())
    }
}

#[async_trait]
impl LeaveStore for MemoryLeaveStore {
    async fn begin(&self, employee_id: u64) -> Result<Box<dyn LeaveTx>, StoreError> {
        let mut state = lock(&self.state, "leave")?;
        if !state.in_flight.insert(employee_id) {
            return Err(StoreError::Busy(employee_id));
        }
        Ok(Box::new(MemoryLeaveTx {
            state: Arc::clone(&self.state),
            employee_id,
            staged: Vec::new(),
        }))
    }

    async fn find(&self, id: u64) -> Result<Option<LeaveRecord>, StoreError> {
        let state = lock(&self.state, "leave")?;
        Ok(state.records.iter().find(|r| r.id == id).cloned())
    }

    async fn list(&self, query: &LeaveQuery) -> Result<(Vec<LeaveRecord>, i64), StoreError> {
        let state = lock(&self.state, "leave")?;
        let mut matching: Vec<&LeaveRecord> = state
            .records
            .iter()
            .filter(|r| query.employee_id.is_none_or(|id| r.employee_id == id))
            .filter(|r| query.status.is_none_or(|s| r.status == s))
            .collect();
        matching.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
            .take(query.per_page as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn transition(
        &self,
        id: u64,
        from: LeaveStatus,
        to: LeaveStatus,
    ) -> Result<bool, StoreError> {
        let mut state = lock(&self.state, "leave")?;
        match state.records.iter_mut().find(|r| r.id == id) {
            Some(record) if record.status == from => {
                record.status = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

struct MemoryLeaveTx {
    state: Arc<Mutex<LeaveState>>,
    employee_id: u64,
    staged: Vec<LeaveRecord>,
}

#[async_trait]
impl LeaveTx for MemoryLeaveTx {
    async fn leave_type(&mut self, id: u64) -> Result<Option<LeaveType>, StoreError> {
        let state = lock(&self.state, "leave")?;
        Ok(state.types.get(&id).cloned())
    }

    async fn approved_days(
        &mut self,
        employee_id: u64,
        leave_type_id: u64,
    ) -> Result<i64, StoreError> {
        let state = lock(&self.state, "leave")?;
        Ok(state
            .records
            .iter()
            .filter(|r| r.employee_id == employee_id)
            .filter(|r| r.leave_type_id == leave_type_id && r.status == LeaveStatus::Approved)
            .map(|r| r.total_days)
            .sum())
    }

    async fn history(&mut self, employee_id: u64) -> Result<Vec<LeaveRecord>, StoreError> {
        let state = lock(&self.state, "leave")?;
        Ok(state.history(employee_id))
    }

    async fn insert(&mut self, leave: NewLeave) -> Result<LeaveRecord, StoreError> {
        let mut state = lock(&self.state, "leave")?;
        state.next_id += 1;
        let record = leave.into_record(state.next_id);
        self.staged.push(record.clone());
        Ok(record)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut this = self;
        let staged = std::mem::take(&mut this.staged);
        let mut state = lock(&this.state, "leave")?;
        state.records.extend(staged);
        Ok(())
    }
}

impl Drop for MemoryLeaveTx {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.in_flight.remove(&self.employee_id);
        }
    }
}

/// Fixed set of employee profiles.
#[derive(Debug, Default)]
pub struct StaticIdentityProvider {
    profiles: HashMap<u64, EmployeeProfile>,
}

impl StaticIdentityProvider {
    pub fn new(profiles: impl IntoIterator<Item = EmployeeProfile>) -> Self {
        Self {
            profiles: profiles.into_iter().map(|p| (p.employee_id, p)).collect(),
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn profile(&self, employee_id: u64) -> Result<EmployeeProfile, StoreError> {
        self.profiles
            .get(&employee_id)
            .cloned()
            .ok_or(StoreError::EmployeeNotFound(employee_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::employee::IdentitySnapshot;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, d).unwrap()
    }

    fn identity() -> IdentitySnapshot {
        IdentitySnapshot {
            employee_name: "Ada".into(),
            department_name: "Ops".into(),
            designation_name: "Lead".into(),
        }
    }

    fn new_attendance(employee_id: u64, date: NaiveDate) -> NewAttendance {
        NewAttendance {
            employee_id,
            identity: identity(),
            date,
            month: "April".into(),
            check_in: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            late_duration: Elapsed::ZERO,
        }
    }

    fn new_leave(employee_id: u64, from: u32) -> NewLeave {
        NewLeave {
            employee_id,
            identity: identity(),
            from_date: day(from),
            to_date: day(from),
            total_days: 1,
            leave_type_id: 1,
            description: String::new(),
            created_at: day(1).and_hms_opt(8, 0, from).unwrap(),
        }
    }

    #[actix_web::test]
    async fn create_if_absent_keeps_one_record_per_day() {
        let store = MemoryAttendanceStore::new();
        assert!(store.create_if_absent(new_attendance(1, day(3))).await.unwrap().is_some());
        assert!(store.create_if_absent(new_attendance(1, day(3))).await.unwrap().is_none());
        assert!(store.create_if_absent(new_attendance(2, day(3))).await.unwrap().is_some());
        assert!(store.create_if_absent(new_attendance(1, day(4))).await.unwrap().is_some());
        assert_eq!(store.len().unwrap(), 3);
    }

    #[actix_web::test]
    async fn check_out_is_written_once() {
        let store = MemoryAttendanceStore::new();
        let record = store
            .create_if_absent(new_attendance(1, day(3)))
            .await
            .unwrap()
            .unwrap();
        let five = NaiveTime::from_hms_opt(17, 0, 0).unwrap();
        assert!(store.complete_check_out(record.id, five, 480).await.unwrap());
        assert!(!store.complete_check_out(record.id, five, 480).await.unwrap());
    }

    #[test]
    fn poisoned_locks_surface_as_errors() {
        let leaves = MemoryLeaveStore::new([]);
        let state = Arc::clone(&leaves.state);
        let _ = std::thread::spawn(move || {
            let _guard = state.lock().unwrap();
            panic!("poison the leave state");
        })
        .join();
        assert!(matches!(leaves.records(), Err(StoreError::Poisoned("leave"))));

        let attendance = MemoryAttendanceStore::new();
        std::thread::scope(|s| {
            let _ = s
                .spawn(|| {
                    let _guard = attendance.state.lock().unwrap();
                    panic!("poison the attendance state");
                })
                .join();
        });
        assert!(matches!(attendance.len(), Err(StoreError::Poisoned("attendance"))));
    }

    #[actix_web::test]
    async fn second_unit_of_work_for_same_employee_is_busy() {
        let store = MemoryLeaveStore::new([]);
        let tx = store.begin(9).await.unwrap();
        assert!(matches!(store.begin(9).await, Err(StoreError::Busy(9))));
        assert!(store.begin(10).await.is_ok());
        drop(tx);
        assert!(store.begin(9).await.is_ok());
    }

    #[actix_web::test]
    async fn uncommitted_inserts_are_discarded() {
        let store = MemoryLeaveStore::new([]);
        let mut tx = store.begin(1).await.unwrap();
        tx.insert(new_leave(1, 10)).await.unwrap();
        drop(tx);
        assert!(store.records().unwrap().is_empty());

        let mut tx = store.begin(1).await.unwrap();
        tx.insert(new_leave(1, 10)).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(store.records().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn list_filters_and_pages_newest_first() {
        let store = MemoryLeaveStore::new([]);
        for from in 10..15 {
            store.seed(new_leave(1, from), LeaveStatus::Pending).unwrap();
        }
        store.seed(new_leave(2, 20), LeaveStatus::Approved).unwrap();

        let query = LeaveQuery {
            employee_id: Some(1),
            page: 2,
            per_page: 2,
            ..LeaveQuery::default()
        };
        let (page, total) = store.list(&query).await.unwrap();
        assert_eq!(total, 5);
        let starts: Vec<_> = page.iter().map(|r| r.from_date).collect();
        assert_eq!(starts, vec![day(12), day(11)]);

        let query = LeaveQuery {
            status: Some(LeaveStatus::Approved),
            ..LeaveQuery::default()
        };
        let (page, total) = store.list(&query).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(page[0].employee_id, 2);
    }

    #[actix_web::test]
    async fn transition_only_from_expected_status() {
        let store = MemoryLeaveStore::new([]);
        let record = store.seed(new_leave(1, 10), LeaveStatus::Pending).unwrap();
        assert!(store
            .transition(record.id, LeaveStatus::Pending, LeaveStatus::Approved)
            .await
            .unwrap());
        assert!(!store
            .transition(record.id, LeaveStatus::Pending, LeaveStatus::Rejected)
            .await
            .unwrap());
        assert_eq!(
            store.find(record.id).await.unwrap().unwrap().status,
            LeaveStatus::Approved
        );
    }
}
