use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::engine::error::{EngineError, Rejection};
use crate::engine::time_window::days_inclusive;
use crate::model::employee::EmployeeProfile;
use crate::model::leave_request::{LeaveRecord, LeaveStatus, NewLeave};
use crate::store::{LeaveQuery, LeaveStore, StoreError};

/// What the employee asks for.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LeaveApplication {
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub from_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub to_date: NaiveDate,
    #[schema(example = 1)]
    pub leave_type_id: u64,
    #[schema(example = "Family event")]
    #[serde(default)]
    pub description: String,
}

#[derive(Clone)]
pub struct LeaveEngine {
    store: Arc<dyn LeaveStore>,
}

impl LeaveEngine {
    pub fn new(store: Arc<dyn LeaveStore>) -> Self {
        Self { store }
    }

    /// Admits a leave request as pending, or says which rule refused it.
    /// Cheap date checks run before anything touches the store.
    pub async fn submit_leave(
        &self,
        employee_id: u64,
        profile: &EmployeeProfile,
        application: LeaveApplication,
        now: NaiveDateTime,
    ) -> Result<LeaveRecord, EngineError> {
        let today = now.date();
        let LeaveApplication {
            from_date,
            to_date,
            leave_type_id,
            description,
        } = application;

        if to_date < from_date {
            return Err(Rejection::InvalidDateRange { from_date, to_date }.into());
        }
        if from_date <= today {
            return Err(Rejection::NotFutureDated { from_date, today }.into());
        }
        let total_days = days_inclusive(from_date, to_date);

        let mut tx = self.store.begin(employee_id).await?;

        let leave_type = tx
            .leave_type(leave_type_id)
            .await?
            .ok_or(Rejection::UnknownLeaveType { leave_type_id })?;

        let consumed = tx.approved_days(employee_id, leave_type.id).await?;
        if consumed + total_days > leave_type.allowed_days {
            return Err(Rejection::QuotaExceeded {
                leave_type: leave_type.name,
                allowed: leave_type.allowed_days,
                consumed,
                requested: total_days,
            }
            .into());
        }

        let history = tx.history(employee_id).await?;
        debug!(employee_id, prior = history.len(), "Checking leave history gates");
        first_leave_gate(&history)?;
        sequencing_gate(&history, today)?;

        let record = tx
            .insert(NewLeave {
                employee_id,
                identity: profile.snapshot(),
                from_date,
                to_date,
                total_days,
                leave_type_id: leave_type.id,
                description,
                created_at: now,
            })
            .await?;
        tx.commit().await?;

        info!(
            employee_id,
            leave_id = record.id,
            %from_date,
            %to_date,
            total_days,
            "Leave request submitted"
        );
        Ok(record)
    }

    /// Records the reviewer's decision on a pending request. Returns false
    /// when the request is missing or was already decided.
    pub async fn record_decision(
        &self,
        leave_id: u64,
        decision: LeaveStatus,
    ) -> Result<bool, StoreError> {
        if decision == LeaveStatus::Pending {
            return Ok(false);
        }
        let changed = self
            .store
            .transition(leave_id, LeaveStatus::Pending, decision)
            .await?;
        if changed {
            info!(leave_id, %decision, "Leave request reviewed");
        }
        Ok(changed)
    }

    pub async fn find(&self, leave_id: u64) -> Result<Option<LeaveRecord>, StoreError> {
        self.store.find(leave_id).await
    }

    pub async fn list(&self, query: &LeaveQuery) -> Result<(Vec<LeaveRecord>, i64), StoreError> {
        self.store.list(query).await
    }
}

/// The employee's first decided request must not block them: an approved or
/// rejected one lets later requests through, an undecided history does not.
/// `history` is oldest first.
pub fn first_leave_gate(history: &[LeaveRecord]) -> Result<(), Rejection> {
    if history.is_empty() {
        return Ok(());
    }

    let Some(first_decided) = history.iter().find(|r| r.status != LeaveStatus::Pending) else {
        return Err(Rejection::FirstLeavePending);
    };

    match first_decided.status {
        LeaveStatus::Approved | LeaveStatus::Rejected => Ok(()),
        status => Err(Rejection::FirstLeaveNotApproved { status }),
    }
}

/// No new request while the latest approved leave has not ended.
pub fn sequencing_gate(history: &[LeaveRecord], today: NaiveDate) -> Result<(), Rejection> {
    let latest_end = history
        .iter()
        .filter(|r| r.status == LeaveStatus::Approved)
        .map(|r| r.to_date)
        .max();

    match latest_end {
        Some(until) if until > today => Err(Rejection::PreviousLeaveOngoing { until }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::employee::IdentitySnapshot;
    use crate::model::leave_request::LeaveType;
    use crate::store::memory::MemoryLeaveStore;

    const EMPLOYEE: u64 = 7;
    const ANNUAL: u64 = 1;
    const SICK: u64 = 2;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    // "Today" for every test is 2026-06-10.
    fn now() -> NaiveDateTime {
        day(6, 10).and_hms_opt(11, 0, 0).unwrap()
    }

    fn profile() -> EmployeeProfile {
        EmployeeProfile {
            employee_id: EMPLOYEE,
            name: Some("Joy Barua".into()),
            department_name: None,
            designation_name: Some("Analyst".into()),
        }
    }

    fn store() -> MemoryLeaveStore {
        MemoryLeaveStore::new([
            LeaveType { id: ANNUAL, name: "annual".into(), allowed_days: 10 },
            LeaveType { id: SICK, name: "sick".into(), allowed_days: 5 },
        ])
    }

    fn application(from: NaiveDate, to: NaiveDate, leave_type_id: u64) -> LeaveApplication {
        LeaveApplication {
            from_date: from,
            to_date: to,
            leave_type_id,
            description: "trip".into(),
        }
    }

    /// Prior request created `n` days before today.
    fn prior(from: NaiveDate, to: NaiveDate, leave_type_id: u64, n: i64) -> NewLeave {
        NewLeave {
            employee_id: EMPLOYEE,
            identity: IdentitySnapshot {
                employee_name: "Joy Barua".into(),
                department_name: "Not specified".into(),
                designation_name: "Analyst".into(),
            },
            from_date: from,
            to_date: to,
            total_days: days_inclusive(from, to),
            leave_type_id,
            description: String::new(),
            created_at: now() - chrono::TimeDelta::days(n),
        }
    }

    fn rejection(err: EngineError) -> Rejection {
        match err {
            EngineError::Rejected(r) => r,
            other => panic!("expected a rejection, got {other:?}"),
        }
    }

    async fn submit(
        store: &MemoryLeaveStore,
        app: LeaveApplication,
    ) -> Result<LeaveRecord, EngineError> {
        LeaveEngine::new(Arc::new(store.clone()))
            .submit_leave(EMPLOYEE, &profile(), app, now())
            .await
    }

    #[actix_web::test]
    async fn leave_starting_today_is_not_future_dated() {
        let store = store();
        let err = submit(&store, application(day(6, 10), day(6, 11), ANNUAL))
            .await
            .unwrap_err();
        assert_eq!(
            rejection(err),
            Rejection::NotFutureDated { from_date: day(6, 10), today: day(6, 10) }
        );
        assert!(store.records().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn first_request_starting_tomorrow_is_admitted_as_pending() {
        let store = store();
        let record = submit(&store, application(day(6, 11), day(6, 13), ANNUAL))
            .await
            .unwrap();

        assert_eq!(record.status, LeaveStatus::Pending);
        assert_eq!(record.total_days, 3);
        assert_eq!(record.employee_name, "Joy Barua");
        assert_eq!(record.department_name, "Not specified");
        assert_eq!(record.created_at, now());
        assert_eq!(store.records().unwrap(), vec![record]);
    }

    #[actix_web::test]
    async fn end_before_start_is_rejected_first() {
        let store = store();
        // Also in the past, but the range check wins.
        let err = submit(&store, application(day(6, 5), day(6, 1), 99)).await.unwrap_err();
        assert!(matches!(rejection(err), Rejection::InvalidDateRange { .. }));
    }

    #[actix_web::test]
    async fn unknown_leave_type_is_rejected() {
        let store = store();
        let err = submit(&store, application(day(6, 11), day(6, 11), 99)).await.unwrap_err();
        assert_eq!(rejection(err), Rejection::UnknownLeaveType { leave_type_id: 99 });
    }

    #[actix_web::test]
    async fn quota_counts_only_approved_requests_of_the_same_type() {
        let store = store();
        store.seed(prior(day(3, 1), day(3, 3), ANNUAL, 90), LeaveStatus::Approved).unwrap();
        store.seed(prior(day(4, 1), day(4, 5), ANNUAL, 60), LeaveStatus::Rejected).unwrap();
        store.seed(prior(day(5, 1), day(5, 4), SICK, 40), LeaveStatus::Approved).unwrap();

        // 3 approved annual days + 8 requested > 10.
        let err = submit(&store, application(day(7, 1), day(7, 8), ANNUAL)).await.unwrap_err();
        assert_eq!(
            rejection(err),
            Rejection::QuotaExceeded {
                leave_type: "annual".into(),
                allowed: 10,
                consumed: 3,
                requested: 8,
            }
        );
        assert_eq!(store.records().unwrap().len(), 3);

        // Exactly filling the quota is fine.
        let record = submit(&store, application(day(7, 1), day(7, 7), ANNUAL)).await.unwrap();
        assert_eq!(record.total_days, 7);
    }

    #[actix_web::test]
    async fn pending_first_leave_blocks_the_next_request() {
        let store = store();
        submit(&store, application(day(6, 20), day(6, 21), ANNUAL)).await.unwrap();

        let err = submit(&store, application(day(7, 1), day(7, 1), SICK)).await.unwrap_err();
        assert_eq!(rejection(err), Rejection::FirstLeavePending);
        assert_eq!(store.records().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn rejected_first_leave_does_not_block() {
        let store = store();
        store.seed(prior(day(5, 1), day(5, 2), ANNUAL, 45), LeaveStatus::Rejected).unwrap();

        let record = submit(&store, application(day(6, 15), day(6, 16), ANNUAL)).await.unwrap();
        assert_eq!(record.status, LeaveStatus::Pending);
    }

    #[actix_web::test]
    async fn ongoing_approved_leave_blocks_a_new_one() {
        let store = store();
        store.seed(prior(day(6, 8), day(6, 12), ANNUAL, 20), LeaveStatus::Approved).unwrap();

        let err = submit(&store, application(day(6, 20), day(6, 20), SICK)).await.unwrap_err();
        assert_eq!(rejection(err), Rejection::PreviousLeaveOngoing { until: day(6, 12) });
    }

    #[actix_web::test]
    async fn approved_leave_ending_today_has_passed() {
        let store = store();
        store.seed(prior(day(6, 8), day(6, 10), ANNUAL, 20), LeaveStatus::Approved).unwrap();

        assert!(submit(&store, application(day(6, 20), day(6, 20), SICK)).await.is_ok());
    }

    #[actix_web::test]
    async fn rejected_submission_is_repeatable_and_writes_nothing() {
        let store = store();
        store.seed(prior(day(6, 8), day(6, 30), ANNUAL, 20), LeaveStatus::Approved).unwrap();
        let before = store.records().unwrap();

        for _ in 0..2 {
            let err = submit(&store, application(day(7, 5), day(7, 5), SICK)).await.unwrap_err();
            assert_eq!(rejection(err), Rejection::PreviousLeaveOngoing { until: day(6, 30) });
        }
        assert_eq!(store.records().unwrap(), before);
    }

    #[actix_web::test]
    async fn concurrent_unit_of_work_surfaces_as_store_error() {
        let store = store();
        let _held = store.begin(EMPLOYEE).await.unwrap();

        let err = submit(&store, application(day(6, 11), day(6, 11), ANNUAL)).await.unwrap_err();
        assert!(matches!(err, EngineError::Store(StoreError::Busy(EMPLOYEE))));
    }

    #[actix_web::test]
    async fn decisions_apply_only_to_pending_requests() {
        let store = store();
        let engine = LeaveEngine::new(Arc::new(store.clone()));
        let record = submit(&store, application(day(6, 11), day(6, 11), ANNUAL)).await.unwrap();

        assert!(!engine.record_decision(record.id, LeaveStatus::Pending).await.unwrap());
        assert!(engine.record_decision(record.id, LeaveStatus::Approved).await.unwrap());
        assert!(!engine.record_decision(record.id, LeaveStatus::Rejected).await.unwrap());
        assert_eq!(
            engine.find(record.id).await.unwrap().unwrap().status,
            LeaveStatus::Approved
        );
    }

    #[test]
    fn first_decided_request_is_the_earliest_non_pending() {
        let pending = prior(day(1, 1), day(1, 1), ANNUAL, 100).into_record(1);
        let mut approved = prior(day(2, 1), day(2, 1), ANNUAL, 90).into_record(2);
        approved.status = LeaveStatus::Approved;

        assert_eq!(first_leave_gate(&[]), Ok(()));
        assert_eq!(first_leave_gate(&[pending.clone()]), Err(Rejection::FirstLeavePending));
        assert_eq!(first_leave_gate(&[pending, approved]), Ok(()));
    }

    #[test]
    fn sequencing_uses_the_latest_approved_end() {
        let mut early = prior(day(6, 1), day(6, 3), ANNUAL, 30).into_record(1);
        early.status = LeaveStatus::Approved;
        let mut later = prior(day(6, 9), day(6, 11), ANNUAL, 20).into_record(2);
        later.status = LeaveStatus::Approved;
        let pending = prior(day(6, 20), day(6, 25), ANNUAL, 5).into_record(3);

        assert_eq!(sequencing_gate(&[early.clone(), pending.clone()], day(6, 10)), Ok(()));
        assert_eq!(
            sequencing_gate(&[early, later, pending], day(6, 10)),
            Err(Rejection::PreviousLeaveOngoing { until: day(6, 11) })
        );
    }
}
