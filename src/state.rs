use std::sync::Arc;

use sqlx::MySqlPool;

use crate::clock::{Clock, SystemClock};
use crate::engine::{AttendanceEngine, LeaveEngine};
use crate::identity::{IdentityProvider, MySqlIdentityProvider};
use crate::store::mysql::{MySqlAttendanceStore, MySqlLeaveStore};
use crate::store::{AttendanceStore, LeaveStore};

/// Everything a request handler needs, shared across workers.
#[derive(Clone)]
pub struct AppState {
    pub attendance: AttendanceEngine,
    pub leave: LeaveEngine,
    pub identity: Arc<dyn IdentityProvider>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        attendance_store: Arc<dyn AttendanceStore>,
        leave_store: Arc<dyn LeaveStore>,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            attendance: AttendanceEngine::new(attendance_store),
            leave: LeaveEngine::new(leave_store),
            identity,
            clock,
        }
    }

    pub fn mysql(pool: MySqlPool) -> Self {
        Self::new(
            Arc::new(MySqlAttendanceStore::new(pool.clone())),
            Arc::new(MySqlLeaveStore::new(pool.clone())),
            Arc::new(MySqlIdentityProvider::new(pool)),
            Arc::new(SystemClock),
        )
    }
}
