use crate::api::leave_request::{LeaveFilter, LeaveListResponse};
use crate::engine::{CheckInOutcome, CheckOutOutcome, LeaveApplication};
use crate::model::attendance::AttendanceRecord;
use crate::model::leave_request::{LeaveRecord, LeaveStatus, LeaveType};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Time & Leave API",
        version = "1.0.0",
        description = r#"
## Attendance and Leave

Daily check-in/check-out against the 09:00-17:00 working window, and
leave requests checked against quota, first-leave approval and
non-overlap with an ongoing approved leave.

### 🔐 Security
Every endpoint expects a **JWT Bearer** access token. Reviewing leave
(approve, reject, list) is limited to **Admin** and **HR**.

### 📦 Response Format
- JSON bodies
- Refused requests answer `400` with `{ "message", "code" }`
- Pagination on the leave list
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::today,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave
    ),
    components(
        schemas(
            AttendanceRecord,
            CheckInOutcome,
            CheckOutOutcome,
            LeaveApplication,
            LeaveRecord,
            LeaveStatus,
            LeaveType,
            LeaveFilter,
            LeaveListResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Leave", description = "Leave management APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
