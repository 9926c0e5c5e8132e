use crate::auth::auth::AuthUser;
use crate::engine::EngineError;
use crate::state::AppState;
use actix_web::{HttpResponse, Responder, web};
use serde_json::json;

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance",
    responses(
        (status = 200, description = "Checked in successfully", body = crate::engine::CheckInOutcome),
        (status = 400, description = "Outside working hours or already checked in today", body = Object, example = json!({
            "message": "Already checked in on 2026-01-05",
            "code": "already_exists"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    let profile = state
        .identity
        .profile(employee_id)
        .await
        .map_err(EngineError::from)?;

    let outcome = state
        .attendance
        .check_in(employee_id, &profile, state.clock.now())
        .await?;

    Ok(HttpResponse::Ok().json(outcome))
}

/// Check-out endpoint
#[utoipa::path(
    put,
    path = "/api/attendance",
    responses(
        (status = 200, description = "Checked out successfully", body = crate::engine::CheckOutOutcome),
        (status = 400, description = "No check-in today, or already checked out", body = Object, example = json!({
            "message": "No check-in found for 2026-01-05",
            "code": "no_check_in"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    let outcome = state
        .attendance
        .check_out(employee_id, state.clock.now())
        .await?;

    Ok(HttpResponse::Ok().json(outcome))
}

/// Today's attendance for the caller
#[utoipa::path(
    get,
    path = "/api/attendance",
    responses(
        (status = 200, description = "Today's attendance record", body = crate::model::attendance::AttendanceRecord),
        (status = 404, description = "Not checked in today", body = Object, example = json!({
            "message": "Not checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn today(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    match state
        .attendance
        .current_day(employee_id, state.clock.now())
        .await?
    {
        Some(record) => Ok(HttpResponse::Ok().json(record)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Not checked in today"
        }))),
    }
}
