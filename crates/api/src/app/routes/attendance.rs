use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};

use textileops_core::{parse_date, AttendanceId, Period, WorkerId};
use textileops_workforce::{AttendanceEntry, AttendanceRecord, AttendanceReportRow, NewAttendance};

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::routes::common::{body, message, parse_id};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(record_attendance))
        .route("/date/:date", get(attendance_for_date))
        .route("/worker/:worker_id", get(attendance_for_worker))
        .route("/report/:start/:end", get(attendance_report))
        .route("/:id", delete(delete_attendance))
}

pub async fn record_attendance(
    Extension(services): Extension<Arc<AppServices>>,
    req: Result<Json<dto::RecordAttendanceRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AttendanceRecord>)> {
    let entry = NewAttendance::try_from(body(req)?)?;
    let record = services.attendance.record(entry).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn attendance_for_date(
    Extension(services): Extension<Arc<AppServices>>,
    Path(date): Path<String>,
) -> ApiResult<Json<Vec<AttendanceEntry>>> {
    let date = parse_date("date", &date)?;
    Ok(Json(services.attendance.for_date(date).await?))
}

pub async fn attendance_for_worker(
    Extension(services): Extension<Arc<AppServices>>,
    Path(worker_id): Path<String>,
) -> ApiResult<Json<Vec<AttendanceRecord>>> {
    let worker_id: WorkerId = parse_id(&worker_id)?;
    Ok(Json(services.attendance.for_worker(worker_id).await?))
}

pub async fn attendance_report(
    Extension(services): Extension<Arc<AppServices>>,
    Path((start, end)): Path<(String, String)>,
) -> ApiResult<Json<Vec<AttendanceReportRow>>> {
    let period = Period::parse(&start, &end)?;
    Ok(Json(services.attendance.report(period).await?))
}

pub async fn delete_attendance(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let id: AttendanceId = parse_id(&id)?;
    services.attendance.delete(id).await?;
    Ok(message("Attendance record deleted"))
}
