use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use textileops_core::{Period, WorkerId};
use textileops_workforce::{PayrollRecord, PayrollRun, PayrollSummary};

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::routes::common::{body, parse_id};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_payroll))
        .route("/calculate", post(calculate_payroll))
        .route("/period/:start/:end", get(payroll_for_period))
        .route("/worker/:worker_id", get(payroll_for_worker))
}

pub async fn calculate_payroll(
    Extension(services): Extension<Arc<AppServices>>,
    req: Result<Json<dto::CalculatePayrollRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PayrollRun>)> {
    let period = body(req)?.period()?;
    let run = services.payroll.calculate(period).await?;
    Ok((StatusCode::CREATED, Json(run)))
}

pub async fn list_payroll(
    Extension(services): Extension<Arc<AppServices>>,
) -> ApiResult<Json<Vec<PayrollRecord>>> {
    Ok(Json(services.payroll.list().await?))
}

pub async fn payroll_for_period(
    Extension(services): Extension<Arc<AppServices>>,
    Path((start, end)): Path<(String, String)>,
) -> ApiResult<Json<PayrollSummary>> {
    let period = Period::parse(&start, &end)?;
    Ok(Json(services.payroll.for_period(period).await?))
}

pub async fn payroll_for_worker(
    Extension(services): Extension<Arc<AppServices>>,
    Path(worker_id): Path<String>,
) -> ApiResult<Json<Vec<PayrollRecord>>> {
    let worker_id: WorkerId = parse_id(&worker_id)?;
    Ok(Json(services.payroll.for_worker(worker_id).await?))
}
