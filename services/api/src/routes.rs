use crate::infra::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::Local;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::json;
use std::sync::Arc;
use warranty_dashboard::error::AppError;
use warranty_dashboard::workflows::summaries::SummaryTable;
use warranty_dashboard::workflows::{
    export_workbook, DatasetStatus, ExportRequest, ReportKind, WarrantyReports, XLSX_CONTENT_TYPE,
};

const DASHBOARD_PAGE: &str = include_str!("../assets/dashboard.html");

/// A summary table, or an empty list when it could not be built.
pub(crate) struct TableView(Option<SummaryTable>);

impl Serialize for TableView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.0 {
            Some(table) => table.serialize(serializer),
            None => serializer.serialize_seq(Some(0))?.end(),
        }
    }
}

/// Every summary keyed by its dashboard name.
pub(crate) struct DataPayload(Arc<WarrantyReports>);

impl Serialize for DataPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(ReportKind::ALL.len()))?;
        for kind in ReportKind::ALL {
            map.serialize_entry(kind.json_key(), &TableView(self.0.summary(kind).cloned()))?;
        }
        map.end()
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StatusResponse {
    pub(crate) divisions: Vec<String>,
    pub(crate) datasets: Vec<DatasetStatus>,
}

pub(crate) fn dashboard_router() -> Router {
    Router::new()
        .route("/", get(dashboard_page))
        .route("/api/data", get(data_endpoint))
        .route("/api/reports/:kind", get(report_endpoint))
        .route("/api/status", get(status_endpoint))
        .route("/api/export", post(export_endpoint))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn dashboard_page() -> Html<&'static str> {
    Html(DASHBOARD_PAGE)
}

pub(crate) async fn data_endpoint(Extension(state): Extension<AppState>) -> Json<DataPayload> {
    Json(DataPayload(state.reports))
}

pub(crate) async fn report_endpoint(
    Extension(state): Extension<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<TableView>, AppError> {
    let kind: ReportKind = kind.parse()?;
    Ok(Json(TableView(state.reports.summary(kind).cloned())))
}

pub(crate) async fn status_endpoint(Extension(state): Extension<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        divisions: state.reports.divisions(),
        datasets: state.reports.statuses(),
    })
}

pub(crate) async fn export_endpoint(
    Extension(state): Extension<AppState>,
    payload: Result<Json<ExportRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload.map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))?;
    let today = Local::now().date_naive();
    let file = export_workbook(&request, &state.reports, today)?;

    tracing::info!(
        report = %request.kind,
        division = %request.division,
        bytes = file.bytes.len(),
        "export generated"
    );

    let disposition = format!("attachment; filename=\"{}\"", file.file_name);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    ))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
