use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use elecpos_reports::{movement_with_balance, summarize_trial_balance};

use crate::app::errors;
use crate::app::routes::common;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/inventory", get(inventory))
        .route("/movement", get(movement))
        .route("/trial-balance", get(trial_balance))
}

pub async fn inventory(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.backend.report_inventory().await {
        Ok(rows) => (StatusCode::OK, Json(serde_json::json!({ "rows": rows }))).into_response(),
        Err(e) => errors::backend_error_to_response(e),
    }
}

pub async fn movement(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<HashMap<String, String>>,
) -> axum::response::Response {
    let from = match common::parse_date("from", params.get("from").map(String::as_str)) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let to = match common::parse_date("to", params.get("to").map(String::as_str)) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    // `sku` is comma-separated; blanks are dropped.
    let skus: Vec<String> = params
        .get("sku")
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let rows = match services.backend.report_movement(from, to, &skus).await {
        Ok(rows) => rows,
        Err(e) => return errors::backend_error_to_response(e),
    };
    let (lines, summary) = movement_with_balance(rows);

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "rows": lines,
            "summary": summary,
        })),
    )
        .into_response()
}

pub async fn trial_balance(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<HashMap<String, String>>,
) -> axum::response::Response {
    let from = match common::parse_date("from", params.get("from").map(String::as_str)) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let to = match common::parse_date("to", params.get("to").map(String::as_str)) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let rows = match services.backend.report_trial_balance(from, to).await {
        Ok(rows) => rows,
        Err(e) => return errors::backend_error_to_response(e),
    };
    let summary = summarize_trial_balance(&rows);

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "rows": rows,
            "summary": summary,
        })),
    )
        .into_response()
}
