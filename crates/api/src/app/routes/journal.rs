use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use elecpos_backend::records::QuickJournalEntry;

use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_entries))
        .route("/quick", post(quick_entry))
}

pub async fn list_entries(
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

    match services.backend.list_journal_entries(from, to).await {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => errors::backend_error_to_response(e),
    }
}

pub async fn quick_entry(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::QuickJournalRequest>,
) -> axum::response::Response {
    if let Err(resp) = common::authorize(&principal, common::BACK_OFFICE) {
        return resp;
    }
    if body.amount <= 0.0 {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "amount must be positive",
        );
    }
    if body.debit_account_id == body.credit_account_id {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "debit and credit accounts must differ",
        );
    }

    let entry = QuickJournalEntry {
        entry_date: body.entry_date,
        voucher_no: body.voucher_no,
        description: body.description,
        debit_account_id: body.debit_account_id,
        credit_account_id: body.credit_account_id,
        amount: body.amount,
    };
    match services.backend.post_journal_quick(entry).await {
        Ok((debit_id, credit_id)) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "ok": true,
                "debit_entry_id": debit_id,
                "credit_entry_id": credit_id,
            })),
        )
            .into_response(),
        Err(e) => errors::backend_error_to_response(e),
    }
}
