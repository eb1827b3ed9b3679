use std::sync::Arc;

use axum::{
    extract::Extension, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};

use elecpos_backend::records::NewAccount;

use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/", post(create_account).get(list_accounts))
}

pub async fn list_accounts(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.backend.list_accounts().await {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => errors::backend_error_to_response(e),
    }
}

pub async fn create_account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateAccountRequest>,
) -> axum::response::Response {
    if let Err(resp) = common::authorize(&principal, common::BACK_OFFICE) {
        return resp;
    }
    if body.code.trim().is_empty() || body.name_ar.trim().is_empty() {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "code and name are required",
        );
    }

    let new = NewAccount {
        code: body.code,
        name_ar: body.name_ar,
        name_en: body.name_en,
        kind: body.kind,
    };
    match services.backend.insert_account(new).await {
        Ok(account) => (StatusCode::CREATED, Json(account)).into_response(),
        Err(e) => errors::backend_error_to_response(e),
    }
}
