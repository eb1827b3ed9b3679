use std::sync::Arc;

use axum::{
    extract::Extension, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};

use elecpos_auth::Role;
use elecpos_backend::records::NewUser;

use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/users", post(create_user).get(list_users))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = common::authorize(&principal, common::ADMIN_ONLY) {
        return resp;
    }
    match services.backend.list_user_profiles().await {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => errors::backend_error_to_response(e),
    }
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateUserRequest>,
) -> axum::response::Response {
    if let Err(resp) = common::authorize(&principal, common::ADMIN_ONLY) {
        return resp;
    }
    if body.email.trim().is_empty() || body.password.trim().is_empty() {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "email and password are required",
        );
    }
    let role = match body.role.as_deref() {
        None => Role::Cashier,
        Some(raw) => match Role::parse(raw) {
            Some(role) => role,
            None => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    "role must be one of: admin, manager, cashier, viewer",
                )
            }
        },
    };

    let new = NewUser {
        email: body.email,
        password: body.password,
        full_name: body.full_name,
        role: role.as_str().to_string(),
    };
    match services.backend.create_user(new).await {
        Ok(profile) => (StatusCode::CREATED, Json(profile)).into_response(),
        Err(e) => errors::backend_error_to_response(e),
    }
}
