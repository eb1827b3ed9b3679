use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use elecpos_auth::AuthzError;
use elecpos_backend::BackendError;
use elecpos_backup::BackupError;
use elecpos_core::DomainError;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn backend_error_to_response(err: BackendError) -> axum::response::Response {
    match err {
        BackendError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        BackendError::Conflict { .. } => {
            json_error(StatusCode::CONFLICT, "conflict", err.to_string())
        }
        BackendError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        BackendError::UnknownTable(table) => json_error(
            StatusCode::BAD_REQUEST,
            "unknown_table",
            format!("unknown table: {table}"),
        ),
        BackendError::Serialization(e) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "serialization_error",
            e.to_string(),
        ),
        BackendError::Database(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "backend_error", msg)
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
    }
}

pub fn authz_error_to_response(err: AuthzError) -> axum::response::Response {
    json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string())
}

pub fn backup_error_to_response(err: BackupError) -> axum::response::Response {
    match err {
        BackupError::Backend(inner) => backend_error_to_response(inner),
        BackupError::Archive(_) | BackupError::BadEntry(_) | BackupError::BadJson { .. } => {
            json_error(StatusCode::BAD_REQUEST, "invalid_archive", err.to_string())
        }
        BackupError::UnknownTable(table) => json_error(
            StatusCode::BAD_REQUEST,
            "unknown_table",
            format!("unknown table: {table}"),
        ),
        BackupError::Json(e) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "serialization_error",
            e.to_string(),
        ),
        BackupError::Io(e) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "io_error",
            e.to_string(),
        ),
    }
}
