use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Extension, Multipart},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use elecpos_backup::{export_dump, import_dump, restore_archive, write_archive};

use crate::app::errors;
use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/export", get(export))
        .route("/export.zip", get(export_zip))
        .route("/import", post(import))
}

pub async fn export(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = common::authorize(&principal, common::ADMIN_ONLY) {
        return resp;
    }
    match export_dump(services.backend.as_ref()).await {
        Ok(dump) => (StatusCode::OK, Json(dump)).into_response(),
        Err(e) => errors::backup_error_to_response(e),
    }
}

pub async fn export_zip(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = common::authorize(&principal, common::ADMIN_ONLY) {
        return resp;
    }
    let dump = match export_dump(services.backend.as_ref()).await {
        Ok(dump) => dump,
        Err(e) => return errors::backup_error_to_response(e),
    };
    let bytes = match write_archive(&dump) {
        Ok(bytes) => bytes,
        Err(e) => return errors::backup_error_to_response(e),
    };

    let filename = format!(
        "elecpos-backup-{}.zip",
        dump.exported_at.format("%Y%m%d_%H%M%S")
    );
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub dump: BTreeMap<String, Vec<serde_json::Value>>,
}

pub async fn import(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<ImportRequest>,
) -> axum::response::Response {
    if let Err(resp) = common::authorize(&principal, common::ADMIN_ONLY) {
        return resp;
    }
    match import_dump(services.backend.as_ref(), body.dump).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => errors::backup_error_to_response(e),
    }
}

pub async fn restore(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    mut multipart: Multipart,
) -> axum::response::Response {
    if let Err(resp) = common::authorize(&principal, common::ADMIN_ONLY) {
        return resp;
    }

    let mut archive: Option<Vec<u8>> = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => match field.bytes().await {
                Ok(bytes) => {
                    archive = Some(bytes.to_vec());
                    break;
                }
                Err(e) => {
                    return errors::json_error(
                        StatusCode::BAD_REQUEST,
                        "invalid_upload",
                        e.to_string(),
                    )
                }
            },
            Ok(None) => break,
            Err(e) => {
                return errors::json_error(StatusCode::BAD_REQUEST, "invalid_upload", e.to_string())
            }
        }
    }
    let Some(archive) = archive else {
        return errors::json_error(StatusCode::BAD_REQUEST, "invalid_upload", "no file uploaded");
    };

    match restore_archive(services.backend.as_ref(), &archive).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => errors::backup_error_to_response(e),
    }
}
