use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{post, put},
    Json, Router,
};

use elecpos_backend::records::NewProduct;

use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route("/:id", put(update_product).delete(delete_product))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.backend.list_products_with_stock().await {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => errors::backend_error_to_response(e),
    }
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateProductRequest>,
) -> axum::response::Response {
    if let Err(resp) = common::authorize(&principal, common::BACK_OFFICE) {
        return resp;
    }
    if body.name_ar.trim().is_empty() {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "name is required");
    }
    if body.unit_price < 0.0 {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "unit price cannot be negative",
        );
    }
    if body.tax_rate < 0.0 {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "tax rate cannot be negative",
        );
    }

    let new = NewProduct {
        sku: body.sku,
        name_ar: body.name_ar,
        name_en: body.name_en,
        unit_price: body.unit_price,
        tax_rate: body.tax_rate,
        image_url: body.image_url,
    };
    match services.backend.insert_product(new).await {
        Ok(product) => (StatusCode::CREATED, Json(product)).into_response(),
        Err(e) => errors::backend_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
    Json(patch): Json<dto::UpdateProductRequest>,
) -> axum::response::Response {
    if let Err(resp) = common::authorize(&principal, common::BACK_OFFICE) {
        return resp;
    }
    match services.backend.update_product(id, patch).await {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(e) => errors::backend_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    if let Err(resp) = common::authorize(&principal, common::BACK_OFFICE) {
        return resp;
    }
    match services.backend.delete_product(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::backend_error_to_response(e),
    }
}
