use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use elecpos_backend::records::{NewSale, SaleUpdate};
use elecpos_core::InvoiceTotals;

use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_sales))
        .route("/checkout", post(checkout))
        .route("/last", get(last_sale).delete(delete_last_sale))
        .route("/:id", get(get_sale).put(update_sale).delete(delete_sale))
}

pub async fn list_sales(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.backend.list_sales().await {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => errors::backend_error_to_response(e),
    }
}

pub async fn checkout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CheckoutRequest>,
) -> axum::response::Response {
    if let Err(resp) = common::authorize(&principal, common::REGISTER) {
        return resp;
    }

    let lines: Vec<_> = body.items.iter().map(|i| i.as_invoice_line()).collect();
    let totals = match InvoiceTotals::compute(&lines) {
        Ok(t) => t,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let sale = match services
        .backend
        .insert_sale(NewSale {
            customer_name: body.customer_name.clone(),
            sub_total: totals.sub_total,
            tax_total: totals.tax_total,
            grand_total: totals.grand_total,
            created_by: Some(*principal.user_id().as_uuid()),
        })
        .await
    {
        Ok(s) => s,
        Err(e) => return errors::backend_error_to_response(e),
    };

    let items: Vec<_> = body.items.iter().map(|i| i.as_item()).collect();
    if let Err(e) = services.backend.insert_sale_items(sale.id, items.clone()).await {
        let _ = services.backend.delete_sale(sale.id).await;
        return errors::backend_error_to_response(e);
    }

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "ok": true,
            "sale": sale,
            "items": items,
        })),
    )
        .into_response()
}

pub async fn last_sale(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.backend.latest_sale().await {
        Ok(sale) => (StatusCode::OK, Json(serde_json::json!({ "sale": sale }))).into_response(),
        Err(e) => errors::backend_error_to_response(e),
    }
}

pub async fn delete_last_sale(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = common::authorize(&principal, common::REGISTER) {
        return resp;
    }
    let sale = match services.backend.latest_sale().await {
        Ok(Some(sale)) => sale,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "no sales to delete")
        }
        Err(e) => return errors::backend_error_to_response(e),
    };
    match services.backend.delete_sale(sale.id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::backend_error_to_response(e),
    }
}

pub async fn get_sale(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    let sale = match services.backend.get_sale(id).await {
        Ok(s) => s,
        Err(e) => return errors::backend_error_to_response(e),
    };
    let items = match services.backend.sale_items_detailed(id).await {
        Ok(items) => items,
        Err(e) => return errors::backend_error_to_response(e),
    };

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "sale": sale,
            "items": items.iter().map(dto::sale_item_to_json).collect::<Vec<_>>(),
        })),
    )
        .into_response()
}

pub async fn update_sale(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
    Json(body): Json<dto::CheckoutRequest>,
) -> axum::response::Response {
    if let Err(resp) = common::authorize(&principal, common::BACK_OFFICE) {
        return resp;
    }

    let lines: Vec<_> = body.items.iter().map(|i| i.as_invoice_line()).collect();
    let totals = match InvoiceTotals::compute(&lines) {
        Ok(t) => t,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let update = SaleUpdate {
        customer_name: body.customer_name.clone(),
        sub_total: totals.sub_total,
        tax_total: totals.tax_total,
        grand_total: totals.grand_total,
    };
    if let Err(e) = services.backend.update_sale(id, update).await {
        return errors::backend_error_to_response(e);
    }

    if let Err(e) = services.backend.delete_sale_items(id).await {
        return errors::backend_error_to_response(e);
    }
    let items = body.items.iter().map(|i| i.as_item()).collect();
    if let Err(e) = services.backend.insert_sale_items(id, items).await {
        return errors::backend_error_to_response(e);
    }

    (StatusCode::OK, Json(serde_json::json!({ "ok": true }))).into_response()
}

pub async fn delete_sale(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    if let Err(resp) = common::authorize(&principal, common::BACK_OFFICE) {
        return resp;
    }
    match services.backend.delete_sale(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::backend_error_to_response(e),
    }
}
