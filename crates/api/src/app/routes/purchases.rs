use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use elecpos_backend::records::{NewPurchase, PurchaseUpdate};
use elecpos_backend::BackendError;
use elecpos_core::{allocate_with_retry, next_invoice_no, InvoiceTotals, MAX_ALLOCATE_ATTEMPTS};

use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_purchase).get(list_purchases))
        .route(
            "/:id",
            get(get_purchase).put(update_purchase).delete(delete_purchase),
        )
}

pub async fn list_purchases(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.backend.list_purchases().await {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => errors::backend_error_to_response(e),
    }
}

pub async fn create_purchase(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::SavePurchaseRequest>,
) -> axum::response::Response {
    if let Err(resp) = common::authorize(&principal, common::BACK_OFFICE) {
        return resp;
    }

    let lines: Vec<_> = body.items.iter().map(|i| i.as_invoice_line()).collect();
    let totals = match InvoiceTotals::compute(&lines) {
        Ok(t) => t,
        Err(e) => return errors::domain_error_to_response(e),
    };

    // The invoice number is derived from the latest stored one, so two
    // concurrent creates can collide on the unique constraint. Re-read and
    // retry, but only on that specific conflict.
    let backend = services.backend.clone();
    let supplier_name = body.supplier_name.clone();
    let header = allocate_with_retry(
        MAX_ALLOCATE_ATTEMPTS,
        |attempt| {
            let backend = backend.clone();
            let supplier_name = supplier_name.clone();
            async move {
                let latest = backend.latest_purchase_invoice_no().await?;
                let invoice_no = next_invoice_no(latest.as_deref());
                if attempt > 0 {
                    tracing::debug!(attempt, %invoice_no, "retrying invoice number allocation");
                }
                backend
                    .insert_purchase(NewPurchase {
                        invoice_no,
                        supplier_name,
                        sub_total: totals.sub_total,
                        tax_total: totals.tax_total,
                        grand_total: totals.grand_total,
                    })
                    .await
            }
        },
        |e: &BackendError| e.is_duplicate("invoice_no"),
    )
    .await;

    let header = match header {
        Ok(h) => h,
        Err(e) => return errors::backend_error_to_response(e),
    };

    let items = body.items.iter().map(|i| i.as_item()).collect();
    if let Err(e) = services.backend.insert_purchase_items(header.id, items).await {
        // Keep the store consistent: drop the header the items failed under.
        let _ = services.backend.delete_purchase(header.id).await;
        return errors::backend_error_to_response(e);
    }

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "ok": true,
            "id": header.id,
            "invoice_no": header.invoice_no,
        })),
    )
        .into_response()
}

pub async fn get_purchase(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    let purchase = match services.backend.get_purchase(id).await {
        Ok(p) => p,
        Err(e) => return errors::backend_error_to_response(e),
    };
    let items = match services.backend.purchase_items_detailed(id).await {
        Ok(items) => items,
        Err(e) => return errors::backend_error_to_response(e),
    };

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "purchase": purchase,
            "items": items.iter().map(dto::purchase_item_to_json).collect::<Vec<_>>(),
        })),
    )
        .into_response()
}

pub async fn update_purchase(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
    Json(body): Json<dto::SavePurchaseRequest>,
) -> axum::response::Response {
    if let Err(resp) = common::authorize(&principal, common::BACK_OFFICE) {
        return resp;
    }

    let lines: Vec<_> = body.items.iter().map(|i| i.as_invoice_line()).collect();
    let totals = match InvoiceTotals::compute(&lines) {
        Ok(t) => t,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let update = PurchaseUpdate {
        supplier_name: body.supplier_name.clone(),
        sub_total: totals.sub_total,
        tax_total: totals.tax_total,
        grand_total: totals.grand_total,
    };
    if let Err(e) = services.backend.update_purchase(id, update).await {
        return errors::backend_error_to_response(e);
    }

    // Full item rewrite: drop the old lines and insert the submitted ones.
    if let Err(e) = services.backend.delete_purchase_items(id).await {
        return errors::backend_error_to_response(e);
    }
    let items = body.items.iter().map(|i| i.as_item()).collect();
    if let Err(e) = services.backend.insert_purchase_items(id, items).await {
        return errors::backend_error_to_response(e);
    }

    (StatusCode::OK, Json(serde_json::json!({ "ok": true }))).into_response()
}

pub async fn delete_purchase(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
) -> axum::response::Response {
    if let Err(resp) = common::authorize(&principal, common::BACK_OFFICE) {
        return resp;
    }
    match services.backend.delete_purchase(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::backend_error_to_response(e),
    }
}
