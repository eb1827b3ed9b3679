//! Request DTOs and JSON mapping helpers.

use serde::Deserialize;

use elecpos_backend::records::{
    NewPurchaseItem, NewSaleItem, ProductPatch, PurchaseItemDetail, SaleItemDetail,
};
use elecpos_core::InvoiceLine;

// -- products ---------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub sku: Option<String>,
    pub name_ar: String,
    pub name_en: Option<String>,
    pub unit_price: f64,
    #[serde(default)]
    pub tax_rate: f64,
    pub image_url: Option<String>,
}

pub type UpdateProductRequest = ProductPatch;

// -- purchases --------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PurchaseLineRequest {
    pub product_id: i64,
    pub qty: f64,
    pub unit_cost: f64,
    #[serde(default)]
    pub tax_rate: f64,
}

impl PurchaseLineRequest {
    pub fn as_invoice_line(&self) -> InvoiceLine {
        InvoiceLine {
            product_id: self.product_id,
            qty: self.qty,
            unit_price: self.unit_cost,
            tax_rate: self.tax_rate,
        }
    }

    pub fn as_item(&self) -> NewPurchaseItem {
        NewPurchaseItem {
            product_id: self.product_id,
            qty: self.qty,
            unit_cost: self.unit_cost,
            tax_rate: self.tax_rate,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SavePurchaseRequest {
    pub supplier_name: Option<String>,
    #[serde(default)]
    pub items: Vec<PurchaseLineRequest>,
}

// -- sales ------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SaleLineRequest {
    pub product_id: i64,
    pub qty: f64,
    pub unit_price: f64,
    #[serde(default)]
    pub tax_rate: f64,
}

impl SaleLineRequest {
    pub fn as_invoice_line(&self) -> InvoiceLine {
        InvoiceLine {
            product_id: self.product_id,
            qty: self.qty,
            unit_price: self.unit_price,
            tax_rate: self.tax_rate,
        }
    }

    pub fn as_item(&self) -> NewSaleItem {
        let line = self.as_invoice_line();
        NewSaleItem {
            product_id: self.product_id,
            qty: self.qty,
            unit_price: self.unit_price,
            tax_rate: self.tax_rate,
            line_total: line.line_total(),
            line_tax: line.line_tax(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub customer_name: Option<String>,
    #[serde(default)]
    pub items: Vec<SaleLineRequest>,
}

// -- accounting -------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub code: String,
    pub name_ar: String,
    pub name_en: Option<String>,
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuickJournalRequest {
    pub entry_date: chrono::NaiveDate,
    pub voucher_no: Option<String>,
    pub description: Option<String>,
    pub debit_account_id: i64,
    pub credit_account_id: i64,
    pub amount: f64,
}

// -- admin ------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub full_name: Option<String>,
    pub role: Option<String>,
}

// -- response helpers -------------------------------------------------------

pub fn purchase_item_to_json(item: &PurchaseItemDetail) -> serde_json::Value {
    serde_json::json!({
        "product_id": item.product_id,
        "qty": item.qty,
        "unit_cost": item.unit_cost,
        "tax_rate": item.tax_rate,
        "product_name": item.product_name,
        "image_url": item.image_url,
    })
}

pub fn sale_item_to_json(item: &SaleItemDetail) -> serde_json::Value {
    serde_json::json!({
        "product_id": item.product_id,
        "qty": item.qty,
        "unit_price": item.unit_price,
        "tax_rate": item.tax_rate,
        "product_name": item.product_name,
        "image_url": item.image_url,
    })
}
