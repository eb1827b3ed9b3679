//! Row types for the externally managed tables this app consumes.
//!
//! The schema is owned by the backend; these structs only mirror the columns
//! the application reads and writes. Ids are backend-assigned serials.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// products
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub sku: Option<String>,
    pub name_ar: String,
    pub name_en: Option<String>,
    pub unit_price: f64,
    pub tax_rate: f64,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row of the `products_with_stock` view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct ProductWithStock {
    pub id: i64,
    pub sku: Option<String>,
    pub name_ar: String,
    pub name_en: Option<String>,
    pub unit_price: f64,
    pub tax_rate: f64,
    pub image_url: Option<String>,
    pub stock_qty: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub sku: Option<String>,
    pub name_ar: String,
    pub name_en: Option<String>,
    pub unit_price: f64,
    #[serde(default)]
    pub tax_rate: f64,
    pub image_url: Option<String>,
}

/// Partial update: only provided fields change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub sku: Option<String>,
    pub name_ar: Option<String>,
    pub name_en: Option<String>,
    pub unit_price: Option<f64>,
    pub tax_rate: Option<f64>,
    pub image_url: Option<String>,
}

// ---------------------------------------------------------------------------
// purchases
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Purchase {
    pub id: i64,
    pub invoice_no: String,
    pub supplier_name: Option<String>,
    pub sub_total: f64,
    pub tax_total: f64,
    pub grand_total: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPurchase {
    pub invoice_no: String,
    pub supplier_name: Option<String>,
    pub sub_total: f64,
    pub tax_total: f64,
    pub grand_total: f64,
}

/// Header update; `invoice_no` is preserved on edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseUpdate {
    pub supplier_name: Option<String>,
    pub sub_total: f64,
    pub tax_total: f64,
    pub grand_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct PurchaseItem {
    pub id: i64,
    pub purchase_id: i64,
    pub product_id: i64,
    pub qty: f64,
    pub unit_cost: f64,
    pub tax_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPurchaseItem {
    pub product_id: i64,
    pub qty: f64,
    pub unit_cost: f64,
    pub tax_rate: f64,
}

/// Purchase line joined with the product's display fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct PurchaseItemDetail {
    pub product_id: i64,
    pub qty: f64,
    pub unit_cost: f64,
    pub tax_rate: f64,
    pub product_name: String,
    pub image_url: Option<String>,
}

// ---------------------------------------------------------------------------
// sales
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: i64,
    pub customer_name: Option<String>,
    pub sub_total: f64,
    pub tax_total: f64,
    pub grand_total: f64,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSale {
    pub customer_name: Option<String>,
    pub sub_total: f64,
    pub tax_total: f64,
    pub grand_total: f64,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleUpdate {
    pub customer_name: Option<String>,
    pub sub_total: f64,
    pub tax_total: f64,
    pub grand_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: i64,
    pub qty: f64,
    pub unit_price: f64,
    pub tax_rate: f64,
    pub line_total: f64,
    pub line_tax: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSaleItem {
    pub product_id: i64,
    pub qty: f64,
    pub unit_price: f64,
    pub tax_rate: f64,
    pub line_total: f64,
    pub line_tax: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct SaleItemDetail {
    pub product_id: i64,
    pub qty: f64,
    pub unit_price: f64,
    pub tax_rate: f64,
    pub product_name: String,
    pub image_url: Option<String>,
}

// ---------------------------------------------------------------------------
// accounting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Account {
    pub id: i64,
    pub code: String,
    pub name_ar: String,
    pub name_en: Option<String>,
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAccount {
    pub code: String,
    pub name_ar: String,
    pub name_en: Option<String>,
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct JournalEntry {
    pub id: i64,
    pub entry_date: NaiveDate,
    pub voucher_no: Option<String>,
    pub description: Option<String>,
    pub account_id: i64,
    pub debit: f64,
    pub credit: f64,
    pub created_at: DateTime<Utc>,
}

/// Parameters of the `post_journal_quick` RPC: one balanced debit/credit pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickJournalEntry {
    pub entry_date: NaiveDate,
    pub voucher_no: Option<String>,
    pub description: Option<String>,
    pub debit_account_id: i64,
    pub credit_account_id: i64,
    pub amount: f64,
}

// ---------------------------------------------------------------------------
// stock moves (adjustments; invoice movements are derived by the backend)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct StockMove {
    pub id: i64,
    pub trx_date: NaiveDate,
    pub product_id: i64,
    /// `"in"` or `"out"`.
    pub direction: String,
    pub qty: f64,
    pub note: Option<String>,
}

// ---------------------------------------------------------------------------
// users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub role: String,
}

// ---------------------------------------------------------------------------
// report rows (stored-function outputs)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct InventoryRow {
    pub product_id: i64,
    pub sku: Option<String>,
    pub name: String,
    pub purchased_qty: f64,
    pub sold_qty: f64,
    pub adjust_in: f64,
    pub adjust_out: f64,
    pub stock_qty: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct MovementRow {
    pub trx_date: NaiveDate,
    pub sku: Option<String>,
    pub name: String,
    /// `"in"` or `"out"`.
    pub direction: String,
    pub qty: f64,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct TrialBalanceRow {
    pub account_id: i64,
    pub code: String,
    pub name: String,
    pub debit: f64,
    pub credit: f64,
}
