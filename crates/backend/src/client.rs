//! The hosted-backend client boundary.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::BackendResult;
use crate::records::*;

/// Tables included in backup export/import, in dump order.
pub const BACKUP_TABLES: &[&str] = &[
    "products",
    "purchases",
    "purchase_items",
    "sales",
    "sale_items",
    "stock_moves",
    "accounts",
    "journal_entries",
    "user_profiles",
];

/// Table CRUD and RPC surface of the hosted backend.
///
/// Mutations return the stored row (with backend-assigned id/timestamps)
/// where the caller needs it. Uniqueness violations surface as
/// [`crate::BackendError::Conflict`] carrying the constraint name.
#[async_trait]
pub trait Backend: Send + Sync {
    // -- products ----------------------------------------------------------

    /// `products_with_stock` view, ordered by name.
    async fn list_products_with_stock(&self) -> BackendResult<Vec<ProductWithStock>>;
    async fn get_product(&self, id: i64) -> BackendResult<Product>;
    async fn insert_product(&self, new: NewProduct) -> BackendResult<Product>;
    async fn update_product(&self, id: i64, patch: ProductPatch) -> BackendResult<Product>;
    /// Fails with `Conflict` when invoice items still reference the product.
    async fn delete_product(&self, id: i64) -> BackendResult<()>;

    // -- purchases ---------------------------------------------------------

    /// Headers, newest first.
    async fn list_purchases(&self) -> BackendResult<Vec<Purchase>>;
    /// `invoice_no` of the most recently created purchase.
    async fn latest_purchase_invoice_no(&self) -> BackendResult<Option<String>>;
    /// Insert a header; duplicate `invoice_no` → `Conflict("purchases_invoice_no_key")`.
    async fn insert_purchase(&self, new: NewPurchase) -> BackendResult<Purchase>;
    async fn get_purchase(&self, id: i64) -> BackendResult<Purchase>;
    async fn update_purchase(&self, id: i64, update: PurchaseUpdate) -> BackendResult<()>;
    async fn delete_purchase(&self, id: i64) -> BackendResult<()>;
    async fn insert_purchase_items(
        &self,
        purchase_id: i64,
        items: Vec<NewPurchaseItem>,
    ) -> BackendResult<()>;
    async fn delete_purchase_items(&self, purchase_id: i64) -> BackendResult<()>;
    /// Lines joined with product name/image, in line order.
    async fn purchase_items_detailed(&self, purchase_id: i64) -> BackendResult<Vec<PurchaseItemDetail>>;

    // -- sales -------------------------------------------------------------

    async fn list_sales(&self) -> BackendResult<Vec<Sale>>;
    async fn latest_sale(&self) -> BackendResult<Option<Sale>>;
    async fn insert_sale(&self, new: NewSale) -> BackendResult<Sale>;
    async fn get_sale(&self, id: i64) -> BackendResult<Sale>;
    async fn update_sale(&self, id: i64, update: SaleUpdate) -> BackendResult<()>;
    async fn delete_sale(&self, id: i64) -> BackendResult<()>;
    async fn insert_sale_items(&self, sale_id: i64, items: Vec<NewSaleItem>) -> BackendResult<()>;
    async fn delete_sale_items(&self, sale_id: i64) -> BackendResult<()>;
    async fn sale_items_detailed(&self, sale_id: i64) -> BackendResult<Vec<SaleItemDetail>>;

    // -- accounting --------------------------------------------------------

    /// Ordered by code.
    async fn list_accounts(&self) -> BackendResult<Vec<Account>>;
    /// Duplicate code → `Conflict("accounts_code_key")`.
    async fn insert_account(&self, new: NewAccount) -> BackendResult<Account>;
    /// Newest first, optionally bounded by entry date.
    async fn list_journal_entries(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> BackendResult<Vec<JournalEntry>>;
    /// RPC `post_journal_quick`: writes the balanced debit/credit pair
    /// atomically, returns the two entry ids.
    async fn post_journal_quick(&self, entry: QuickJournalEntry) -> BackendResult<(i64, i64)>;

    // -- report RPCs -------------------------------------------------------

    /// RPC `report_inventory`: per-product stock aggregation.
    async fn report_inventory(&self) -> BackendResult<Vec<InventoryRow>>;
    /// RPC `report_movement`: date-ordered movement rows, optionally bounded
    /// by date range and filtered to the given SKUs.
    async fn report_movement(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        skus: &[String],
    ) -> BackendResult<Vec<MovementRow>>;
    /// RPC `report_trial_balance`: per-account debit/credit totals.
    async fn report_trial_balance(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> BackendResult<Vec<TrialBalanceRow>>;

    // -- backup ------------------------------------------------------------

    /// All rows of a backup table as JSON objects. Unknown table → error.
    async fn dump_table(&self, table: &str) -> BackendResult<Vec<serde_json::Value>>;
    /// Upsert rows (keyed on `id`) into a backup table; returns the row count.
    async fn upsert_rows(&self, table: &str, rows: Vec<serde_json::Value>) -> BackendResult<usize>;

    // -- users -------------------------------------------------------------

    async fn list_user_profiles(&self) -> BackendResult<Vec<UserProfile>>;
    /// Create a profile row; duplicate email → `Conflict`. Credentials are
    /// owned by the external auth provider, so the `password` field of
    /// [`NewUser`] is never persisted by a backend.
    async fn create_user(&self, new: NewUser) -> BackendResult<UserProfile>;
}
