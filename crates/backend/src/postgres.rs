//! Postgres-backed implementation of [`Backend`].
//!
//! The hosted database owns the schema, constraints, and the report stored
//! functions. This client issues plain queries for table CRUD and calls the
//! stored functions for reports and quick journal posting, so both backends
//! expose identical semantics to the app layer.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::client::{Backend, BACKUP_TABLES};
use crate::error::{BackendError, BackendResult};
use crate::records::*;

pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> BackendResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(8)
            .connect(database_url)
            .await
            .map_err(map_err)?;
        Ok(Self::new(pool))
    }
}

fn map_err(err: sqlx::Error) -> BackendError {
    match &err {
        sqlx::Error::RowNotFound => BackendError::NotFound,
        sqlx::Error::Database(db) => {
            use sqlx::error::ErrorKind;
            match db.kind() {
                ErrorKind::UniqueViolation | ErrorKind::ForeignKeyViolation => {
                    BackendError::conflict(db.constraint().unwrap_or_default())
                }
                _ => BackendError::Database(err.to_string()),
            }
        }
        _ => BackendError::Database(err.to_string()),
    }
}

/// Backup tables keyed by a serial id; `user_profiles` is keyed by uuid and
/// has no sequence to realign after a restore.
fn has_serial_id(table: &str) -> bool {
    table != "user_profiles"
}

/// Non-key columns per backup table, for the restore upsert's update set.
fn restore_columns(table: &str) -> &'static [&'static str] {
    match table {
        "products" => &[
            "sku", "name_ar", "name_en", "unit_price", "tax_rate", "image_url", "created_at",
        ],
        "purchases" => &[
            "invoice_no", "supplier_name", "sub_total", "tax_total", "grand_total", "created_at",
        ],
        "purchase_items" => &["purchase_id", "product_id", "qty", "unit_cost", "tax_rate"],
        "sales" => &[
            "customer_name", "sub_total", "tax_total", "grand_total", "created_by", "created_at",
        ],
        "sale_items" => &[
            "sale_id", "product_id", "qty", "unit_price", "tax_rate", "line_total", "line_tax",
        ],
        "stock_moves" => &["trx_date", "product_id", "direction", "qty", "note"],
        "accounts" => &["code", "name_ar", "name_en", "kind"],
        "journal_entries" => &[
            "entry_date", "voucher_no", "description", "account_id", "debit", "credit",
            "created_at",
        ],
        "user_profiles" => &["email", "full_name", "role", "created_at"],
        _ => &[],
    }
}

/// Insert-or-update keyed on `id`, fed from the JSON backup payload. Rows
/// already present are updated in place, so restoring over existing data
/// never removes parents that child tables still reference.
fn upsert_sql(table: &str) -> String {
    let set = restore_columns(table)
        .iter()
        .map(|col| format!("{col} = EXCLUDED.{col}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {table} SELECT * FROM jsonb_populate_recordset(NULL::{table}, $1)
         ON CONFLICT (id) DO UPDATE SET {set}"
    )
}

#[async_trait]
impl Backend for PostgresBackend {
    // -- products ----------------------------------------------------------

    async fn list_products_with_stock(&self) -> BackendResult<Vec<ProductWithStock>> {
        sqlx::query_as::<_, ProductWithStock>(
            "SELECT id, sku, name_ar, name_en, unit_price, tax_rate, image_url, stock_qty
             FROM products_with_stock ORDER BY name_ar",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn get_product(&self, id: i64) -> BackendResult<Product> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?
            .ok_or(BackendError::NotFound)
    }

    async fn insert_product(&self, new: NewProduct) -> BackendResult<Product> {
        sqlx::query_as::<_, Product>(
            "INSERT INTO products (sku, name_ar, name_en, unit_price, tax_rate, image_url)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(&new.sku)
        .bind(&new.name_ar)
        .bind(&new.name_en)
        .bind(new.unit_price)
        .bind(new.tax_rate)
        .bind(&new.image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn update_product(&self, id: i64, patch: ProductPatch) -> BackendResult<Product> {
        sqlx::query_as::<_, Product>(
            "UPDATE products SET
                sku = COALESCE($2, sku),
                name_ar = COALESCE($3, name_ar),
                name_en = COALESCE($4, name_en),
                unit_price = COALESCE($5, unit_price),
                tax_rate = COALESCE($6, tax_rate),
                image_url = COALESCE($7, image_url)
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&patch.sku)
        .bind(&patch.name_ar)
        .bind(&patch.name_en)
        .bind(patch.unit_price)
        .bind(patch.tax_rate)
        .bind(&patch.image_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?
        .ok_or(BackendError::NotFound)
    }

    async fn delete_product(&self, id: i64) -> BackendResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        if result.rows_affected() == 0 {
            return Err(BackendError::NotFound);
        }
        Ok(())
    }

    // -- purchases ---------------------------------------------------------

    async fn list_purchases(&self) -> BackendResult<Vec<Purchase>> {
        sqlx::query_as::<_, Purchase>("SELECT * FROM purchases ORDER BY id DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn latest_purchase_invoice_no(&self) -> BackendResult<Option<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT invoice_no FROM purchases ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn insert_purchase(&self, new: NewPurchase) -> BackendResult<Purchase> {
        sqlx::query_as::<_, Purchase>(
            "INSERT INTO purchases (invoice_no, supplier_name, sub_total, tax_total, grand_total)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(&new.invoice_no)
        .bind(&new.supplier_name)
        .bind(new.sub_total)
        .bind(new.tax_total)
        .bind(new.grand_total)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn get_purchase(&self, id: i64) -> BackendResult<Purchase> {
        sqlx::query_as::<_, Purchase>("SELECT * FROM purchases WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?
            .ok_or(BackendError::NotFound)
    }

    async fn update_purchase(&self, id: i64, update: PurchaseUpdate) -> BackendResult<()> {
        let result = sqlx::query(
            "UPDATE purchases
             SET supplier_name = $2, sub_total = $3, tax_total = $4, grand_total = $5
             WHERE id = $1",
        )
        .bind(id)
        .bind(&update.supplier_name)
        .bind(update.sub_total)
        .bind(update.tax_total)
        .bind(update.grand_total)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        if result.rows_affected() == 0 {
            return Err(BackendError::NotFound);
        }
        Ok(())
    }

    async fn delete_purchase(&self, id: i64) -> BackendResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_err)?;
        sqlx::query("DELETE FROM purchase_items WHERE purchase_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_err)?;
        let result = sqlx::query("DELETE FROM purchases WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_err)?;
        if result.rows_affected() == 0 {
            return Err(BackendError::NotFound);
        }
        tx.commit().await.map_err(map_err)
    }

    async fn insert_purchase_items(
        &self,
        purchase_id: i64,
        items: Vec<NewPurchaseItem>,
    ) -> BackendResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_err)?;
        for item in &items {
            sqlx::query(
                "INSERT INTO purchase_items (purchase_id, product_id, qty, unit_cost, tax_rate)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(purchase_id)
            .bind(item.product_id)
            .bind(item.qty)
            .bind(item.unit_cost)
            .bind(item.tax_rate)
            .execute(&mut *tx)
            .await
            .map_err(map_err)?;
        }
        tx.commit().await.map_err(map_err)
    }

    async fn delete_purchase_items(&self, purchase_id: i64) -> BackendResult<()> {
        sqlx::query("DELETE FROM purchase_items WHERE purchase_id = $1")
            .bind(purchase_id)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn purchase_items_detailed(
        &self,
        purchase_id: i64,
    ) -> BackendResult<Vec<PurchaseItemDetail>> {
        sqlx::query_as::<_, PurchaseItemDetail>(
            "SELECT i.product_id, i.qty, i.unit_cost, i.tax_rate,
                    p.name_ar AS product_name, p.image_url
             FROM purchase_items i
             JOIN products p ON p.id = i.product_id
             WHERE i.purchase_id = $1
             ORDER BY i.id",
        )
        .bind(purchase_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)
    }

    // -- sales -------------------------------------------------------------

    async fn list_sales(&self) -> BackendResult<Vec<Sale>> {
        sqlx::query_as::<_, Sale>("SELECT * FROM sales ORDER BY id DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn latest_sale(&self) -> BackendResult<Option<Sale>> {
        sqlx::query_as::<_, Sale>("SELECT * FROM sales ORDER BY id DESC LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn insert_sale(&self, new: NewSale) -> BackendResult<Sale> {
        sqlx::query_as::<_, Sale>(
            "INSERT INTO sales (customer_name, sub_total, tax_total, grand_total, created_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(&new.customer_name)
        .bind(new.sub_total)
        .bind(new.tax_total)
        .bind(new.grand_total)
        .bind(new.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn get_sale(&self, id: i64) -> BackendResult<Sale> {
        sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?
            .ok_or(BackendError::NotFound)
    }

    async fn update_sale(&self, id: i64, update: SaleUpdate) -> BackendResult<()> {
        let result = sqlx::query(
            "UPDATE sales
             SET customer_name = $2, sub_total = $3, tax_total = $4, grand_total = $5
             WHERE id = $1",
        )
        .bind(id)
        .bind(&update.customer_name)
        .bind(update.sub_total)
        .bind(update.tax_total)
        .bind(update.grand_total)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        if result.rows_affected() == 0 {
            return Err(BackendError::NotFound);
        }
        Ok(())
    }

    async fn delete_sale(&self, id: i64) -> BackendResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_err)?;
        sqlx::query("DELETE FROM sale_items WHERE sale_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_err)?;
        let result = sqlx::query("DELETE FROM sales WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_err)?;
        if result.rows_affected() == 0 {
            return Err(BackendError::NotFound);
        }
        tx.commit().await.map_err(map_err)
    }

    async fn insert_sale_items(&self, sale_id: i64, items: Vec<NewSaleItem>) -> BackendResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_err)?;
        for item in &items {
            sqlx::query(
                "INSERT INTO sale_items
                     (sale_id, product_id, qty, unit_price, tax_rate, line_total, line_tax)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(sale_id)
            .bind(item.product_id)
            .bind(item.qty)
            .bind(item.unit_price)
            .bind(item.tax_rate)
            .bind(item.line_total)
            .bind(item.line_tax)
            .execute(&mut *tx)
            .await
            .map_err(map_err)?;
        }
        tx.commit().await.map_err(map_err)
    }

    async fn delete_sale_items(&self, sale_id: i64) -> BackendResult<()> {
        sqlx::query("DELETE FROM sale_items WHERE sale_id = $1")
            .bind(sale_id)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn sale_items_detailed(&self, sale_id: i64) -> BackendResult<Vec<SaleItemDetail>> {
        sqlx::query_as::<_, SaleItemDetail>(
            "SELECT i.product_id, i.qty, i.unit_price, i.tax_rate,
                    p.name_ar AS product_name, p.image_url
             FROM sale_items i
             JOIN products p ON p.id = i.product_id
             WHERE i.sale_id = $1
             ORDER BY i.id",
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)
    }

    // -- accounting --------------------------------------------------------

    async fn list_accounts(&self) -> BackendResult<Vec<Account>> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts ORDER BY code")
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn insert_account(&self, new: NewAccount) -> BackendResult<Account> {
        sqlx::query_as::<_, Account>(
            "INSERT INTO accounts (code, name_ar, name_en, kind)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(&new.code)
        .bind(&new.name_ar)
        .bind(&new.name_en)
        .bind(&new.kind)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn list_journal_entries(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> BackendResult<Vec<JournalEntry>> {
        sqlx::query_as::<_, JournalEntry>(
            "SELECT * FROM journal_entries
             WHERE ($1::date IS NULL OR entry_date >= $1)
               AND ($2::date IS NULL OR entry_date <= $2)
             ORDER BY id DESC",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)
    }

    async fn post_journal_quick(&self, entry: QuickJournalEntry) -> BackendResult<(i64, i64)> {
        sqlx::query_as::<_, (i64, i64)>(
            "SELECT * FROM post_journal_quick($1, $2, $3, $4, $5, $6)",
        )
        .bind(entry.entry_date)
        .bind(&entry.voucher_no)
        .bind(&entry.description)
        .bind(entry.debit_account_id)
        .bind(entry.credit_account_id)
        .bind(entry.amount)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)
    }

    // -- report RPCs -------------------------------------------------------

    async fn report_inventory(&self) -> BackendResult<Vec<InventoryRow>> {
        sqlx::query_as::<_, InventoryRow>("SELECT * FROM report_inventory()")
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn report_movement(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        skus: &[String],
    ) -> BackendResult<Vec<MovementRow>> {
        let sku_filter = if skus.is_empty() {
            None
        } else {
            Some(skus.to_vec())
        };
        sqlx::query_as::<_, MovementRow>("SELECT * FROM report_movement($1, $2, $3)")
            .bind(from)
            .bind(to)
            .bind(sku_filter)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn report_trial_balance(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> BackendResult<Vec<TrialBalanceRow>> {
        sqlx::query_as::<_, TrialBalanceRow>("SELECT * FROM report_trial_balance($1, $2)")
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)
    }

    // -- backup ------------------------------------------------------------

    async fn dump_table(&self, table: &str) -> BackendResult<Vec<serde_json::Value>> {
        if !BACKUP_TABLES.contains(&table) {
            return Err(BackendError::UnknownTable(table.to_string()));
        }
        // Table name is validated against the fixed allow list above.
        let sql = format!(
            "SELECT COALESCE(jsonb_agg(to_jsonb(t) ORDER BY t.id), '[]'::jsonb) FROM {table} t"
        );
        let dump: serde_json::Value = sqlx::query_scalar(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(map_err)?;
        match dump {
            serde_json::Value::Array(values) => Ok(values),
            _ => Ok(Vec::new()),
        }
    }

    async fn upsert_rows(&self, table: &str, rows: Vec<serde_json::Value>) -> BackendResult<usize> {
        if !BACKUP_TABLES.contains(&table) {
            return Err(BackendError::UnknownTable(table.to_string()));
        }
        if rows.is_empty() {
            return Ok(0);
        }
        let count = rows.len();
        let payload = serde_json::Value::Array(rows);

        let mut tx = self.pool.begin().await.map_err(map_err)?;
        sqlx::query(&upsert_sql(table))
            .bind(&payload)
            .execute(&mut *tx)
            .await
            .map_err(map_err)?;
        if has_serial_id(table) {
            let seq_sql = format!(
                "SELECT setval(pg_get_serial_sequence('{table}', 'id'),
                        (SELECT COALESCE(MAX(id), 1) FROM {table}), true)"
            );
            sqlx::query(&seq_sql)
                .execute(&mut *tx)
                .await
                .map_err(map_err)?;
        }
        tx.commit().await.map_err(map_err)?;
        Ok(count)
    }

    // -- users -------------------------------------------------------------

    async fn list_user_profiles(&self) -> BackendResult<Vec<UserProfile>> {
        sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles ORDER BY email")
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn create_user(&self, new: NewUser) -> BackendResult<UserProfile> {
        // Credentials live with the external auth provider; this backend only
        // owns the profile row the app reads roles from.
        sqlx::query_as::<_, UserProfile>(
            "INSERT INTO user_profiles (id, email, full_name, role)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&new.email)
        .bind(&new.full_name)
        .bind(&new.role)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_backup_table_has_restore_columns() {
        for table in BACKUP_TABLES {
            assert!(!restore_columns(table).is_empty(), "{table}");
        }
    }

    /// Restoring over existing data must update rows in place. A delete
    /// before reinsert would trip foreign keys held by child tables.
    #[test]
    fn restore_upsert_updates_rows_in_place() {
        for table in BACKUP_TABLES {
            let sql = upsert_sql(table);
            assert!(sql.contains("ON CONFLICT (id) DO UPDATE SET"), "{table}");
            assert!(!sql.to_uppercase().contains("DELETE"), "{table}");
        }
    }
}
