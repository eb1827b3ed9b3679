//! In-process backend for dev and tests.
//!
//! Honors the contracts the app otherwise gets from the hosted database:
//! serial row ids, unique `invoice_no` / account `code` / profile email,
//! balanced journal postings, and the stock aggregations behind the report
//! RPCs. All mutations run under one write lock so id assignment and
//! uniqueness checks are atomic.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::client::{Backend, BACKUP_TABLES};
use crate::error::{BackendError, BackendResult};
use crate::records::*;

#[derive(Debug, Default)]
struct Tables {
    products: Vec<Product>,
    purchases: Vec<Purchase>,
    purchase_items: Vec<PurchaseItem>,
    sales: Vec<Sale>,
    sale_items: Vec<SaleItem>,
    stock_moves: Vec<StockMove>,
    accounts: Vec<Account>,
    journal_entries: Vec<JournalEntry>,
    user_profiles: Vec<UserProfile>,
    next_id: BTreeMap<&'static str, i64>,
}

impl Tables {
    fn take_id(&mut self, table: &'static str) -> i64 {
        let slot = self.next_id.entry(table).or_insert(1);
        let id = *slot;
        *slot += 1;
        id
    }

    /// Keep the serial ahead of restored rows so later inserts don't collide.
    fn bump_id(&mut self, table: &'static str, seen: i64) {
        let slot = self.next_id.entry(table).or_insert(1);
        if seen >= *slot {
            *slot = seen + 1;
        }
    }

    fn product(&self, id: i64) -> BackendResult<&Product> {
        self.products
            .iter()
            .find(|p| p.id == id)
            .ok_or(BackendError::NotFound)
    }

    /// Net stock: purchased - sold + manual adjustments.
    fn stock_qty(&self, product_id: i64) -> f64 {
        let purchased: f64 = self
            .purchase_items
            .iter()
            .filter(|i| i.product_id == product_id)
            .map(|i| i.qty)
            .sum();
        let sold: f64 = self
            .sale_items
            .iter()
            .filter(|i| i.product_id == product_id)
            .map(|i| i.qty)
            .sum();
        let adj_in: f64 = self
            .stock_moves
            .iter()
            .filter(|m| m.product_id == product_id && m.direction == "in")
            .map(|m| m.qty)
            .sum();
        let adj_out: f64 = self
            .stock_moves
            .iter()
            .filter(|m| m.product_id == product_id && m.direction == "out")
            .map(|m| m.qty)
            .sum();
        purchased - sold + adj_in - adj_out
    }
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    inner: RwLock<Tables>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> BackendResult<RwLockReadGuard<'_, Tables>> {
        self.inner
            .read()
            .map_err(|_| BackendError::Database("lock poisoned".to_string()))
    }

    fn write(&self) -> BackendResult<RwLockWriteGuard<'_, Tables>> {
        self.inner
            .write()
            .map_err(|_| BackendError::Database("lock poisoned".to_string()))
    }
}

fn in_range(date: NaiveDate, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    from.is_none_or(|f| date >= f) && to.is_none_or(|t| date <= t)
}

#[async_trait]
impl Backend for MemoryBackend {
    // -- products ----------------------------------------------------------

    async fn list_products_with_stock(&self) -> BackendResult<Vec<ProductWithStock>> {
        let t = self.read()?;
        let mut rows: Vec<ProductWithStock> = t
            .products
            .iter()
            .map(|p| ProductWithStock {
                id: p.id,
                sku: p.sku.clone(),
                name_ar: p.name_ar.clone(),
                name_en: p.name_en.clone(),
                unit_price: p.unit_price,
                tax_rate: p.tax_rate,
                image_url: p.image_url.clone(),
                stock_qty: t.stock_qty(p.id),
            })
            .collect();
        rows.sort_by(|a, b| a.name_ar.cmp(&b.name_ar));
        Ok(rows)
    }

    async fn get_product(&self, id: i64) -> BackendResult<Product> {
        Ok(self.read()?.product(id)?.clone())
    }

    async fn insert_product(&self, new: NewProduct) -> BackendResult<Product> {
        let mut t = self.write()?;
        let id = t.take_id("products");
        let row = Product {
            id,
            sku: new.sku,
            name_ar: new.name_ar,
            name_en: new.name_en,
            unit_price: new.unit_price,
            tax_rate: new.tax_rate,
            image_url: new.image_url,
            created_at: Utc::now(),
        };
        t.products.push(row.clone());
        Ok(row)
    }

    async fn update_product(&self, id: i64, patch: ProductPatch) -> BackendResult<Product> {
        let mut t = self.write()?;
        let row = t
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(BackendError::NotFound)?;
        if let Some(sku) = patch.sku {
            row.sku = Some(sku);
        }
        if let Some(name_ar) = patch.name_ar {
            row.name_ar = name_ar;
        }
        if let Some(name_en) = patch.name_en {
            row.name_en = Some(name_en);
        }
        if let Some(unit_price) = patch.unit_price {
            row.unit_price = unit_price;
        }
        if let Some(tax_rate) = patch.tax_rate {
            row.tax_rate = tax_rate;
        }
        if let Some(image_url) = patch.image_url {
            row.image_url = Some(image_url);
        }
        Ok(row.clone())
    }

    async fn delete_product(&self, id: i64) -> BackendResult<()> {
        let mut t = self.write()?;
        t.product(id)?;
        if t.purchase_items.iter().any(|i| i.product_id == id) {
            return Err(BackendError::conflict("purchase_items_product_id_fkey"));
        }
        if t.sale_items.iter().any(|i| i.product_id == id) {
            return Err(BackendError::conflict("sale_items_product_id_fkey"));
        }
        t.products.retain(|p| p.id != id);
        Ok(())
    }

    // -- purchases ---------------------------------------------------------

    async fn list_purchases(&self) -> BackendResult<Vec<Purchase>> {
        let t = self.read()?;
        let mut rows = t.purchases.clone();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows)
    }

    async fn latest_purchase_invoice_no(&self) -> BackendResult<Option<String>> {
        let t = self.read()?;
        Ok(t.purchases
            .iter()
            .max_by_key(|p| p.id)
            .map(|p| p.invoice_no.clone()))
    }

    async fn insert_purchase(&self, new: NewPurchase) -> BackendResult<Purchase> {
        let mut t = self.write()?;
        if t.purchases.iter().any(|p| p.invoice_no == new.invoice_no) {
            return Err(BackendError::conflict("purchases_invoice_no_key"));
        }
        let id = t.take_id("purchases");
        let row = Purchase {
            id,
            invoice_no: new.invoice_no,
            supplier_name: new.supplier_name,
            sub_total: new.sub_total,
            tax_total: new.tax_total,
            grand_total: new.grand_total,
            created_at: Utc::now(),
        };
        t.purchases.push(row.clone());
        Ok(row)
    }

    async fn get_purchase(&self, id: i64) -> BackendResult<Purchase> {
        self.read()?
            .purchases
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(BackendError::NotFound)
    }

    async fn update_purchase(&self, id: i64, update: PurchaseUpdate) -> BackendResult<()> {
        let mut t = self.write()?;
        let row = t
            .purchases
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(BackendError::NotFound)?;
        row.supplier_name = update.supplier_name;
        row.sub_total = update.sub_total;
        row.tax_total = update.tax_total;
        row.grand_total = update.grand_total;
        Ok(())
    }

    async fn delete_purchase(&self, id: i64) -> BackendResult<()> {
        let mut t = self.write()?;
        if !t.purchases.iter().any(|p| p.id == id) {
            return Err(BackendError::NotFound);
        }
        t.purchase_items.retain(|i| i.purchase_id != id);
        t.purchases.retain(|p| p.id != id);
        Ok(())
    }

    async fn insert_purchase_items(
        &self,
        purchase_id: i64,
        items: Vec<NewPurchaseItem>,
    ) -> BackendResult<()> {
        let mut t = self.write()?;
        if !t.purchases.iter().any(|p| p.id == purchase_id) {
            return Err(BackendError::NotFound);
        }
        for item in &items {
            t.product(item.product_id)?;
        }
        for item in items {
            let id = t.take_id("purchase_items");
            t.purchase_items.push(PurchaseItem {
                id,
                purchase_id,
                product_id: item.product_id,
                qty: item.qty,
                unit_cost: item.unit_cost,
                tax_rate: item.tax_rate,
            });
        }
        Ok(())
    }

    async fn delete_purchase_items(&self, purchase_id: i64) -> BackendResult<()> {
        let mut t = self.write()?;
        t.purchase_items.retain(|i| i.purchase_id != purchase_id);
        Ok(())
    }

    async fn purchase_items_detailed(&self, purchase_id: i64) -> BackendResult<Vec<PurchaseItemDetail>> {
        let t = self.read()?;
        t.purchase_items
            .iter()
            .filter(|i| i.purchase_id == purchase_id)
            .map(|i| {
                let p = t.product(i.product_id)?;
                Ok(PurchaseItemDetail {
                    product_id: i.product_id,
                    qty: i.qty,
                    unit_cost: i.unit_cost,
                    tax_rate: i.tax_rate,
                    product_name: p.name_ar.clone(),
                    image_url: p.image_url.clone(),
                })
            })
            .collect()
    }

    // -- sales -------------------------------------------------------------

    async fn list_sales(&self) -> BackendResult<Vec<Sale>> {
        let t = self.read()?;
        let mut rows = t.sales.clone();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows)
    }

    async fn latest_sale(&self) -> BackendResult<Option<Sale>> {
        let t = self.read()?;
        Ok(t.sales.iter().max_by_key(|s| s.id).cloned())
    }

    async fn insert_sale(&self, new: NewSale) -> BackendResult<Sale> {
        let mut t = self.write()?;
        let id = t.take_id("sales");
        let row = Sale {
            id,
            customer_name: new.customer_name,
            sub_total: new.sub_total,
            tax_total: new.tax_total,
            grand_total: new.grand_total,
            created_by: new.created_by,
            created_at: Utc::now(),
        };
        t.sales.push(row.clone());
        Ok(row)
    }

    async fn get_sale(&self, id: i64) -> BackendResult<Sale> {
        self.read()?
            .sales
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(BackendError::NotFound)
    }

    async fn update_sale(&self, id: i64, update: SaleUpdate) -> BackendResult<()> {
        let mut t = self.write()?;
        let row = t
            .sales
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(BackendError::NotFound)?;
        row.customer_name = update.customer_name;
        row.sub_total = update.sub_total;
        row.tax_total = update.tax_total;
        row.grand_total = update.grand_total;
        Ok(())
    }

    async fn delete_sale(&self, id: i64) -> BackendResult<()> {
        let mut t = self.write()?;
        if !t.sales.iter().any(|s| s.id == id) {
            return Err(BackendError::NotFound);
        }
        t.sale_items.retain(|i| i.sale_id != id);
        t.sales.retain(|s| s.id != id);
        Ok(())
    }

    async fn insert_sale_items(&self, sale_id: i64, items: Vec<NewSaleItem>) -> BackendResult<()> {
        let mut t = self.write()?;
        if !t.sales.iter().any(|s| s.id == sale_id) {
            return Err(BackendError::NotFound);
        }
        for item in &items {
            t.product(item.product_id)?;
        }
        for item in items {
            let id = t.take_id("sale_items");
            t.sale_items.push(SaleItem {
                id,
                sale_id,
                product_id: item.product_id,
                qty: item.qty,
                unit_price: item.unit_price,
                tax_rate: item.tax_rate,
                line_total: item.line_total,
                line_tax: item.line_tax,
            });
        }
        Ok(())
    }

    async fn delete_sale_items(&self, sale_id: i64) -> BackendResult<()> {
        let mut t = self.write()?;
        t.sale_items.retain(|i| i.sale_id != sale_id);
        Ok(())
    }

    async fn sale_items_detailed(&self, sale_id: i64) -> BackendResult<Vec<SaleItemDetail>> {
        let t = self.read()?;
        t.sale_items
            .iter()
            .filter(|i| i.sale_id == sale_id)
            .map(|i| {
                let p = t.product(i.product_id)?;
                Ok(SaleItemDetail {
                    product_id: i.product_id,
                    qty: i.qty,
                    unit_price: i.unit_price,
                    tax_rate: i.tax_rate,
                    product_name: p.name_ar.clone(),
                    image_url: p.image_url.clone(),
                })
            })
            .collect()
    }

    // -- accounting --------------------------------------------------------

    async fn list_accounts(&self) -> BackendResult<Vec<Account>> {
        let t = self.read()?;
        let mut rows = t.accounts.clone();
        rows.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(rows)
    }

    async fn insert_account(&self, new: NewAccount) -> BackendResult<Account> {
        let mut t = self.write()?;
        if t.accounts.iter().any(|a| a.code == new.code) {
            return Err(BackendError::conflict("accounts_code_key"));
        }
        let id = t.take_id("accounts");
        let row = Account {
            id,
            code: new.code,
            name_ar: new.name_ar,
            name_en: new.name_en,
            kind: new.kind,
        };
        t.accounts.push(row.clone());
        Ok(row)
    }

    async fn list_journal_entries(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> BackendResult<Vec<JournalEntry>> {
        let t = self.read()?;
        let mut rows: Vec<JournalEntry> = t
            .journal_entries
            .iter()
            .filter(|e| in_range(e.entry_date, from, to))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows)
    }

    async fn post_journal_quick(&self, entry: QuickJournalEntry) -> BackendResult<(i64, i64)> {
        let mut t = self.write()?;
        if entry.amount <= 0.0 {
            return Err(BackendError::validation("amount must be positive"));
        }
        if entry.debit_account_id == entry.credit_account_id {
            return Err(BackendError::validation(
                "debit and credit accounts must differ",
            ));
        }
        for account_id in [entry.debit_account_id, entry.credit_account_id] {
            if !t.accounts.iter().any(|a| a.id == account_id) {
                return Err(BackendError::validation(format!(
                    "unknown account: {account_id}"
                )));
            }
        }

        let now = Utc::now();
        let debit_id = t.take_id("journal_entries");
        t.journal_entries.push(JournalEntry {
            id: debit_id,
            entry_date: entry.entry_date,
            voucher_no: entry.voucher_no.clone(),
            description: entry.description.clone(),
            account_id: entry.debit_account_id,
            debit: entry.amount,
            credit: 0.0,
            created_at: now,
        });
        let credit_id = t.take_id("journal_entries");
        t.journal_entries.push(JournalEntry {
            id: credit_id,
            entry_date: entry.entry_date,
            voucher_no: entry.voucher_no,
            description: entry.description,
            account_id: entry.credit_account_id,
            debit: 0.0,
            credit: entry.amount,
            created_at: now,
        });
        Ok((debit_id, credit_id))
    }

    // -- report RPCs -------------------------------------------------------

    async fn report_inventory(&self) -> BackendResult<Vec<InventoryRow>> {
        let t = self.read()?;
        let mut rows: Vec<InventoryRow> = t
            .products
            .iter()
            .map(|p| {
                let purchased_qty: f64 = t
                    .purchase_items
                    .iter()
                    .filter(|i| i.product_id == p.id)
                    .map(|i| i.qty)
                    .sum();
                let sold_qty: f64 = t
                    .sale_items
                    .iter()
                    .filter(|i| i.product_id == p.id)
                    .map(|i| i.qty)
                    .sum();
                let adjust_in: f64 = t
                    .stock_moves
                    .iter()
                    .filter(|m| m.product_id == p.id && m.direction == "in")
                    .map(|m| m.qty)
                    .sum();
                let adjust_out: f64 = t
                    .stock_moves
                    .iter()
                    .filter(|m| m.product_id == p.id && m.direction == "out")
                    .map(|m| m.qty)
                    .sum();
                InventoryRow {
                    product_id: p.id,
                    sku: p.sku.clone(),
                    name: p.name_ar.clone(),
                    purchased_qty,
                    sold_qty,
                    adjust_in,
                    adjust_out,
                    stock_qty: purchased_qty - sold_qty + adjust_in - adjust_out,
                }
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn report_movement(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        skus: &[String],
    ) -> BackendResult<Vec<MovementRow>> {
        let t = self.read()?;
        let mut rows: Vec<MovementRow> = Vec::new();

        for item in &t.purchase_items {
            let Some(header) = t.purchases.iter().find(|p| p.id == item.purchase_id) else {
                continue;
            };
            let product = t.product(item.product_id)?;
            rows.push(MovementRow {
                trx_date: header.created_at.date_naive(),
                sku: product.sku.clone(),
                name: product.name_ar.clone(),
                direction: "in".to_string(),
                qty: item.qty,
                note: Some(format!("purchase {}", header.invoice_no)),
            });
        }

        for item in &t.sale_items {
            let Some(header) = t.sales.iter().find(|s| s.id == item.sale_id) else {
                continue;
            };
            let product = t.product(item.product_id)?;
            rows.push(MovementRow {
                trx_date: header.created_at.date_naive(),
                sku: product.sku.clone(),
                name: product.name_ar.clone(),
                direction: "out".to_string(),
                qty: item.qty,
                note: Some(format!("sale #{}", header.id)),
            });
        }

        for mv in &t.stock_moves {
            let product = t.product(mv.product_id)?;
            rows.push(MovementRow {
                trx_date: mv.trx_date,
                sku: product.sku.clone(),
                name: product.name_ar.clone(),
                direction: mv.direction.clone(),
                qty: mv.qty,
                note: mv.note.clone(),
            });
        }

        rows.retain(|r| in_range(r.trx_date, from, to));
        if !skus.is_empty() {
            rows.retain(|r| r.sku.as_deref().is_some_and(|s| skus.iter().any(|q| q == s)));
        }
        rows.sort_by(|a, b| a.trx_date.cmp(&b.trx_date));
        Ok(rows)
    }

    async fn report_trial_balance(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> BackendResult<Vec<TrialBalanceRow>> {
        let t = self.read()?;
        let mut per_account: BTreeMap<i64, (f64, f64)> = BTreeMap::new();
        for e in t
            .journal_entries
            .iter()
            .filter(|e| in_range(e.entry_date, from, to))
        {
            let slot = per_account.entry(e.account_id).or_insert((0.0, 0.0));
            slot.0 += e.debit;
            slot.1 += e.credit;
        }

        let mut rows: Vec<TrialBalanceRow> = per_account
            .into_iter()
            .filter_map(|(account_id, (debit, credit))| {
                let account = t.accounts.iter().find(|a| a.id == account_id)?;
                Some(TrialBalanceRow {
                    account_id,
                    code: account.code.clone(),
                    name: account.name_ar.clone(),
                    debit,
                    credit,
                })
            })
            .collect();
        rows.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(rows)
    }

    // -- backup ------------------------------------------------------------

    async fn dump_table(&self, table: &str) -> BackendResult<Vec<serde_json::Value>> {
        let t = self.read()?;
        let rows = match table {
            "products" => serde_json::to_value(&t.products)?,
            "purchases" => serde_json::to_value(&t.purchases)?,
            "purchase_items" => serde_json::to_value(&t.purchase_items)?,
            "sales" => serde_json::to_value(&t.sales)?,
            "sale_items" => serde_json::to_value(&t.sale_items)?,
            "stock_moves" => serde_json::to_value(&t.stock_moves)?,
            "accounts" => serde_json::to_value(&t.accounts)?,
            "journal_entries" => serde_json::to_value(&t.journal_entries)?,
            "user_profiles" => serde_json::to_value(&t.user_profiles)?,
            other => return Err(BackendError::UnknownTable(other.to_string())),
        };
        match rows {
            serde_json::Value::Array(values) => Ok(values),
            _ => Ok(Vec::new()),
        }
    }

    async fn upsert_rows(&self, table: &str, rows: Vec<serde_json::Value>) -> BackendResult<usize> {
        if !BACKUP_TABLES.contains(&table) {
            return Err(BackendError::UnknownTable(table.to_string()));
        }
        let count = rows.len();
        let mut t = self.write()?;
        match table {
            "products" => {
                for value in rows {
                    let row: Product = serde_json::from_value(value)?;
                    t.bump_id("products", row.id);
                    upsert_by(&mut t.products, row, |r| r.id);
                }
            }
            "purchases" => {
                for value in rows {
                    let row: Purchase = serde_json::from_value(value)?;
                    t.bump_id("purchases", row.id);
                    upsert_by(&mut t.purchases, row, |r| r.id);
                }
            }
            "purchase_items" => {
                for value in rows {
                    let row: PurchaseItem = serde_json::from_value(value)?;
                    t.bump_id("purchase_items", row.id);
                    upsert_by(&mut t.purchase_items, row, |r| r.id);
                }
            }
            "sales" => {
                for value in rows {
                    let row: Sale = serde_json::from_value(value)?;
                    t.bump_id("sales", row.id);
                    upsert_by(&mut t.sales, row, |r| r.id);
                }
            }
            "sale_items" => {
                for value in rows {
                    let row: SaleItem = serde_json::from_value(value)?;
                    t.bump_id("sale_items", row.id);
                    upsert_by(&mut t.sale_items, row, |r| r.id);
                }
            }
            "stock_moves" => {
                for value in rows {
                    let row: StockMove = serde_json::from_value(value)?;
                    t.bump_id("stock_moves", row.id);
                    upsert_by(&mut t.stock_moves, row, |r| r.id);
                }
            }
            "accounts" => {
                for value in rows {
                    let row: Account = serde_json::from_value(value)?;
                    t.bump_id("accounts", row.id);
                    upsert_by(&mut t.accounts, row, |r| r.id);
                }
            }
            "journal_entries" => {
                for value in rows {
                    let row: JournalEntry = serde_json::from_value(value)?;
                    t.bump_id("journal_entries", row.id);
                    upsert_by(&mut t.journal_entries, row, |r| r.id);
                }
            }
            "user_profiles" => {
                for value in rows {
                    let row: UserProfile = serde_json::from_value(value)?;
                    upsert_by(&mut t.user_profiles, row, |r| r.id);
                }
            }
            _ => unreachable!("table checked against BACKUP_TABLES"),
        }
        Ok(count)
    }

    // -- users -------------------------------------------------------------

    async fn list_user_profiles(&self) -> BackendResult<Vec<UserProfile>> {
        let t = self.read()?;
        let mut rows = t.user_profiles.clone();
        rows.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(rows)
    }

    async fn create_user(&self, new: NewUser) -> BackendResult<UserProfile> {
        let mut t = self.write()?;
        if t.user_profiles.iter().any(|u| u.email == new.email) {
            return Err(BackendError::conflict("user_profiles_email_key"));
        }
        let row = UserProfile {
            id: Uuid::now_v7(),
            email: new.email,
            full_name: new.full_name,
            role: new.role,
            created_at: Utc::now(),
        };
        t.user_profiles.push(row.clone());
        Ok(row)
    }
}

fn upsert_by<T, K: PartialEq>(rows: &mut Vec<T>, row: T, key: impl Fn(&T) -> K) {
    let k = key(&row);
    if let Some(existing) = rows.iter_mut().find(|r| key(r) == k) {
        *existing = row;
    } else {
        rows.push(row);
    }
}
