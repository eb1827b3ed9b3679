use chrono::{Duration as ChronoDuration, Utc};
use elecpos_auth::{JwtClaims, Role, UserId};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(jwt_secret: &str) -> Self {
        // Build the same router as prod (in-memory backend), bound to an
        // ephemeral port.
        let app = elecpos_api::app::build_app(jwt_secret.to_string()).await;
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(jwt_secret: &str, roles: Vec<Role>) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: UserId::new(),
        roles,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn create_product(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    name: &str,
    sku: &str,
    unit_price: f64,
) -> i64 {
    let res = client
        .post(format!("{}/products", base_url))
        .bearer_auth(token)
        .json(&json!({ "sku": sku, "name_ar": name, "unit_price": unit_price, "tax_rate": 0.05 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn("test-secret").await;

    let res = reqwest::Client::new()
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn("test-secret").await;

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/whoami", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(format!("{}/products", srv.base_url))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn whoami_reflects_the_token() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, vec![Role::Manager, Role::Cashier]);

    let res = reqwest::Client::new()
        .get(format!("{}/whoami", srv.base_url))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["user_id"].as_str().is_some());
    let roles = body["roles"].as_array().unwrap();
    assert!(roles.iter().any(|r| r == "manager"));
    assert!(roles.iter().any(|r| r == "cashier"));
}

#[tokio::test]
async fn product_crud_lifecycle() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, vec![Role::Admin]);
    let client = reqwest::Client::new();

    let id = create_product(&client, &srv.base_url, &token, "Cable", "C-1", 12.5).await;

    // Fresh products carry zero stock.
    let res = client
        .get(format!("{}/products", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["stock_qty"].as_f64().unwrap(), 0.0);

    // Partial update changes only the provided fields.
    let res = client
        .put(format!("{}/products/{}", srv.base_url, id))
        .bearer_auth(&token)
        .json(&json!({ "unit_price": 14.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: serde_json::Value = res.json().await.unwrap();
    assert_eq!(updated["unit_price"].as_f64().unwrap(), 14.0);
    assert_eq!(updated["name_ar"].as_str().unwrap(), "Cable");

    let res = client
        .delete(format!("{}/products/{}", srv.base_url, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn product_validation_rejects_bad_input() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, vec![Role::Admin]);
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/products", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name_ar": "", "unit_price": 1.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(format!("{}/products", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name_ar": "x", "unit_price": -1.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn viewer_cannot_write() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let viewer = mint_jwt(jwt_secret, vec![Role::Viewer]);
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/products", srv.base_url))
        .bearer_auth(&viewer)
        .json(&json!({ "name_ar": "Cable", "unit_price": 1.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Reads are open to any authenticated role.
    let res = client
        .get(format!("{}/products", srv.base_url))
        .bearer_auth(&viewer)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn purchase_creates_header_items_and_totals() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, vec![Role::Manager]);
    let client = reqwest::Client::new();

    let product_id = create_product(&client, &srv.base_url, &token, "Plug", "P-1", 10.0).await;

    let res = client
        .post(format!("{}/purchases", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "supplier_name": "Acme",
            "items": [
                { "product_id": product_id, "qty": 2.0, "unit_cost": 10.0, "tax_rate": 0.05 },
                { "product_id": product_id, "qty": 1.0, "unit_cost": 30.0 }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    assert_eq!(created["ok"], json!(true));
    assert_eq!(created["invoice_no"].as_str().unwrap(), "1");
    let id = created["id"].as_i64().unwrap();

    // sub = 2*10 + 1*30 = 50, tax = 2*10*0.05 = 1, grand = 51
    let res = client
        .get(format!("{}/purchases/{}", srv.base_url, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["purchase"]["sub_total"].as_f64().unwrap(), 50.0);
    assert_eq!(body["purchase"]["tax_total"].as_f64().unwrap(), 1.0);
    assert_eq!(body["purchase"]["grand_total"].as_f64().unwrap(), 51.0);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(
        body["items"][0]["product_name"].as_str().unwrap(),
        "Plug"
    );
}

#[tokio::test]
async fn invoice_numbers_increment_per_purchase() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, vec![Role::Admin]);
    let client = reqwest::Client::new();

    let product_id = create_product(&client, &srv.base_url, &token, "Fuse", "F-1", 2.0).await;

    for expected in ["1", "2", "3"] {
        let res = client
            .post(format!("{}/purchases", srv.base_url))
            .bearer_auth(&token)
            .json(&json!({
                "items": [{ "product_id": product_id, "qty": 1.0, "unit_cost": 2.0 }]
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["invoice_no"].as_str().unwrap(), expected);
    }
}

#[tokio::test]
async fn empty_invoice_is_rejected() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, vec![Role::Admin]);
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/purchases", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "items": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(format!("{}/sales/checkout", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "items": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn checkout_records_sale_and_moves_stock() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let admin = mint_jwt(jwt_secret, vec![Role::Admin]);
    let cashier = mint_jwt(jwt_secret, vec![Role::Cashier]);
    let client = reqwest::Client::new();

    let product_id = create_product(&client, &srv.base_url, &admin, "Lamp", "L-1", 6.0).await;

    // Stock in 10 via purchase.
    let res = client
        .post(format!("{}/purchases", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({
            "items": [{ "product_id": product_id, "qty": 10.0, "unit_cost": 4.0 }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    // Cashier sells 3.
    let res = client
        .post(format!("{}/sales/checkout", srv.base_url))
        .bearer_auth(&cashier)
        .json(&json!({
            "customer_name": "walk-in",
            "items": [{ "product_id": product_id, "qty": 3.0, "unit_price": 6.0, "tax_rate": 0.0 }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["sale"]["grand_total"].as_f64().unwrap(), 18.0);
    assert_eq!(body["items"][0]["line_total"].as_f64().unwrap(), 18.0);

    // /sales/last sees it.
    let res = client
        .get(format!("{}/sales/last", srv.base_url))
        .bearer_auth(&cashier)
        .send()
        .await
        .unwrap();
    let last: serde_json::Value = res.json().await.unwrap();
    assert_eq!(last["sale"]["grand_total"].as_f64().unwrap(), 18.0);

    // Inventory reflects 10 in - 3 out.
    let res = client
        .get(format!("{}/reports/inventory", srv.base_url))
        .bearer_auth(&cashier)
        .send()
        .await
        .unwrap();
    let report: serde_json::Value = res.json().await.unwrap();
    let row = &report["rows"][0];
    assert_eq!(row["purchased_qty"].as_f64().unwrap(), 10.0);
    assert_eq!(row["sold_qty"].as_f64().unwrap(), 3.0);
    assert_eq!(row["stock_qty"].as_f64().unwrap(), 7.0);
}

#[tokio::test]
async fn movement_report_carries_running_balance() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, vec![Role::Admin]);
    let client = reqwest::Client::new();

    let product_id = create_product(&client, &srv.base_url, &token, "Bulb", "B-1", 3.0).await;

    client
        .post(format!("{}/purchases", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "items": [{ "product_id": product_id, "qty": 5.0, "unit_cost": 1.0 }]
        }))
        .send()
        .await
        .unwrap();
    client
        .post(format!("{}/sales/checkout", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "items": [{ "product_id": product_id, "qty": 2.0, "unit_price": 3.0 }]
        }))
        .send()
        .await
        .unwrap();

    let res = client
        .get(format!("{}/reports/movement?sku=B-1", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let report: serde_json::Value = res.json().await.unwrap();
    assert_eq!(report["summary"]["total_in"].as_f64().unwrap(), 5.0);
    assert_eq!(report["summary"]["total_out"].as_f64().unwrap(), 2.0);
    assert_eq!(report["summary"]["balance"].as_f64().unwrap(), 3.0);
    let rows = report["rows"].as_array().unwrap();
    assert_eq!(rows.last().unwrap()["balance"].as_f64().unwrap(), 3.0);
}

#[tokio::test]
async fn quick_journal_entry_balances_the_trial_balance() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, vec![Role::Admin]);
    let client = reqwest::Client::new();

    let mut account_ids = Vec::new();
    for (code, name) in [("1000", "Cash"), ("4000", "Sales")] {
        let res = client
            .post(format!("{}/accounts", srv.base_url))
            .bearer_auth(&token)
            .json(&json!({ "code": code, "name_ar": name }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let account: serde_json::Value = res.json().await.unwrap();
        account_ids.push(account["id"].as_i64().unwrap());
    }

    let res = client
        .post(format!("{}/journal/quick", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "entry_date": "2024-06-01",
            "voucher_no": "V-1",
            "debit_account_id": account_ids[0],
            "credit_account_id": account_ids[1],
            "amount": 250.0
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .get(format!("{}/reports/trial-balance", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let report: serde_json::Value = res.json().await.unwrap();
    assert_eq!(report["summary"]["total_debit"].as_f64().unwrap(), 250.0);
    assert_eq!(report["summary"]["total_credit"].as_f64().unwrap(), 250.0);
    assert_eq!(report["summary"]["balanced"], json!(true));
}

#[tokio::test]
async fn duplicate_account_code_conflicts() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, vec![Role::Admin]);
    let client = reqwest::Client::new();

    for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
        let res = client
            .post(format!("{}/accounts", srv.base_url))
            .bearer_auth(&token)
            .json(&json!({ "code": "1000", "name_ar": "Cash" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), expected);
    }
}

#[tokio::test]
async fn backup_export_import_round_trip() {
    let jwt_secret = "test-secret";
    let source = TestServer::spawn(jwt_secret).await;
    let admin = mint_jwt(jwt_secret, vec![Role::Admin]);
    let client = reqwest::Client::new();

    let product_id = create_product(&client, &source.base_url, &admin, "Switch", "S-1", 9.0).await;
    client
        .post(format!("{}/purchases", source.base_url))
        .bearer_auth(&admin)
        .json(&json!({
            "items": [{ "product_id": product_id, "qty": 4.0, "unit_cost": 5.0 }]
        }))
        .send()
        .await
        .unwrap();

    let res = client
        .get(format!("{}/backup/export", source.base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let dump: serde_json::Value = res.json().await.unwrap();
    assert!(dump["exported_at"].as_str().is_some());
    assert_eq!(dump["dump"]["products"].as_array().unwrap().len(), 1);

    // Import into a fresh server.
    let target = TestServer::spawn(jwt_secret).await;
    let res = client
        .post(format!("{}/backup/import", target.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "dump": dump["dump"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/products", target.base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["stock_qty"].as_f64().unwrap(), 4.0);
}

#[tokio::test]
async fn zip_backup_restores_via_multipart_upload() {
    let jwt_secret = "test-secret";
    let source = TestServer::spawn(jwt_secret).await;
    let admin = mint_jwt(jwt_secret, vec![Role::Admin]);
    let client = reqwest::Client::new();

    create_product(&client, &source.base_url, &admin, "Socket", "K-1", 3.5).await;

    let res = client
        .get(format!("{}/backup/export.zip", source.base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()[reqwest::header::CONTENT_TYPE],
        "application/zip"
    );
    let bytes = res.bytes().await.unwrap();

    // The download is a real archive with one data/<table>.json per table.
    let cursor = std::io::Cursor::new(bytes.to_vec());
    let mut archive = zip::ZipArchive::new(cursor).unwrap();
    for table in elecpos_backend::BACKUP_TABLES {
        assert!(
            archive.by_name(&format!("data/{table}.json")).is_ok(),
            "missing archive entry for {table}"
        );
    }

    let target = TestServer::spawn(jwt_secret).await;
    let form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(bytes.to_vec()).file_name("backup.zip"),
    );
    let res = client
        .post(format!("{}/restore", target.base_url))
        .bearer_auth(&admin)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let report: serde_json::Value = res.json().await.unwrap();
    assert_eq!(report["total_rows"].as_i64().unwrap(), 1);

    let res = client
        .get(format!("{}/products", target.base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["items"][0]["name_ar"].as_str().unwrap(), "Socket");
}

#[tokio::test]
async fn backup_and_admin_are_admin_only() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let manager = mint_jwt(jwt_secret, vec![Role::Manager]);
    let client = reqwest::Client::new();

    for url in [
        format!("{}/backup/export", srv.base_url),
        format!("{}/admin/users", srv.base_url),
    ] {
        let res = client.get(url).bearer_auth(&manager).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}

#[tokio::test]
async fn admin_creates_users_with_default_role() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let admin = mint_jwt(jwt_secret, vec![Role::Admin]);
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/admin/users", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "email": "clerk@shop.example", "password": "secret" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let user: serde_json::Value = res.json().await.unwrap();
    assert_eq!(user["role"].as_str().unwrap(), "cashier");

    // Missing password is a validation error.
    let res = client
        .post(format!("{}/admin/users", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "email": "x@shop.example" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Duplicate email conflicts.
    let res = client
        .post(format!("{}/admin/users", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "email": "clerk@shop.example", "password": "other" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn delete_last_sale_requires_an_existing_sale() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, vec![Role::Admin]);
    let client = reqwest::Client::new();

    let res = client
        .delete(format!("{}/sales/last", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
