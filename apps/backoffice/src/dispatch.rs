//! # Request Dispatcher
//!
//! Turns one JSON request into one JSON response.
//!
//! ## Wire Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Request                                                                │
//! │  {"command": "register_payment",                                        │
//! │   "args": {"kind": "customer", "partyId": "…", "amount": 1500}}        │
//! │                                                                         │
//! │  Success                                                                │
//! │  {"ok": true, "data": {…}}                                             │
//! │                                                                         │
//! │  Failure                                                                │
//! │  {"ok": false, "error": {"code": "NOT_FOUND", "message": "…"}}         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands without arguments may omit `args`. Amounts are integer cents,
//! quantities integer thousandths, rates integer basis points.

use caja_core::{NewPurchase, NewSale, PartyInput, ProductInput};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::commands::category::{CreateCategoryArgs, RenameCategoryArgs};
use crate::commands::ledger::{PartyArgs, RegisterPaymentArgs};
use crate::commands::party::UpdatePartyArgs;
use crate::commands::product::{AdjustStockArgs, FindProductArgs, UpdateProductArgs};
use crate::commands::purchase::{ListPurchasesArgs, UpdatePurchaseStatusArgs};
use crate::commands::report::{DebtorsArgs, LimitArgs};
use crate::commands::sale::{ListSalesArgs, RefundSaleArgs};
use crate::commands::session::{AddMovementArgs, CloseSessionArgs, OpenSessionArgs};
use crate::commands::{self, IdArgs, ListArgs, RangeArgs, SearchArgs};
use crate::error::ApiError;
use crate::state::{ConfigState, DbState};

/// Every operation the back office exposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", content = "args", rename_all = "snake_case")]
pub enum Request {
    // Register sessions
    OpenSession(OpenSessionArgs),
    CloseSession(CloseSessionArgs),
    AddMovement(AddMovementArgs),
    GetActiveSession,
    GetSession(IdArgs),
    ListSessions(ListArgs),

    // Sales
    CompleteSale(NewSale),
    RefundSale(RefundSaleArgs),
    GetSale(IdArgs),
    ListSales(ListSalesArgs),

    // Purchases
    CreatePurchase(NewPurchase),
    UpdatePurchaseStatus(UpdatePurchaseStatusArgs),
    GetPurchase(IdArgs),
    ListPurchases(ListPurchasesArgs),

    // Ledgers
    RegisterPayment(RegisterPaymentArgs),
    GetLedger(PartyArgs),
    RecomputeBalance(PartyArgs),

    // Customers
    CreateCustomer(PartyInput),
    UpdateCustomer(UpdatePartyArgs),
    GetCustomer(IdArgs),
    SearchCustomers(SearchArgs),
    DeactivateCustomer(IdArgs),

    // Suppliers
    CreateSupplier(PartyInput),
    UpdateSupplier(UpdatePartyArgs),
    GetSupplier(IdArgs),
    SearchSuppliers(SearchArgs),
    DeactivateSupplier(IdArgs),

    // Catalogue
    CreateProduct(ProductInput),
    UpdateProduct(UpdateProductArgs),
    GetProduct(IdArgs),
    FindProduct(FindProductArgs),
    SearchProducts(SearchArgs),
    DeactivateProduct(IdArgs),
    AdjustStock(AdjustStockArgs),
    ListAdjustments(IdArgs),
    CreateCategory(CreateCategoryArgs),
    ListCategories,
    RenameCategory(RenameCategoryArgs),
    DeleteCategory(IdArgs),

    // Reports
    SalesSummary(RangeArgs),
    DailySales(RangeArgs),
    SalesByPaymentMethod(RangeArgs),
    TopProducts(ListArgs),
    InventoryValuation,
    LowStock(LimitArgs),
    Debtors(DebtorsArgs),
    SessionHistory(ListArgs),

    // Configuration
    GetConfig,
}

/// Outcome of one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl Response {
    pub fn success(data: Value) -> Self {
        Response {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: ApiError) -> Self {
        Response {
            ok: false,
            data: None,
            error: Some(error),
        }
    }
}

/// Parses and runs one request line.
pub async fn handle_line(db: &DbState, config: &ConfigState, line: &str) -> Response {
    match serde_json::from_str::<Request>(line) {
        Ok(request) => dispatch(db, config, request).await,
        Err(e) => {
            warn!(error = %e, "Rejected malformed request");
            Response::failure(ApiError::from(e))
        }
    }
}

/// Runs a parsed request.
pub async fn dispatch(db: &DbState, config: &ConfigState, request: Request) -> Response {
    match execute(db, config, request).await {
        Ok(data) => Response::success(data),
        Err(error) => {
            debug!(code = ?error.code, message = %error.message, "Command failed");
            Response::failure(error)
        }
    }
}

async fn execute(db: &DbState, config: &ConfigState, request: Request) -> Result<Value, ApiError> {
    use commands::{category, ledger, party, product, purchase, report, sale, session};

    let database = db.inner();

    match request {
        Request::OpenSession(args) => to_json(session::open_session(db, args).await?),
        Request::CloseSession(args) => to_json(session::close_session(db, args).await?),
        Request::AddMovement(args) => to_json(session::add_movement(db, args).await?),
        Request::GetActiveSession => to_json(session::get_active_session(db).await?),
        Request::GetSession(args) => to_json(session::get_session(db, args).await?),
        Request::ListSessions(args) => to_json(session::list_sessions(db, args).await?),

        Request::CompleteSale(new_sale) => to_json(sale::complete_sale(db, config, new_sale).await?),
        Request::RefundSale(args) => to_json(sale::refund_sale(db, args).await?),
        Request::GetSale(args) => to_json(sale::get_sale(db, args).await?),
        Request::ListSales(args) => to_json(sale::list_sales(db, args).await?),

        Request::CreatePurchase(new_purchase) => {
            to_json(purchase::create_purchase(db, new_purchase).await?)
        }
        Request::UpdatePurchaseStatus(args) => {
            to_json(purchase::update_purchase_status(db, args).await?)
        }
        Request::GetPurchase(args) => to_json(purchase::get_purchase(db, args).await?),
        Request::ListPurchases(args) => to_json(purchase::list_purchases(db, args).await?),

        Request::RegisterPayment(args) => to_json(ledger::register_payment(db, args).await?),
        Request::GetLedger(args) => to_json(ledger::get_ledger(db, args).await?),
        Request::RecomputeBalance(args) => to_json(ledger::recompute_balance(db, args).await?),

        Request::CreateCustomer(input) => to_json(party::create(database.customers(), input).await?),
        Request::UpdateCustomer(args) => to_json(party::update(database.customers(), args).await?),
        Request::GetCustomer(args) => to_json(party::get(database.customers(), args).await?),
        Request::SearchCustomers(args) => to_json(party::search(database.customers(), args).await?),
        Request::DeactivateCustomer(args) => {
            to_json(party::deactivate(database.customers(), args).await?)
        }

        Request::CreateSupplier(input) => to_json(party::create(database.suppliers(), input).await?),
        Request::UpdateSupplier(args) => to_json(party::update(database.suppliers(), args).await?),
        Request::GetSupplier(args) => to_json(party::get(database.suppliers(), args).await?),
        Request::SearchSuppliers(args) => to_json(party::search(database.suppliers(), args).await?),
        Request::DeactivateSupplier(args) => {
            to_json(party::deactivate(database.suppliers(), args).await?)
        }

        Request::CreateProduct(input) => to_json(product::create_product(db, input).await?),
        Request::UpdateProduct(args) => to_json(product::update_product(db, args).await?),
        Request::GetProduct(args) => to_json(product::get_product(db, args).await?),
        Request::FindProduct(args) => to_json(product::find_product(db, args).await?),
        Request::SearchProducts(args) => to_json(product::search_products(db, args).await?),
        Request::DeactivateProduct(args) => to_json(product::deactivate_product(db, args).await?),
        Request::AdjustStock(args) => to_json(product::adjust_stock(db, args).await?),
        Request::ListAdjustments(args) => to_json(product::list_adjustments(db, args).await?),
        Request::CreateCategory(args) => to_json(category::create_category(db, args).await?),
        Request::ListCategories => to_json(category::list_categories(db).await?),
        Request::RenameCategory(args) => to_json(category::rename_category(db, args).await?),
        Request::DeleteCategory(args) => to_json(category::delete_category(db, args).await?),

        Request::SalesSummary(args) => to_json(report::sales_summary(db, args).await?),
        Request::DailySales(args) => to_json(report::daily_sales(db, args).await?),
        Request::SalesByPaymentMethod(args) => {
            to_json(report::sales_by_payment_method(db, args).await?)
        }
        Request::TopProducts(args) => to_json(report::top_products(db, args).await?),
        Request::InventoryValuation => to_json(report::inventory_valuation(db).await?),
        Request::LowStock(args) => to_json(report::low_stock(db, config, args).await?),
        Request::Debtors(args) => to_json(report::debtors(db, args).await?),
        Request::SessionHistory(args) => to_json(report::session_history(db, args).await?),

        Request::GetConfig => to_json(commands::config::get_config(config)),
    }
}

fn to_json<T: Serialize>(value: T) -> Result<Value, ApiError> {
    serde_json::to_value(value)
        .map_err(|e| ApiError::internal(format!("Failed to encode response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use caja_db::{Database, DbConfig};
    use serde_json::json;

    async fn setup() -> (DbState, ConfigState) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        (DbState::new(db), ConfigState::default())
    }

    async fn call(db: &DbState, config: &ConfigState, request: Value) -> Response {
        handle_line(db, config, &request.to_string()).await
    }

    async fn ok(db: &DbState, config: &ConfigState, request: Value) -> Value {
        let response = call(db, config, request.clone()).await;
        assert!(response.ok, "{request} failed: {:?}", response.error);
        response.data.unwrap_or(Value::Null)
    }

    #[tokio::test]
    async fn test_sale_through_the_wire() {
        let (db, config) = setup().await;

        let session = ok(&db, &config, json!({"command": "open_session", "args": {"openingFloat": 1000}})).await;
        let product = ok(
            &db,
            &config,
            json!({"command": "create_product", "args": {
                "name": "Queso", "basePrice": 500, "taxRate": 1000
            }}),
        )
        .await;
        ok(
            &db,
            &config,
            json!({"command": "adjust_stock", "args": {
                "productId": product["id"], "delta": 10000, "reason": "Initial count"
            }}),
        )
        .await;

        let receipt = ok(
            &db,
            &config,
            json!({"command": "complete_sale", "args": {
                "sessionId": session["id"],
                "paymentMethod": "cash",
                "amountTendered": 1100,
                "items": [{
                    "productId": product["id"],
                    "productName": "Queso",
                    "quantity": 2000,
                    "unitPrice": 500,
                    "taxRate": 1000
                }]
            }}),
        )
        .await;

        assert_eq!(receipt["sale"]["total"], 1100);
        assert_eq!(receipt["sale"]["change"], 0);
        assert_eq!(receipt["totalDisplay"], "$11.00");
        assert_eq!(receipt["items"].as_array().map(Vec::len), Some(1));

        let active = ok(&db, &config, json!({"command": "get_active_session"})).await;
        assert_eq!(active["session"]["cash_sales"], 1100);
        assert_eq!(active["summary"]["expectedFloat"], 2100);

        let stock = ok(&db, &config, json!({"command": "get_product", "args": {"id": product["id"]}})).await;
        assert_eq!(stock["stock"], 8000);
    }

    #[tokio::test]
    async fn test_failures_are_structured() {
        let (db, config) = setup().await;

        let response = call(
            &db,
            &config,
            json!({"command": "update_purchase_status", "args": {"id": "nope", "status": "cancelled"}}),
        )
        .await;
        assert!(!response.ok);
        assert_eq!(response.error.map(|e| e.code), Some(ErrorCode::NotFound));

        let response = call(
            &db,
            &config,
            json!({"command": "add_movement", "args": {
                "sessionId": "x", "amount": -5, "kind": "in", "reason": "oops"
            }}),
        )
        .await;
        assert_eq!(response.error.map(|e| e.code), Some(ErrorCode::ValidationError));

        let response = handle_line(&db, &config, "{not json").await;
        assert_eq!(response.error.map(|e| e.code), Some(ErrorCode::ValidationError));

        let response = call(&db, &config, json!({"command": "launch_rockets"})).await;
        assert!(!response.ok);
    }

    #[tokio::test]
    async fn test_second_open_session_is_invalid_state() {
        let (db, config) = setup().await;
        ok(&db, &config, json!({"command": "open_session", "args": {"openingFloat": 0}})).await;

        let response = call(&db, &config, json!({"command": "open_session", "args": {"openingFloat": 0}})).await;
        let error = response.error.unwrap();
        assert_eq!(error.code, ErrorCode::InvalidState);

        let wire = serde_json::to_value(Response::failure(error)).unwrap();
        assert_eq!(wire["ok"], false);
        assert_eq!(wire["error"]["code"], "INVALID_STATE");
        assert!(wire.get("data").is_none());
    }

    #[tokio::test]
    async fn test_supplier_payment_and_ledger() {
        let (db, config) = setup().await;

        let supplier = ok(&db, &config, json!({"command": "create_supplier", "args": {"name": "Molinos"}})).await;
        ok(
            &db,
            &config,
            json!({"command": "register_payment", "args": {
                "kind": "supplier", "partyId": supplier["id"], "amount": 250, "notes": "Advance"
            }}),
        )
        .await;

        let ledger = ok(
            &db,
            &config,
            json!({"command": "get_ledger", "args": {"kind": "supplier", "partyId": supplier["id"]}}),
        )
        .await;
        assert_eq!(ledger.as_array().map(Vec::len), Some(1));
        assert_eq!(ledger[0]["kind"], "payment");

        let check = ok(
            &db,
            &config,
            json!({"command": "recompute_balance", "args": {"kind": "supplier", "partyId": supplier["id"]}}),
        )
        .await;
        assert_eq!(check["stored"], -250);
        assert_eq!(check["computed"], -250);
    }

    #[tokio::test]
    async fn test_reports_and_config_without_args() {
        let (db, config) = setup().await;

        let summary = ok(&db, &config, json!({"command": "sales_summary", "args": {}})).await;
        assert_eq!(summary["saleCount"], 0);

        let valuation = ok(&db, &config, json!({"command": "inventory_valuation"})).await;
        assert_eq!(valuation["productCount"], 0);

        let cfg = ok(&db, &config, json!({"command": "get_config"})).await;
        assert_eq!(cfg["storeName"], config.store_name);
        assert_eq!(cfg["defaultTaxRate"], 2100);
    }
}
