//! # Seed Data Generator
//!
//! Populates a development database with a small, realistic store.
//!
//! ## Usage
//! ```bash
//! # Seed ./caja_dev.db
//! cargo run -p caja-db --bin seed
//!
//! # Specify database path
//! cargo run -p caja-db --bin seed -- --db ./data/caja.db
//! ```
//!
//! ## What Gets Created
//! - Categories and their products (prices in cents, tax in bps)
//! - One supplier, and one credit purchase that brings in opening stock
//! - A few customers
//! - An open register session with a couple of sales
//!
//! Everything goes through the same posting operations the app uses, so
//! the seeded ledgers and drawer totals are consistent.

use std::env;

use caja_core::{
    Money, NewPurchase, NewPurchaseLine, NewSale, NewSaleLine, PartyInput, PaymentMethod,
    ProductInput, Quantity, Rate,
};
use caja_db::{Database, DbConfig};

/// (category, [(name, price in cents, tax in bps)])
const CATALOGUE: &[(&str, &[(&str, i64, u32)])] = &[
    (
        "Almacen",
        &[
            ("Yerba Mate 1kg", 450_00, 2100),
            ("Harina 000 1kg", 120_00, 1050),
            ("Aceite Girasol 1.5L", 380_00, 2100),
            ("Arroz Largo Fino 1kg", 160_00, 1050),
            ("Fideos Spaghetti 500g", 95_00, 1050),
        ],
    ),
    (
        "Bebidas",
        &[
            ("Agua Mineral 2L", 80_00, 2100),
            ("Gaseosa Cola 2.25L", 210_00, 2100),
            ("Jugo de Naranja 1L", 150_00, 2100),
        ],
    ),
    (
        "Lacteos",
        &[
            ("Leche Entera 1L", 110_00, 1050),
            ("Queso Cremoso 500g", 520_00, 1050),
            ("Manteca 200g", 240_00, 1050),
        ],
    ),
];

const CUSTOMERS: &[&str] = &["Ana Gomez", "Bruno Diaz", "Carla Perez"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./caja_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Caja Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./caja_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Caja Seed Data Generator");
    println!("========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Catalogue
    let mut purchase_lines = Vec::new();
    let mut sku = 1;
    for (category_name, products) in CATALOGUE {
        let category = db.categories().create(category_name).await?;

        for (name, price, tax_bps) in products.iter() {
            let price = Money::from_cents(*price);
            let cost = Money::from_cents(price.cents() * 60 / 100);
            let product = db
                .products()
                .create(&ProductInput {
                    name: name.to_string(),
                    sku: Some(format!("SKU-{:04}", sku)),
                    barcode: Some(format!("779{:010}", sku)),
                    category_id: Some(category.id.clone()),
                    base_price: price,
                    cost_price: cost,
                    tax_rate: Rate::from_bps(*tax_bps),
                    min_stock: Quantity::from_units(5),
                    track_inventory: true,
                })
                .await?;

            purchase_lines.push(NewPurchaseLine {
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                quantity: Quantity::from_units(20 + (sku % 4) * 10),
                unit_cost: cost,
                tax_rate: product.tax_rate,
            });
            sku += 1;
        }
    }
    println!("✓ {} products in {} categories", sku - 1, CATALOGUE.len());

    // Opening stock arrives on account
    let supplier = db
        .suppliers()
        .create(&PartyInput {
            name: "Distribuidora Central".to_string(),
            phone: Some("011-4000-1000".to_string()),
            ..PartyInput::default()
        })
        .await?;

    let purchase = db
        .purchases()
        .create_purchase(&NewPurchase {
            supplier_id: supplier.id.clone(),
            payment_method: PaymentMethod::Credit,
            notes: Some("Opening stock".to_string()),
            items: purchase_lines.clone(),
        })
        .await?;
    println!(
        "✓ Purchase {} for {} ({} lines)",
        purchase.purchase.receipt_number,
        purchase.purchase.total,
        purchase.items.len()
    );

    let mut customers = Vec::new();
    for name in CUSTOMERS {
        let customer = db
            .customers()
            .create(&PartyInput {
                name: name.to_string(),
                credit_limit: Money::from_units(5000),
                ..PartyInput::default()
            })
            .await?;
        customers.push(customer);
    }
    println!("✓ {} customers", customers.len());

    // A day at the till
    let session = db.sessions().open(Money::from_units(1000)).await?;

    let sale_line = |line: &NewPurchaseLine, units: i64| NewSaleLine {
        product_id: line.product_id.clone(),
        product_name: line.product_name.clone(),
        quantity: Quantity::from_units(units),
        unit_price: Money::from_cents(line.unit_cost.cents() * 100 / 60),
        discount_rate: Rate::zero(),
        tax_rate: line.tax_rate,
    };

    let cash = db
        .sales()
        .complete_sale(&NewSale {
            session_id: session.id.clone(),
            customer_id: None,
            payment_method: PaymentMethod::Cash,
            amount_tendered: Money::from_units(2000),
            items: vec![sale_line(&purchase_lines[0], 1), sale_line(&purchase_lines[5], 2)],
        })
        .await?;

    let credit = db
        .sales()
        .complete_sale(&NewSale {
            session_id: session.id.clone(),
            customer_id: Some(customers[0].id.clone()),
            payment_method: PaymentMethod::Credit,
            amount_tendered: Money::zero(),
            items: vec![sale_line(&purchase_lines[9], 1)],
        })
        .await?;

    println!(
        "✓ Session open with sales {} and {}",
        cash.sale.receipt_number, credit.sale.receipt_number
    );

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
