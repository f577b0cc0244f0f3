//! # Seed Data Generator
//!
//! Populates a SQLite database with demo categories and products for
//! development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p till-store --bin seed
//!
//! # Specify database path
//! cargo run -p till-store --bin seed -- --db ./data/till.db
//! ```
//!
//! ## Generated Data
//! One category per group below, with a handful of products each.
//! Prices are fixed per product so repeated seeds of a fresh database
//! are deterministic; stock starts generous enough for checkout demos.

use std::env;

use till_store::{DbConfig, NewCategory, NewProduct, SqliteStore, Store};

/// Demo catalog: (category, description, products as (name, price_cents, stock))
const CATALOG: &[(&str, &str, &[(&str, i64, i64)])] = &[
    (
        "Beverages",
        "Bottled and canned drinks",
        &[
            ("Cola 330ml", 250, 120),
            ("Cola 500ml", 350, 80),
            ("Orange Juice 1L", 450, 40),
            ("Still Water 500ml", 150, 200),
            ("Iced Tea 330ml", 300, 60),
        ],
    ),
    (
        "Snacks",
        "Chips, candy, and cookies",
        &[
            ("Potato Chips Classic", 320, 90),
            ("Chocolate Bar", 180, 150),
            ("Oat Cookies", 280, 70),
            ("Salted Pretzels", 240, 50),
        ],
    ),
    (
        "Dairy",
        "Milk and refrigerated goods",
        &[
            ("Whole Milk 1L", 380, 30),
            ("Greek Yogurt 150g", 220, 45),
            ("Cheddar Block 200g", 650, 25),
        ],
    ),
    (
        "Grocery",
        "Shelf-stable staples",
        &[
            ("Spaghetti 500g", 290, 60),
            ("White Rice 1kg", 420, 40),
            ("Canned Tomatoes", 190, 80),
            ("Peanut Butter 350g", 540, 35),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut db_path = "./till.db".to_string();

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" if i + 1 < args.len() => {
                db_path = args[i + 1].clone();
                i += 2;
            }
            "--help" | "-h" => {
                println!("Usage: seed [--db <path>]");
                return Ok(());
            }
            other => {
                eprintln!("Unknown argument: {other}");
                std::process::exit(1);
            }
        }
    }

    println!("Seeding {db_path} ...");
    let store = SqliteStore::connect(DbConfig::new(&db_path)).await?;

    let mut product_count = 0usize;
    for (category_name, description, products) in CATALOG {
        let category = store
            .create_category(NewCategory {
                name: (*category_name).to_string(),
                description: (*description).to_string(),
            })
            .await?;
        println!("  + category {} (id {})", category.name, category.id);

        for (name, price_cents, stock) in *products {
            store
                .create_product(NewProduct {
                    name: (*name).to_string(),
                    description: String::new(),
                    price_cents: *price_cents,
                    stock: *stock,
                    category_id: Some(category.id),
                })
                .await?;
            product_count += 1;
        }
    }

    println!();
    println!(
        "✓ Seed complete: {} categories, {} products",
        CATALOG.len(),
        product_count
    );

    store.close().await;
    Ok(())
}
